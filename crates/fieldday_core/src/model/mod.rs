//! Entity model for zones, field days, configuration, and gamification.
//!
//! # Responsibility
//! - Define plain data records persisted by the store.
//! - Keep behaviour limited to derived, read-only metrics.
//!
//! # Invariants
//! - Every entity is identified by a stable id (`Uuid` or catalog key).
//! - Deployment stops copy place fields; they never reference live places.

pub mod config;
pub mod field_day;
pub mod medal;
pub mod rank;
pub mod zone;
