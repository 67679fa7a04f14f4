//! Domain engine and its use-case services.
//!
//! # Responsibility
//! - Own in-memory collections behind one single-writer `Engine`.
//! - Split use-cases by area: catalog, field day, gamification.
//! - Keep presentation and FFI layers decoupled from storage details.

pub mod catalog_service;
pub mod clock;
pub mod engine;
pub mod events;
pub mod field_day_service;
pub mod gamification;
pub mod ordering;
pub mod pressure;
pub mod undo;
