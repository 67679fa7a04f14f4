//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the raw storage-unit contract used by the persistence store.
//! - Isolate SQLite query details from versioning and domain logic.

pub mod unit_repo;
