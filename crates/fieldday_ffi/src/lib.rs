//! Flutter bridge crate for Field Day Command.
//!
//! # Responsibility
//! - Host the FRB-facing use-case API in [`api`].

pub mod api;
