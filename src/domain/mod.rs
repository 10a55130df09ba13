//! Domain layer for the deferred action engine
//!
//! This module contains the task model, the group conflict policy model and
//! the ports the engine depends on.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
