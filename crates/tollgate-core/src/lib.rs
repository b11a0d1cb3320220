//! # Tollgate Core
//!
//! The domain layer of the Tollgate admission-control service.
//! This crate contains the tier policy, the fixed-window counting rules and
//! the ports the infrastructure crate implements. It performs no I/O.

pub mod domain;
pub mod error;
pub mod ports;

pub use error::DomainError;
