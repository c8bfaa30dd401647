//! Domain layer for the Castellan scheduler
//!
//! This module contains core scheduling models and the ports the
//! surrounding simulation implements.

pub mod error;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use error::TaskError;
