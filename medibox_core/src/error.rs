//! Error types for the medibox_core library.
//!
//! The dose engine itself never fails; these errors come from the
//! persistence and configuration collaborators.

use crate::CompartmentId;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for medibox_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored box state is inconsistent
    #[error("State error: {0}")]
    State(String),

    /// No compartment with the given slot id
    #[error("Unknown compartment: {0}")]
    UnknownCompartment(CompartmentId),

    /// A time-of-day could not be understood
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    /// The shared session lock was poisoned by a panicking holder
    #[error("Session lock poisoned")]
    LockPoisoned,

    /// Generic error
    #[error("{0}")]
    Other(String),
}
