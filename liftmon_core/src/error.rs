//! Error types for the liftmon_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for liftmon_core operations
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

    /// A record the workflow requires does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A collaborator failed to read or write a record
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Workout data violates its structural invariants
    #[error("Invalid workout: {0}")]
    InvalidWorkout(String),

    /// Species key missing from the species table
    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
