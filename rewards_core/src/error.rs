//! Error types for the rewards_core library.
//!
//! The engine modules never fail on user data; these errors come from the
//! host adapters (journal, state store, config) and from catalog validation.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for rewards_core operations
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

    /// Badge catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Reward state persistence error
    #[error("State error: {0}")]
    State(String),

    /// Host-supplied input that could not be parsed (CLI arguments, dates)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
