//! Error types for merkle_distributor

use thiserror::Error;

/// Result type alias for merkle_distributor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a distribution
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed input: bad numeric string, bad address, duplicate identity
    #[error("Invalid input: {0}")]
    Input(String),

    /// A field cannot be encoded into its fixed-width slot
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Cannot build a distribution from an empty holder set")]
    EmptyInput,

    #[error("Leaf index {index} is out of range for a tree with {leaf_count} leaves")]
    IndexOutOfRange { index: usize, leaf_count: usize },

    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Logging error: {0}")]
    Log(String),
}
