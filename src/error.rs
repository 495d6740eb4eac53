use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the library
#[derive(Error, Debug)]
pub enum MimicError {
    /// An input file could not be read
    #[error("Failed to read {path:?}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created or written
    #[error("Failed to write {path:?}: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be encoded or decoded
    #[error("JSON error in {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A configuration file was rejected
    #[error("Invalid configuration in {path:?}: {message}")]
    Config { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, MimicError>;
