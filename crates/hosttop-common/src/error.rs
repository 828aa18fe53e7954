//! Unified error types for the hosttop workspace.
//!
//! Each higher-level crate defines its own domain-specific error enum
//! (`ParseError`, `TraceError`, `RenderError`); this one carries the
//! startup and configuration failures that halt the whole program.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum HostTopError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The process table could not be enumerated.
    #[error("cannot enumerate processes under {path}: {source}")]
    Discovery {
        /// Process table root that failed to list.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Discovery ran but matched no worker process.
    #[error("no worker processes matching {marker:?}; is the server up and running?")]
    NoWorkers {
        /// Command-line prefix that was searched for.
        marker: String,
    },

    /// Every candidate worker refused the tracer.
    #[error("none of the {requested} worker processes could be attached")]
    NoneAttached {
        /// Number of workers an attach was attempted on.
        requested: usize,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, HostTopError>;
