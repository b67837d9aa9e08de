//! Error types surfaced while parsing build flags and loading project configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised before a descriptor can be generated.
///
/// Descriptor generation itself is infallible; everything here concerns turning untyped
/// driver input into the typed values the generator accepts.
#[derive(Debug, Error)]
pub enum BuildConfigError {
    /// A browser class other than `modern` or `legacy` was requested.
    #[error("invalid browser class `{0}` (expected `modern` or `legacy`)")]
    InvalidBrowserClass(String),

    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    ConfigRead {
        /// Path that caused the error.
        path: PathBuf,
        /// Source I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::ProjectConfig`].
    #[error("failed to parse {}: {source}", path.display())]
    ConfigParse {
        /// Path that caused the error.
        path: PathBuf,
        /// Source parse error.
        source: serde_json::Error,
    },
}
