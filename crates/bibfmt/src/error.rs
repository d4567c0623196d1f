//! Error types for output dispatch.

use thiserror::Error;

/// Result type alias for bibfmt operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while formatting a collection.
#[derive(Debug, Error)]
pub enum Error {
    /// The type/style pair has no pipeline (`json` with `citation-*`).
    #[error("Combination type/style of {output_type}/{style} is not valid")]
    InvalidCombination { output_type: String, style: String },

    /// The style names no known kind.
    #[error("Invalid options: unknown style '{style}'")]
    InvalidOptions { style: String },

    /// The citation engine failed. Passed through as-is.
    #[error(transparent)]
    Engine(#[from] bibfmt_citeproc::Error),

    /// The engine returned a different number of entries than ids.
    #[error("Bibliography has {entries} entries for {ids} sorted ids")]
    InconsistentBibliography { entries: usize, ids: usize },

    /// A pipeline produced output the materializer could not parse.
    #[error("Failed to materialize {output_type} output: {message}")]
    Materialization { output_type: String, message: String },

    /// Input was not CSL-JSON entries.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Entry serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this is a reported (rather than propagated) option error.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Error::InvalidCombination { .. } | Error::InvalidOptions { .. }
        )
    }
}
