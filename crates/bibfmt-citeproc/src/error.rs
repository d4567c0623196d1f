//! Error types for citation processing.

use thiserror::Error;

/// Result type alias for bibfmt-citeproc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building an engine or rendering a bibliography.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The style template is not well-formed XML or not a usable CSL style.
    #[error("Failed to parse style '{style}': {message}")]
    StyleParse { style: String, message: String },

    /// Locale data is not well-formed XML or not a CSL locale.
    #[error("Failed to parse locale '{locale}': {message}")]
    LocaleParse { locale: String, message: String },

    /// The locale callback had nothing for the requested language.
    #[error("No locale data available for '{lang}'")]
    LocaleNotFound { lang: String },

    /// No built-in template exists under this name.
    #[error("Style template '{name}' not found")]
    TemplateNotFound { name: String },

    /// The item callback could not resolve a registered id.
    #[error("Reference '{id}' not found")]
    ReferenceNotFound { id: String },

    /// The style has no `<bibliography>` element.
    #[error("Style '{style}' does not define a bibliography")]
    MissingBibliography { style: String },
}
