//! BibTeX output: structured records and source text.

mod json;
mod text;

pub use json::{BibtexEntry, bibtex_type, label, to_bibtex_json};
pub use text::to_bibtex_text;
