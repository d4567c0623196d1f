//! Pipeline selection and the passthrough pipelines.

use crate::bibliography;
use crate::bibtex::{to_bibtex_json, to_bibtex_text};
use crate::markup::strip_tags;
use crate::options::{Options, OutputType, Style, StyleKind};
use crate::snapshot::Snapshot;
use crate::{Error, Result};
use bibfmt_citeproc::EngineFactory;
use bibfmt_citeproc::output::escape_html;

/// One way of turning a snapshot into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Rendered bibliography fragment.
    HtmlBibliography,
    /// Rendered bibliography with all tags stripped.
    TextBibliography,
    /// Compact CSL-JSON.
    CslJson,
    /// Pretty CSL-JSON, escaped inside a `<pre>` block.
    CslHtml,
    BibtexText { html: bool },
    /// A JSON array of BibTeX records.
    BibtexJson,
}

impl Pipeline {
    /// Pick the pipeline for a type/style pair.
    pub fn select(output_type: OutputType, style: &Style) -> Result<Pipeline> {
        use OutputType as T;
        use StyleKind as K;

        let pipeline = match (output_type, style.kind()) {
            (T::Html, K::Citation) => Pipeline::HtmlBibliography,
            (T::Html, K::Csl) => Pipeline::CslHtml,
            (T::Html, K::Bibtex) => Pipeline::BibtexText { html: true },
            (T::String, K::Bibtex) => Pipeline::BibtexText { html: false },
            (T::String, K::Citation) => Pipeline::TextBibliography,
            (T::String | T::Json, K::Csl) => Pipeline::CslJson,
            (T::Json, K::Bibtex) => Pipeline::BibtexJson,
            (T::Json, K::Citation) => {
                return Err(Error::InvalidCombination {
                    output_type: output_type.to_string(),
                    style: style.to_string(),
                });
            }
            (_, K::Other(_)) => {
                return Err(Error::InvalidOptions {
                    style: style.to_string(),
                });
            }
        };
        Ok(pipeline)
    }

    pub fn run(
        self,
        snapshot: &Snapshot,
        options: &Options,
        engines: &dyn EngineFactory,
    ) -> Result<String> {
        match self {
            Pipeline::HtmlBibliography => bibliography::render_html(snapshot, options, engines),
            Pipeline::TextBibliography => Ok(strip_tags(&bibliography::render_html(
                snapshot, options, engines,
            )?)),
            Pipeline::CslJson => Ok(serde_json::to_string(snapshot.entries())?),
            Pipeline::CslHtml => Ok(format!(
                "<pre class=\"csl-json\">{}</pre>",
                escape_html(&serde_json::to_string_pretty(snapshot.entries())?)
            )),
            Pipeline::BibtexText { html } => Ok(to_bibtex_text(snapshot.entries(), html)),
            Pipeline::BibtexJson => {
                let records: Vec<_> = snapshot.entries().iter().map(to_bibtex_json).collect();
                Ok(serde_json::to_string(&records)?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn select(output_type: OutputType, style: &str) -> Result<Pipeline> {
        Pipeline::select(output_type, &Style::parse(style))
    }

    #[test]
    fn test_selection_table() {
        use OutputType::*;
        assert_eq!(select(Html, "citation-apa").unwrap(), Pipeline::HtmlBibliography);
        assert_eq!(select(Html, "csl").unwrap(), Pipeline::CslHtml);
        assert_eq!(select(Html, "bibtex").unwrap(), Pipeline::BibtexText { html: true });
        assert_eq!(select(String, "bibtex").unwrap(), Pipeline::BibtexText { html: false });
        assert_eq!(select(String, "citation-apa").unwrap(), Pipeline::TextBibliography);
        assert_eq!(select(String, "csl").unwrap(), Pipeline::CslJson);
        assert_eq!(select(Json, "csl").unwrap(), Pipeline::CslJson);
        assert_eq!(select(Json, "bibtex").unwrap(), Pipeline::BibtexJson);
    }

    #[test]
    fn test_invalid_pairs() {
        let err = select(OutputType::Json, "citation-apa").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Combination type/style of json/citation-apa is not valid"
        );
        assert!(matches!(
            select(OutputType::Html, "ris"),
            Err(Error::InvalidOptions { .. })
        ));
        assert!(matches!(
            select(OutputType::String, ""),
            Err(Error::InvalidOptions { .. })
        ));
    }
}
