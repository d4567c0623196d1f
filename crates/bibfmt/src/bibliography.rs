//! The rendered-bibliography pipeline.
//!
//! One engine is built per call: it gets the snapshot's ids in collection
//! order, decides the bibliography order, and renders one string per entry.
//! Each entry is then tagged with the id at its rank before the pieces are
//! joined into one fragment.

use crate::options::Options;
use crate::snapshot::Snapshot;
use crate::{Error, Result};
use bibfmt_citeproc::locale::{DEFAULT_LANG, fetch_locale};
use bibfmt_citeproc::styles::{DEFAULT_TEMPLATE, fetch_template};
use bibfmt_citeproc::{Bibliography, EngineFactory, LocaleCallback};
use tracing::{debug, warn};

/// Separator placed between rendered entries.
pub const ENTRY_SEPARATOR: &str = "<br />";

/// Attribute naming the entry id on each rendered entry.
pub const ENTRY_ID_ATTRIBUTE: &str = "data-csl-entry-id";

/// Engine output paired with the bibliography order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibliographyResult {
    wrapper_start: String,
    wrapper_end: String,
    entries: Vec<String>,
    sorted_ids: Vec<String>,
}

impl BibliographyResult {
    /// Fails unless there is exactly one entry per sorted id.
    pub fn new(bibliography: Bibliography, sorted_ids: Vec<String>) -> Result<Self> {
        if bibliography.entries.len() != sorted_ids.len() {
            return Err(Error::InconsistentBibliography {
                entries: bibliography.entries.len(),
                ids: sorted_ids.len(),
            });
        }
        Ok(BibliographyResult {
            wrapper_start: bibliography.bibstart,
            wrapper_end: bibliography.bibend,
            entries: bibliography.entries,
            sorted_ids,
        })
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn sorted_ids(&self) -> &[String] {
        &self.sorted_ids
    }

    /// Assemble the fragment: wrapper, tagged entries joined by `<br />`.
    pub fn to_html(&self) -> String {
        let body: Vec<String> = self
            .entries
            .iter()
            .zip(&self.sorted_ids)
            .map(|(entry, id)| mark_entry(entry, id))
            .collect();
        format!(
            "{}{}{}",
            self.wrapper_start,
            body.join(ENTRY_SEPARATOR),
            self.wrapper_end
        )
    }
}

/// Add the entry-id attribute to the leading tag of `entry`.
///
/// Entries that do not start with a tag (after whitespace) are returned
/// unchanged.
pub fn mark_entry(entry: &str, id: &str) -> String {
    let leading = entry.len() - entry.trim_start().len();
    let rest = &entry[leading..];
    let Some(after_lt) = rest.strip_prefix('<') else {
        return entry.to_string();
    };
    let name_len = after_lt
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(after_lt.len());
    if name_len == 0 {
        return entry.to_string();
    }
    let split = leading + 1 + name_len;
    format!(
        "{} {}=\"{}\"{}",
        &entry[..split],
        ENTRY_ID_ATTRIBUTE,
        bibfmt_citeproc::output::escape_html(id),
        &entry[split..]
    )
}

/// Render the bibliography for `snapshot` as an HTML fragment.
pub fn render_html(
    snapshot: &Snapshot,
    options: &Options,
    engines: &dyn EngineFactory,
) -> Result<String> {
    Ok(render(snapshot, options, engines)?.to_html())
}

/// Run the engine and pair its output with the bibliography order.
pub fn render(
    snapshot: &Snapshot,
    options: &Options,
    engines: &dyn EngineFactory,
) -> Result<BibliographyResult> {
    let style_format = options.style.format();

    let locales: LocaleCallback<'_> = if options.locale.is_empty() {
        Box::new(fetch_locale)
    } else {
        let locale = options.locale.clone();
        Box::new(move |_: &str| Some(locale.clone()))
    };

    let lang = if fetch_locale(&options.lang).is_some() {
        options.lang.as_str()
    } else {
        debug!(lang = %options.lang, "no built-in locale, using {}", DEFAULT_LANG);
        DEFAULT_LANG
    };

    let template = resolve_template(options)?;

    let mut engine = engines.create(
        style_format,
        lang,
        &template,
        snapshot.item_callback(),
        locales,
    )?;
    let sorted_ids = engine.update_items(&snapshot.ids())?;
    let bibliography = engine.make_bibliography()?;
    debug!(
        style = style_format,
        lang,
        entries = bibliography.entries.len(),
        "rendered bibliography"
    );

    BibliographyResult::new(bibliography, sorted_ids)
}

/// The template override, else the built-in template named by the style
/// format, else the default template.
fn resolve_template(options: &Options) -> Result<String> {
    if !options.template.is_empty() {
        return Ok(options.template.clone());
    }
    let name = options.style.format();
    if let Some(template) = fetch_template(name) {
        return Ok(template);
    }
    warn!(
        style = name,
        fallback = DEFAULT_TEMPLATE,
        "unknown style template, using fallback"
    );
    fetch_template(DEFAULT_TEMPLATE).ok_or_else(|| {
        bibfmt_citeproc::Error::TemplateNotFound {
            name: name.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bibliography(entries: &[&str]) -> Bibliography {
        Bibliography {
            bibstart: "<div>".to_string(),
            bibend: "</div>".to_string(),
            entries: entries.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_mark_entry() {
        assert_eq!(
            mark_entry("  <div class=\"csl-entry\">x</div>\n", "b"),
            "  <div data-csl-entry-id=\"b\" class=\"csl-entry\">x</div>\n"
        );
        assert_eq!(mark_entry("<p>x</p>", "a&b"), "<p data-csl-entry-id=\"a&amp;b\">x</p>");
        assert_eq!(mark_entry("plain", "a"), "plain");
        assert_eq!(mark_entry("< p>", "a"), "< p>");
    }

    #[test]
    fn test_length_invariant() {
        let err = BibliographyResult::new(bibliography(&["<p>a</p>"]), vec![]).unwrap_err();
        assert!(matches!(
            err,
            Error::InconsistentBibliography { entries: 1, ids: 0 }
        ));
    }

    #[test]
    fn test_assembly() {
        let result = BibliographyResult::new(
            bibliography(&["<p>one</p>", "<p>two</p>"]),
            vec!["x".to_string(), "y".to_string()],
        )
        .unwrap();
        assert_eq!(
            result.to_html(),
            "<div><p data-csl-entry-id=\"x\">one</p><br /><p data-csl-entry-id=\"y\">two</p></div>"
        );
    }

    #[test]
    fn test_empty_bibliography_is_wrapper_only() {
        let result = BibliographyResult::new(bibliography(&[]), vec![]).unwrap();
        assert_eq!(result.to_html(), "<div></div>");
    }
}
