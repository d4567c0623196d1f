//! BibTeX text output, plain or as HTML.

use super::json::{BibtexEntry, to_bibtex_json};
use crate::entry::Entry;
use crate::markup::{decode_entities, strip_tags};
use bibfmt_citeproc::output::escape_html;

/// Render entries as BibTeX source. With `html`, the source is wrapped in
/// classed elements and values are HTML-escaped instead of tag-stripped.
pub fn to_bibtex_text(entries: &[Entry], html: bool) -> String {
    let records: Vec<BibtexEntry> = entries.iter().map(to_bibtex_json).collect();
    if html {
        render_html(&records)
    } else {
        render_plain(&records)
    }
}

fn render_plain(records: &[BibtexEntry]) -> String {
    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!("@{}{{{},\n", record.entry_type, plain_text(&record.label)));
        for (key, value) in &record.properties {
            out.push_str(&format!("\t{}={{{}}},\n", key, escape_latex(&plain_text(value))));
        }
        out.push_str("}\n");
    }
    out
}

fn render_html(records: &[BibtexEntry]) -> String {
    let mut out = String::from("<div class=\"csl-bib-body\">");
    for record in records {
        out.push_str("<div class=\"csl-entry\">");
        out.push_str(&format!(
            "<span class=\"bibtex-type\">@{}{{</span><span class=\"bibtex-label\">{}</span>,",
            escape_html(&record.entry_type),
            escape_html(&record.label)
        ));
        out.push_str("<div class=\"bibtex-properties\">");
        for (key, value) in &record.properties {
            out.push_str(&format!(
                "<div class=\"bibtex-property\">{}={{<span class=\"bibtex-value\">{}</span>}},</div>",
                escape_html(key),
                escape_html(value)
            ));
        }
        out.push_str("</div>}</div>");
    }
    out.push_str("</div>");
    out
}

/// Markup removed and entities decoded. Stripping runs again after decoding
/// so an encoded `&lt;i&gt;` does not come back as a tag.
fn plain_text(value: &str) -> String {
    strip_tags(&decode_entities(&strip_tags(value)))
}

/// Escape characters with special meaning in LaTeX.
fn escape_latex(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '&' | '%' | '$' | '#' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
