//! Behaviour of `Cite::get` across the type/style matrix.

use bibfmt::{Cite, Error, Format, Output, OutputType, PartialOptions, strip_tags};
use bibfmt_citeproc::{
    Bibliography, CitationEngine, EngineFactory, ItemCallback, ItemData, LocaleCallback,
};
use serde_json::json;
use std::io;
use std::sync::{Arc, Mutex};

const ENTRIES: &str = r#"[
    {"id": "a", "title": "X", "author": [{"family": "Doe", "given": "Jane"}], "issued": {"date-parts": [[2020]]}},
    {"id": "b", "title": "Y", "author": [{"family": "Doe", "given": "Jane"}], "issued": {"date-parts": [[2019]]}}
]"#;

fn cite() -> Cite {
    Cite::from_csl_json(ENTRIES).unwrap()
}

fn opts(output_type: OutputType, style: &str) -> PartialOptions {
    PartialOptions::new()
        .output_type(output_type)
        .style(style)
        .format(Format::String)
}

fn text(output: Output) -> String {
    match output {
        Output::Text(text) => text,
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn test_json_csl_string_keeps_order() {
    let out = text(cite().get(&opts(OutputType::Json, "csl")).unwrap());
    assert_eq!(
        out,
        r#"[{"id":"a","title":"X","author":[{"family":"Doe","given":"Jane"}],"issued":{"date-parts":[[2020]]}},{"id":"b","title":"Y","author":[{"family":"Doe","given":"Jane"}],"issued":{"date-parts":[[2019]]}}]"#
    );
}

#[test]
fn test_json_csl_real_round_trips() {
    let cite = cite();
    let out = cite
        .get(&PartialOptions::new().output_type(OutputType::Json).style("csl"))
        .unwrap();
    let expected = serde_json::to_value(cite.entries()).unwrap();
    assert_eq!(out, Output::Json(expected));
}

#[test]
fn test_defaults_are_real_json_csl() {
    let out = cite().get(&PartialOptions::new()).unwrap();
    let ids: Vec<&str> = out
        .as_json()
        .and_then(|v| v.as_array())
        .unwrap()
        .iter()
        .filter_map(|e| e["id"].as_str())
        .collect();
    assert_eq!(ids, ["a", "b"]);
}

#[test]
fn test_html_citation_apa() {
    let out = text(cite().get(&opts(OutputType::Html, "citation-apa")).unwrap());
    insta::assert_snapshot!(out, @r#"
    <div class="csl-bib-body">
      <div data-csl-entry-id="b" class="csl-entry">Doe, J. (2019). Y.</div>
    <br />  <div data-csl-entry-id="a" class="csl-entry">Doe, J. (2020). X.</div>
    </div>
    "#);
}

#[test]
fn test_string_citation_is_stripped_html() {
    let cite = cite();
    for style in ["citation-apa", "citation-vancouver", "citation-harvard1"] {
        let html = text(cite.get(&opts(OutputType::Html, style)).unwrap());
        let plain = text(cite.get(&opts(OutputType::String, style)).unwrap());
        assert_eq!(plain, strip_tags(&html), "{}", style);
        assert!(!plain.contains('<'), "{}", style);
    }
}

#[test]
fn test_vancouver_numbers_follow_bibliography_order() {
    let out = text(cite().get(&opts(OutputType::String, "citation-vancouver")).unwrap());
    let lines: Vec<&str> = out.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    assert_eq!(lines, ["1. Doe J. X. 2020.", "2. Doe J. Y. 2019."]);
}

#[test]
fn test_real_html_is_nodes() {
    let out = cite()
        .get(
            &PartialOptions::new()
                .output_type(OutputType::Html)
                .style("citation-apa"),
        )
        .unwrap();
    let nodes = out.as_nodes().unwrap();
    assert_eq!(nodes.len(), 1);
    assert!(out.to_string().starts_with("<div class=\"csl-bib-body\">"));
}

#[test]
fn test_real_html_without_renderer_is_text() {
    let out = cite()
        .without_renderer()
        .get(&PartialOptions::new().output_type(OutputType::Html).style("bibtex"))
        .unwrap();
    assert!(out.as_text().unwrap().starts_with("<div class=\"csl-bib-body\">"));
}

#[test]
fn test_real_html_with_unbalanced_title_markup() {
    let cite = Cite::from_csl_json(
        r#"[{"id": "a", "type": "book", "title": "On <i>E. coli", "author": [{"family": "Doe", "given": "Jane"}], "issued": {"date-parts": [[2020]]}},
            {"id": "b", "type": "book", "title": "Stray </b>close", "issued": {"date-parts": [[2021]]}}]"#,
    )
    .unwrap();
    let html = PartialOptions::new()
        .output_type(OutputType::Html)
        .style("citation-apa");

    let out = cite.get(&html).unwrap();
    assert!(out.as_nodes().is_some(), "{:?}", out);

    let raw = text(cite.get(&html.clone().format(Format::String)).unwrap());
    assert_eq!(raw.matches("<i>").count(), raw.matches("</i>").count(), "{}", raw);
    assert!(raw.contains("Stray &lt;/b&gt;close"), "{}", raw);
}

#[test]
fn test_citation_without_author_renders_title_once() {
    let cite = Cite::from_csl_json(r#"[{"id": "a", "title": "The <sc>NASA</sc> story"}]"#).unwrap();
    let out = text(cite.get(&opts(OutputType::Html, "citation-apa")).unwrap());
    assert_eq!(out.matches("NASA").count(), 1, "{}", out);
    assert!(
        out.contains("<span style=\"font-variant:small-caps;\">NASA</span>"),
        "{}",
        out
    );
    assert!(!out.contains("<sc>"), "{}", out);

    let nodes = cite
        .get(&PartialOptions::new().output_type(OutputType::Html).style("citation-apa"))
        .unwrap();
    assert!(nodes.as_nodes().is_some());
}

#[test]
fn test_html_csl_is_escaped_pretty_json() {
    let cite = Cite::from_csl_json(r#"[{"id": "<a>"}]"#).unwrap();
    let out = text(cite.get(&opts(OutputType::Html, "csl")).unwrap());
    assert_eq!(
        out,
        "<pre class=\"csl-json\">[\n  {\n    &quot;id&quot;: &quot;&lt;a&gt;&quot;\n  }\n]</pre>"
    );
}

#[test]
fn test_bibtex_outputs() {
    let cite = cite();
    let plain = text(cite.get(&opts(OutputType::String, "bibtex")).unwrap());
    assert!(plain.starts_with("@misc{Doe2020X,\n\tauthor={Doe, Jane},\n"));
    assert_eq!(strip_tags(&plain), plain);

    let records = cite
        .get(&PartialOptions::new().output_type(OutputType::Json).style("bibtex"))
        .unwrap();
    assert_eq!(
        records.as_json().unwrap()[1],
        json!({
            "type": "misc",
            "label": "Doe2019Y",
            "properties": {"author": "Doe, Jane", "title": "Y", "year": "2019"}
        })
    );
}

#[test]
fn test_empty_collection_citation() {
    let cite = Cite::new(Vec::new());
    let out = text(cite.get(&opts(OutputType::Html, "citation-apa")).unwrap());
    assert_eq!(out, "<div class=\"csl-bib-body\">\n</div>");
}

#[test]
fn test_unknown_template_falls_back_to_apa() {
    let cite = cite();
    let fallback = cite.get(&opts(OutputType::Html, "citation-nonexistent")).unwrap();
    let apa = cite.get(&opts(OutputType::Html, "citation-apa")).unwrap();
    assert_eq!(fallback, apa);
}

#[test]
fn test_unknown_lang_falls_back_to_en_us() {
    let cite = cite();
    let out = cite
        .get(&opts(OutputType::Html, "citation-apa").lang("xx-XX"))
        .unwrap();
    let en = cite.get(&opts(OutputType::Html, "citation-apa")).unwrap();
    assert_eq!(out, en);
}

#[test]
fn test_template_override_per_call() {
    let template = r#"<style><bibliography><layout><text variable="title"/></layout></bibliography></style>"#;
    let cite = cite();
    let out = text(
        cite.get(&opts(OutputType::String, "citation-custom").template(template))
            .unwrap(),
    );
    assert_eq!(out, "\n  X\n  Y\n");

    // Instance-level templates are reset before call options apply.
    let cite = cite.with_options(PartialOptions::new().template(template));
    let out = text(cite.get(&opts(OutputType::String, "citation-apa")).unwrap());
    assert!(out.contains("Doe, J. (2020). X."));
}

#[test]
fn test_locale_override_per_call() {
    let locale = r#"<locale xml:lang="en-US"><terms>
        <term name="no date" form="short">sine anno</term>
    </terms></locale>"#;
    let cite = Cite::from_csl_json(r#"[{"id": "u", "title": "Undated"}]"#).unwrap();
    let out = text(
        cite.get(&opts(OutputType::String, "citation-apa").locale(locale))
            .unwrap(),
    );
    assert!(out.contains("(sine anno)"), "{}", out);
}

#[test]
fn test_engine_errors_propagate() {
    let cite = cite();
    let err = cite
        .get(&opts(OutputType::Html, "citation-x").template("<style><bibliography>"))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Engine(bibfmt_citeproc::Error::StyleParse { .. })
    ));
}

#[test]
fn test_get_does_not_touch_collection() {
    let cite = cite();
    let before = cite.entries().to_vec();
    cite.get(&opts(OutputType::Html, "citation-apa")).unwrap();
    cite.get(&opts(OutputType::Json, "bibtex")).unwrap();
    assert_eq!(cite.entries(), before.as_slice());
}

#[test]
fn test_get_ids() {
    let mut cite = cite();
    cite.add(bibfmt::Entry::try_from(json!({"id": 3})).unwrap());
    cite.add(bibfmt::Entry::try_from(json!({"title": "anonymous"})).unwrap());
    assert_eq!(cite.get_ids(), ["a", "b", "3"]);
}

// ============================================================================
// Invalid combinations
// ============================================================================

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, captured.contents())
}

#[test]
fn test_json_citation_is_undefined_and_logged() {
    let cite = cite();
    let (out, logs) = with_captured_logs(|| {
        cite.get(&PartialOptions::new().output_type(OutputType::Json).style("citation-apa"))
    });
    assert_eq!(out.unwrap(), Output::Undefined);
    assert!(logs.contains("ERROR"), "{}", logs);
    assert!(
        logs.contains("Combination type/style of json/citation-apa is not valid"),
        "{}",
        logs
    );
}

#[test]
fn test_unknown_style_is_undefined_and_logged() {
    let cite = cite();
    let (out, logs) = with_captured_logs(|| cite.get(&opts(OutputType::Html, "ris")));
    assert!(out.unwrap().is_undefined());
    assert!(logs.contains("Invalid options"), "{}", logs);
}

#[test]
fn test_try_get_returns_typed_error() {
    let err = cite()
        .try_get(&opts(OutputType::Json, "citation-apa"))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidCombination { .. }));
}

// ============================================================================
// Engine contract, checked with a stand-in engine
// ============================================================================

/// Orders items by reverse registration and renders `[rank] title`.
struct ReversingEngine;

struct Reversing<'a> {
    retrieve_item: ItemCallback<'a>,
    items: Vec<(String, ItemData)>,
}

impl EngineFactory for ReversingEngine {
    fn create<'a>(
        &self,
        _style_format: &str,
        _lang: &str,
        _template: &str,
        retrieve_item: ItemCallback<'a>,
        _retrieve_locale: LocaleCallback<'a>,
    ) -> bibfmt_citeproc::Result<Box<dyn CitationEngine + 'a>> {
        Ok(Box::new(Reversing {
            retrieve_item,
            items: Vec::new(),
        }))
    }
}

impl CitationEngine for Reversing<'_> {
    fn update_items(&mut self, ids: &[String]) -> bibfmt_citeproc::Result<Vec<String>> {
        self.items = ids
            .iter()
            .rev()
            .map(|id| {
                (self.retrieve_item)(id)
                    .map(|item| (id.clone(), item))
                    .ok_or_else(|| bibfmt_citeproc::Error::ReferenceNotFound { id: id.clone() })
            })
            .collect::<bibfmt_citeproc::Result<_>>()?;
        Ok(self.items.iter().map(|(id, _)| id.clone()).collect())
    }

    fn make_bibliography(&mut self) -> bibfmt_citeproc::Result<Bibliography> {
        Ok(Bibliography {
            bibstart: "<ol>".to_string(),
            bibend: "</ol>".to_string(),
            entries: self
                .items
                .iter()
                .enumerate()
                .map(|(rank, (_, item))| {
                    format!(
                        "<li>[{}] {}</li>",
                        rank + 1,
                        item.get("title").and_then(|t| t.as_str()).unwrap_or("")
                    )
                })
                .collect(),
        })
    }
}

#[test]
fn test_entry_markers_follow_engine_order() {
    let cite = Cite::from_csl_json(
        r#"[{"id": "p", "title": "First"}, {"id": "q", "title": "Second"}, {"id": "r", "title": "Third"}]"#,
    )
    .unwrap()
    .with_engine(ReversingEngine);

    let out = text(cite.get(&opts(OutputType::Html, "citation-any")).unwrap());
    assert_eq!(
        out,
        "<ol><li data-csl-entry-id=\"r\">[1] Third</li><br /><li data-csl-entry-id=\"q\">[2] Second</li><br /><li data-csl-entry-id=\"p\">[3] First</li></ol>"
    );

    let plain = text(cite.get(&opts(OutputType::String, "citation-any")).unwrap());
    assert_eq!(plain, "[1] Third[2] Second[3] First");
}
