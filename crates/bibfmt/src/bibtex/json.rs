//! CSL-JSON to BibTeX-JSON conversion.

use crate::entry::Entry;
use bibfmt_citeproc::reference::{
    DateValue, Name, get_date, get_names, get_variable, item_type,
};
use hashlink::LinkedHashMap;
use serde::{Deserialize, Serialize};

/// A BibTeX record: entry type, citation key, and fields in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BibtexEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub label: String,
    pub properties: LinkedHashMap<String, String>,
}

/// Map a CSL type to a BibTeX entry type.
pub fn bibtex_type(csl_type: &str) -> &'static str {
    match csl_type {
        "article" | "article-journal" | "article-magazine" | "article-newspaper" => "article",
        "book" => "book",
        "chapter" => "incollection",
        "paper-conference" => "inproceedings",
        "thesis" => "phdthesis",
        "report" => "techreport",
        _ => "misc",
    }
}

/// Convert one entry.
pub fn to_bibtex_json(entry: &Entry) -> BibtexEntry {
    let item = entry.fields();
    let csl_type = item_type(item);
    let entry_type = bibtex_type(csl_type);
    let mut properties = LinkedHashMap::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            properties.insert(key.to_string(), value);
        }
    };

    put("author", join_names(&get_names(item, "author")));
    put("editor", join_names(&get_names(item, "editor")));
    put("title", get_variable(item, "title"));
    let container_key = match entry_type {
        "article" => Some("journal"),
        "incollection" | "inproceedings" => Some("booktitle"),
        _ => None,
    };
    if let Some(key) = container_key {
        put(key, get_variable(item, "container-title"));
    }
    let publisher_key = match entry_type {
        "phdthesis" => "school",
        "techreport" => "institution",
        _ => "publisher",
    };
    put(publisher_key, get_variable(item, "publisher"));
    put("address", get_variable(item, "publisher-place"));
    put("edition", get_variable(item, "edition"));
    put("volume", get_variable(item, "volume"));
    put("number", get_variable(item, "issue"));
    put("pages", get_variable(item, "page").map(|p| bibtex_page_range(&p)));

    match get_date(item, "issued") {
        Some(DateValue::Parts(parts)) => {
            put("year", Some(parts.year.to_string()));
            put("month", parts.month.map(|m| m.to_string()));
        }
        Some(DateValue::Literal(literal)) => put("year", Some(literal)),
        None => {}
    }

    put("doi", get_variable(item, "DOI"));
    put("isbn", get_variable(item, "ISBN"));
    put("issn", get_variable(item, "ISSN"));
    put("url", get_variable(item, "URL"));
    put("note", get_variable(item, "note"));
    put("abstract", get_variable(item, "abstract"));

    BibtexEntry {
        entry_type: entry_type.to_string(),
        label: label(entry),
        properties,
    }
}

/// The citation key: `citation-label` if present, otherwise first author
/// family name, year and first title word (e.g. `Smith2020On`), otherwise
/// the entry id.
pub fn label(entry: &Entry) -> String {
    let item = entry.fields();
    if let Some(label) = get_variable(item, "citation-label") {
        return label;
    }

    let family = get_names(item, "author")
        .into_iter()
        .next()
        .and_then(|name| name.family.or(name.literal));
    let year = match get_date(item, "issued") {
        Some(DateValue::Parts(parts)) => Some(parts.year.to_string()),
        _ => None,
    };
    let word = get_variable(item, "title")
        .and_then(|title| title.split_whitespace().next().map(str::to_string));

    let label: String = [family, year, word]
        .into_iter()
        .flatten()
        .map(|part| part.chars().filter(|c| c.is_alphanumeric()).collect::<String>())
        .collect();
    if label.is_empty() {
        entry.id().unwrap_or_default()
    } else {
        label
    }
}

fn join_names(names: &[Name]) -> Option<String> {
    let formatted: Vec<String> = names
        .iter()
        .filter_map(|name| {
            if let Some(literal) = &name.literal {
                return Some(literal.clone());
            }
            let family = [name.non_dropping_particle.as_deref(), name.family.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            match (family.is_empty(), name.given.as_deref()) {
                (true, None) => None,
                (true, Some(given)) => Some(given.to_string()),
                (false, None) => Some(family),
                (false, Some(given)) => Some(format!("{}, {}", family, given)),
            }
        })
        .collect();
    (!formatted.is_empty()).then(|| formatted.join(" and "))
}

/// "10-20" and "10–20" become "10--20".
fn bibtex_page_range(page: &str) -> String {
    page.replace("--", "-")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace('-', "--")
}
