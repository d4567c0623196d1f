//! Locale data for CSL term lookup.
//!
//! Locales are CSL locale XML documents. The built-in set is embedded from
//! the `locales/` directory; callers may also hand the engine arbitrary
//! locale XML through the locale callback.

use crate::error::{Error, Result};
use crate::xml::{self, XmlElement};
use rust_embed::Embed;

/// Embedded locale files from the locales/ directory.
#[derive(Embed)]
#[folder = "locales/"]
#[include = "*.xml"]
struct LocaleFiles;

/// The language every lookup falls back to.
pub const DEFAULT_LANG: &str = "en-US";

/// Term forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermForm {
    Long,
    Short,
    Verb,
    VerbShort,
    Symbol,
}

impl TermForm {
    /// The form to try next when this one is not defined.
    fn fallback(self) -> Option<TermForm> {
        match self {
            TermForm::Long => None,
            TermForm::Short | TermForm::Verb => Some(TermForm::Long),
            TermForm::VerbShort => Some(TermForm::Verb),
            TermForm::Symbol => Some(TermForm::Short),
        }
    }
}

/// A locale term, with optional singular/plural variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub name: String,
    pub form: TermForm,
    pub single: Option<String>,
    pub multiple: Option<String>,
    pub value: Option<String>,
}

impl Term {
    fn get(&self, plural: bool) -> Option<&str> {
        let variant = if plural { &self.multiple } else { &self.single };
        variant.as_deref().or(self.value.as_deref())
    }
}

/// A parsed locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Locale {
    pub lang: Option<String>,
    pub terms: Vec<Term>,
}

/// Look up the embedded locale XML for an exact language tag.
pub fn fetch_locale(lang: &str) -> Option<String> {
    let file = LocaleFiles::get(&format!("{}.xml", lang))?;
    std::str::from_utf8(file.data.as_ref())
        .ok()
        .map(str::to_string)
}

/// Language tags of every embedded locale.
pub fn available_locales() -> Vec<String> {
    let mut langs: Vec<String> = LocaleFiles::iter()
        .filter_map(|name| name.strip_suffix(".xml").map(str::to_string))
        .collect();
    langs.sort();
    langs
}

/// Parse a locale XML document.
pub fn parse_locale(lang: &str, content: &str) -> Result<Locale> {
    let fail = |message: String| Error::LocaleParse {
        locale: lang.to_string(),
        message,
    };

    let root = xml::parse(content).map_err(fail)?;
    if root.name != "locale" {
        return Err(fail(format!(
            "Expected <locale> root element, found <{}>",
            root.name
        )));
    }

    let mut terms = Vec::new();
    for terms_el in root.elements().filter(|el| el.name == "terms") {
        for term_el in terms_el.elements().filter(|el| el.name == "term") {
            terms.push(parse_term(term_el).map_err(fail)?);
        }
    }

    Ok(Locale {
        lang: root.attr("xml:lang").map(str::to_string),
        terms,
    })
}

pub(crate) fn parse_term(element: &XmlElement) -> std::result::Result<Term, String> {
    let name = element
        .attr("name")
        .ok_or("Term missing 'name' attribute")?
        .to_string();

    let single = element.child("single").map(XmlElement::text);
    let multiple = element.child("multiple").map(XmlElement::text);
    let value = if single.is_none() && multiple.is_none() {
        Some(element.text())
    } else {
        None
    };

    Ok(Term {
        name,
        form: parse_term_form(element),
        single,
        multiple,
        value,
    })
}

pub(crate) fn parse_term_form(element: &XmlElement) -> TermForm {
    match element.attr("form") {
        Some("short") => TermForm::Short,
        Some("verb") => TermForm::Verb,
        Some("verb-short") => TermForm::VerbShort,
        Some("symbol") => TermForm::Symbol,
        _ => TermForm::Long,
    }
}

/// Layered term lookup: style overrides, then the requested locale, then en-US.
#[derive(Debug, Clone, Default)]
pub struct Terms {
    layers: Vec<Vec<Term>>,
}

impl Terms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer consulted after every layer added before it.
    pub fn push_layer(&mut self, terms: Vec<Term>) {
        self.layers.push(terms);
    }

    /// Get a term, falling back through forms and then through layers.
    pub fn get(&self, name: &str, form: TermForm, plural: bool) -> Option<String> {
        for layer in &self.layers {
            let mut current = Some(form);
            while let Some(f) = current {
                if let Some(term) = layer.iter().find(|t| t.name == name && t.form == f) {
                    return term.get(plural).map(str::to_string);
                }
                current = f.fallback();
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_embedded_locales_parse() {
        let langs = available_locales();
        assert!(langs.contains(&"en-US".to_string()));
        for lang in langs {
            let content = fetch_locale(&lang).unwrap();
            let locale = parse_locale(&lang, &content)
                .unwrap_or_else(|e| panic!("Failed to parse {}: {}", lang, e));
            assert_eq!(locale.lang.as_deref(), Some(lang.as_str()));
            assert!(!locale.terms.is_empty(), "Locale {} has no terms", lang);
        }
    }

    #[test]
    fn test_fetch_locale_is_exact() {
        assert!(fetch_locale("de-DE").is_some());
        assert!(fetch_locale("de").is_none());
        assert!(fetch_locale("xx-XX").is_none());
    }

    #[test]
    fn test_single_and_multiple() {
        let locale = parse_locale(
            "t",
            r#"<locale xml:lang="t"><terms>
                 <term name="page" form="short"><single>p.</single><multiple>pp.</multiple></term>
               </terms></locale>"#,
        )
        .unwrap();
        let mut terms = Terms::new();
        terms.push_layer(locale.terms);
        assert_eq!(terms.get("page", TermForm::Short, false).as_deref(), Some("p."));
        assert_eq!(terms.get("page", TermForm::Short, true).as_deref(), Some("pp."));
    }

    #[test]
    fn test_form_and_layer_fallback() {
        let mut terms = Terms::new();
        terms.push_layer(vec![Term {
            name: "and".to_string(),
            form: TermForm::Long,
            single: None,
            multiple: None,
            value: Some("und".to_string()),
        }]);
        terms.push_layer(vec![Term {
            name: "et-al".to_string(),
            form: TermForm::Long,
            single: None,
            multiple: None,
            value: Some("et al.".to_string()),
        }]);
        assert_eq!(terms.get("and", TermForm::Symbol, false).as_deref(), Some("und"));
        assert_eq!(terms.get("et-al", TermForm::Long, false).as_deref(), Some("et al."));
        assert_eq!(terms.get("missing", TermForm::Long, false), None);
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let err = parse_locale("x", "<style/>").unwrap_err();
        assert!(matches!(err, Error::LocaleParse { .. }));
    }
}
