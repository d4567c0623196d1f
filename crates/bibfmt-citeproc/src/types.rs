//! The built-in processor and bibliography sorting.

use crate::engine::{Bibliography, CitationEngine, ItemCallback, LocaleCallback};
use crate::eval::{EvalContext, evaluate_element, evaluate_layout, evaluate_macro};
use crate::locale::{DEFAULT_LANG, TermForm, Terms, parse_locale};
use crate::output::{Output, QuoteConfig, join_outputs, strip_html_tags};
use crate::reference::{
    DATE_VARIABLES, DateValue, ItemData, NAME_VARIABLES, get_date, get_names, get_variable,
};
use crate::style::{BibliographyDef, Formatting, SortKey, SortSource, Style, parse_style};
use crate::{Error, Result};
use hashlink::LinkedHashMap;
use std::cmp::Ordering;
use tracing::debug;

const BIB_START: &str = "<div class=\"csl-bib-body\">\n";
const BIB_END: &str = "</div>";

/// A computed sort key value with its sort direction.
#[derive(Debug, Clone)]
pub struct SortKeyValue {
    /// The computed string value for sorting.
    pub value: String,
    /// Whether this key sorts in descending order.
    pub descending: bool,
}

/// Compare two sets of sort keys.
///
/// Empty values sort after non-empty ones whatever the direction; the
/// descending flag only reverses the comparison of two non-empty values.
pub fn compare_sort_keys(a: &[SortKeyValue], b: &[SortKeyValue]) -> Ordering {
    for (ka, kb) in a.iter().zip(b.iter()) {
        let va = normalize_for_sort(&ka.value);
        let vb = normalize_for_sort(&kb.value);

        let cmp = match (va.is_empty(), vb.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let value_cmp = va.cmp(&vb);
                if ka.descending {
                    value_cmp.reverse()
                } else {
                    value_cmp
                }
            }
        };

        if cmp != Ordering::Equal {
            return cmp;
        }
    }
    a.len().cmp(&b.len())
}

/// Lowercase and drop leading punctuation ("[Anon.]" sorts with "anon").
fn normalize_for_sort(s: &str) -> String {
    s.trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// The built-in citation processor for a CSL subset.
pub struct Processor<'a> {
    style_format: String,
    style: Style,
    terms: Terms,
    quotes: QuoteConfig,
    retrieve_item: ItemCallback<'a>,
    /// Registered items in registration order.
    registry: LinkedHashMap<String, ItemData>,
    sorted_ids: Vec<String>,
}

impl<'a> Processor<'a> {
    /// Build a processor for a style template.
    ///
    /// Locale data for `lang` must be available from `retrieve_locale`;
    /// en-US data, when available, backs up missing terms.
    pub fn new(
        style_format: &str,
        lang: &str,
        template: &str,
        retrieve_item: ItemCallback<'a>,
        retrieve_locale: LocaleCallback<'a>,
    ) -> Result<Self> {
        let style = parse_style(style_format, template)?;

        let mut terms = Terms::new();
        terms.push_layer(style.terms.clone());

        let content = retrieve_locale(lang).ok_or_else(|| Error::LocaleNotFound {
            lang: lang.to_string(),
        })?;
        terms.push_layer(parse_locale(lang, &content)?.terms);

        if lang != DEFAULT_LANG {
            if let Some(fallback) = retrieve_locale(DEFAULT_LANG) {
                terms.push_layer(parse_locale(DEFAULT_LANG, &fallback)?.terms);
            }
        }

        let defaults = QuoteConfig::default();
        let quotes = QuoteConfig {
            open: terms
                .get("open-quote", TermForm::Long, false)
                .unwrap_or(defaults.open),
            close: terms
                .get("close-quote", TermForm::Long, false)
                .unwrap_or(defaults.close),
        };

        debug!(style = style_format, lang, "created citation processor");

        Ok(Processor {
            style_format: style_format.to_string(),
            style,
            terms,
            quotes,
            retrieve_item,
            registry: LinkedHashMap::new(),
            sorted_ids: Vec::new(),
        })
    }

    /// The parsed style.
    pub fn style(&self) -> &Style {
        &self.style
    }

    /// Ids in bibliography order, as of the last `update_items`.
    pub fn sorted_ids(&self) -> &[String] {
        &self.sorted_ids
    }

    /// Compute the bibliography sort keys for an item.
    pub fn compute_sort_keys(
        &self,
        item: &ItemData,
        keys: &[SortKey],
        citation_number: usize,
    ) -> Vec<SortKeyValue> {
        keys.iter()
            .map(|key| {
                let value = match &key.source {
                    SortSource::Variable(name) => {
                        variable_sort_value(item, name, citation_number)
                    }
                    SortSource::Macro(name) => {
                        let mut ctx =
                            EvalContext::new(&self.style, &self.terms, item, citation_number);
                        strip_html_tags(&evaluate_macro(&mut ctx, name).render(&self.quotes))
                    }
                };
                SortKeyValue {
                    value,
                    descending: key.descending,
                }
            })
            .collect()
    }

    fn render_entry(&self, bib: &BibliographyDef, item: &ItemData, citation_number: usize) -> String {
        let layout = &bib.layout;
        let mut ctx = EvalContext::new(&self.style, &self.terms, item, citation_number);

        match layout.elements.split_first() {
            Some((first, rest)) if bib.second_field_align && !rest.is_empty() => {
                let left = evaluate_element(&mut ctx, first);
                let outputs = rest.iter().map(|el| evaluate_element(&mut ctx, el)).collect();
                let right = join_outputs(outputs, layout.delimiter.as_deref().unwrap_or(""));

                let left_formatting = Formatting {
                    suffix: None,
                    ..layout.formatting.clone()
                };
                let right_formatting = Formatting {
                    prefix: None,
                    ..layout.formatting.clone()
                };
                format!(
                    "  <div class=\"csl-entry\">\n    <div class=\"csl-left-margin\">{}</div><div class=\"csl-right-inline\">{}</div>\n  </div>\n",
                    Output::formatted(left_formatting, vec![left]).render(&self.quotes),
                    Output::formatted(right_formatting, vec![right]).render(&self.quotes),
                )
            }
            _ => {
                let body = evaluate_layout(&mut ctx, layout);
                format!(
                    "  <div class=\"csl-entry\">{}</div>\n",
                    Output::formatted(layout.formatting.clone(), vec![body]).render(&self.quotes)
                )
            }
        }
    }
}

impl CitationEngine for Processor<'_> {
    fn update_items(&mut self, ids: &[String]) -> Result<Vec<String>> {
        self.registry.clear();
        for id in ids {
            if self.registry.contains_key(id) {
                continue;
            }
            let item = (self.retrieve_item)(id)
                .ok_or_else(|| Error::ReferenceNotFound { id: id.clone() })?;
            self.registry.insert(id.clone(), item);
        }

        let sort_keys = self
            .style
            .bibliography
            .as_ref()
            .map(|bib| bib.sort.as_slice())
            .unwrap_or(&[]);

        let mut keyed: Vec<(String, Vec<SortKeyValue>)> = self
            .registry
            .iter()
            .enumerate()
            .map(|(index, (id, item))| {
                (id.clone(), self.compute_sort_keys(item, sort_keys, index + 1))
            })
            .collect();
        // Stable: ties keep registration order.
        keyed.sort_by(|a, b| compare_sort_keys(&a.1, &b.1));

        self.sorted_ids = keyed.into_iter().map(|(id, _)| id).collect();
        debug!(count = self.sorted_ids.len(), "registered items");
        Ok(self.sorted_ids.clone())
    }

    fn make_bibliography(&mut self) -> Result<Bibliography> {
        let bib = self
            .style
            .bibliography
            .as_ref()
            .ok_or_else(|| Error::MissingBibliography {
                style: self.style_format.clone(),
            })?;

        let mut entries = Vec::with_capacity(self.sorted_ids.len());
        for (rank, id) in self.sorted_ids.iter().enumerate() {
            let item = self
                .registry
                .get(id)
                .ok_or_else(|| Error::ReferenceNotFound { id: id.clone() })?;
            entries.push(self.render_entry(bib, item, rank + 1));
        }

        Ok(Bibliography {
            bibstart: BIB_START.to_string(),
            bibend: BIB_END.to_string(),
            entries,
        })
    }
}

fn variable_sort_value(item: &ItemData, name: &str, citation_number: usize) -> String {
    if name == "citation-number" {
        format!("{:08}", citation_number)
    } else if NAME_VARIABLES.contains(&name) {
        get_names(item, name)
            .iter()
            .map(|n| {
                [n.family.as_deref(), n.given.as_deref(), n.literal.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join(", ")
    } else if DATE_VARIABLES.contains(&name) {
        match get_date(item, name) {
            // Offset keeps negative years ordered before positive ones.
            Some(DateValue::Parts(parts)) => format!(
                "{:06}{:02}{:02}",
                i64::from(parts.year) + 100_000,
                parts.month.unwrap_or(0),
                parts.day.unwrap_or(0)
            ),
            Some(DateValue::Literal(literal)) => literal,
            None => String::new(),
        }
    } else {
        get_variable(item, name).unwrap_or_default()
    }
}
