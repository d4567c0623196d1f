//! CSL style model and parser.
//!
//! Only the parts of CSL a bibliography needs are modelled: macros, inline
//! locale terms, and the `<bibliography>` element with its sort keys and
//! layout. Citation layouts are accepted but not read.

use crate::error::{Error, Result};
use crate::locale::{Term, TermForm, parse_term, parse_term_form};
use crate::xml::{self, XmlElement};
use std::collections::HashMap;

/// Font style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

/// Font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

/// Vertical alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlign {
    Baseline,
    Sup,
    Sub,
}

/// Text case transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCase {
    Lowercase,
    Uppercase,
    CapitalizeFirst,
    CapitalizeAll,
}

/// Formatting attributes shared by rendering elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formatting {
    pub font_style: Option<FontStyle>,
    pub font_weight: Option<FontWeight>,
    pub vertical_align: Option<VerticalAlign>,
    pub text_case: Option<TextCase>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub quotes: bool,
}

impl Formatting {
    fn from_element(el: &XmlElement) -> Self {
        Formatting {
            font_style: el.attr("font-style").map(|v| match v {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }),
            font_weight: el.attr("font-weight").map(|v| match v {
                "bold" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }),
            vertical_align: el.attr("vertical-align").map(|v| match v {
                "sup" => VerticalAlign::Sup,
                "sub" => VerticalAlign::Sub,
                _ => VerticalAlign::Baseline,
            }),
            text_case: el.attr("text-case").and_then(|v| match v {
                "lowercase" => Some(TextCase::Lowercase),
                "uppercase" => Some(TextCase::Uppercase),
                "capitalize-first" => Some(TextCase::CapitalizeFirst),
                "capitalize-all" => Some(TextCase::CapitalizeAll),
                _ => None,
            }),
            prefix: el.attr("prefix").map(str::to_string),
            suffix: el.attr("suffix").map(str::to_string),
            quotes: el.attr("quotes") == Some("true"),
        }
    }
}

/// Where a `<text>` element takes its content from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    Variable { name: String, form: TermForm },
    Macro(String),
    Term { name: String, form: TermForm, plural: bool },
    Value(String),
}

/// How the last name of a list is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameAnd {
    Text,
    Symbol,
}

/// Whether the name delimiter also precedes the "and" connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterPrecedesLast {
    Contextual,
    Always,
    Never,
}

/// Which names are inverted to "Family, Given".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameAsSortOrder {
    First,
    All,
}

/// Long names include given names; short names are family only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameForm {
    Long,
    Short,
}

/// Options from a `<name>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameOptions {
    pub and: Option<NameAnd>,
    pub delimiter: String,
    pub delimiter_precedes_last: DelimiterPrecedesLast,
    pub initialize_with: Option<String>,
    pub name_as_sort_order: Option<NameAsSortOrder>,
    pub sort_separator: String,
    pub et_al_min: Option<usize>,
    pub et_al_use_first: Option<usize>,
    pub form: NameForm,
}

impl Default for NameOptions {
    fn default() -> Self {
        NameOptions {
            and: None,
            delimiter: ", ".to_string(),
            delimiter_precedes_last: DelimiterPrecedesLast::Contextual,
            initialize_with: None,
            name_as_sort_order: None,
            sort_separator: ", ".to_string(),
            et_al_min: None,
            et_al_use_first: None,
            form: NameForm::Long,
        }
    }
}

impl NameOptions {
    /// Read a `<name>` element, falling back to `base` for absent attributes.
    fn from_element(el: &XmlElement, base: &NameOptions) -> Self {
        NameOptions {
            and: match el.attr("and") {
                Some("text") => Some(NameAnd::Text),
                Some("symbol") => Some(NameAnd::Symbol),
                Some(_) => None,
                None => base.and,
            },
            delimiter: el
                .attr("delimiter")
                .map(str::to_string)
                .unwrap_or_else(|| base.delimiter.clone()),
            delimiter_precedes_last: match el.attr("delimiter-precedes-last") {
                Some("always") => DelimiterPrecedesLast::Always,
                Some("never") => DelimiterPrecedesLast::Never,
                Some(_) => DelimiterPrecedesLast::Contextual,
                None => base.delimiter_precedes_last,
            },
            initialize_with: el
                .attr("initialize-with")
                .map(str::to_string)
                .or_else(|| base.initialize_with.clone()),
            name_as_sort_order: match el.attr("name-as-sort-order") {
                Some("first") => Some(NameAsSortOrder::First),
                Some("all") => Some(NameAsSortOrder::All),
                Some(_) => None,
                None => base.name_as_sort_order,
            },
            sort_separator: el
                .attr("sort-separator")
                .map(str::to_string)
                .unwrap_or_else(|| base.sort_separator.clone()),
            et_al_min: el
                .attr("et-al-min")
                .and_then(|v| v.parse().ok())
                .or(base.et_al_min),
            et_al_use_first: el
                .attr("et-al-use-first")
                .and_then(|v| v.parse().ok())
                .or(base.et_al_use_first),
            form: match el.attr("form") {
                Some("short") => NameForm::Short,
                Some(_) => NameForm::Long,
                None => base.form,
            },
        }
    }
}

/// A `<names>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamesElement {
    pub variables: Vec<String>,
    pub name: NameOptions,
    pub delimiter: Option<String>,
    pub substitute: Vec<Element>,
    pub formatting: Formatting,
}

/// Date part names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePartName {
    Year,
    Month,
    Day,
}

/// Date part forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePartForm {
    Numeric,
    NumericLeadingZeros,
    Long,
    Short,
}

/// A `<date-part>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePart {
    pub name: DatePartName,
    pub form: DatePartForm,
    pub formatting: Formatting,
}

/// A `<date>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateElement {
    pub variable: String,
    pub parts: Vec<DatePart>,
    pub delimiter: Option<String>,
    pub formatting: Formatting,
}

/// How the tests of a branch combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    All,
    Any,
    None,
}

/// A single test of an `<if>`/`<else-if>` branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Type(String),
    Variable(String),
    IsNumeric(String),
}

/// A branch of a `<choose>`. An `<else>` branch has no conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub conditions: Vec<Condition>,
    pub match_type: MatchType,
    pub elements: Vec<Element>,
}

/// A rendering element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Text {
        source: TextSource,
        formatting: Formatting,
    },
    Number {
        variable: String,
        formatting: Formatting,
    },
    Label {
        variable: String,
        form: TermForm,
        formatting: Formatting,
    },
    Names(NamesElement),
    Date(DateElement),
    Group {
        elements: Vec<Element>,
        delimiter: Option<String>,
        formatting: Formatting,
    },
    Choose(Vec<Branch>),
}

/// A `<layout>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    pub elements: Vec<Element>,
    pub delimiter: Option<String>,
    pub formatting: Formatting,
}

/// What a sort key is computed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortSource {
    Variable(String),
    Macro(String),
}

/// A `<key>` of a `<sort>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub source: SortSource,
    pub descending: bool,
}

/// The `<bibliography>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibliographyDef {
    /// `second-field-align` is set: the first layout field is rendered in its own column.
    pub second_field_align: bool,
    pub sort: Vec<SortKey>,
    pub layout: Layout,
}

/// A parsed CSL style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pub id: Option<String>,
    pub title: Option<String>,
    pub default_locale: Option<String>,
    pub macros: HashMap<String, Vec<Element>>,
    /// Terms from `<locale>` elements inside the style; these win over locale files.
    pub terms: Vec<Term>,
    pub bibliography: Option<BibliographyDef>,
}

/// Parse a CSL style template. `name` is only used in error messages.
pub fn parse_style(name: &str, template: &str) -> Result<Style> {
    let fail = |message: String| Error::StyleParse {
        style: name.to_string(),
        message,
    };

    let root = xml::parse(template).map_err(fail)?;
    if root.name != "style" {
        return Err(fail(format!(
            "Expected <style> root element, found <{}>",
            root.name
        )));
    }

    let mut style = Style {
        default_locale: root.attr("default-locale").map(str::to_string),
        ..Default::default()
    };

    for child in root.elements() {
        match child.name.as_str() {
            "info" => {
                style.id = child.child("id").map(XmlElement::text);
                style.title = child.child("title").map(XmlElement::text);
            }
            "locale" => {
                for terms in child.elements().filter(|el| el.name == "terms") {
                    for term_el in terms.elements().filter(|el| el.name == "term") {
                        style.terms.push(parse_term(term_el).map_err(fail)?);
                    }
                }
            }
            "macro" => {
                let macro_name = child
                    .attr("name")
                    .ok_or_else(|| fail("<macro> missing 'name' attribute".to_string()))?;
                let elements = parse_elements(child, &NameOptions::default()).map_err(fail)?;
                style.macros.insert(macro_name.to_string(), elements);
            }
            "bibliography" => {
                style.bibliography = Some(parse_bibliography(child).map_err(fail)?);
            }
            _ => {}
        }
    }

    Ok(style)
}

fn parse_bibliography(el: &XmlElement) -> std::result::Result<BibliographyDef, String> {
    // Name options on <bibliography> are inherited by every <name> below it.
    let inherited = NameOptions::from_element(el, &NameOptions::default());

    let mut sort = Vec::new();
    if let Some(sort_el) = el.child("sort") {
        for key in sort_el.elements().filter(|k| k.name == "key") {
            let source = match (key.attr("variable"), key.attr("macro")) {
                (Some(variable), _) => SortSource::Variable(variable.to_string()),
                (None, Some(macro_name)) => SortSource::Macro(macro_name.to_string()),
                (None, None) => return Err("<key> needs a variable or macro".to_string()),
            };
            sort.push(SortKey {
                source,
                descending: key.attr("sort") == Some("descending"),
            });
        }
    }

    let layout_el = el
        .child("layout")
        .ok_or_else(|| "<bibliography> missing <layout>".to_string())?;

    Ok(BibliographyDef {
        second_field_align: el.attr("second-field-align").is_some(),
        sort,
        layout: Layout {
            elements: parse_elements(layout_el, &inherited)?,
            delimiter: layout_el.attr("delimiter").map(str::to_string),
            formatting: Formatting::from_element(layout_el),
        },
    })
}

fn parse_elements(
    parent: &XmlElement,
    names: &NameOptions,
) -> std::result::Result<Vec<Element>, String> {
    let mut elements = Vec::new();
    for child in parent.elements() {
        if let Some(element) = parse_element(child, names)? {
            elements.push(element);
        }
    }
    Ok(elements)
}

fn parse_element(
    el: &XmlElement,
    names: &NameOptions,
) -> std::result::Result<Option<Element>, String> {
    let formatting = Formatting::from_element(el);
    let delimiter = el.attr("delimiter").map(str::to_string);

    let element = match el.name.as_str() {
        "text" => {
            let form = parse_term_form(el);
            let source = if let Some(name) = el.attr("variable") {
                TextSource::Variable {
                    name: name.to_string(),
                    form,
                }
            } else if let Some(name) = el.attr("macro") {
                TextSource::Macro(name.to_string())
            } else if let Some(name) = el.attr("term") {
                TextSource::Term {
                    name: name.to_string(),
                    form,
                    plural: el.attr("plural") == Some("true"),
                }
            } else if let Some(value) = el.attr("value") {
                TextSource::Value(value.to_string())
            } else {
                return Err("<text> needs a variable, macro, term or value".to_string());
            };
            Element::Text { source, formatting }
        }
        "number" => Element::Number {
            variable: required(el, "variable")?,
            formatting,
        },
        "label" => Element::Label {
            variable: required(el, "variable")?,
            form: parse_term_form(el),
            formatting,
        },
        "names" => {
            let name = el
                .child("name")
                .map(|name_el| NameOptions::from_element(name_el, names))
                .unwrap_or_else(|| names.clone());
            let substitute = match el.child("substitute") {
                Some(sub) => parse_elements(sub, &name)?,
                None => Vec::new(),
            };
            Element::Names(NamesElement {
                variables: required(el, "variable")?
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
                name,
                delimiter,
                substitute,
                formatting,
            })
        }
        "date" => {
            let mut parts = Vec::new();
            for part in el.elements().filter(|p| p.name == "date-part") {
                parts.push(parse_date_part(part)?);
            }
            if parts.is_empty() {
                parts.push(DatePart {
                    name: DatePartName::Year,
                    form: DatePartForm::Numeric,
                    formatting: Formatting::default(),
                });
            }
            Element::Date(DateElement {
                variable: required(el, "variable")?,
                parts,
                delimiter,
                formatting,
            })
        }
        "group" => Element::Group {
            elements: parse_elements(el, names)?,
            delimiter,
            formatting,
        },
        "choose" => {
            let mut branches = Vec::new();
            for branch in el.elements() {
                match branch.name.as_str() {
                    "if" | "else-if" => branches.push(Branch {
                        conditions: parse_conditions(branch),
                        match_type: match branch.attr("match") {
                            Some("any") => MatchType::Any,
                            Some("none") => MatchType::None,
                            _ => MatchType::All,
                        },
                        elements: parse_elements(branch, names)?,
                    }),
                    "else" => branches.push(Branch {
                        conditions: Vec::new(),
                        match_type: MatchType::All,
                        elements: parse_elements(branch, names)?,
                    }),
                    other => return Err(format!("Unexpected <{}> in <choose>", other)),
                }
            }
            Element::Choose(branches)
        }
        // <et-al>, <label> inside <names>, and anything unknown
        _ => return Ok(None),
    };

    Ok(Some(element))
}

fn parse_conditions(el: &XmlElement) -> Vec<Condition> {
    let mut conditions = Vec::new();
    let mut push = |attr: &str, make: fn(String) -> Condition| {
        if let Some(values) = el.attr(attr) {
            conditions.extend(values.split_whitespace().map(|v| make(v.to_string())));
        }
    };
    push("type", Condition::Type);
    push("variable", Condition::Variable);
    push("is-numeric", Condition::IsNumeric);
    conditions
}

fn parse_date_part(el: &XmlElement) -> std::result::Result<DatePart, String> {
    let name = match el.attr("name") {
        Some("year") => DatePartName::Year,
        Some("month") => DatePartName::Month,
        Some("day") => DatePartName::Day,
        Some(other) => return Err(format!("Unknown date-part name '{}'", other)),
        None => return Err("<date-part> missing 'name' attribute".to_string()),
    };
    let form = match (name, el.attr("form")) {
        (_, Some("numeric-leading-zeros")) => DatePartForm::NumericLeadingZeros,
        (_, Some("short")) => DatePartForm::Short,
        (DatePartName::Month, Some("long") | None) => DatePartForm::Long,
        _ => DatePartForm::Numeric,
    };
    Ok(DatePart {
        name,
        form,
        formatting: Formatting::from_element(el),
    })
}

fn required(el: &XmlElement, attr: &str) -> std::result::Result<String, String> {
    el.attr(attr)
        .map(str::to_string)
        .ok_or_else(|| format!("<{}> missing '{}' attribute", el.name, attr))
}
