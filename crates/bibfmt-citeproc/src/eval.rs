//! Bibliography entry evaluation.
//!
//! Walks a style's elements against one item and builds an `Output` tree.
//! Variable calls are counted so that groups can be suppressed when every
//! variable they call is empty. Variables that fill in for empty names
//! through `<substitute>` are suppressed for the rest of the entry.

use std::collections::HashSet;

use crate::locale::{TermForm, Terms};
use crate::output::{Output, join_outputs};
use crate::reference::{
    DateValue, ItemData, Name, get_date, get_names, get_short_variable, get_variable,
    has_variable, item_type,
};
use crate::style::{
    Branch, Condition, DateElement, DatePartForm, DatePartName, DelimiterPrecedesLast, Element,
    Layout, MatchType, NameAnd, NameAsSortOrder, NameForm, NameOptions, NamesElement,
    Style, TextSource,
};

/// Macros calling themselves stop expanding past this depth.
const MAX_MACRO_DEPTH: usize = 32;

/// Evaluation context for processing a single item.
pub(crate) struct EvalContext<'a> {
    style: &'a Style,
    terms: &'a Terms,
    item: &'a ItemData,
    /// Rank of the item in bibliography order, starting at 1.
    citation_number: usize,
    vars_called: usize,
    vars_rendered: usize,
    /// Variables rendered so far, in order.
    rendered: Vec<String>,
    /// Variables consumed by a `<substitute>`; they render empty from then on.
    suppressed: HashSet<String>,
    macro_depth: usize,
}

impl<'a> EvalContext<'a> {
    pub(crate) fn new(
        style: &'a Style,
        terms: &'a Terms,
        item: &'a ItemData,
        citation_number: usize,
    ) -> Self {
        Self {
            style,
            terms,
            item,
            citation_number,
            vars_called: 0,
            vars_rendered: 0,
            rendered: Vec::new(),
            suppressed: HashSet::new(),
            macro_depth: 0,
        }
    }

    fn note_variable(&mut self, rendered: bool) {
        self.vars_called += 1;
        if rendered {
            self.vars_rendered += 1;
        }
    }

    fn note_rendered(&mut self, name: &str) {
        self.rendered.push(name.to_string());
    }

    fn is_suppressed(&self, name: &str) -> bool {
        self.suppressed.contains(name)
    }

    fn term(&self, name: &str, form: TermForm, plural: bool) -> Option<String> {
        self.terms.get(name, form, plural)
    }
}

/// Evaluate the elements of a layout, joined by its delimiter.
///
/// Layout-level formatting is left to the caller.
pub(crate) fn evaluate_layout(ctx: &mut EvalContext, layout: &Layout) -> Output {
    evaluate_elements(ctx, &layout.elements, layout.delimiter.as_deref().unwrap_or(""))
}

/// Evaluate a macro by name. Unknown macros render nothing.
pub(crate) fn evaluate_macro(ctx: &mut EvalContext, name: &str) -> Output {
    let style = ctx.style;
    let Some(elements) = style.macros.get(name) else {
        return Output::Null;
    };
    if ctx.macro_depth >= MAX_MACRO_DEPTH {
        return Output::Null;
    }
    ctx.macro_depth += 1;
    let output = evaluate_elements(ctx, elements, "");
    ctx.macro_depth -= 1;
    output
}

fn evaluate_elements(ctx: &mut EvalContext, elements: &[Element], delimiter: &str) -> Output {
    let outputs = elements.iter().map(|el| evaluate_element(ctx, el)).collect();
    join_outputs(outputs, delimiter)
}

/// Evaluate a single element, formatting included.
pub(crate) fn evaluate_element(ctx: &mut EvalContext, element: &Element) -> Output {
    match element {
        Element::Text { source, formatting } => {
            let output = evaluate_text(ctx, source);
            Output::formatted(formatting.clone(), vec![output])
        }
        Element::Number {
            variable,
            formatting,
        } => {
            let value = variable_value(ctx, variable, TermForm::Long);
            ctx.note_variable(value.is_some());
            if value.is_some() {
                ctx.note_rendered(variable);
            }
            Output::formatted(formatting.clone(), vec![Output::literal(value.unwrap_or_default())])
        }
        Element::Label {
            variable,
            form,
            formatting,
        } => {
            let value = get_variable(ctx.item, variable).filter(|_| !ctx.is_suppressed(variable));
            let output = match value {
                Some(value) => {
                    let plural = value.contains(['-', ',', '&', '\u{2013}']);
                    Output::literal(ctx.term(variable, *form, plural).unwrap_or_default())
                }
                None => Output::Null,
            };
            Output::formatted(formatting.clone(), vec![output])
        }
        Element::Names(names) => evaluate_names(ctx, names),
        Element::Date(date) => evaluate_date(ctx, date),
        Element::Group {
            elements,
            delimiter,
            formatting,
        } => {
            let (called, rendered) = (ctx.vars_called, ctx.vars_rendered);
            let output = evaluate_elements(ctx, elements, delimiter.as_deref().unwrap_or(""));
            if ctx.vars_called > called && ctx.vars_rendered == rendered {
                Output::Null
            } else {
                Output::formatted(formatting.clone(), vec![output])
            }
        }
        Element::Choose(branches) => evaluate_choose(ctx, branches),
    }
}

fn evaluate_text(ctx: &mut EvalContext, source: &TextSource) -> Output {
    match source {
        TextSource::Variable { name, form } => {
            let value = variable_value(ctx, name, *form);
            ctx.note_variable(value.is_some());
            if value.is_some() {
                ctx.note_rendered(name);
            }
            Output::literal(value.unwrap_or_default())
        }
        TextSource::Macro(name) => evaluate_macro(ctx, name),
        TextSource::Term { name, form, plural } => {
            Output::literal(ctx.term(name, *form, *plural).unwrap_or_default())
        }
        TextSource::Value(value) => Output::literal(value.clone()),
    }
}

fn variable_value(ctx: &EvalContext, name: &str, form: TermForm) -> Option<String> {
    if ctx.is_suppressed(name) {
        return None;
    }
    match name {
        "citation-number" => Some(ctx.citation_number.to_string()),
        "page" => get_variable(ctx.item, name).map(|page| format_page_range(&page)),
        _ if form == TermForm::Short => get_short_variable(ctx.item, name),
        _ => get_variable(ctx.item, name),
    }
}

/// "12-19" and "12--19" become "12–19".
fn format_page_range(page: &str) -> String {
    page.replace("--", "\u{2013}").replace('-', "\u{2013}")
}

fn evaluate_names(ctx: &mut EvalContext, names_el: &NamesElement) -> Output {
    let mut rendered = Vec::new();
    for variable in &names_el.variables {
        if ctx.is_suppressed(variable) {
            continue;
        }
        let names = get_names(ctx.item, variable);
        if !names.is_empty() {
            rendered.push(Output::literal(format_names(ctx, &names, &names_el.name)));
            ctx.note_rendered(variable);
        }
    }
    ctx.note_variable(!rendered.is_empty());

    let output = if rendered.is_empty() {
        evaluate_substitute(ctx, &names_el.substitute)
    } else {
        join_outputs(rendered, names_el.delimiter.as_deref().unwrap_or(", "))
    };

    Output::formatted(names_el.formatting.clone(), vec![output])
}

/// The first substitute that renders wins; the variables it used are then
/// suppressed.
fn evaluate_substitute(ctx: &mut EvalContext, substitute: &[Element]) -> Output {
    for element in substitute {
        let mark = ctx.rendered.len();
        let output = evaluate_element(ctx, element);
        if !output.is_null() {
            let used: Vec<String> = ctx.rendered.drain(mark..).collect();
            ctx.suppressed.extend(used);
            return output;
        }
    }
    Output::Null
}

/// Format a list of names according to CSL rules.
fn format_names(ctx: &EvalContext, names: &[Name], opts: &NameOptions) -> String {
    let use_et_al = opts.et_al_min.is_some_and(|min| names.len() >= min);
    let shown = if use_et_al {
        opts.et_al_use_first.unwrap_or(1).clamp(1, names.len())
    } else {
        names.len()
    };

    let formatted: Vec<String> = names
        .iter()
        .take(shown)
        .enumerate()
        .map(|(i, name)| {
            let inverted = match opts.name_as_sort_order {
                Some(NameAsSortOrder::All) => true,
                Some(NameAsSortOrder::First) => i == 0,
                None => false,
            };
            format_single_name(name, opts, inverted)
        })
        .collect();

    let and_word = opts.and.map(|and| match and {
        NameAnd::Text => ctx
            .term("and", TermForm::Long, false)
            .unwrap_or_else(|| "and".to_string()),
        NameAnd::Symbol => "&".to_string(),
    });

    let mut result = match formatted.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => {
            let head = init.join(&opts.delimiter);
            match and_word.as_ref().filter(|_| !use_et_al) {
                Some(and) => {
                    let precedes = match opts.delimiter_precedes_last {
                        DelimiterPrecedesLast::Always => true,
                        DelimiterPrecedesLast::Never => false,
                        DelimiterPrecedesLast::Contextual => formatted.len() > 2,
                    };
                    if precedes {
                        format!("{}{}{} {}", head, opts.delimiter, and, last)
                    } else {
                        format!("{} {} {}", head, and, last)
                    }
                }
                None => format!("{}{}{}", head, opts.delimiter, last),
            }
        }
    };

    if use_et_al && shown < names.len() {
        let et_al = ctx
            .term("et-al", TermForm::Long, false)
            .unwrap_or_else(|| "et al.".to_string());
        let separator = if shown > 1 { opts.delimiter.as_str() } else { " " };
        result = format!("{}{}{}", result, separator, et_al);
    }

    result
}

/// Format a single name.
fn format_single_name(name: &Name, opts: &NameOptions, inverted: bool) -> String {
    if let Some(ref literal) = name.literal {
        return literal.clone();
    }

    let family: String = [name.non_dropping_particle.as_deref(), name.family.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    if opts.form == NameForm::Short {
        return family;
    }

    let given = name.given.as_deref().map(|given| match opts.initialize_with {
        Some(ref init) => initialize_name(given, init),
        None => given.to_string(),
    });
    let given: String = [given.as_deref(), name.dropping_particle.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");

    let mut result = match (inverted, given.is_empty(), family.is_empty()) {
        (_, true, _) => family,
        (_, false, true) => given,
        (true, false, false) => format!("{}{}{}", family, opts.sort_separator, given),
        (false, false, false) => format!("{} {}", given, family),
    };
    if let Some(ref suffix) = name.suffix {
        let separator = if inverted { ", " } else { " " };
        result = format!("{}{}{}", result, separator, suffix);
    }
    result
}

/// Initialize a given name ("John William" -> "J. W.", "Jean-Paul" -> "J.-P.").
pub(crate) fn initialize_name(given: &str, initialize_with: &str) -> String {
    let initial_suffix = initialize_with.trim_end();
    let word_separator = if initialize_with.ends_with(' ') { " " } else { "" };
    given
        .split_whitespace()
        .map(|word| {
            word.split('-')
                .filter_map(|part| part.chars().next())
                .map(|c| format!("{}{}", c.to_uppercase(), initial_suffix))
                .collect::<Vec<_>>()
                .join("-")
        })
        .collect::<Vec<_>>()
        .join(word_separator)
}

fn evaluate_date(ctx: &mut EvalContext, date_el: &DateElement) -> Output {
    let value = get_date(ctx.item, &date_el.variable).filter(|_| !ctx.is_suppressed(&date_el.variable));
    ctx.note_variable(value.is_some());
    if value.is_some() {
        ctx.note_rendered(&date_el.variable);
    }

    let output = match value {
        None => Output::Null,
        Some(DateValue::Literal(literal)) => Output::literal(literal),
        Some(DateValue::Parts(parts)) => {
            let rendered = date_el
                .parts
                .iter()
                .map(|part| {
                    let text = match part.name {
                        DatePartName::Year => Some(if parts.year < 0 {
                            format!("{}BC", -parts.year)
                        } else {
                            parts.year.to_string()
                        }),
                        DatePartName::Month => parts.month.map(|m| match part.form {
                            DatePartForm::Long => month_term(ctx, m, TermForm::Long),
                            DatePartForm::Short => month_term(ctx, m, TermForm::Short),
                            DatePartForm::NumericLeadingZeros => format!("{:02}", m),
                            DatePartForm::Numeric => m.to_string(),
                        }),
                        DatePartName::Day => parts.day.map(|d| match part.form {
                            DatePartForm::NumericLeadingZeros => format!("{:02}", d),
                            _ => d.to_string(),
                        }),
                    };
                    Output::formatted(
                        part.formatting.clone(),
                        vec![Output::literal(text.unwrap_or_default())],
                    )
                })
                .collect();
            join_outputs(rendered, date_el.delimiter.as_deref().unwrap_or(""))
        }
    };

    Output::formatted(date_el.formatting.clone(), vec![output])
}

fn month_term(ctx: &EvalContext, month: u32, form: TermForm) -> String {
    ctx.term(&format!("month-{:02}", month), form, false)
        .unwrap_or_else(|| month.to_string())
}

fn evaluate_choose(ctx: &mut EvalContext, branches: &[Branch]) -> Output {
    for branch in branches {
        let matches = branch.conditions.is_empty()
            || match branch.match_type {
                MatchType::All => branch.conditions.iter().all(|c| evaluate_condition(ctx, c)),
                MatchType::Any => branch.conditions.iter().any(|c| evaluate_condition(ctx, c)),
                MatchType::None => !branch.conditions.iter().any(|c| evaluate_condition(ctx, c)),
            };
        if matches {
            return evaluate_elements(ctx, &branch.elements, "");
        }
    }
    Output::Null
}

fn evaluate_condition(ctx: &EvalContext, condition: &Condition) -> bool {
    match condition {
        Condition::Type(t) => item_type(ctx.item) == t,
        Condition::Variable(v) => {
            v == "citation-number" || (!ctx.is_suppressed(v) && has_variable(ctx.item, v))
        }
        Condition::IsNumeric(v) => get_variable(ctx.item, v)
            .is_some_and(|s| s.chars().all(|c| c.is_ascii_digit() || c == '-')),
    }
}
