//! Output building for rendered bibliography entries.
//!
//! Evaluation produces an `Output` tree of plain-text literals wrapped in
//! formatting nodes. `render()` turns the tree into HTML, escaping literals
//! and applying formatting in the same order citeproc-js does: text case,
//! quotes, font style, font weight, vertical align, then affixes.

use crate::style::{FontStyle, FontWeight, Formatting, TextCase, VerticalAlign};

/// Inline tags that may appear inside CSL-JSON field values. `sc` renders as a
/// small-caps span.
const RICH_TEXT_TAGS: &[&str] = &["i", "b", "sup", "sub", "sc"];

/// Quote marks from the active locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteConfig {
    pub open: String,
    pub close: String,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        QuoteConfig {
            open: "\u{201C}".to_string(),
            close: "\u{201D}".to_string(),
        }
    }
}

/// Intermediate output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Plain text (may carry CSL rich-text tags). Escaped on render.
    Literal(String),
    /// Children with formatting applied around them.
    Formatted {
        formatting: Formatting,
        children: Vec<Output>,
    },
    /// Empty output.
    Null,
}

impl Output {
    /// Create a literal text node.
    pub fn literal(s: impl Into<String>) -> Self {
        let s = s.into();
        if s.is_empty() {
            Output::Null
        } else {
            Output::Literal(s)
        }
    }

    /// Create a formatted node with children.
    pub fn formatted(formatting: Formatting, children: Vec<Output>) -> Self {
        let children: Vec<_> = children.into_iter().filter(|c| !c.is_null()).collect();
        if children.is_empty() {
            Output::Null
        } else {
            Output::Formatted {
                formatting,
                children,
            }
        }
    }

    /// Check if this output is null/empty.
    pub fn is_null(&self) -> bool {
        match self {
            Output::Null => true,
            Output::Literal(s) => s.is_empty(),
            Output::Formatted { children, .. } => children.iter().all(Output::is_null),
        }
    }

    /// Render to HTML.
    pub fn render(&self, quotes: &QuoteConfig) -> String {
        match self {
            Output::Null => String::new(),
            Output::Literal(s) => escape_rich_text(s),
            Output::Formatted {
                formatting,
                children,
            } => {
                let inner: String = children.iter().map(|c| c.render(quotes)).collect();
                render_with_formatting(&inner, formatting, quotes)
            }
        }
    }
}

/// Join outputs with a delimiter, skipping empty ones.
pub fn join_outputs(outputs: Vec<Output>, delimiter: &str) -> Output {
    let mut children = Vec::new();
    for output in outputs.into_iter().filter(|o| !o.is_null()) {
        if !children.is_empty() && !delimiter.is_empty() {
            children.push(Output::Literal(delimiter.to_string()));
        }
        children.push(output);
    }
    match children.len() {
        0 => Output::Null,
        1 => children.pop().unwrap_or(Output::Null),
        _ => Output::formatted(Formatting::default(), children),
    }
}

fn render_with_formatting(html: &str, formatting: &Formatting, quotes: &QuoteConfig) -> String {
    if html.is_empty() {
        return String::new();
    }

    let mut body = match formatting.text_case {
        Some(case) => map_text(html, |text| apply_text_case(text, case)),
        None => html.to_string(),
    };
    if formatting.quotes {
        body = format!(
            "{}{}{}",
            escape_html(&quotes.open),
            body,
            escape_html(&quotes.close)
        );
    }
    if formatting.font_style == Some(FontStyle::Italic) {
        body = format!("<i>{}</i>", body);
    }
    if formatting.font_weight == Some(FontWeight::Bold) {
        body = format!("<b>{}</b>", body);
    }
    match formatting.vertical_align {
        Some(VerticalAlign::Sup) => body = format!("<sup>{}</sup>", body),
        Some(VerticalAlign::Sub) => body = format!("<sub>{}</sub>", body),
        _ => {}
    }

    let mut result = String::new();
    if let Some(ref prefix) = formatting.prefix {
        result.push_str(&escape_html(prefix));
    }
    result.push_str(&body);
    if let Some(ref suffix) = formatting.suffix {
        // "Smith J." followed by suffix "." renders one period, not two
        let suffix = match (last_text_char(&result), suffix.chars().next()) {
            (Some('.'), Some('.')) => &suffix[1..],
            _ => suffix.as_str(),
        };
        result.push_str(&escape_html(suffix));
    }
    result
}

fn apply_text_case(text: &str, case: TextCase) -> String {
    match case {
        TextCase::Lowercase => text.to_lowercase(),
        TextCase::Uppercase => text.to_uppercase(),
        TextCase::CapitalizeFirst => capitalize_first(text),
        TextCase::CapitalizeAll => text
            .split(' ')
            .map(capitalize_first)
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Apply `f` to text runs of an HTML string, leaving tags and entities alone.
fn map_text(html: &str, f: impl Fn(&str) -> String) -> String {
    let mut result = String::with_capacity(html.len());
    let mut run = String::new();
    let mut chars = html.chars().peekable();
    while let Some(c) = chars.next() {
        let terminator = match c {
            '<' => '>',
            '&' => ';',
            _ => {
                run.push(c);
                continue;
            }
        };
        result.push_str(&f(&run));
        run.clear();
        result.push(c);
        for next in chars.by_ref() {
            result.push(next);
            if next == terminator {
                break;
            }
        }
    }
    result.push_str(&f(&run));
    result
}

/// The last character of an HTML string that is not part of a tag.
fn last_text_char(html: &str) -> Option<char> {
    let mut in_tag = false;
    for c in html.chars().rev() {
        match c {
            '>' => in_tag = true,
            '<' => in_tag = false,
            _ if !in_tag => return Some(c),
            _ => {}
        }
    }
    None
}

/// Escape `&`, `<`, `>` and `"` for HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape a field value, keeping the inline tags CSL-JSON allows.
///
/// The result is always balanced: a closing tag with no open counterpart is
/// escaped, and tags still open at the end of the value are closed.
fn escape_rich_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut open: Vec<&str> = Vec::new();
    let mut rest = s;
    while let Some(start) = rest.find('<') {
        out.push_str(&escape_html(&rest[..start]));
        let candidate = &rest[start..];
        let Some((name, closing, len)) = rich_tag(candidate) else {
            out.push_str("&lt;");
            rest = &candidate[1..];
            continue;
        };
        if !closing {
            open.push(name);
            out.push_str(&open_tag(name));
        } else if let Some(depth) = open.iter().rposition(|tag| *tag == name) {
            for tag in open.drain(depth..).rev() {
                out.push_str(close_tag(tag));
            }
        } else {
            out.push_str(&escape_html(&candidate[..len]));
        }
        rest = &candidate[len..];
    }
    out.push_str(&escape_html(rest));
    for tag in open.into_iter().rev() {
        out.push_str(close_tag(tag));
    }
    out
}

/// Parse a rich-text tag at the start of `s`: name, whether it closes, byte length.
fn rich_tag(s: &str) -> Option<(&'static str, bool, usize)> {
    let end = s.find('>')?;
    let inner = &s[1..end];
    let (name, closing) = match inner.strip_prefix('/') {
        Some(name) => (name, true),
        None => (inner, false),
    };
    let name = RICH_TEXT_TAGS.iter().copied().find(|tag| *tag == name)?;
    Some((name, closing, end + 1))
}

fn open_tag(name: &str) -> String {
    match name {
        "sc" => "<span style=\"font-variant:small-caps;\">".to_string(),
        _ => format!("<{}>", name),
    }
}

fn close_tag(name: &str) -> &'static str {
    match name {
        "i" => "</i>",
        "b" => "</b>",
        "sup" => "</sup>",
        "sub" => "</sub>",
        _ => "</span>",
    }
}

/// Remove every tag from an HTML string. Used for sort keys.
pub fn strip_html_tags(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt() -> Formatting {
        Formatting::default()
    }

    #[test]
    fn test_literal_empty_is_null() {
        assert!(Output::literal("").is_null());
        assert!(!Output::literal("x").is_null());
    }

    #[test]
    fn test_formatted_all_null_is_null() {
        let out = Output::formatted(fmt(), vec![Output::Null, Output::literal("")]);
        assert_eq!(out, Output::Null);
    }

    #[test]
    fn test_render_escapes_literals() {
        let out = Output::literal("Fish & <Chips>");
        assert_eq!(out.render(&QuoteConfig::default()), "Fish &amp; &lt;Chips&gt;");
    }

    #[test]
    fn test_render_keeps_rich_text_tags() {
        let out = Output::literal("On <i>E. coli</i> & <script>");
        assert_eq!(
            out.render(&QuoteConfig::default()),
            "On <i>E. coli</i> &amp; &lt;script&gt;"
        );
    }

    #[test]
    fn test_render_balances_rich_text() {
        let quotes = QuoteConfig::default();
        assert_eq!(
            Output::literal("On <i>E. coli").render(&quotes),
            "On <i>E. coli</i>"
        );
        assert_eq!(
            Output::literal("a</b> <i><b>c</i>").render(&quotes),
            "a&lt;/b&gt; <i><b>c</b></i>"
        );
    }

    #[test]
    fn test_small_caps_become_span() {
        let out = Output::literal("The <sc>NASA</sc> story");
        assert_eq!(
            out.render(&QuoteConfig::default()),
            "The <span style=\"font-variant:small-caps;\">NASA</span> story"
        );
    }

    #[test]
    fn test_render_formatting_order() {
        let formatting = Formatting {
            font_style: Some(FontStyle::Italic),
            font_weight: Some(FontWeight::Bold),
            prefix: Some("(".to_string()),
            suffix: Some(")".to_string()),
            quotes: true,
            ..Default::default()
        };
        let out = Output::formatted(formatting, vec![Output::literal("T")]);
        assert_eq!(
            out.render(&QuoteConfig::default()),
            "(<b><i>\u{201C}T\u{201D}</i></b>)"
        );
    }

    #[test]
    fn test_suffix_period_collapses() {
        let formatting = Formatting {
            suffix: Some(".".to_string()),
            ..Default::default()
        };
        let inner = Output::formatted(
            Formatting {
                font_style: Some(FontStyle::Italic),
                ..Default::default()
            },
            vec![Output::literal("Smith J.")],
        );
        let out = Output::formatted(formatting, vec![inner]);
        assert_eq!(out.render(&QuoteConfig::default()), "<i>Smith J.</i>");
    }

    #[test]
    fn test_text_case_skips_markup() {
        let formatting = Formatting {
            text_case: Some(TextCase::Uppercase),
            ..Default::default()
        };
        let out = Output::formatted(formatting, vec![Output::literal("a & <i>b</i>")]);
        assert_eq!(out.render(&QuoteConfig::default()), "A &amp; <i>B</i>");
    }

    #[test]
    fn test_join_outputs_skips_null() {
        let joined = join_outputs(
            vec![Output::literal("a"), Output::Null, Output::literal("b")],
            ", ",
        );
        assert_eq!(joined.render(&QuoteConfig::default()), "a, b");
        assert_eq!(join_outputs(vec![Output::Null], ", "), Output::Null);
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<div class=\"x\">a <i>b</i></div>"), "a b");
    }
}
