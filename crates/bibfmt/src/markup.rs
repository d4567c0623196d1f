//! Markup helpers: tag stripping and fragment rendering.

use bibfmt_citeproc::output::escape_html;
use bibfmt_citeproc::xml::{self, XmlNode};
use quick_xml::escape::resolve_predefined_entity;

/// A parsed markup node.
pub type Node = XmlNode;

/// Turns an HTML fragment into nodes.
pub trait MarkupRenderer {
    fn render(&self, html: &str) -> Result<Vec<Node>, String>;
}

/// Renders well-formed fragments with the XML reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentRenderer;

impl MarkupRenderer for FragmentRenderer {
    fn render(&self, html: &str) -> Result<Vec<Node>, String> {
        xml::parse_fragment(html)
    }
}

/// Remove markup tags, keeping text (and entities) as they are.
///
/// A `<` only opens a tag when followed by a letter, `/` or `!`, so
/// "a < b" survives. An unterminated tag runs to the end of the input.
pub fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut chars = html.chars().peekable();
    while let Some(c) = chars.next() {
        let opens_tag = c == '<'
            && chars
                .peek()
                .is_some_and(|next| next.is_ascii_alphabetic() || matches!(next, '/' | '!'));
        if !opens_tag {
            out.push(c);
            continue;
        }
        let mut quote = None;
        for next in chars.by_ref() {
            match (quote, next) {
                (None, '"' | '\'') => quote = Some(next),
                (Some(q), _) if q == next => quote = None,
                (None, '>') => break,
                _ => {}
            }
        }
    }
    out
}

/// Decode character references such as `&amp;`, `&#38;` and `&nbsp;`.
/// Text with an unknown or unterminated reference comes back unchanged.
pub fn decode_entities(text: &str) -> String {
    quick_xml::escape::unescape_with(text, |entity| {
        resolve_predefined_entity(entity).or(match entity {
            "nbsp" => Some("\u{a0}"),
            _ => None,
        })
    })
    .map_or_else(|_| text.to_string(), |decoded| decoded.into_owned())
}

/// Serialize nodes back to markup.
pub fn to_html(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        XmlNode::Text(text) => out.push_str(&escape_html(text)),
        XmlNode::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (name, value) in &el.attributes {
                out.push_str(&format!(" {}=\"{}\"", name, escape_html(value)));
            }
            if el.children.is_empty() && is_void(&el.name) {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in &el.children {
                write_node(child, out);
            }
            out.push_str(&format!("</{}>", el.name));
        }
    }
}

fn is_void(name: &str) -> bool {
    matches!(name, "br" | "hr" | "img" | "input" | "meta" | "link" | "wbr")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<div class=\"csl-entry\">Smith, J. <i>Title</i></div><br />"),
            "Smith, J. Title"
        );
        assert_eq!(strip_tags("a < b &amp; c"), "a < b &amp; c");
        assert_eq!(strip_tags("<span title=\"x > y\">z</span>"), "z");
        assert_eq!(strip_tags("<!-- note -->text"), "text");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Fish &amp; Chips"), "Fish & Chips");
        assert_eq!(decode_entities("&lt;b&gt; &#38; a&nbsp;b"), "<b> & a\u{a0}b");
        assert_eq!(decode_entities("AT&T"), "AT&T");
    }

    #[test]
    fn test_fragment_render_and_serialize() {
        let html = "<div class=\"csl-bib-body\">\n  <div class=\"csl-entry\">A &amp; B</div>\n</div><br />";
        let nodes = FragmentRenderer.render(html).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(to_html(&nodes), html);
    }

    #[test]
    fn test_fragment_render_rejects_broken_markup() {
        assert!(FragmentRenderer.render("<div><i>open</div>").is_err());
    }
}
