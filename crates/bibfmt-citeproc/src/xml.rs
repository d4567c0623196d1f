//! A small owned XML tree built on quick-xml.
//!
//! Styles and locales are read with [`parse`], which trims whitespace and
//! requires a single root. Rendered markup fragments are read with
//! [`parse_fragment`], which keeps every text run and allows any number of
//! top-level nodes.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// An element with its attributes (in document order) and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// A node of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    /// Get an attribute value by its full (possibly prefixed) name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(el) => Some(el),
            XmlNode::Text(_) => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.name == name)
    }

    /// Concatenated text of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

impl XmlNode {
    /// Concatenated text of this node and its descendants.
    pub fn text(&self) -> String {
        match self {
            XmlNode::Text(text) => text.clone(),
            XmlNode::Element(el) => el.text(),
        }
    }
}

fn collect_text(children: &[XmlNode], out: &mut String) {
    for child in children {
        match child {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// Parse a document with exactly one root element.
///
/// Whitespace around text runs is trimmed, and whitespace-only runs are
/// dropped, which is what the style and locale readers want.
pub fn parse(content: &str) -> Result<XmlElement, String> {
    let mut roots = read_nodes(content, true)?.into_iter().filter_map(|node| match node {
        XmlNode::Element(el) => Some(el),
        XmlNode::Text(_) => None,
    });
    let root = roots
        .next()
        .ok_or_else(|| "Empty XML document: no root element found".to_string())?;
    if roots.next().is_some() {
        return Err("Multiple root elements".to_string());
    }
    Ok(root)
}

/// Parse a markup fragment into its top-level nodes, keeping all text.
pub fn parse_fragment(content: &str) -> Result<Vec<XmlNode>, String> {
    read_nodes(content, false)
}

fn read_nodes(content: &str, trim: bool) -> Result<Vec<XmlNode>, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text_start = trim;
    reader.config_mut().trim_text_end = trim;

    let mut top: Vec<XmlNode> = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(start_element(&e)?),
            Ok(Event::Empty(e)) => {
                let element = start_element(&e)?;
                attach(&mut stack, &mut top, XmlNode::Element(element));
            }
            Ok(Event::End(e)) => {
                let end_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let element = stack
                    .pop()
                    .ok_or_else(|| format!("Unexpected closing tag </{}>", end_name))?;
                attach(&mut stack, &mut top, XmlNode::Element(element));
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| format!("Invalid text content: {}", err))?;
                if !text.is_empty() && !(trim && text.trim().is_empty()) {
                    attach(&mut stack, &mut top, XmlNode::Text(text.into_owned()));
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                attach(&mut stack, &mut top, XmlNode::Text(text));
            }
            // Comments, processing instructions, declarations and doctypes
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!(
                    "XML syntax error: {} at byte {}",
                    e,
                    reader.error_position()
                ));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!(
            "Unexpected end of input, expected closing tag </{}>",
            open.name
        ));
    }

    Ok(top)
}

fn attach(stack: &mut [XmlElement], top: &mut Vec<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

fn start_element(e: &BytesStart<'_>) -> Result<XmlElement, String> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| format!("Invalid attribute in <{}>: {}", name, err))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| format!("Invalid attribute value: {}", err))?;
        attributes.push((key, value.into_owned()));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_root() {
        let root = parse(r#"<style class="in-text"><info/>  <macro name="x">t</macro></style>"#)
            .unwrap();
        assert_eq!(root.name, "style");
        assert_eq!(root.attr("class"), Some("in-text"));
        assert_eq!(root.elements().count(), 2);
        assert_eq!(root.child("macro").unwrap().text(), "t");
    }

    #[test]
    fn test_parse_keeps_prefixed_attribute_names() {
        let root = parse(r#"<locale xml:lang="de-DE"/>"#).unwrap();
        assert_eq!(root.attr("xml:lang"), Some("de-DE"));
    }

    #[test]
    fn test_parse_rejects_multiple_roots() {
        assert!(parse("<a/><b/>").is_err());
    }

    #[test]
    fn test_parse_rejects_unclosed() {
        let err = parse("<a><b></b>").unwrap_err();
        assert!(err.contains("</a>"), "Got: {}", err);
    }

    #[test]
    fn test_fragment_keeps_text_and_siblings() {
        let nodes = parse_fragment("<i>a</i> &amp; <b>b</b><br />").unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(nodes[1], XmlNode::Text(" & ".to_string()));
        let text: String = nodes.iter().map(XmlNode::text).collect();
        assert_eq!(text, "a & b");
    }
}
