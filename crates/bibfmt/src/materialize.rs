//! Turning pipeline text into the value handed back to the caller.

use crate::markup::{MarkupRenderer, Node, to_html};
use crate::options::{Format, Options, OutputType};
use crate::{Error, Result};
use serde_json::Value;
use std::fmt;

/// The result of a `get` call.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// No result: the request named an invalid type/style pair.
    Undefined,
    Text(String),
    Json(Value),
    Nodes(Vec<Node>),
}

impl Output {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Output::Undefined)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Output::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_nodes(&self) -> Option<&[Node]> {
        match self {
            Output::Nodes(nodes) => Some(nodes),
            _ => None,
        }
    }
}

/// Text form: JSON is compact, nodes are serialized back to markup, and
/// `Undefined` is empty.
impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Undefined => Ok(()),
            Output::Text(text) => f.write_str(text),
            Output::Json(value) => write!(f, "{}", value),
            Output::Nodes(nodes) => f.write_str(&to_html(nodes)),
        }
    }
}

/// Parse text output when `format` is `real`.
///
/// JSON text becomes a [`Value`]; HTML becomes nodes when a renderer is
/// available and stays text otherwise. Anything else is returned as is.
pub fn materialize(
    output: Output,
    options: &Options,
    renderer: Option<&dyn MarkupRenderer>,
) -> Result<Output> {
    let text = match output {
        Output::Text(text) if options.format == Format::Real => text,
        other => return Ok(other),
    };

    match (options.output_type, renderer) {
        (OutputType::Json, _) => serde_json::from_str(&text)
            .map(Output::Json)
            .map_err(|e| Error::Materialization {
                output_type: OutputType::Json.to_string(),
                message: e.to_string(),
            }),
        (OutputType::Html, Some(renderer)) => renderer
            .render(&text)
            .map(Output::Nodes)
            .map_err(|message| Error::Materialization {
                output_type: OutputType::Html.to_string(),
                message,
            }),
        (OutputType::Html, None) | (OutputType::String, _) => Ok(Output::Text(text)),
    }
}
