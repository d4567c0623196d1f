//! Read access to CSL-JSON item data.
//!
//! Items reach the engine as plain JSON maps (whatever the item callback
//! returns). This module pulls typed values out of them on demand rather
//! than deserializing a full schema up front.

use serde::Deserialize;
use serde_json::Value;

/// CSL-JSON item data, field order preserved.
pub type ItemData = serde_json::Map<String, Value>;

/// CSL name variables.
pub const NAME_VARIABLES: &[&str] = &[
    "author",
    "editor",
    "translator",
    "container-author",
    "collection-editor",
    "composer",
    "director",
    "illustrator",
    "interviewer",
    "recipient",
    "reviewed-author",
    "editorial-director",
];

/// CSL date variables.
pub const DATE_VARIABLES: &[&str] = &[
    "issued",
    "accessed",
    "event-date",
    "original-date",
    "submitted",
    "available-date",
];

/// A name in CSL-JSON format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Name {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub given: Option<String>,
    #[serde(rename = "dropping-particle", default)]
    pub dropping_particle: Option<String>,
    #[serde(rename = "non-dropping-particle", default)]
    pub non_dropping_particle: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub literal: Option<String>,
}

/// A date as year, optional month, optional day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateParts {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

/// A date variable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateValue {
    Parts(DateParts),
    Literal(String),
}

/// The item's CSL type, empty when absent.
pub fn item_type(item: &ItemData) -> &str {
    item.get("type").and_then(Value::as_str).unwrap_or("")
}

/// The item's id. CSL-JSON allows both strings and integers.
pub fn item_id(item: &ItemData) -> Option<String> {
    match item.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// A standard (text or number) variable as a non-empty string.
pub fn get_variable(item: &ItemData, name: &str) -> Option<String> {
    let value = match item.get(name)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!value.is_empty()).then_some(value)
}

/// The short form of a variable, falling back to the long form.
pub fn get_short_variable(item: &ItemData, name: &str) -> Option<String> {
    let short = match name {
        "container-title" => get_variable(item, "container-title-short")
            .or_else(|| get_variable(item, "journalAbbreviation")),
        _ => get_variable(item, &format!("{}-short", name)),
    };
    short.or_else(|| get_variable(item, name))
}

/// A name variable. Malformed entries are skipped.
pub fn get_names(item: &ItemData, name: &str) -> Vec<Name> {
    match item.get(name) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| Name::deserialize(v).ok())
            .filter(|n| n.family.is_some() || n.given.is_some() || n.literal.is_some())
            .collect(),
        _ => Vec::new(),
    }
}

/// A date variable.
///
/// Accepts `{"date-parts": [[y, m, d]]}`, `{"literal": ..}`, `{"raw": ..}`,
/// a bare year number, or a string starting with a year.
pub fn get_date(item: &ItemData, name: &str) -> Option<DateValue> {
    match item.get(name)? {
        Value::Number(n) => n
            .as_i64()
            .and_then(|y| i32::try_from(y).ok())
            .map(|year| DateValue::Parts(DateParts { year, month: None, day: None })),
        Value::String(s) => parse_raw_date(s),
        Value::Object(obj) => {
            if let Some(Value::Array(ranges)) = obj.get("date-parts") {
                if let Some(Value::Array(first)) = ranges.first() {
                    return date_parts_from_json(first).map(DateValue::Parts);
                }
            }
            if let Some(literal) = obj.get("literal").and_then(Value::as_str) {
                return Some(DateValue::Literal(literal.to_string()));
            }
            obj.get("raw").and_then(Value::as_str).and_then(parse_raw_date)
        }
        _ => None,
    }
}

/// Whether a variable of any kind has a value.
pub fn has_variable(item: &ItemData, name: &str) -> bool {
    if NAME_VARIABLES.contains(&name) {
        !get_names(item, name).is_empty()
    } else if DATE_VARIABLES.contains(&name) {
        get_date(item, name).is_some()
    } else {
        get_variable(item, name).is_some()
    }
}

fn date_parts_from_json(parts: &[Value]) -> Option<DateParts> {
    let number = |v: &Value| -> Option<i64> {
        match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    };
    let year = i32::try_from(number(parts.first()?)?).ok()?;
    let month = parts
        .get(1)
        .and_then(number)
        .and_then(|m| u32::try_from(m).ok())
        .filter(|m| (1..=12).contains(m));
    let day = parts
        .get(2)
        .and_then(number)
        .and_then(|d| u32::try_from(d).ok())
        .filter(|d| (1..=31).contains(d));
    Some(DateParts { year, month, day })
}

fn parse_raw_date(raw: &str) -> Option<DateValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut fields = raw.split(['-', '/']);
    let parts = fields
        .next()
        .and_then(|y| y.parse::<i32>().ok())
        .map(|year| {
            let month = fields
                .next()
                .and_then(|m| m.parse::<u32>().ok())
                .filter(|m| (1..=12).contains(m));
            let day = fields
                .next()
                .and_then(|d| d.parse::<u32>().ok())
                .filter(|d| (1..=31).contains(d));
            DateParts { year, month, day }
        });
    Some(match parts {
        Some(parts) => DateValue::Parts(parts),
        None => DateValue::Literal(raw.to_string()),
    })
}
