//! CSL-JSON entries.

use crate::{Error, Result};
use bibfmt_citeproc::ItemData;
use bibfmt_citeproc::reference::item_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One bibliographic entry: CSL fields in their original order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(ItemData);

impl Entry {
    pub fn new(fields: ItemData) -> Self {
        Entry(fields)
    }

    /// The entry's `id`, with integer ids given as strings.
    pub fn id(&self) -> Option<String> {
        item_id(&self.0)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> &ItemData {
        &self.0
    }

    pub fn into_fields(self) -> ItemData {
        self.0
    }

    /// Parse CSL-JSON: either one entry object or an array of them.
    pub fn parse_list(json: &str) -> Result<Vec<Entry>> {
        let value: Value = serde_json::from_str(json).map_err(|e| Error::InvalidInput {
            message: e.to_string(),
        })?;
        match value {
            Value::Array(values) => values.into_iter().map(Entry::try_from).collect(),
            other => Ok(vec![Entry::try_from(other)?]),
        }
    }
}

impl From<ItemData> for Entry {
    fn from(fields: ItemData) -> Self {
        Entry(fields)
    }
}

impl TryFrom<Value> for Entry {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Entry(fields)),
            other => Err(Error::InvalidInput {
                message: format!("expected an entry object, found {}", json_kind(&other)),
            }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
