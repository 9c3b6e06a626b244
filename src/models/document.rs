use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::TermdexError;
use crate::Result;

/// Unique document identifier
pub type DocumentId = u64;

/// Value of one document field: a single string, several strings, or null
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    Multi(Vec<String>),
    Null,
}

impl FieldValue {
    /// All values, in document order
    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Single(v) => vec![v.as_str()],
            FieldValue::Multi(vs) => vs.iter().map(String::as_str).collect(),
            FieldValue::Null => Vec::new(),
        }
    }

    /// True for `Null` and for an empty value list
    pub fn is_null(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Multi(vs) => vs.is_empty(),
            FieldValue::Single(_) => false,
        }
    }

    /// Convert a JSON scalar or array of scalars
    fn from_json(field: &str, value: &Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null => Ok(FieldValue::Null),
            Value::Array(items) => items
                .iter()
                .map(|item| scalar_to_string(item).ok_or_else(|| nested_error(field)))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(FieldValue::Multi),
            other => scalar_to_string(other)
                .map(FieldValue::Single)
                .ok_or_else(|| nested_error(field)),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn nested_error(field: &str) -> String {
    format!("field '{}' must hold strings, numbers or booleans", field)
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Single(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Single(value)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(values: Vec<&str>) -> Self {
        FieldValue::Multi(values.into_iter().map(String::from).collect())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(values: Vec<String>) -> Self {
        FieldValue::Multi(values)
    }
}

/// Document with an identifier and named field values
///
/// Serializes flat: `{"id": 1, "name": "mouse"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Document {
    pub fn new(id: DocumentId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    /// Set a field value
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a field to null
    pub fn null_field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), FieldValue::Null);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Values of a field; empty when absent or null
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields.get(name).map(FieldValue::values).unwrap_or_default()
    }

    /// First value of a field
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name).into_iter().next()
    }

    /// Build a document from a flat JSON object
    ///
    /// The identifier is read from `id` (or `_id`), as a number or a numeric
    /// string. Numbers and booleans in other fields become their string form.
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            TermdexError::InvalidRequest("document must be a JSON object".to_string())
        })?;

        let id_value = map
            .get("id")
            .or_else(|| map.get("_id"))
            .ok_or_else(|| TermdexError::InvalidRequest("document has no id".to_string()))?;
        let id = match id_value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            TermdexError::InvalidRequest(format!("invalid document id: {}", id_value))
        })?;

        let mut doc = Document::new(id);
        for (name, value) in map {
            if name == "id" || name == "_id" {
                continue;
            }
            let value = FieldValue::from_json(name, value)
                .map_err(|reason| TermdexError::Validation { doc_id: id, reason })?;
            doc.fields.insert(name.clone(), value);
        }
        Ok(doc)
    }
}
