//! Index mapping definitions
//!
//! Mappings declare, per index, each field's type and, for text fields, the
//! analyzer to use. A mapping is immutable once its index is created.

use super::field_type::FieldType;
use crate::error::{MappingError, TermdexError};
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Behavior for document fields that are not in the mapping
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DynamicMapping {
    /// Reject documents with unmapped fields (default)
    #[default]
    Strict,
    /// Keep unmapped fields in the source without indexing them
    False,
}

impl DynamicMapping {
    /// Check if unmapped fields should cause an error
    pub fn should_reject_unmapped(&self) -> bool {
        matches!(self, DynamicMapping::Strict)
    }
}

/// Field mapping configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Field name
    pub name: String,

    /// Field data type
    #[serde(flatten)]
    pub field_type: FieldType,

    /// Whether every document must carry a non-null value
    #[serde(default)]
    pub required: bool,
}

impl FieldMapping {
    /// Create a new field mapping with the given type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }

    /// Create a text field mapping with the standard analyzer
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::text())
    }

    /// Create a keyword field mapping
    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::keyword())
    }

    /// Use a named analyzer for this text field
    ///
    /// Has no effect on keyword fields, which are never analyzed.
    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        if let FieldType::Text { analyzer: a, .. } = &mut self.field_type {
            *a = crate::analysis::AnalyzerRef::Named(analyzer.into());
        }
        self
    }

    /// Use an inline analyzer configuration for this text field
    pub fn with_analyzer_config(mut self, config: crate::analysis::AnalyzerConfig) -> Self {
        if let FieldType::Text { analyzer: a, .. } = &mut self.field_type {
            *a = crate::analysis::AnalyzerRef::Inline(config);
        }
        self
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Index mapping (schema) definition
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMapping {
    /// Field mappings in declaration order
    #[serde(default)]
    pub fields: Vec<FieldMapping>,

    /// Unmapped field behavior
    #[serde(default)]
    pub dynamic: DynamicMapping,
}

impl IndexMapping {
    /// Create a new empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field mapping
    pub fn field(mut self, mapping: FieldMapping) -> Self {
        self.fields.push(mapping);
        self
    }

    /// Set dynamic mapping behavior
    pub fn with_dynamic(mut self, dynamic: DynamicMapping) -> Self {
        self.dynamic = dynamic;
        self
    }

    /// Get a field mapping by name
    pub fn get_field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get a field's type, failing with `UnknownField` when it is not mapped
    pub fn field_type(&self, name: &str) -> Result<&FieldType> {
        self.get_field(name)
            .map(|f| &f.field_type)
            .ok_or_else(|| TermdexError::UnknownField(name.to_string()))
    }

    /// Check if a field exists
    pub fn has_field(&self, name: &str) -> bool {
        self.get_field(name).is_some()
    }

    /// Get all field names in declaration order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Reject empty or duplicate field names
    pub fn validate(&self) -> std::result::Result<(), MappingError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.is_empty() {
                return Err(MappingError::InvalidMapping(
                    "field names must not be empty".to_string(),
                ));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(MappingError::DuplicateField(field.name.clone()));
            }
        }
        Ok(())
    }

    /// Parse a mapping in the shape accepted by index creation requests
    ///
    /// ```json
    /// {
    ///   "dynamic": "strict",
    ///   "properties": {
    ///     "name": { "type": "keyword", "required": true },
    ///     "description": { "type": "text", "analyzer": "standard" }
    ///   }
    /// }
    /// ```
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            MappingError::InvalidMapping("mapping must be a JSON object".to_string())
        })?;

        let mut mapping = IndexMapping::new();
        if let Some(dynamic) = map.get("dynamic") {
            mapping.dynamic = match dynamic {
                Value::Bool(false) => DynamicMapping::False,
                Value::String(s) if s == "false" => DynamicMapping::False,
                Value::String(s) if s == "strict" => DynamicMapping::Strict,
                other => {
                    return Err(MappingError::InvalidMapping(format!(
                        "unsupported dynamic setting: {}",
                        other
                    ))
                    .into())
                }
            };
        }

        let properties = match map.get("properties") {
            Some(Value::Object(props)) => props.clone(),
            Some(_) => {
                return Err(MappingError::InvalidMapping(
                    "properties must be an object".to_string(),
                )
                .into())
            }
            None => Map::new(),
        };

        for (name, props) in properties {
            mapping.fields.push(Self::parse_field(name, props)?);
        }
        mapping.validate()?;
        Ok(mapping)
    }

    fn parse_field(name: String, props: Value) -> Result<FieldMapping> {
        let kind = props.get("type").and_then(Value::as_str).unwrap_or("");
        if !FieldType::is_known_type_name(kind) {
            return Err(MappingError::InvalidFieldKind {
                field: name,
                kind: kind.to_string(),
            }
            .into());
        }

        let required = props.get("required").and_then(Value::as_bool).unwrap_or(false);
        let field_type: FieldType = serde_json::from_value(props).map_err(|e| {
            MappingError::InvalidMapping(format!("field '{}': {}", name, e))
        })?;

        Ok(FieldMapping {
            name,
            field_type,
            required,
        })
    }

    /// Render the mapping in the same shape `from_json` accepts
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut props = serde_json::to_value(&field.field_type).unwrap_or(Value::Null);
            if field.required {
                if let Value::Object(obj) = &mut props {
                    obj.insert("required".to_string(), Value::Bool(true));
                }
            }
            properties.insert(field.name.clone(), props);
        }
        serde_json::json!({
            "dynamic": self.dynamic,
            "properties": properties,
        })
    }
}
