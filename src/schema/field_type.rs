//! Field type definitions
//!
//! Defines how the two supported data types are indexed and queried.

use serde::{Deserialize, Serialize};

use crate::analysis::AnalyzerRef;

/// Field data type
///
/// Determines how a field is indexed and which queries analyze their input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// Full-text searchable field
    ///
    /// Text fields are analyzed before indexing; `match` queries analyze their
    /// input with the same analyzer unless a search analyzer is set.
    Text {
        /// Analyzer to use for indexing
        #[serde(default)]
        analyzer: AnalyzerRef,
        /// Analyzer to use for search (if different from index analyzer)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        search_analyzer: Option<AnalyzerRef>,
    },

    /// Exact match keyword field
    ///
    /// The entire raw value is indexed as a single case-preserving term.
    /// Keyword fields support exact queries, sorting, aggregations and collapse.
    Keyword,
}

impl Default for FieldType {
    fn default() -> Self {
        FieldType::text()
    }
}

impl FieldType {
    /// Create a text field with the standard analyzer
    pub fn text() -> Self {
        FieldType::Text {
            analyzer: AnalyzerRef::default(),
            search_analyzer: None,
        }
    }

    /// Create a text field with a specific analyzer
    pub fn text_with_analyzer(analyzer: AnalyzerRef) -> Self {
        FieldType::Text {
            analyzer,
            search_analyzer: None,
        }
    }

    pub fn keyword() -> Self {
        FieldType::Keyword
    }

    /// Check if this field type is analyzed
    pub fn is_analyzed(&self) -> bool {
        matches!(self, FieldType::Text { .. })
    }

    /// Check if this field type supports sorting, aggregations and collapse
    pub fn is_aggregatable(&self) -> bool {
        matches!(self, FieldType::Keyword)
    }

    /// Name used in mapping definitions
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text { .. } => "text",
            FieldType::Keyword => "keyword",
        }
    }

    /// Names accepted in the `type` key of a mapping definition
    pub fn is_known_type_name(name: &str) -> bool {
        matches!(name, "text" | "keyword")
    }
}
