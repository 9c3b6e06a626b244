use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::{AnalyzerConfig, CharFilterConfig, TokenFilterConfig};

/// Engine-wide limits and defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size used when a search request does not set one
    pub default_size: usize,
    /// Upper bound for `from + size`
    pub max_result_window: usize,
    /// Maximum number of named filters in an adjacency matrix aggregation
    pub max_adjacency_filters: usize,
    /// Position gap inserted between the values of a multi-valued text field
    pub position_increment_gap: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_size: 10,
            max_result_window: 10_000,
            max_adjacency_filters: 16,
            position_increment_gap: 100,
        }
    }
}

impl EngineConfig {
    pub fn with_default_size(mut self, size: usize) -> Self {
        self.default_size = size;
        self
    }

    pub fn with_max_result_window(mut self, window: usize) -> Self {
        self.max_result_window = window;
        self
    }

    pub fn with_max_adjacency_filters(mut self, max: usize) -> Self {
        self.max_adjacency_filters = max;
        self
    }
}

/// Per-index settings supplied at creation time
///
/// Mirrors the `settings` body of an index creation request:
///
/// ```json
/// {
///   "analysis": {
///     "analyzer": { "my_analyzer": { "char_filter": ["html_strip"], "tokenizer": "standard", "filter": ["lowercase"] } },
///     "filter": { "my_stop": { "type": "stop", "stopwords": ["/n"] } }
///   }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSettings {
    #[serde(default)]
    pub analysis: AnalysisSettings,
}

/// Named analysis components available to the fields of one index
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    #[serde(default, rename = "analyzer")]
    pub analyzers: BTreeMap<String, AnalyzerConfig>,
    #[serde(default, rename = "filter")]
    pub token_filters: BTreeMap<String, TokenFilterConfig>,
    #[serde(default, rename = "char_filter")]
    pub char_filters: BTreeMap<String, CharFilterConfig>,
}

impl IndexSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named analyzer
    pub fn analyzer(mut self, name: impl Into<String>, config: AnalyzerConfig) -> Self {
        self.analysis.analyzers.insert(name.into(), config);
        self
    }

    /// Register a named token filter
    pub fn token_filter(mut self, name: impl Into<String>, config: TokenFilterConfig) -> Self {
        self.analysis.token_filters.insert(name.into(), config);
        self
    }

    /// Register a named char filter
    pub fn char_filter(mut self, name: impl Into<String>, config: CharFilterConfig) -> Self {
        self.analysis.char_filters.insert(name.into(), config);
        self
    }

    /// Parse settings from a JSON value
    pub fn from_json(value: &serde_json::Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }
}
