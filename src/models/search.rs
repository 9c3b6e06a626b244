use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::document::{Document, DocumentId};
use crate::aggregations::{Aggregation, AggregationResult};
use crate::query::ast::{MatchAllQuery, QueryNode};
use crate::query::types::Explanation;
use crate::sort::{Script, ScriptValue, SortCriterion, SortValue};
use crate::Result;

/// Search request
///
/// `size` falls back to the engine's default size when unset. Pagination
/// applies after sorting and collapsing; aggregations always see every match.
#[derive(Clone, Debug)]
pub struct SearchRequest {
    pub query: Box<dyn QueryNode>,
    pub sort: Vec<SortCriterion>,
    pub aggregations: BTreeMap<String, Aggregation>,
    pub collapse: Option<String>,
    pub script_fields: Vec<(String, Script)>,
    pub size: Option<usize>,
    pub from: usize,
    pub explain: bool,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::from_boxed(Box::new(MatchAllQuery::new()))
    }
}

impl SearchRequest {
    pub fn new(query: impl QueryNode + 'static) -> Self {
        Self::from_boxed(Box::new(query))
    }

    pub fn from_boxed(query: Box<dyn QueryNode>) -> Self {
        Self {
            query,
            sort: Vec::new(),
            aggregations: BTreeMap::new(),
            collapse: None,
            script_fields: Vec::new(),
            size: None,
            from: 0,
            explain: false,
        }
    }

    pub fn sort(mut self, criterion: SortCriterion) -> Self {
        self.sort.push(criterion);
        self
    }

    pub fn aggregation(mut self, name: impl Into<String>, aggregation: impl Into<Aggregation>) -> Self {
        self.aggregations.insert(name.into(), aggregation.into());
        self
    }

    /// Keep only the first hit per value of a keyword field
    pub fn collapse(mut self, field: impl Into<String>) -> Self {
        self.collapse = Some(field.into());
        self
    }

    /// Compute a named value per hit, returned in `Hit::fields`
    pub fn script_field(mut self, name: impl Into<String>, script: Script) -> Self {
        self.script_fields.push((name.into(), script));
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn from(mut self, from: usize) -> Self {
        self.from = from;
        self
    }

    pub fn explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    /// Whether the relevance order alone decides which hits are returned
    pub(crate) fn needs_all_hits(&self) -> bool {
        !self.sort.is_empty() || self.collapse.is_some() || !self.aggregations.is_empty()
    }
}

/// Script-computed values of one hit, kept apart from its source document
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptFields(BTreeMap<String, ScriptValue>);

impl ScriptFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ScriptValue) {
        self.0.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Raw value of a field
    pub fn value(&self, name: &str) -> Option<&ScriptValue> {
        self.0.get(name)
    }

    /// Typed value of a field
    ///
    /// `Ok(None)` when the field is absent or null; a value that does not
    /// convert to `T` is an error.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let value = match self.0.get(name) {
            None | Some(ScriptValue::Null) => return Ok(None),
            Some(value) => value,
        };
        let json = match value {
            // Whole numbers become JSON integers so they read back as ints
            ScriptValue::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                Value::from(*n as i64)
            }
            other => serde_json::to_value(other)?,
        };
        Ok(Some(serde_json::from_value(json)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScriptValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// One search hit
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Hit {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(rename = "_score")]
    pub score: f32,
    #[serde(rename = "_source")]
    pub source: Document,
    #[serde(skip_serializing_if = "ScriptFields::is_empty")]
    pub fields: ScriptFields,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortValue>,
    #[serde(rename = "_explanation", skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

impl Hit {
    pub fn new(source: Document, score: f32) -> Self {
        Self {
            id: source.id,
            score,
            source,
            fields: ScriptFields::new(),
            sort: Vec::new(),
            explanation: None,
        }
    }

    pub fn with_sort(mut self, sort: Vec<SortValue>) -> Self {
        self.sort = sort;
        self
    }
}

/// Search response with timing information
#[derive(Clone, Debug, Serialize)]
pub struct SearchResponse {
    /// Matching documents before collapsing and pagination
    pub total: u64,
    pub max_score: Option<f32>,
    pub hits: Vec<Hit>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub aggregations: BTreeMap<String, AggregationResult>,
    pub took_us: u64,
}

impl SearchResponse {
    pub fn ids(&self) -> Vec<DocumentId> {
        self.hits.iter().map(|h| h.id).collect()
    }

    pub fn aggregation(&self, name: &str) -> Option<&AggregationResult> {
        self.aggregations.get(name)
    }
}
