//! Aggregation engine
//!
//! Aggregations run over every document the query matched, independent of
//! `size` and `from`. Bucket aggregations carry nested sub-aggregations that
//! run over the documents of each bucket.
//!
//! - `terms`: one bucket per distinct keyword value
//! - `cardinality`: exact distinct-value count
//! - `top_hits`: best `size` documents under a sort
//! - `adjacency_matrix`: document counts for every combination of named filters
//!
//! Collapsing is not an aggregation; see [`collapse`].

mod adjacency_matrix;
mod cardinality;
mod collapse;
mod terms;
mod top_hits;

pub use adjacency_matrix::AdjacencyMatrixAggregation;
pub use cardinality::CardinalityAggregation;
pub use collapse::collapse;
pub use terms::TermsAggregation;
pub use top_hits::TopHitsAggregation;

use roaring::RoaringBitmap;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::cancel::{self, CancellationToken};
use crate::error::TermdexError;
use crate::models::Hit;
use crate::query::{QueryContext, ScoredDoc};
use crate::schema::FieldType;
use crate::Result;

/// Named aggregations of one request or bucket
pub type Aggregations = BTreeMap<String, Aggregation>;

/// Computed aggregations, by name
pub type AggregationResults = BTreeMap<String, AggregationResult>;

/// One aggregation request
#[derive(Clone, Debug)]
pub enum Aggregation {
    Terms(TermsAggregation),
    Cardinality(CardinalityAggregation),
    TopHits(TopHitsAggregation),
    AdjacencyMatrix(AdjacencyMatrixAggregation),
}

impl Aggregation {
    pub fn kind(&self) -> &'static str {
        match self {
            Aggregation::Terms(_) => "terms",
            Aggregation::Cardinality(_) => "cardinality",
            Aggregation::TopHits(_) => "top_hits",
            Aggregation::AdjacencyMatrix(_) => "adjacency_matrix",
        }
    }

    /// Compute over `hits`, which must be in relevance order
    pub fn compute(&self, actx: &AggregationContext<'_, '_>, hits: &[ScoredDoc]) -> Result<AggregationResult> {
        actx.check_cancelled()?;
        match self {
            Aggregation::Terms(agg) => agg.compute(actx, hits),
            Aggregation::Cardinality(agg) => agg.compute(actx, hits),
            Aggregation::TopHits(agg) => agg.compute(actx, hits),
            Aggregation::AdjacencyMatrix(agg) => agg.compute(actx, hits),
        }
    }
}

impl From<TermsAggregation> for Aggregation {
    fn from(agg: TermsAggregation) -> Self {
        Aggregation::Terms(agg)
    }
}

impl From<CardinalityAggregation> for Aggregation {
    fn from(agg: CardinalityAggregation) -> Self {
        Aggregation::Cardinality(agg)
    }
}

impl From<TopHitsAggregation> for Aggregation {
    fn from(agg: TopHitsAggregation) -> Self {
        Aggregation::TopHits(agg)
    }
}

impl From<AdjacencyMatrixAggregation> for Aggregation {
    fn from(agg: AdjacencyMatrixAggregation) -> Self {
        Aggregation::AdjacencyMatrix(agg)
    }
}

/// Read access and limits shared by every aggregation of a request
pub struct AggregationContext<'c, 'a> {
    pub query: &'c QueryContext<'a>,
    pub cancel: Option<&'c CancellationToken>,
    pub max_adjacency_filters: usize,
}

impl<'c, 'a> AggregationContext<'c, 'a> {
    pub fn new(query: &'c QueryContext<'a>) -> Self {
        Self {
            query,
            cancel: None,
            max_adjacency_filters: 16,
        }
    }

    pub fn with_cancel(mut self, cancel: Option<&'c CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_max_adjacency_filters(mut self, max: usize) -> Self {
        self.max_adjacency_filters = max;
        self
    }

    pub fn check_cancelled(&self) -> Result<()> {
        cancel::check(self.cancel)
    }

    /// Compute every aggregation in `aggs` over `hits`
    pub fn run(&self, aggs: &Aggregations, hits: &[ScoredDoc]) -> Result<AggregationResults> {
        aggs.iter()
            .map(|(name, agg)| Ok((name.clone(), agg.compute(self, hits)?)))
            .collect()
    }

    /// Ensure a field can be bucketed: mapped and not analyzed
    pub(crate) fn aggregatable_field(&self, field: &str, kind: &str) -> Result<&'a FieldType> {
        let field_type = self.query.field_type(field)?;
        if !field_type.is_aggregatable() {
            return Err(TermdexError::InvalidRequest(format!(
                "{} on {} field '{}' is not supported",
                kind,
                field_type.type_name(),
                field
            )));
        }
        Ok(field_type)
    }
}

/// Document numbers of `hits`
pub(crate) fn hit_bitmap(hits: &[ScoredDoc]) -> RoaringBitmap {
    hits.iter().map(|h| h.docno).collect()
}

/// Hits whose document is in `docs`, keeping their order
pub(crate) fn hits_in(hits: &[ScoredDoc], docs: &RoaringBitmap) -> Vec<ScoredDoc> {
    hits.iter().filter(|h| docs.contains(h.docno)).copied().collect()
}

/// Result of one aggregation
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregationResult {
    Buckets { buckets: Vec<Bucket> },
    Value { value: u64 },
    Hits { total: u64, hits: Vec<Hit> },
}

impl AggregationResult {
    pub fn buckets(&self) -> Option<&[Bucket]> {
        match self {
            AggregationResult::Buckets { buckets } => Some(buckets),
            _ => None,
        }
    }

    /// Bucket with the given key
    pub fn bucket(&self, key: &str) -> Option<&Bucket> {
        self.buckets()?.iter().find(|b| b.key == key)
    }

    pub fn value(&self) -> Option<u64> {
        match self {
            AggregationResult::Value { value } => Some(*value),
            _ => None,
        }
    }

    pub fn hits(&self) -> Option<&[Hit]> {
        match self {
            AggregationResult::Hits { hits, .. } => Some(hits),
            _ => None,
        }
    }
}

/// One bucket of a bucket aggregation
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub doc_count: u64,
    #[serde(flatten)]
    pub sub_aggregations: AggregationResults,
}

impl Bucket {
    pub fn new(key: impl Into<String>, doc_count: u64) -> Self {
        Self {
            key: key.into(),
            doc_count,
            sub_aggregations: BTreeMap::new(),
        }
    }

    pub fn sub_aggregation(&self, name: &str) -> Option<&AggregationResult> {
        self.sub_aggregations.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bucket_serialization_flattens_sub_aggregations() {
        let mut bucket = Bucket::new("mouse", 3);
        bucket
            .sub_aggregations
            .insert("distinct".to_string(), AggregationResult::Value { value: 2 });

        assert_eq!(
            serde_json::to_value(&bucket).unwrap(),
            json!({ "key": "mouse", "doc_count": 3, "distinct": { "value": 2 } })
        );
    }

    #[test]
    fn test_result_accessors() {
        let result = AggregationResult::Buckets {
            buckets: vec![Bucket::new("a", 1), Bucket::new("b", 2)],
        };
        assert_eq!(result.bucket("b").unwrap().doc_count, 2);
        assert!(result.value().is_none());
        assert_eq!(AggregationResult::Value { value: 7 }.value(), Some(7));
    }
}
