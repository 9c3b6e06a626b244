//! Abstract Syntax Tree for query representation
//!
//! This module defines the core `QueryNode` trait that all query types implement,
//! providing a unified interface for query execution, scoring and cost estimation.

use crate::Result;
use roaring::RoaringBitmap;
use std::fmt::Debug;

use super::context::QueryContext;
use super::types::Explanation;

/// Core trait for all query nodes in the AST
///
/// Query nodes form a tree structure that represents the logical structure
/// of a search query. Each node can be executed against a `QueryContext`
/// to produce a set of matching document numbers.
pub trait QueryNode: Send + Sync + Debug {
    /// Execute the query and return matching document numbers as a bitmap
    ///
    /// Fails with `UnknownField` when the query references a field absent
    /// from the mapping.
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap>;

    /// Estimate the execution cost of this query
    ///
    /// Lower costs should be executed first (e.g., highly selective filters).
    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64;

    /// Get the query type name for debugging and logging
    fn query_type(&self) -> &'static str;

    /// Whether this query produces scores (vs just filtering)
    ///
    /// Scoring queries contribute to the relevance score of matching documents.
    /// Non-scoring queries (filters) only determine which documents match.
    fn is_scoring(&self) -> bool {
        true
    }

    /// Get the boost factor for this query
    fn boost(&self) -> f32 {
        1.0
    }

    /// Score of a document
    ///
    /// Returns `Some` exactly when the document matches this query, so
    /// compound queries can also use it as a per-document membership test.
    fn score(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<f32>;

    /// Explain the score of a matching document
    fn explain(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<Explanation> {
        self.score(ctx, docno)
            .map(|value| Explanation::new(value, format!("{} query", self.query_type())))
    }

    /// Clone this query node into a boxed trait object
    fn clone_box(&self) -> Box<dyn QueryNode>;
}

impl Clone for Box<dyn QueryNode> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A query that matches all documents
#[derive(Clone, Debug)]
pub struct MatchAllQuery {
    pub boost: f32,
}

impl Default for MatchAllQuery {
    fn default() -> Self {
        Self { boost: 1.0 }
    }
}

impl MatchAllQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl QueryNode for MatchAllQuery {
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        Ok(ctx.all_docs())
    }

    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64 {
        // Cost is proportional to total documents
        ctx.total_docs() as f64
    }

    fn query_type(&self) -> &'static str {
        "match_all"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<f32> {
        ctx.document(docno).map(|_| self.boost)
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

/// A query that matches no documents
#[derive(Clone, Debug, Default)]
pub struct MatchNoneQuery;

impl QueryNode for MatchNoneQuery {
    fn execute(&self, _ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        Ok(RoaringBitmap::new())
    }

    fn estimate_cost(&self, _ctx: &QueryContext<'_>) -> f64 {
        0.0
    }

    fn query_type(&self) -> &'static str {
        "match_none"
    }

    fn is_scoring(&self) -> bool {
        false
    }

    fn score(&self, _ctx: &QueryContext<'_>, _docno: u32) -> Option<f32> {
        None
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
