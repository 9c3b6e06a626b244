//! Terms query - matches any of several exact terms

use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::Result;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

/// Query that matches documents containing any of the given exact terms
///
/// Like [`TermQuery`](super::TermQuery) the terms are not analyzed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TermsQuery {
    pub field: String,
    pub terms: Vec<String>,
    #[serde(default = "default_boost")]
    pub boost: f32,
}

fn default_boost() -> f32 {
    1.0
}

impl TermsQuery {
    pub fn new<I, S>(field: impl Into<String>, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field: field.into(),
            terms: terms.into_iter().map(Into::into).collect(),
            boost: 1.0,
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Cache key independent of term order
    pub fn cache_key(&self) -> String {
        let mut terms = self.terms.clone();
        terms.sort();
        terms.dedup();
        format!("terms\u{1f}{}\u{1f}{}", self.field, terms.join("\u{1f}"))
    }
}

impl QueryNode for TermsQuery {
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        ctx.field_type(&self.field)?;
        ctx.get_or_cache_filter(&self.cache_key(), || {
            let mut result = RoaringBitmap::new();
            for term in &self.terms {
                result |= ctx.postings_bitmap(&self.field, term);
            }
            Ok(result)
        })
    }

    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64 {
        self.terms
            .iter()
            .map(|t| ctx.term_stats(&self.field, t).doc_frequency as f64)
            .sum()
    }

    fn query_type(&self) -> &'static str {
        "terms"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<f32> {
        self.terms
            .iter()
            .any(|t| ctx.term_frequency(&self.field, t, docno).is_some())
            .then_some(self.boost)
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
