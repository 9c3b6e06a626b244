//! Match query - full-text search with analysis

use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::query::types::{Explanation, MatchOperator};
use crate::schema::FieldType;
use crate::Result;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Query that performs full-text search on a field
///
/// On a text field the input is analyzed with the field's search analyzer (or
/// the named `analyzer`) and the resulting terms are combined with the
/// operator. On a keyword field no analysis happens: the whole input is one
/// exact term, so `match` behaves like `term`.
///
/// A matching document scores the sum of the frequencies of the query terms
/// it contains, times the boost.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchQuery {
    /// Field to search in
    pub field: String,
    /// Text to search for
    pub query: String,
    /// How to combine terms (AND/OR)
    #[serde(default)]
    pub operator: MatchOperator,
    /// Boost factor for scoring
    #[serde(default = "default_boost")]
    pub boost: f32,
    /// Analyzer to use instead of the field's search analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,
}

fn default_boost() -> f32 {
    1.0
}

impl MatchQuery {
    /// Create a new match query
    pub fn new(field: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            query: query.into(),
            operator: MatchOperator::default(),
            boost: 1.0,
            analyzer: None,
        }
    }

    /// Set the operator to AND (all terms must match)
    pub fn with_and_operator(mut self) -> Self {
        self.operator = MatchOperator::And;
        self
    }

    pub fn with_operator(mut self, operator: MatchOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Set the boost factor
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Set the analyzer
    pub fn with_analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    /// Get the cache key for this query
    pub fn cache_key(&self) -> String {
        [
            "match",
            self.field.as_str(),
            self.query.as_str(),
            self.operator.as_str(),
            self.analyzer.as_deref().unwrap_or(""),
        ]
        .join("\u{1f}")
    }

    /// Terms the query text stands for on this field, deduplicated in order
    ///
    /// The text is analyzed once per context; later calls reuse the terms.
    pub fn analyze(&self, ctx: &QueryContext<'_>) -> Result<Arc<Vec<String>>> {
        ctx.get_or_analyze(&self.cache_key(), || self.analyze_uncached(ctx))
    }

    fn analyze_uncached(&self, ctx: &QueryContext<'_>) -> Result<Vec<String>> {
        match ctx.field_type(&self.field)? {
            FieldType::Keyword => Ok(vec![self.query.clone()]),
            FieldType::Text { .. } => {
                let analyzer = match &self.analyzer {
                    Some(name) => ctx.analyzer(name)?,
                    None => ctx.search_analyzer(&self.field)?,
                };
                let mut terms: Vec<String> = Vec::new();
                for term in analyzer.terms(&self.query) {
                    if !terms.contains(&term) {
                        terms.push(term);
                    }
                }
                Ok(terms)
            }
        }
    }

    fn term_frequencies(&self, ctx: &QueryContext<'_>, terms: &[String], docno: u32) -> Vec<Option<u32>> {
        terms
            .iter()
            .map(|term| ctx.term_frequency(&self.field, term, docno))
            .collect()
    }

    fn matches(&self, frequencies: &[Option<u32>]) -> bool {
        if frequencies.is_empty() {
            return false;
        }
        match self.operator {
            MatchOperator::And => frequencies.iter().all(Option::is_some),
            MatchOperator::Or => frequencies.iter().any(Option::is_some),
        }
    }
}

impl QueryNode for MatchQuery {
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        let terms = self.analyze(ctx)?;

        if terms.is_empty() {
            return Ok(RoaringBitmap::new());
        }

        ctx.get_or_cache_filter(&self.cache_key(), || {
            let bitmaps = terms.iter().map(|term| ctx.postings_bitmap(&self.field, term));

            let result = match self.operator {
                MatchOperator::And => bitmaps.reduce(|a, b| a & b),
                MatchOperator::Or => bitmaps.reduce(|a, b| a | b),
            };

            Ok(result.unwrap_or_default())
        })
    }

    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64 {
        let terms = self.analyze(ctx).unwrap_or_default();
        let costs = terms
            .iter()
            .map(|term| ctx.term_stats(&self.field, term).doc_frequency as f64);

        match self.operator {
            // AND is bounded by its rarest term
            MatchOperator::And => costs.fold(f64::MAX, f64::min).min(ctx.total_docs() as f64),
            MatchOperator::Or => costs.sum(),
        }
    }

    fn query_type(&self) -> &'static str {
        "match"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<f32> {
        let terms = self.analyze(ctx).ok()?;
        let frequencies = self.term_frequencies(ctx, &terms, docno);
        if !self.matches(&frequencies) {
            return None;
        }
        let total: u32 = frequencies.into_iter().flatten().sum();
        Some(total as f32 * self.boost)
    }

    fn explain(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<Explanation> {
        let terms = self.analyze(ctx).ok()?;
        let frequencies = self.term_frequencies(ctx, &terms, docno);
        if !self.matches(&frequencies) {
            return None;
        }

        let details: Vec<Explanation> = terms
            .iter()
            .zip(frequencies)
            .filter_map(|(term, freq)| {
                freq.map(|tf| {
                    Explanation::new(
                        tf as f32 * self.boost,
                        format!("termFreq={} of {}:{}", tf, self.field, term),
                    )
                })
            })
            .collect();
        let value = details.iter().map(|d| d.value).sum();

        Some(
            Explanation::new(value, format!("sum of matched terms in {}", self.field))
                .with_details(details),
        )
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
