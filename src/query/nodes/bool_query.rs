//! Boolean query - combines multiple clauses with AND, OR, NOT semantics

use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::query::types::{Explanation, MinimumShouldMatch};
use crate::Result;
use roaring::RoaringBitmap;
use std::collections::HashMap;

/// Boolean query combining multiple clauses
///
/// The boolean query supports four types of clauses:
/// - `must`: All clauses must match (AND). Contributes to score.
/// - `should`: Optional unless `minimum_should_match` says otherwise. Contributes to score.
/// - `must_not`: No clause must match (NOT). Does not contribute to score.
/// - `filter`: All clauses must match (AND). Does not contribute to score. Cached.
///
/// When `minimum_should_match` is unset it defaults to 1 if the query has no
/// `must` or `filter` clause, and to 0 otherwise. A bool query without any
/// clause matches every document.
///
/// # Example
///
/// ```json
/// {
///   "bool": {
///     "must": [
///       { "match": { "description": "mouse" } }
///     ],
///     "filter": [
///       { "term": { "name": "mouse" } }
///     ],
///     "must_not": [
///       { "term": { "name": "keyboard" } }
///     ]
///   }
/// }
/// ```
#[derive(Clone, Debug)]
pub struct BoolQuery {
    /// Clauses that must match (AND, scoring)
    pub must: Vec<Box<dyn QueryNode>>,
    /// Optional clauses (OR, scoring)
    pub should: Vec<Box<dyn QueryNode>>,
    /// Clauses that must not match (NOT, no scoring)
    pub must_not: Vec<Box<dyn QueryNode>>,
    /// Clauses that must match (AND, no scoring, cached)
    pub filter: Vec<Box<dyn QueryNode>>,
    /// Minimum number of should clauses that must match
    pub minimum_should_match: Option<MinimumShouldMatch>,
    /// Boost factor for scoring
    pub boost: f32,
}

impl Default for BoolQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl BoolQuery {
    /// Create a new empty boolean query
    pub fn new() -> Self {
        Self {
            must: Vec::new(),
            should: Vec::new(),
            must_not: Vec::new(),
            filter: Vec::new(),
            minimum_should_match: None,
            boost: 1.0,
        }
    }

    /// Add a must clause
    pub fn must(mut self, query: impl QueryNode + 'static) -> Self {
        self.must.push(Box::new(query));
        self
    }

    /// Add a should clause
    pub fn should(mut self, query: impl QueryNode + 'static) -> Self {
        self.should.push(Box::new(query));
        self
    }

    /// Add a must_not clause
    pub fn must_not(mut self, query: impl QueryNode + 'static) -> Self {
        self.must_not.push(Box::new(query));
        self
    }

    /// Add a filter clause
    pub fn filter(mut self, query: impl QueryNode + 'static) -> Self {
        self.filter.push(Box::new(query));
        self
    }

    /// Add a must clause (boxed)
    pub fn must_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.must.push(query);
        self
    }

    /// Add a should clause (boxed)
    pub fn should_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.should.push(query);
        self
    }

    /// Add a must_not clause (boxed)
    pub fn must_not_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.must_not.push(query);
        self
    }

    /// Add a filter clause (boxed)
    pub fn filter_boxed(mut self, query: Box<dyn QueryNode>) -> Self {
        self.filter.push(query);
        self
    }

    /// Set minimum should match
    pub fn with_minimum_should_match(mut self, msm: MinimumShouldMatch) -> Self {
        self.minimum_should_match = Some(msm);
        self
    }

    /// Set boost factor
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Check if this is an empty query
    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty()
    }

    /// Get total number of clauses
    pub fn clause_count(&self) -> usize {
        self.must.len() + self.should.len() + self.must_not.len() + self.filter.len()
    }

    /// Number of should clauses a document has to match
    pub fn required_should_matches(&self) -> usize {
        match &self.minimum_should_match {
            Some(msm) => msm.calculate(self.should.len()),
            None if self.must.is_empty() && self.filter.is_empty() => 1.min(self.should.len()),
            None => 0,
        }
    }

    /// Required clauses, cheapest first
    fn required_by_cost(&self, ctx: &QueryContext<'_>) -> Vec<&dyn QueryNode> {
        let mut required: Vec<(f64, &dyn QueryNode)> = self
            .filter
            .iter()
            .chain(self.must.iter())
            .map(|q| (q.estimate_cost(ctx), q.as_ref()))
            .collect();
        required.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        required.into_iter().map(|(_, q)| q).collect()
    }
}

impl QueryNode for BoolQuery {
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        let mut result: Option<RoaringBitmap> = None;

        // Most selective first so the intersection empties early
        for query in self.required_by_cost(ctx) {
            let matches = query.execute(ctx)?;
            let combined = match result {
                Some(r) => r & matches,
                None => matches,
            };
            if combined.is_empty() {
                return Ok(combined);
            }
            result = Some(combined);
        }

        let min_should = self.required_should_matches();
        if !self.should.is_empty() {
            let mut match_counts: HashMap<u32, usize> = HashMap::new();
            for query in &self.should {
                for docno in query.execute(ctx)?.iter() {
                    *match_counts.entry(docno).or_insert(0) += 1;
                }
            }

            if min_should > 0 {
                let should_matches: RoaringBitmap = match_counts
                    .into_iter()
                    .filter(|(_, count)| *count >= min_should)
                    .map(|(docno, _)| docno)
                    .collect();
                result = Some(match result {
                    Some(r) => r & should_matches,
                    None => should_matches,
                });
            }
        }

        let mut final_result = result.unwrap_or_else(|| ctx.all_docs());
        for query in &self.must_not {
            final_result -= query.execute(ctx)?;
        }

        Ok(final_result)
    }

    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64 {
        // Cost is dominated by the most selective required clause
        let required_cost = self
            .must
            .iter()
            .chain(self.filter.iter())
            .map(|q| q.estimate_cost(ctx))
            .fold(f64::MAX, f64::min);

        let should_cost: f64 = self.should.iter().map(|q| q.estimate_cost(ctx)).sum();
        let must_not_cost: f64 = self.must_not.iter().map(|q| q.estimate_cost(ctx)).sum();

        let base_cost = if required_cost < f64::MAX {
            required_cost
        } else if should_cost > 0.0 {
            should_cost
        } else {
            ctx.total_docs() as f64
        };

        base_cost + should_cost * 0.1 + must_not_cost * 0.1
    }

    fn query_type(&self) -> &'static str {
        "bool"
    }

    fn is_scoring(&self) -> bool {
        self.must.iter().any(|q| q.is_scoring()) || self.should.iter().any(|q| q.is_scoring())
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<f32> {
        if self.is_empty() {
            return ctx.document(docno).map(|_| self.boost);
        }

        for query in &self.filter {
            query.score(ctx, docno)?;
        }
        if self.must_not.iter().any(|q| q.score(ctx, docno).is_some()) {
            return None;
        }

        let mut total_score = 0.0f32;
        for query in &self.must {
            total_score += query.score(ctx, docno)?;
        }

        let mut should_matched = 0;
        for query in &self.should {
            if let Some(score) = query.score(ctx, docno) {
                total_score += score;
                should_matched += 1;
            }
        }
        if should_matched < self.required_should_matches() {
            return None;
        }

        // Pure filter queries still need the document to exist
        if self.must.is_empty() && self.should.is_empty() {
            ctx.document(docno)?;
        }

        Some(total_score * self.boost)
    }

    fn explain(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<Explanation> {
        let value = self.score(ctx, docno)?;
        let details = self
            .must
            .iter()
            .chain(self.should.iter())
            .filter_map(|q| q.explain(ctx, docno))
            .collect();
        Some(Explanation::new(value, "sum of scoring clauses").with_details(details))
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
