use roaring::RoaringBitmap;

use super::{hit_bitmap, AggregationContext, AggregationResult, Bucket};
use crate::error::TermdexError;
use crate::query::{QueryNode, ScoredDoc};
use crate::Result;

/// Document counts for every combination of named filters
///
/// Each non-empty subset of filters whose conjunction matches at least one
/// document becomes a bucket keyed by the sorted filter names joined with the
/// separator. A single-filter bucket is keyed by the bare filter name.
/// Buckets are ordered by key.
#[derive(Clone, Debug)]
pub struct AdjacencyMatrixAggregation {
    pub filters: Vec<(String, Box<dyn QueryNode>)>,
    pub separator: String,
}

impl Default for AdjacencyMatrixAggregation {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            separator: "&".to_string(),
        }
    }
}

impl AdjacencyMatrixAggregation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(self, name: impl Into<String>, query: impl QueryNode + 'static) -> Self {
        self.filter_boxed(name, Box::new(query))
    }

    pub fn filter_boxed(mut self, name: impl Into<String>, query: Box<dyn QueryNode>) -> Self {
        self.filters.push((name.into(), query));
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    pub(crate) fn compute(&self, actx: &AggregationContext<'_, '_>, hits: &[ScoredDoc]) -> Result<AggregationResult> {
        if self.filters.len() > actx.max_adjacency_filters {
            return Err(TermdexError::InvalidRequest(format!(
                "adjacency_matrix has {} filters, the limit is {}",
                self.filters.len(),
                actx.max_adjacency_filters
            )));
        }

        let matched = hit_bitmap(hits);
        let mut named: Vec<(&str, RoaringBitmap)> = Vec::with_capacity(self.filters.len());
        for (name, query) in &self.filters {
            if named.iter().any(|(existing, _)| *existing == name.as_str()) {
                return Err(TermdexError::InvalidRequest(format!(
                    "duplicate adjacency_matrix filter '{}'",
                    name
                )));
            }
            actx.check_cancelled()?;
            named.push((name.as_str(), query.execute(actx.query)? & &matched));
        }
        named.sort_by(|a, b| a.0.cmp(b.0));

        let mut buckets = Vec::new();
        let mut keys = Vec::new();
        self.expand(actx, &named, 0, None, &mut keys, &mut buckets)?;
        buckets.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(AggregationResult::Buckets { buckets })
    }

    /// Depth-first walk over subsets, extending only non-empty intersections
    fn expand<'n>(
        &self,
        actx: &AggregationContext<'_, '_>,
        named: &'n [(&'n str, RoaringBitmap)],
        start: usize,
        current: Option<&RoaringBitmap>,
        keys: &mut Vec<&'n str>,
        buckets: &mut Vec<Bucket>,
    ) -> Result<()> {
        for (i, (name, docs)) in named.iter().enumerate().skip(start) {
            let intersection = match current {
                Some(current) => current & docs,
                None => docs.clone(),
            };
            if intersection.is_empty() {
                continue;
            }

            actx.check_cancelled()?;
            keys.push(*name);
            buckets.push(Bucket::new(keys.join(self.separator.as_str()), intersection.len()));
            self.expand(actx, named, i + 1, Some(&intersection), keys, buckets)?;
            keys.pop();
        }
        Ok(())
    }
}
