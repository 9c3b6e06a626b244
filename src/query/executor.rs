//! Query executor for running queries against an index
//!
//! The executor runs a query tree, then scores every match. Results are
//! ordered by descending score with ties broken by indexing order.

use crate::cancel::{self, CancellationToken};
use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::query::types::QueryStats;
use crate::Result;
use ordered_float::OrderedFloat;
use roaring::RoaringBitmap;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Instant;

/// Documents scored between cancellation checks
const CANCEL_CHECK_INTERVAL: u64 = 1024;

/// A matching document and its relevance score
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredDoc {
    pub docno: u32,
    pub score: f32,
}

impl ScoredDoc {
    /// Descending score, then ascending docno
    pub fn relevance_order(a: &ScoredDoc, b: &ScoredDoc) -> Ordering {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.docno.cmp(&b.docno))
    }
}

/// Query execution result
#[derive(Debug)]
pub struct QueryResult {
    /// Every matching document number
    pub matches: RoaringBitmap,
    /// Scored hits in relevance order
    pub hits: Vec<ScoredDoc>,
    /// Execution statistics
    pub stats: QueryStats,
}

impl QueryResult {
    pub fn total_hits(&self) -> u64 {
        self.matches.len()
    }
}

/// Query executor for running queries
pub struct QueryExecutor;

impl QueryExecutor {
    /// Execute a query and score its matches
    ///
    /// With `top_k` set only the best `top_k` hits are kept; otherwise every
    /// match is scored and returned.
    pub fn execute(
        query: &dyn QueryNode,
        ctx: &QueryContext<'_>,
        top_k: Option<usize>,
    ) -> Result<QueryResult> {
        Self::execute_with_cancel(query, ctx, top_k, None)
    }

    /// Like [`execute`](Self::execute), checking `cancel` while scoring
    pub fn execute_with_cancel(
        query: &dyn QueryNode,
        ctx: &QueryContext<'_>,
        top_k: Option<usize>,
        cancel: Option<&CancellationToken>,
    ) -> Result<QueryResult> {
        let start = Instant::now();

        cancel::check(cancel)?;
        let matches = query.execute(ctx)?;
        cancel::check(cancel)?;

        let hits = match top_k {
            Some(k) => Self::collect_top_k(query, ctx, &matches, k, cancel)?,
            None => Self::collect_all(query, ctx, &matches, cancel)?,
        };

        let stats = QueryStats {
            docs_matched: matches.len(),
            execution_time_us: start.elapsed().as_micros() as u64,
        };

        Ok(QueryResult {
            matches,
            hits,
            stats,
        })
    }

    fn collect_all(
        query: &dyn QueryNode,
        ctx: &QueryContext<'_>,
        matches: &RoaringBitmap,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<ScoredDoc>> {
        let mut hits = Vec::with_capacity(matches.len() as usize);
        for (i, docno) in matches.iter().enumerate() {
            if i as u64 % CANCEL_CHECK_INTERVAL == 0 {
                cancel::check(cancel)?;
            }
            let score = query.score(ctx, docno).unwrap_or(0.0);
            hits.push(ScoredDoc { docno, score });
        }
        hits.sort_by(ScoredDoc::relevance_order);
        Ok(hits)
    }

    /// Collect top-k results with a bounded min-heap
    fn collect_top_k(
        query: &dyn QueryNode,
        ctx: &QueryContext<'_>,
        matches: &RoaringBitmap,
        top_k: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<ScoredDoc>> {
        if matches.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        // Heap top is the weakest kept hit: lowest score, then highest docno
        let mut heap: BinaryHeap<Reverse<(OrderedFloat<f32>, Reverse<u32>)>> =
            BinaryHeap::with_capacity(top_k + 1);

        for (i, docno) in matches.iter().enumerate() {
            if i as u64 % CANCEL_CHECK_INTERVAL == 0 {
                cancel::check(cancel)?;
            }
            let score = query.score(ctx, docno).unwrap_or(0.0);
            let entry = (OrderedFloat(score), Reverse(docno));

            if heap.len() < top_k {
                heap.push(Reverse(entry));
            } else if let Some(Reverse(weakest)) = heap.peek() {
                if entry > *weakest {
                    heap.pop();
                    heap.push(Reverse(entry));
                }
            }
        }

        let mut hits: Vec<ScoredDoc> = heap
            .into_iter()
            .map(|Reverse((OrderedFloat(score), Reverse(docno)))| ScoredDoc { docno, score })
            .collect();
        hits.sort_by(ScoredDoc::relevance_order);
        Ok(hits)
    }
}
