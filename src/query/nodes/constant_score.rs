//! Constant score query - wraps a filter and assigns a fixed score

use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::query::types::Explanation;
use crate::Result;
use roaring::RoaringBitmap;

/// Every document matching `filter` scores exactly `boost`
#[derive(Clone, Debug)]
pub struct ConstantScoreQuery {
    pub filter: Box<dyn QueryNode>,
    pub boost: f32,
}

impl ConstantScoreQuery {
    pub fn new(filter: impl QueryNode + 'static) -> Self {
        Self::from_boxed(Box::new(filter))
    }

    pub fn from_boxed(filter: Box<dyn QueryNode>) -> Self {
        Self { filter, boost: 1.0 }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }
}

impl QueryNode for ConstantScoreQuery {
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        self.filter.execute(ctx)
    }

    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64 {
        self.filter.estimate_cost(ctx)
    }

    fn query_type(&self) -> &'static str {
        "constant_score"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<f32> {
        self.filter.score(ctx, docno).map(|_| self.boost)
    }

    fn explain(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<Explanation> {
        self.score(ctx, docno).map(|value| {
            Explanation::new(value, format!("constant score of {} filter", self.filter.query_type()))
        })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}
