//! Term query - exact match on a field

use crate::query::ast::QueryNode;
use crate::query::context::QueryContext;
use crate::query::types::Explanation;
use crate::Result;
use roaring::RoaringBitmap;
use serde::{Deserialize, Serialize};

/// Query that matches documents containing an exact term in a field
///
/// This is the most basic query type - it looks up the term in the inverted
/// index and returns the posting list as a bitmap. The term is never analyzed:
/// on a keyword field it must equal the whole raw value, and on a text field it
/// must equal one analyzed token ("Mouse pad" never matches a text field).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TermQuery {
    /// Field to search in
    pub field: String,
    /// Exact term to match
    pub term: String,
    /// Boost factor for scoring
    #[serde(default = "default_boost")]
    pub boost: f32,
}

fn default_boost() -> f32 {
    1.0
}

impl TermQuery {
    /// Create a new term query
    pub fn new(field: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            term: term.into(),
            boost: 1.0,
        }
    }

    /// Set the boost factor
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Get the cache key for this term
    pub fn cache_key(&self) -> String {
        ["term", self.field.as_str(), self.term.as_str()].join("\u{1f}")
    }
}

impl QueryNode for TermQuery {
    fn execute(&self, ctx: &QueryContext<'_>) -> Result<RoaringBitmap> {
        ctx.field_type(&self.field)?;
        ctx.get_or_cache_filter(&self.cache_key(), || {
            Ok(ctx.postings_bitmap(&self.field, &self.term))
        })
    }

    fn estimate_cost(&self, ctx: &QueryContext<'_>) -> f64 {
        ctx.term_stats(&self.field, &self.term).doc_frequency as f64
    }

    fn query_type(&self) -> &'static str {
        "term"
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn score(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<f32> {
        ctx.term_frequency(&self.field, &self.term, docno)
            .map(|_| self.boost)
    }

    fn explain(&self, ctx: &QueryContext<'_>, docno: u32) -> Option<Explanation> {
        self.score(ctx, docno).map(|value| {
            Explanation::new(value, format!("term {}:{}", self.field, self.term))
        })
    }

    fn clone_box(&self) -> Box<dyn QueryNode> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexSettings;
    use crate::index::InvertedIndex;
    use crate::models::Document;
    use crate::schema::{FieldMapping, IndexMapping};
    use crate::TermdexError;

    fn create_test_index() -> InvertedIndex {
        let mapping = IndexMapping::new()
            .field(FieldMapping::keyword("name"))
            .field(FieldMapping::text("description"));
        let mut index = InvertedIndex::new(mapping, IndexSettings::default(), 100).unwrap();
        index
            .add_document(Document::new(1).field("name", "mouse").field("description", "Mouse pad"))
            .unwrap();
        index
            .add_document(Document::new(2).field("name", "mouse pad").field("description", "mouse"))
            .unwrap();
        index
    }

    #[test]
    fn test_term_query_creation() {
        let query = TermQuery::new("name", "mouse").with_boost(2.5);
        assert_eq!(query.field, "name");
        assert_eq!(query.term, "mouse");
        assert_eq!(query.boost, 2.5);
        assert_eq!(query.cache_key(), "term\u{1f}name\u{1f}mouse");
        assert_ne!(
            TermQuery::new("a:b", "c").cache_key(),
            TermQuery::new("a", "b:c").cache_key()
        );
    }

    #[test]
    fn test_keyword_term_is_exact() {
        let index = create_test_index();
        let ctx = QueryContext::new(&index);

        let result = TermQuery::new("name", "mouse").execute(&ctx).unwrap();
        assert_eq!(result.iter().collect::<Vec<_>>(), vec![0]);

        let result = TermQuery::new("name", "Mouse").execute(&ctx).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_text_term_is_not_analyzed() {
        let index = create_test_index();
        let ctx = QueryContext::new(&index);

        assert!(TermQuery::new("description", "Mouse pad")
            .execute(&ctx)
            .unwrap()
            .is_empty());
        assert_eq!(
            TermQuery::new("description", "mouse").execute(&ctx).unwrap().len(),
            2
        );
    }

    #[test]
    fn test_term_query_score() {
        let index = create_test_index();
        let ctx = QueryContext::new(&index);
        let query = TermQuery::new("name", "mouse pad");
        assert_eq!(query.score(&ctx, 1), Some(1.0));
        assert_eq!(query.score(&ctx, 0), None);
    }

    #[test]
    fn test_unknown_field() {
        let index = create_test_index();
        let ctx = QueryContext::new(&index);
        assert!(matches!(
            TermQuery::new("price", "1").execute(&ctx),
            Err(TermdexError::UnknownField(_))
        ));
    }
}
