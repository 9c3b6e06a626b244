use roaring::RoaringBitmap;

use super::{hit_bitmap, hits_in, AggregationContext, AggregationResult, Aggregations, Bucket};
use crate::query::ScoredDoc;
use crate::Result;

/// One bucket per distinct keyword value among the matched documents
///
/// Buckets are ordered by descending document count, ties by ascending key,
/// and truncated to `size`.
#[derive(Clone, Debug)]
pub struct TermsAggregation {
    pub field: String,
    pub size: usize,
    pub sub_aggregations: Aggregations,
}

impl TermsAggregation {
    pub const DEFAULT_SIZE: usize = 10;

    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            size: Self::DEFAULT_SIZE,
            sub_aggregations: Aggregations::new(),
        }
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn sub_aggregation(mut self, name: impl Into<String>, agg: impl Into<super::Aggregation>) -> Self {
        self.sub_aggregations.insert(name.into(), agg.into());
        self
    }

    pub(crate) fn compute(&self, actx: &AggregationContext<'_, '_>, hits: &[ScoredDoc]) -> Result<AggregationResult> {
        actx.aggregatable_field(&self.field, "terms aggregation")?;
        let matched = hit_bitmap(hits);

        // Term dictionary iterates in key order, so the stable sort keeps ties by key
        let mut counts: Vec<(&str, RoaringBitmap)> = Vec::new();
        if let Some(field_index) = actx.query.field_index(&self.field) {
            for (term, postings) in field_index.terms() {
                let docs = postings.docs() & &matched;
                if !docs.is_empty() {
                    counts.push((term, docs));
                }
            }
        }
        counts.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        counts.truncate(self.size);

        let mut buckets = Vec::with_capacity(counts.len());
        for (key, docs) in counts {
            actx.check_cancelled()?;
            let mut bucket = Bucket::new(key, docs.len());
            if !self.sub_aggregations.is_empty() {
                bucket.sub_aggregations = actx.run(&self.sub_aggregations, &hits_in(hits, &docs))?;
            }
            buckets.push(bucket);
        }

        Ok(AggregationResult::Buckets { buckets })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregations::CardinalityAggregation;
    use crate::config::IndexSettings;
    use crate::index::InvertedIndex;
    use crate::models::Document;
    use crate::query::QueryContext;
    use crate::schema::{FieldMapping, IndexMapping};
    use crate::TermdexError;

    fn create_test_index() -> InvertedIndex {
        let mapping = IndexMapping::new()
            .field(FieldMapping::keyword("name"))
            .field(FieldMapping::keyword("color"))
            .field(FieldMapping::text("description"));
        let mut index = InvertedIndex::new(mapping, IndexSettings::default(), 100).unwrap();
        let docs = [
            (1, "mouse", "red"),
            (2, "mouse pad", "red"),
            (3, "mouse", "blue"),
            (4, "mouse", "red"),
            (5, "mouse pad", "green"),
            (6, "keyboard", "red"),
        ];
        for (id, name, color) in docs {
            index
                .add_document(Document::new(id).field("name", name).field("color", color))
                .unwrap();
        }
        index
    }

    fn all_hits(index: &InvertedIndex) -> Vec<ScoredDoc> {
        (0..index.doc_count() as u32)
            .map(|docno| ScoredDoc { docno, score: 1.0 })
            .collect()
    }

    fn bucket_pairs(result: &AggregationResult) -> Vec<(String, u64)> {
        result
            .buckets()
            .unwrap()
            .iter()
            .map(|b| (b.key.clone(), b.doc_count))
            .collect()
    }

    #[test]
    fn test_terms_counts_and_order() {
        let index = create_test_index();
        let ctx = QueryContext::new(&index);
        let actx = AggregationContext::new(&ctx);

        let result = TermsAggregation::new("name").compute(&actx, &all_hits(&index)).unwrap();
        assert_eq!(
            bucket_pairs(&result),
            vec![
                ("mouse".to_string(), 3),
                ("mouse pad".to_string(), 2),
                ("keyboard".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_terms_only_counts_matched_documents() {
        let index = create_test_index();
        let ctx = QueryContext::new(&index);
        let actx = AggregationContext::new(&ctx);
        let hits: Vec<ScoredDoc> = all_hits(&index).into_iter().filter(|h| h.docno < 2).collect();

        let result = TermsAggregation::new("name").compute(&actx, &hits).unwrap();
        assert_eq!(
            bucket_pairs(&result),
            vec![("mouse".to_string(), 1), ("mouse pad".to_string(), 1)]
        );
    }

    #[test]
    fn test_terms_size_and_sub_aggregations() {
        let index = create_test_index();
        let ctx = QueryContext::new(&index);
        let actx = AggregationContext::new(&ctx);

        let agg = TermsAggregation::new("name")
            .with_size(1)
            .sub_aggregation("colors", CardinalityAggregation::new("color"));
        let result = agg.compute(&actx, &all_hits(&index)).unwrap();

        let buckets = result.buckets().unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].sub_aggregation("colors").unwrap().value(), Some(2));
    }

    #[test]
    fn test_terms_rejects_text_and_unmapped_fields() {
        let index = create_test_index();
        let ctx = QueryContext::new(&index);
        let actx = AggregationContext::new(&ctx);
        let hits = all_hits(&index);

        assert!(matches!(
            TermsAggregation::new("description").compute(&actx, &hits),
            Err(TermdexError::InvalidRequest(_))
        ));
        assert!(matches!(
            TermsAggregation::new("price").compute(&actx, &hits),
            Err(TermdexError::UnknownField(_))
        ));
    }
}
