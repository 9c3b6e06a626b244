use super::{AggregationContext, AggregationResult};
use crate::models::Hit;
use crate::query::ScoredDoc;
use crate::sort::{self, SortCriterion};
use crate::Result;

/// Best `size` documents of the bucket, by `sort` or by relevance
#[derive(Clone, Debug)]
pub struct TopHitsAggregation {
    pub sort: Vec<SortCriterion>,
    pub size: usize,
}

impl Default for TopHitsAggregation {
    fn default() -> Self {
        Self {
            sort: Vec::new(),
            size: Self::DEFAULT_SIZE,
        }
    }
}

impl TopHitsAggregation {
    pub const DEFAULT_SIZE: usize = 3;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn sort(mut self, criterion: SortCriterion) -> Self {
        self.sort.push(criterion);
        self
    }

    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub(crate) fn compute(&self, actx: &AggregationContext<'_, '_>, hits: &[ScoredDoc]) -> Result<AggregationResult> {
        let total = hits.len() as u64;
        let sorted = sort::sort_hits(actx.query, hits.to_vec(), &self.sort)?;

        let hits = sorted
            .into_iter()
            .take(self.size)
            .filter_map(|sorted| {
                actx.query
                    .document(sorted.hit.docno)
                    .map(|doc| Hit::new(doc.clone(), sorted.hit.score).with_sort(sorted.sort))
            })
            .collect();

        Ok(AggregationResult::Hits { total, hits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregations::TermsAggregation;
    use crate::config::IndexSettings;
    use crate::index::InvertedIndex;
    use crate::models::Document;
    use crate::query::QueryContext;
    use crate::schema::{FieldMapping, IndexMapping};
    use crate::sort::SortOrder;

    fn create_test_index() -> InvertedIndex {
        let mapping = IndexMapping::new().field(FieldMapping::keyword("name"));
        let mut index = InvertedIndex::new(mapping, IndexSettings::default(), 100).unwrap();
        for (id, name) in [(1, "mouse"), (2, "mouse pad"), (3, "mouse"), (4, "mouse"), (5, "mouse pad")] {
            index.add_document(Document::new(id).field("name", name)).unwrap();
        }
        index
    }

    fn all_hits(index: &InvertedIndex) -> Vec<ScoredDoc> {
        (0..index.doc_count() as u32)
            .map(|docno| ScoredDoc { docno, score: 1.0 })
            .collect()
    }

    #[test]
    fn test_top_hits_by_relevance() {
        let index = create_test_index();
        let ctx = QueryContext::new(&index);
        let actx = AggregationContext::new(&ctx);

        let result = TopHitsAggregation::new().compute(&actx, &all_hits(&index)).unwrap();
        let ids: Vec<u64> = result.hits().unwrap().iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_highest_id_per_term_bucket() {
        let index = create_test_index();
        let ctx = QueryContext::new(&index);
        let actx = AggregationContext::new(&ctx);

        let agg = TermsAggregation::new("name").sub_aggregation(
            "latest",
            TopHitsAggregation::new().sort(SortCriterion::id(SortOrder::Desc)).with_size(1),
        );
        let result = agg.compute(&actx, &all_hits(&index)).unwrap();

        let summary: Vec<String> = result
            .buckets()
            .unwrap()
            .iter()
            .map(|bucket| {
                let hit = &bucket.sub_aggregation("latest").unwrap().hits().unwrap()[0];
                format!("{}:{}", hit.id, hit.source.first_value("name").unwrap())
            })
            .collect();
        assert_eq!(summary, vec!["4:mouse", "5:mouse pad"]);
    }
}
