use super::{hit_bitmap, AggregationContext, AggregationResult};
use crate::query::ScoredDoc;
use crate::Result;

/// Exact number of distinct keyword values among the matched documents
#[derive(Clone, Debug)]
pub struct CardinalityAggregation {
    pub field: String,
}

impl CardinalityAggregation {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    pub(crate) fn compute(&self, actx: &AggregationContext<'_, '_>, hits: &[ScoredDoc]) -> Result<AggregationResult> {
        actx.aggregatable_field(&self.field, "cardinality aggregation")?;
        let matched = hit_bitmap(hits);

        let value = actx
            .query
            .field_index(&self.field)
            .map(|field_index| {
                field_index
                    .terms()
                    .filter(|(_, postings)| !postings.docs().is_disjoint(&matched))
                    .count() as u64
            })
            .unwrap_or(0);

        Ok(AggregationResult::Value { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexSettings;
    use crate::index::InvertedIndex;
    use crate::models::Document;
    use crate::query::QueryContext;
    use crate::schema::{FieldMapping, IndexMapping};

    #[test]
    fn test_cardinality() {
        let mapping = IndexMapping::new().field(FieldMapping::keyword("name"));
        let mut index = InvertedIndex::new(mapping, IndexSettings::default(), 100).unwrap();
        for (id, name) in [(1, "mouse"), (2, "mouse pad"), (3, "mouse"), (4, "keyboard")] {
            index.add_document(Document::new(id).field("name", name)).unwrap();
        }
        let ctx = QueryContext::new(&index);
        let actx = AggregationContext::new(&ctx);

        let hits: Vec<ScoredDoc> = (0..3).map(|docno| ScoredDoc { docno, score: 1.0 }).collect();
        let result = CardinalityAggregation::new("name").compute(&actx, &hits).unwrap();
        assert_eq!(result.value(), Some(2));

        let result = CardinalityAggregation::new("name").compute(&actx, &[]).unwrap();
        assert_eq!(result.value(), Some(0));
    }
}
