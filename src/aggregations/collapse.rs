use std::collections::HashSet;

use super::AggregationContext;
use crate::sort::SortedHit;
use crate::Result;

/// Keep the first hit of each group of equal `field` values
///
/// The hits keep their order. Documents without a value form one group;
/// multi-valued documents are grouped by their first value.
pub fn collapse(actx: &AggregationContext<'_, '_>, hits: Vec<SortedHit>, field: &str) -> Result<Vec<SortedHit>> {
    actx.aggregatable_field(field, "collapse")?;

    let mut seen: HashSet<Option<&str>> = HashSet::new();
    let mut collapsed = Vec::new();
    for hit in hits {
        let key = actx
            .query
            .document(hit.hit.docno)
            .and_then(|doc| doc.first_value(field));
        if seen.insert(key) {
            collapsed.push(hit);
        }
    }
    Ok(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexSettings;
    use crate::index::InvertedIndex;
    use crate::models::Document;
    use crate::query::{QueryContext, ScoredDoc};
    use crate::schema::{FieldMapping, IndexMapping};
    use crate::TermdexError;

    #[test]
    fn test_collapse_keeps_first_per_group() {
        let mapping = IndexMapping::new()
            .field(FieldMapping::keyword("name"))
            .field(FieldMapping::text("description"));
        let mut index = InvertedIndex::new(mapping, IndexSettings::default(), 100).unwrap();
        for (id, name) in [(1, Some("mouse")), (2, None), (3, Some("mouse pad")), (4, Some("mouse")), (5, None)] {
            let doc = match name {
                Some(name) => Document::new(id).field("name", name),
                None => Document::new(id),
            };
            index.add_document(doc).unwrap();
        }
        let ctx = QueryContext::new(&index);
        let actx = AggregationContext::new(&ctx);

        let hits: Vec<SortedHit> = [3u32, 2, 0, 1, 4]
            .into_iter()
            .map(|docno| SortedHit {
                hit: ScoredDoc { docno, score: 1.0 },
                sort: Vec::new(),
            })
            .collect();
        let collapsed = collapse(&actx, hits.clone(), "name").unwrap();
        let docnos: Vec<u32> = collapsed.iter().map(|h| h.hit.docno).collect();
        assert_eq!(docnos, vec![3, 2, 1]);

        assert!(matches!(
            collapse(&actx, hits, "description"),
            Err(TermdexError::InvalidRequest(_))
        ));
    }
}
