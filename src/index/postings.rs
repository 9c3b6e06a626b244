//! Per-field term dictionary and posting lists

use roaring::RoaringBitmap;
use std::collections::BTreeMap;

use super::types::{DocNo, Posting};

/// Postings of one term, ordered by document number
#[derive(Clone, Debug, Default)]
pub struct PostingList {
    postings: Vec<Posting>,
    docs: RoaringBitmap,
    total_term_frequency: u64,
}

impl PostingList {
    /// Append a posting; documents are indexed in docno order
    fn push(&mut self, posting: Posting) {
        debug_assert!(self
            .postings
            .last()
            .map_or(true, |last| last.docno < posting.docno));
        self.docs.insert(posting.docno.as_u32());
        self.total_term_frequency += posting.term_frequency as u64;
        self.postings.push(posting);
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn docs(&self) -> &RoaringBitmap {
        &self.docs
    }

    pub fn doc_frequency(&self) -> u32 {
        self.postings.len() as u32
    }

    pub fn total_term_frequency(&self) -> u64 {
        self.total_term_frequency
    }

    /// Posting of one document
    pub fn get(&self, docno: DocNo) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&docno, |p| p.docno)
            .ok()
            .map(|i| &self.postings[i])
    }
}

/// Inverted index of a single field
#[derive(Clone, Debug, Default)]
pub struct FieldIndex {
    terms: BTreeMap<String, PostingList>,
    docs: RoaringBitmap,
}

impl FieldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the positions of `term` in document `docno`
    pub fn add(&mut self, term: String, docno: DocNo, positions: Vec<u32>) {
        self.docs.insert(docno.as_u32());
        self.terms
            .entry(term)
            .or_default()
            .push(Posting::with_positions(docno, positions));
    }

    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.terms.get(term)
    }

    /// Terms in byte order with their posting lists
    pub fn terms(&self) -> impl Iterator<Item = (&str, &PostingList)> {
        self.terms.iter().map(|(t, p)| (t.as_str(), p))
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Documents holding at least one term in this field
    pub fn docs(&self) -> &RoaringBitmap {
        &self.docs
    }

    /// Term frequencies of one document, in byte order of the terms
    pub fn term_vector(&self, docno: DocNo) -> BTreeMap<String, u32> {
        self.terms
            .iter()
            .filter(|(_, list)| list.docs().contains(docno.as_u32()))
            .filter_map(|(term, list)| list.get(docno).map(|p| (term.clone(), p.term_frequency)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_index_postings() {
        let mut field = FieldIndex::new();
        field.add("mouse".to_string(), DocNo(0), vec![0]);
        field.add("pad".to_string(), DocNo(0), vec![1]);
        field.add("mouse".to_string(), DocNo(1), vec![0, 3]);

        let mouse = field.postings("mouse").unwrap();
        assert_eq!(mouse.doc_frequency(), 2);
        assert_eq!(mouse.total_term_frequency(), 3);
        assert_eq!(mouse.get(DocNo(1)).unwrap().positions, vec![0, 3]);
        assert!(mouse.get(DocNo(2)).is_none());
        assert_eq!(field.docs().len(), 2);
        assert_eq!(field.term_count(), 2);
    }

    #[test]
    fn test_term_vector_is_sorted() {
        let mut field = FieldIndex::new();
        field.add("sentence".to_string(), DocNo(0), vec![3, 9]);
        field.add("a".to_string(), DocNo(0), vec![2]);
        field.add("other".to_string(), DocNo(1), vec![0]);

        let vector = field.term_vector(DocNo(0));
        let entries: Vec<(&str, u32)> = vector.iter().map(|(t, f)| (t.as_str(), *f)).collect();
        assert_eq!(entries, vec![("a", 1), ("sentence", 2)]);
    }
}
