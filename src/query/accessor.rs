//! Index accessor for query execution
//!
//! Provides abstraction over the inverted index for query node execution.

use roaring::RoaringBitmap;
use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::index::{DocNo, FieldIndex, InvertedIndex, PostingList};
use crate::models::Document;
use crate::schema::FieldType;
use crate::Result;

/// Per-term statistics
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TermStats {
    /// Number of documents containing this term
    pub doc_frequency: u32,
    /// Total occurrences of this term across all documents
    pub total_term_frequency: u64,
}

/// Trait for accessing posting lists and documents from an index
pub trait IndexAccessor: Send + Sync {
    /// Mapped type of a field; `UnknownField` when the field is not mapped
    fn field_type(&self, field: &str) -> Result<&FieldType>;

    /// Every term of a field with its postings
    fn field_index(&self, field: &str) -> Option<&FieldIndex>;

    /// Posting list of a term in a field
    fn postings(&self, field: &str, term: &str) -> Option<&PostingList> {
        self.field_index(field)?.postings(term)
    }

    /// Get term statistics (df, ttf)
    fn term_stats(&self, field: &str, term: &str) -> TermStats {
        self.postings(field, term)
            .map(|list| TermStats {
                doc_frequency: list.doc_frequency(),
                total_term_frequency: list.total_term_frequency(),
            })
            .unwrap_or_default()
    }

    /// Get postings as bitmap for set operations
    fn postings_bitmap(&self, field: &str, term: &str) -> RoaringBitmap {
        self.postings(field, term)
            .map(|list| list.docs().clone())
            .unwrap_or_default()
    }

    /// Analyzer applied to query text on a text field
    fn search_analyzer(&self, field: &str) -> Option<Arc<Analyzer>>;

    /// Registered analyzer by name
    fn analyzer(&self, name: &str) -> Result<Arc<Analyzer>>;

    /// Every document number in the index
    fn all_docs(&self) -> RoaringBitmap;

    /// Global statistics: total document count
    fn total_docs(&self) -> u32;

    /// Stored source document
    fn document(&self, docno: DocNo) -> Option<&Document>;
}

impl IndexAccessor for InvertedIndex {
    fn field_type(&self, field: &str) -> Result<&FieldType> {
        InvertedIndex::field_type(self, field)
    }

    fn field_index(&self, field: &str) -> Option<&FieldIndex> {
        InvertedIndex::field_index(self, field)
    }

    fn search_analyzer(&self, field: &str) -> Option<Arc<Analyzer>> {
        InvertedIndex::search_analyzer(self, field)
    }

    fn analyzer(&self, name: &str) -> Result<Arc<Analyzer>> {
        self.registry().get(name)
    }

    fn all_docs(&self) -> RoaringBitmap {
        self.store().all_docs().clone()
    }

    fn total_docs(&self) -> u32 {
        self.doc_count() as u32
    }

    fn document(&self, docno: DocNo) -> Option<&Document> {
        self.store().get(docno)
    }
}
