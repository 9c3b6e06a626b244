//! Query execution context
//!
//! The `QueryContext` provides access to index data and caching during query execution.

use crate::analysis::Analyzer;
use crate::error::TermdexError;
use crate::index::{DocNo, FieldIndex, PostingList};
use crate::models::Document;
use crate::query::accessor::{IndexAccessor, TermStats};
use crate::schema::FieldType;
use crate::Result;
use parking_lot::RwLock;
use roaring::RoaringBitmap;
use std::collections::HashMap;
use std::sync::Arc;

/// Filter cache for reusing expensive filter computations
pub type FilterCache = RwLock<HashMap<String, RoaringBitmap>>;

/// Query text already run through an analyzer, keyed like the filter cache
pub type TermsCache = RwLock<HashMap<String, Arc<Vec<String>>>>;

/// Query execution context providing access to index data
///
/// This struct is passed to query nodes during execution, giving them
/// access to the postings, the document store and a per-request filter cache.
/// It borrows the index, so it lives for the duration of one read.
pub struct QueryContext<'a> {
    /// Index accessor for posting list lookups
    accessor: &'a dyn IndexAccessor,

    /// Filter result cache (keyed by canonical filter representation)
    filter_cache: FilterCache,

    /// Analyzed query terms, so scoring every candidate reuses one analysis
    terms_cache: TermsCache,
}

impl<'a> QueryContext<'a> {
    /// Create a new query context
    pub fn new(accessor: &'a dyn IndexAccessor) -> Self {
        Self {
            accessor,
            filter_cache: RwLock::new(HashMap::new()),
            terms_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Get total number of documents
    pub fn total_docs(&self) -> u32 {
        self.accessor.total_docs()
    }

    /// Every live document number
    pub fn all_docs(&self) -> RoaringBitmap {
        self.accessor.all_docs()
    }

    /// Mapped type of a field; `UnknownField` when it is not mapped
    pub fn field_type(&self, field: &str) -> Result<&'a FieldType> {
        self.accessor.field_type(field)
    }

    /// Term dictionary of a field
    pub fn field_index(&self, field: &str) -> Option<&'a FieldIndex> {
        self.accessor.field_index(field)
    }

    /// Posting list for a term, if any document holds it
    pub fn postings(&self, field: &str, term: &str) -> Option<&'a PostingList> {
        self.accessor.postings(field, term)
    }

    /// Documents holding a term
    pub fn postings_bitmap(&self, field: &str, term: &str) -> RoaringBitmap {
        self.accessor.postings_bitmap(field, term)
    }

    /// Get term statistics
    pub fn term_stats(&self, field: &str, term: &str) -> TermStats {
        self.accessor.term_stats(field, term)
    }

    /// Frequency of a term in one document
    pub fn term_frequency(&self, field: &str, term: &str, docno: u32) -> Option<u32> {
        self.postings(field, term)?
            .get(DocNo(docno))
            .map(|posting| posting.term_frequency)
    }

    /// Analyzer for query text on a text field
    pub fn search_analyzer(&self, field: &str) -> Result<Arc<Analyzer>> {
        self.accessor.search_analyzer(field).ok_or_else(|| {
            TermdexError::InvalidRequest(format!("field '{}' is not analyzed", field))
        })
    }

    /// Registered analyzer by name
    pub fn analyzer(&self, name: &str) -> Result<Arc<Analyzer>> {
        self.accessor.analyzer(name)
    }

    /// Stored source document
    pub fn document(&self, docno: u32) -> Option<&'a Document> {
        self.accessor.document(DocNo(docno))
    }

    /// Get or compute a cached filter result
    pub fn get_or_cache_filter<F>(
        &self,
        cache_key: &str,
        compute: F,
    ) -> Result<RoaringBitmap>
    where
        F: FnOnce() -> Result<RoaringBitmap>,
    {
        // Check cache first
        if let Some(cached) = self.filter_cache.read().get(cache_key) {
            return Ok(cached.clone());
        }

        // Compute and cache
        let result = compute()?;
        self.filter_cache
            .write()
            .insert(cache_key.to_string(), result.clone());
        Ok(result)
    }

    /// Get or compute the analyzed terms of a query
    pub fn get_or_analyze<F>(&self, cache_key: &str, analyze: F) -> Result<Arc<Vec<String>>>
    where
        F: FnOnce() -> Result<Vec<String>>,
    {
        if let Some(cached) = self.terms_cache.read().get(cache_key) {
            return Ok(Arc::clone(cached));
        }

        let terms = Arc::new(analyze()?);
        self.terms_cache
            .write()
            .insert(cache_key.to_string(), Arc::clone(&terms));
        Ok(terms)
    }

    /// Number of cached filters
    pub fn cached_filters(&self) -> usize {
        self.filter_cache.read().len()
    }

    /// Clear the filter and analyzed terms caches
    pub fn clear_filter_cache(&self) {
        self.filter_cache.write().clear();
        self.terms_cache.write().clear();
    }
}
