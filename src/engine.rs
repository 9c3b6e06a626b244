//! Search engine: the registry of indices and the public operations
//!
//! Each index sits behind its own reader/writer lock. Searches, term vectors
//! and analysis take the read side and run concurrently; bulk indexing and
//! index deletion take the write side. Indexed documents are visible to the
//! next read.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::aggregations::{self, AggregationContext};
use crate::analysis::{AnalyzerConfig, Token};
use crate::cancel::{self, CancellationToken};
use crate::config::{EngineConfig, IndexSettings};
use crate::error::{MappingError, TermdexError};
use crate::index::{InvertedIndex, TermVectors};
use crate::models::{BulkItem, BulkResponse, Document, DocumentId, Hit, ScriptFields, SearchRequest, SearchResponse};
use crate::query::{QueryContext, QueryExecutor};
use crate::schema::IndexMapping;
use crate::sort::{self, SortedHit};
use crate::Result;

/// Reference to a created index
///
/// A handle outlives its index: once the index is deleted every operation
/// through the handle fails with `IndexNotFound`, even if an index with the
/// same name is created again.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexHandle {
    name: String,
    id: u64,
}

impl IndexHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct IndexEntry {
    id: u64,
    /// `None` once the index is deleted
    data: RwLock<Option<InvertedIndex>>,
}

/// In-memory search engine owning every index
pub struct SearchEngine {
    config: EngineConfig,
    indices: RwLock<HashMap<String, Arc<IndexEntry>>>,
    next_id: AtomicU64,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SearchEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            indices: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Create an index with default settings
    pub fn create_index(&self, name: &str, mapping: IndexMapping) -> Result<IndexHandle> {
        self.create_index_with_settings(name, mapping, IndexSettings::default())
    }

    /// Create an index, compiling every analyzer its text fields reference
    pub fn create_index_with_settings(
        &self,
        name: &str,
        mapping: IndexMapping,
        settings: IndexSettings,
    ) -> Result<IndexHandle> {
        if name.is_empty() {
            return Err(MappingError::InvalidMapping("index name must not be empty".to_string()).into());
        }

        let mut indices = self.indices.write();
        if indices.contains_key(name) {
            return Err(MappingError::DuplicateIndex(name.to_string()).into());
        }

        let field_count = mapping.fields.len();
        let index = InvertedIndex::new(mapping, settings, self.config.position_increment_gap)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        indices.insert(
            name.to_string(),
            Arc::new(IndexEntry {
                id,
                data: RwLock::new(Some(index)),
            }),
        );

        info!(index = name, fields = field_count, "Created index");
        Ok(IndexHandle {
            name: name.to_string(),
            id,
        })
    }

    /// Delete an index and everything it owns
    ///
    /// Waits for in-flight reads and writes on the index to finish. Calls
    /// that reach the index afterwards fail with `IndexNotFound`.
    pub fn delete_index(&self, handle: &IndexHandle) -> Result<()> {
        let entry = self.entry(handle)?;
        let mut data = entry.data.write();
        if data.take().is_none() {
            return Err(TermdexError::IndexNotFound(handle.name.clone()));
        }

        let mut indices = self.indices.write();
        if indices.get(&handle.name).is_some_and(|e| e.id == handle.id) {
            indices.remove(&handle.name);
        }
        info!(index = %handle.name, "Deleted index");
        Ok(())
    }

    /// Handle of an existing index by name
    pub fn index(&self, name: &str) -> Result<IndexHandle> {
        self.indices
            .read()
            .get(name)
            .map(|entry| IndexHandle {
                name: name.to_string(),
                id: entry.id,
            })
            .ok_or_else(|| TermdexError::IndexNotFound(name.to_string()))
    }

    /// Names of every index, sorted
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.indices.read().keys().cloned().collect();
        names.sort();
        names
    }

    fn entry(&self, handle: &IndexHandle) -> Result<Arc<IndexEntry>> {
        self.indices
            .read()
            .get(&handle.name)
            .filter(|entry| entry.id == handle.id)
            .cloned()
            .ok_or_else(|| TermdexError::IndexNotFound(handle.name.clone()))
    }

    /// Run `f` against the index under its read lock
    fn with_index<R>(&self, handle: &IndexHandle, f: impl FnOnce(&InvertedIndex) -> Result<R>) -> Result<R> {
        let entry = self.entry(handle)?;
        let data = entry.data.read();
        let index = data
            .as_ref()
            .ok_or_else(|| TermdexError::IndexNotFound(handle.name.clone()))?;
        f(index)
    }

    /// Index documents, reporting each one's outcome
    ///
    /// Invalid documents are reported in the response and do not stop the
    /// others; every valid document is searchable when this returns.
    pub fn index_documents(&self, handle: &IndexHandle, docs: Vec<Document>) -> Result<BulkResponse> {
        self.index_documents_with_cancel(handle, docs, None)
    }

    /// Like [`index_documents`](Self::index_documents), checking `cancel`
    /// between documents
    ///
    /// On cancellation the documents indexed so far stay indexed, every
    /// remaining item is reported as `Cancelled` and `cancelled` is set.
    pub fn index_documents_with_cancel(
        &self,
        handle: &IndexHandle,
        docs: Vec<Document>,
        cancel: Option<&CancellationToken>,
    ) -> Result<BulkResponse> {
        let start = Instant::now();
        let entry = self.entry(handle)?;
        let mut data = entry.data.write();
        let index = data
            .as_mut()
            .ok_or_else(|| TermdexError::IndexNotFound(handle.name.clone()))?;

        let mut response = BulkResponse::default();
        for doc in docs {
            let id = doc.id;
            if response.cancelled {
                response.push(BulkItem::failed(id, &TermdexError::Cancelled));
                continue;
            }
            if let Err(e) = cancel::check(cancel) {
                warn!(index = %handle.name, indexed = response.indexed_count(), "Bulk indexing cancelled");
                response.push(BulkItem::failed(id, &e));
                continue;
            }

            match index.add_document(doc) {
                Ok(_) => response.push(BulkItem::indexed(id)),
                Err(e) => {
                    warn!(index = %handle.name, doc_id = id, error = %e, "Rejected document");
                    response.push(BulkItem::failed(id, &e));
                }
            }
        }
        response.took_us = start.elapsed().as_micros() as u64;

        debug!(
            index = %handle.name,
            items = response.items.len(),
            indexed = response.indexed_count(),
            took_us = response.took_us,
            "Bulk indexing finished"
        );
        Ok(response)
    }

    /// Run a registered analyzer of the index over `text`
    pub fn analyze(&self, handle: &IndexHandle, analyzer: &str, text: &str) -> Result<Vec<Token>> {
        self.with_index(handle, |index| Ok(index.registry().get(analyzer)?.analyze(text)))
    }

    /// Run an ad hoc analyzer definition, resolving names against the index settings
    pub fn analyze_with_config(&self, handle: &IndexHandle, config: &AnalyzerConfig, text: &str) -> Result<Vec<Token>> {
        self.with_index(handle, |index| {
            let analyzer = crate::analysis::Analyzer::build(config, &index.settings().analysis)?;
            Ok(analyzer.analyze(text))
        })
    }

    /// Term frequencies of a document, for every field or just `field`
    pub fn term_vectors(&self, handle: &IndexHandle, id: DocumentId, field: Option<&str>) -> Result<TermVectors> {
        self.with_index(handle, |index| index.term_vectors(id, field))
    }

    /// Stored source of a document
    pub fn get_document(&self, handle: &IndexHandle, id: DocumentId) -> Result<Document> {
        self.with_index(handle, |index| {
            index
                .store()
                .by_id(id)
                .cloned()
                .ok_or(TermdexError::DocumentNotFound(id))
        })
    }

    pub fn mapping(&self, handle: &IndexHandle) -> Result<IndexMapping> {
        self.with_index(handle, |index| Ok(index.mapping().clone()))
    }

    pub fn settings(&self, handle: &IndexHandle) -> Result<IndexSettings> {
        self.with_index(handle, |index| Ok(index.settings().clone()))
    }

    pub fn doc_count(&self, handle: &IndexHandle) -> Result<usize> {
        self.with_index(handle, |index| Ok(index.doc_count()))
    }

    /// Search an index
    pub fn search(&self, handle: &IndexHandle, request: &SearchRequest) -> Result<SearchResponse> {
        self.search_with_cancel(handle, request, None)
    }

    /// Search, checking `cancel` between scoring batches and aggregation buckets
    pub fn search_with_cancel(
        &self,
        handle: &IndexHandle,
        request: &SearchRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<SearchResponse> {
        let start = Instant::now();
        let size = request.size.unwrap_or(self.config.default_size);
        let window = request.from.saturating_add(size);
        if window > self.config.max_result_window {
            return Err(TermdexError::InvalidRequest(format!(
                "from + size must be at most {}, got {}",
                self.config.max_result_window, window
            )));
        }

        let entry = self.entry(handle)?;
        let data = entry.data.read();
        let index = data
            .as_ref()
            .ok_or_else(|| TermdexError::IndexNotFound(handle.name.clone()))?;
        let ctx = QueryContext::new(index);

        let top_k = (!request.needs_all_hits()).then_some(window);
        let result = QueryExecutor::execute_with_cancel(request.query.as_ref(), &ctx, top_k, cancel)
            .map_err(|e| log_cancelled(e, &handle.name))?;
        let total = result.total_hits();
        let max_score = result.hits.first().map(|hit| hit.score);

        let actx = AggregationContext::new(&ctx)
            .with_cancel(cancel)
            .with_max_adjacency_filters(self.config.max_adjacency_filters);
        let aggregations = actx
            .run(&request.aggregations, &result.hits)
            .map_err(|e| log_cancelled(e, &handle.name))?;

        let mut sorted = sort::sort_hits(&ctx, result.hits, &request.sort)?;
        if let Some(field) = &request.collapse {
            sorted = aggregations::collapse(&actx, sorted, field)?;
        }

        let hits: Vec<Hit> = sorted
            .into_iter()
            .skip(request.from)
            .take(size)
            .filter_map(|sorted| build_hit(&ctx, request, sorted))
            .collect();

        let took_us = start.elapsed().as_micros() as u64;
        debug!(
            index = %handle.name,
            query = request.query.query_type(),
            total,
            returned = hits.len(),
            took_us,
            "Search finished"
        );

        Ok(SearchResponse {
            total,
            max_score,
            hits,
            aggregations,
            took_us,
        })
    }
}

fn build_hit(ctx: &QueryContext<'_>, request: &SearchRequest, sorted: SortedHit) -> Option<Hit> {
    let docno = sorted.hit.docno;
    let doc = ctx.document(docno)?;

    let mut fields = ScriptFields::new();
    for (name, script) in &request.script_fields {
        fields.insert(name.clone(), script.evaluate(doc));
    }

    let mut hit = Hit::new(doc.clone(), sorted.hit.score).with_sort(sorted.sort);
    hit.fields = fields;
    if request.explain {
        hit.explanation = request.query.explain(ctx, docno);
    }
    Some(hit)
}

fn log_cancelled(e: TermdexError, index: &str) -> TermdexError {
    if matches!(e, TermdexError::Cancelled) {
        warn!(index = %index, "Search cancelled");
    }
    e
}
