//! Inverted index and document store of one search index
//!
//! Keyword fields index their raw value as the only term. Text fields index
//! the output of the field's analyzer. Documents are visible to readers as
//! soon as `add_document` returns.

mod postings;
mod store;
mod types;

pub use postings::{FieldIndex, PostingList};
pub use store::DocumentStore;
pub use types::{DocNo, Posting};

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::analysis::{Analyzer, AnalyzerRegistry};
use crate::config::IndexSettings;
use crate::error::TermdexError;
use crate::models::{Document, DocumentId};
use crate::schema::{FieldType, IndexMapping};
use crate::Result;

/// Term frequencies per field for one document
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TermVectors {
    pub doc_id: DocumentId,
    pub fields: BTreeMap<String, BTreeMap<String, u32>>,
}

impl TermVectors {
    /// Term vector of one field
    pub fn field(&self, name: &str) -> Option<&BTreeMap<String, u32>> {
        self.fields.get(name)
    }
}

/// All indexed state of one index
#[derive(Debug)]
pub struct InvertedIndex {
    mapping: IndexMapping,
    settings: IndexSettings,
    registry: AnalyzerRegistry,
    index_analyzers: HashMap<String, Arc<Analyzer>>,
    search_analyzers: HashMap<String, Arc<Analyzer>>,
    fields: HashMap<String, FieldIndex>,
    store: DocumentStore,
    position_increment_gap: u32,
}

impl InvertedIndex {
    /// Create an empty index, compiling the analyzers every text field needs
    pub fn new(mapping: IndexMapping, settings: IndexSettings, position_increment_gap: u32) -> Result<Self> {
        mapping.validate()?;
        let registry = AnalyzerRegistry::new(&settings.analysis)?;

        let mut index_analyzers = HashMap::new();
        let mut search_analyzers = HashMap::new();
        for field in &mapping.fields {
            if let FieldType::Text {
                analyzer,
                search_analyzer,
            } = &field.field_type
            {
                let index_analyzer = registry.resolve(analyzer)?;
                let search_analyzer = match search_analyzer {
                    Some(reference) => registry.resolve(reference)?,
                    None => index_analyzer.clone(),
                };
                index_analyzers.insert(field.name.clone(), index_analyzer);
                search_analyzers.insert(field.name.clone(), search_analyzer);
            }
        }

        let fields = mapping
            .fields
            .iter()
            .map(|f| (f.name.clone(), FieldIndex::new()))
            .collect();

        Ok(Self {
            mapping,
            settings,
            registry,
            index_analyzers,
            search_analyzers,
            fields,
            store: DocumentStore::new(),
            position_increment_gap,
        })
    }

    pub fn mapping(&self) -> &IndexMapping {
        &self.mapping
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.settings
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn doc_count(&self) -> usize {
        self.store.len()
    }

    /// Field type, failing with `UnknownField` when the field is not mapped
    pub fn field_type(&self, field: &str) -> Result<&FieldType> {
        self.mapping.field_type(field)
    }

    pub fn field_index(&self, field: &str) -> Option<&FieldIndex> {
        self.fields.get(field)
    }

    /// Analyzer used for query text on a text field
    pub fn search_analyzer(&self, field: &str) -> Option<Arc<Analyzer>> {
        self.search_analyzers.get(field).cloned()
    }

    /// Check a document against the mapping without indexing it
    pub fn validate_document(&self, doc: &Document) -> Result<()> {
        let invalid = |reason: String| TermdexError::Validation {
            doc_id: doc.id,
            reason,
        };

        if self.store.contains(doc.id) {
            return Err(invalid("a document with this id already exists".to_string()));
        }

        if self.mapping.dynamic.should_reject_unmapped() {
            if let Some(name) = doc.fields.keys().find(|name| !self.mapping.has_field(name)) {
                return Err(invalid(format!("field '{}' is not mapped", name)));
            }
        }

        for field in self.mapping.fields.iter().filter(|f| f.required) {
            if doc.get(&field.name).map_or(true, |value| value.is_null()) {
                return Err(invalid(format!(
                    "required field '{}' is missing or null",
                    field.name
                )));
            }
        }
        Ok(())
    }

    /// Validate and index a document, taking ownership of it
    pub fn add_document(&mut self, doc: Document) -> Result<DocNo> {
        self.validate_document(&doc)?;
        let docno = self.store.next_docno();

        for field in &self.mapping.fields {
            let values = doc.values(&field.name);
            if values.is_empty() {
                continue;
            }

            let terms = match &field.field_type {
                FieldType::Keyword => keyword_terms(&values),
                FieldType::Text { .. } => match self.index_analyzers.get(&field.name) {
                    Some(analyzer) => text_terms(analyzer, &values, self.position_increment_gap),
                    None => continue,
                },
            };

            if let Some(field_index) = self.fields.get_mut(&field.name) {
                for (term, positions) in terms {
                    field_index.add(term, docno, positions);
                }
            }
        }

        Ok(self.store.insert(doc))
    }

    /// Term frequencies of one document, computed from the postings
    ///
    /// With `field` set only that field is returned, and a document without a
    /// value for it is reported as not found.
    pub fn term_vectors(&self, id: DocumentId, field: Option<&str>) -> Result<TermVectors> {
        let docno = self
            .store
            .docno(id)
            .ok_or(TermdexError::DocumentNotFound(id))?;

        let names: Vec<&str> = match field {
            Some(name) => {
                self.field_type(name)?;
                let has_value = self
                    .fields
                    .get(name)
                    .map_or(false, |f| f.docs().contains(docno.as_u32()));
                if !has_value {
                    return Err(TermdexError::FieldNotFound {
                        doc_id: id,
                        field: name.to_string(),
                    });
                }
                vec![name]
            }
            None => self.mapping.field_names(),
        };

        let mut vectors = TermVectors {
            doc_id: id,
            fields: BTreeMap::new(),
        };
        for name in names {
            if let Some(field_index) = self.fields.get(name) {
                let vector = field_index.term_vector(docno);
                if !vector.is_empty() {
                    vectors.fields.insert(name.to_string(), vector);
                }
            }
        }
        Ok(vectors)
    }
}

/// Keyword values are terms verbatim; the value index is the position
fn keyword_terms(values: &[&str]) -> BTreeMap<String, Vec<u32>> {
    let mut terms: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    for (i, value) in values.iter().enumerate() {
        terms.entry(value.to_string()).or_default().push(i as u32);
    }
    terms
}

/// Analyze every value, separating values by `gap` positions
fn text_terms(analyzer: &Analyzer, values: &[&str], gap: u32) -> BTreeMap<String, Vec<u32>> {
    let mut terms: BTreeMap<String, Vec<u32>> = BTreeMap::new();
    let mut base = 0u32;
    for value in values {
        let tokens = analyzer.analyze(value);
        let mut next_base = base;
        for token in tokens {
            let position = base + token.position;
            next_base = next_base.max(position + 1);
            terms.entry(token.text).or_default().push(position);
        }
        base = next_base + gap;
    }
    terms
}
