use std::fmt;

use thiserror::Error;

use crate::models::DocumentId;

/// Errors raised while declaring an index and its field mappings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("Index already exists: {0}")]
    DuplicateIndex(String),

    #[error("Field declared more than once: {0}")]
    DuplicateField(String),

    #[error("Invalid field kind '{kind}' for field '{field}'")]
    InvalidFieldKind { field: String, kind: String },

    #[error("Invalid mapping: {0}")]
    InvalidMapping(String),
}

/// Kind of analysis component referenced by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerComponent {
    Analyzer,
    CharFilter,
    Tokenizer,
    TokenFilter,
    StopWords,
}

impl fmt::Display for AnalyzerComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalyzerComponent::Analyzer => "analyzer",
            AnalyzerComponent::CharFilter => "char filter",
            AnalyzerComponent::Tokenizer => "tokenizer",
            AnalyzerComponent::TokenFilter => "token filter",
            AnalyzerComponent::StopWords => "stop words preset",
        };
        f.write_str(name)
    }
}

/// Main error type for termdex operations
#[derive(Error, Debug)]
pub enum TermdexError {
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    #[error("Validation failed for document {doc_id}: {reason}")]
    Validation { doc_id: DocumentId, reason: String },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown {kind}: {name}")]
    UnknownAnalyzerComponent {
        kind: AnalyzerComponent,
        name: String,
    },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Field '{field}' not found in document {doc_id}")]
    FieldNotFound { doc_id: DocumentId, field: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for termdex operations
pub type Result<T> = std::result::Result<T, TermdexError>;

impl TermdexError {
    /// Whether this error reports a missing index, document or field
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TermdexError::IndexNotFound(_)
                | TermdexError::DocumentNotFound(_)
                | TermdexError::FieldNotFound { .. }
        )
    }

    pub(crate) fn unknown_component(kind: AnalyzerComponent, name: impl Into<String>) -> Self {
        TermdexError::UnknownAnalyzerComponent {
            kind,
            name: name.into(),
        }
    }
}
