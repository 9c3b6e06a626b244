use serde::Serialize;

use super::document::DocumentId;
use crate::error::TermdexError;

/// Why a bulk item was not indexed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkErrorKind {
    /// The document broke the mapping: duplicate id, unmapped or missing required field
    Validation,
    /// The call was cancelled before this document was reached
    Cancelled,
    /// Any other engine error
    Rejected,
}

impl From<&TermdexError> for BulkErrorKind {
    fn from(error: &TermdexError) -> Self {
        match error {
            TermdexError::Validation { .. } => BulkErrorKind::Validation,
            TermdexError::Cancelled => BulkErrorKind::Cancelled,
            _ => BulkErrorKind::Rejected,
        }
    }
}

/// Failure of one bulk item
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BulkError {
    #[serde(rename = "type")]
    pub kind: BulkErrorKind,
    pub reason: String,
}

impl From<&TermdexError> for BulkError {
    fn from(error: &TermdexError) -> Self {
        Self {
            kind: error.into(),
            reason: match error {
                TermdexError::Validation { reason, .. } => reason.clone(),
                other => other.to_string(),
            },
        }
    }
}

/// Outcome of one document in a bulk request
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BulkItem {
    pub id: DocumentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BulkError>,
}

impl BulkItem {
    pub fn indexed(id: DocumentId) -> Self {
        Self { id, error: None }
    }

    pub fn failed(id: DocumentId, error: &TermdexError) -> Self {
        Self {
            id,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_kind(&self) -> Option<BulkErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

/// Per-item results of a bulk indexing call, in request order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BulkResponse {
    pub items: Vec<BulkItem>,
    /// True when at least one item failed
    pub errors: bool,
    /// True when the call stopped early; the remaining items are `Cancelled`
    pub cancelled: bool,
    pub took_us: u64,
}

impl BulkResponse {
    pub fn push(&mut self, item: BulkItem) {
        self.errors |= !item.is_ok();
        self.cancelled |= item.error_kind() == Some(BulkErrorKind::Cancelled);
        self.items.push(item);
    }

    pub fn indexed_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &BulkItem> {
        self.items.iter().filter(|i| !i.is_ok())
    }
}
