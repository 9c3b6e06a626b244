pub mod bulk;
pub mod document;
pub mod search;

pub use bulk::{BulkError, BulkErrorKind, BulkItem, BulkResponse};
pub use document::{Document, DocumentId, FieldValue};
pub use search::{Hit, ScriptFields, SearchRequest, SearchResponse};
