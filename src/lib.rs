//! termdex: an in-memory full-text search engine
//!
//! Indices are declared with a strict mapping of keyword and text fields.
//! Text fields run through a configurable analysis pipeline (char filters,
//! tokenizer, token filters); keyword fields are indexed verbatim. Searches
//! combine term, match, bool and constant-score queries with sorting,
//! aggregations and collapsing.
//!
//! ```no_run
//! use termdex::{Document, FieldMapping, IndexMapping, MatchQuery, SearchEngine, SearchRequest};
//!
//! let engine = SearchEngine::default();
//! let products = engine.create_index(
//!     "products",
//!     IndexMapping::new()
//!         .field(FieldMapping::keyword("name"))
//!         .field(FieldMapping::text("description")),
//! )?;
//! engine.index_documents(&products, vec![
//!     Document::new(1).field("name", "mouse").field("description", "A great mouse"),
//! ])?;
//! let response = engine.search(&products, &SearchRequest::new(MatchQuery::new("description", "mouse")))?;
//! assert_eq!(response.total, 1);
//! # Ok::<(), termdex::TermdexError>(())
//! ```

pub mod aggregations;
pub mod analysis;
pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod models;
pub mod query;
pub mod schema;
pub mod sort;

pub use aggregations::{
    AdjacencyMatrixAggregation, Aggregation, AggregationResult, Bucket, CardinalityAggregation,
    TermsAggregation, TopHitsAggregation,
};
pub use analysis::{Analyzer, AnalyzerConfig, AnalyzerRef, StopWords, Token, TokenFilterConfig};
pub use cancel::CancellationToken;
pub use config::{EngineConfig, IndexSettings};
pub use engine::{IndexHandle, SearchEngine};
pub use error::{MappingError, Result, TermdexError};
pub use index::TermVectors;
pub use models::*;
pub use query::{
    BoolQuery, ConstantScoreQuery, Explanation, MatchAllQuery, MatchNoneQuery, MatchOperator,
    MatchQuery, MinimumShouldMatch, QueryNode, QueryParser, TermQuery, TermsQuery,
};
pub use schema::{FieldMapping, FieldType, IndexMapping};
pub use sort::{Script, ScriptSortType, ScriptValue, SortCriterion, SortOrder, SortValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
