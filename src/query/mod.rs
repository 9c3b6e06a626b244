//! Query DSL and execution engine
//!
//! This module provides a structured query language supporting:
//! - Term queries (exact, unanalyzed match)
//! - Terms queries (any of several exact terms)
//! - Match queries (full-text search through the field's analyzer)
//! - Boolean queries (must, should, must_not, filter)
//! - Constant score queries (fixed score for a filter)
//! - match_all / match_none
//!
//! # Example
//!
//! ```json
//! {
//!   "query": {
//!     "bool": {
//!       "must": [
//!         { "match": { "description": "mouse pad" } }
//!       ],
//!       "filter": [
//!         { "term": { "name": "mouse pad" } }
//!       ]
//!     }
//!   }
//! }
//! ```

pub mod accessor;
pub mod ast;
pub mod context;
pub mod executor;
pub mod nodes;
pub mod parser;
pub mod types;

pub use accessor::{IndexAccessor, TermStats};
pub use ast::{MatchAllQuery, MatchNoneQuery, QueryNode};
pub use context::QueryContext;
pub use executor::{QueryExecutor, QueryResult, ScoredDoc};
pub use nodes::{BoolQuery, ConstantScoreQuery, MatchQuery, TermQuery, TermsQuery};
pub use parser::QueryParser;
pub use types::*;
