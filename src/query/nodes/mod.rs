//! Concrete query node implementations
//!
//! This module provides implementations of the `QueryNode` trait for
//! various query types.

mod bool_query;
mod constant_score;
mod match_query;
mod term_query;
mod terms_query;

pub use bool_query::BoolQuery;
pub use constant_score::ConstantScoreQuery;
pub use match_query::MatchQuery;
pub use term_query::TermQuery;
pub use terms_query::TermsQuery;
