//! Core types for the query system

use serde::{Deserialize, Serialize};

/// Operator for combining analyzed terms in a match query
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOperator {
    /// All terms must match (AND)
    And,
    /// At least one term must match (OR)
    #[default]
    Or,
}

impl MatchOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchOperator::And => "and",
            MatchOperator::Or => "or",
        }
    }
}

/// Query execution statistics
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Number of documents matched
    pub docs_matched: u64,
    /// Query execution time in microseconds
    pub execution_time_us: u64,
}

/// Minimum should match configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MinimumShouldMatch {
    /// Exact count
    Count(usize),
    /// Percentage (e.g., "75%")
    Percentage(String),
}

impl MinimumShouldMatch {
    /// Calculate the minimum number of clauses that should match
    pub fn calculate(&self, total_clauses: usize) -> usize {
        match self {
            MinimumShouldMatch::Count(n) => (*n).min(total_clauses),
            MinimumShouldMatch::Percentage(s) => {
                let pct: f64 = s
                    .trim_end_matches('%')
                    .parse()
                    .unwrap_or(100.0)
                    / 100.0;
                ((total_clauses as f64) * pct).ceil() as usize
            }
        }
    }
}

impl Default for MinimumShouldMatch {
    fn default() -> Self {
        MinimumShouldMatch::Count(1)
    }
}

/// Score explanation tree attached to hits when `explain` is requested
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub value: f32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Explanation>,
}

impl Explanation {
    pub fn new(value: f32, description: impl Into<String>) -> Self {
        Self {
            value,
            description: description.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<Explanation>) -> Self {
        self.details = details;
        self
    }
}
