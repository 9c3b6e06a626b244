//! Text analysis pipeline
//!
//! Raw field text flows through three stages:
//! - character filters rewrite the raw text (markup stripping, pattern replacement)
//! - a tokenizer splits the filtered text into tokens
//! - token filters transform the token stream in declared order
//!
//! Token offsets always point into the raw text, before any character filter ran.

mod analyzer;
mod char_filter;
mod filter;
mod registry;
mod tokenizer;

pub use analyzer::{Analyzer, AnalyzerConfig, AnalyzerRef, StopWords, TokenFilterConfig, TokenFilterSpec};
pub use char_filter::{CharFilter, CharFilterConfig, FilteredText};
pub use filter::{StemLanguage, TokenFilter, ENGLISH_STOP_WORDS};
pub use registry::AnalyzerRegistry;
pub use tokenizer::Tokenizer;

use crate::config::AnalysisSettings;
use crate::Result;
use serde::{Deserialize, Serialize};

/// A unit of text produced by the analysis pipeline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Term text after all token filters
    #[serde(rename = "token")]
    pub text: String,
    /// Byte offset of the first byte in the raw input
    pub start_offset: usize,
    /// Byte offset one past the last byte in the raw input
    pub end_offset: usize,
    /// Position in the token stream; removed tokens leave gaps
    pub position: u32,
}

impl Token {
    pub fn new(text: impl Into<String>, start_offset: usize, end_offset: usize, position: u32) -> Self {
        Self {
            text: text.into(),
            start_offset,
            end_offset,
            position,
        }
    }
}

/// Analyze `text` with a standalone analyzer configuration
///
/// Only built-in component names can be referenced; use an
/// [`AnalyzerRegistry`] to resolve names declared in index settings.
pub fn analyze(config: &AnalyzerConfig, text: &str) -> Result<Vec<Token>> {
    let analyzer = Analyzer::build(config, &AnalysisSettings::default())?;
    Ok(analyzer.analyze(text))
}
