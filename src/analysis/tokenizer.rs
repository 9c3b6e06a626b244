use unicode_segmentation::UnicodeSegmentation;

use super::Token;
use crate::error::{AnalyzerComponent, TermdexError};
use crate::Result;

/// Splits filtered text into tokens
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tokenizer {
    /// Unicode word boundaries (UAX #29). Punctuation is dropped, apostrophes
    /// and decimal points inside a word are kept ("can't", "32.3").
    Standard,
    /// Split on whitespace only
    Whitespace,
    /// Emit the whole input as a single token
    Keyword,
    /// Maximal runs of letters
    Letter,
    /// Maximal runs of letters, lowercased
    Lowercase,
}

impl Tokenizer {
    /// Resolve a tokenizer by name
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "standard" => Ok(Tokenizer::Standard),
            "whitespace" => Ok(Tokenizer::Whitespace),
            "keyword" => Ok(Tokenizer::Keyword),
            "letter" => Ok(Tokenizer::Letter),
            "lowercase" => Ok(Tokenizer::Lowercase),
            _ => Err(TermdexError::unknown_component(
                AnalyzerComponent::Tokenizer,
                name,
            )),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tokenizer::Standard => "standard",
            Tokenizer::Whitespace => "whitespace",
            Tokenizer::Keyword => "keyword",
            Tokenizer::Letter => "letter",
            Tokenizer::Lowercase => "lowercase",
        }
    }

    /// Tokenize text, numbering positions from zero
    ///
    /// Offsets are byte offsets into `text`.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let spans: Vec<(usize, &str)> = match self {
            Tokenizer::Standard => text.unicode_word_indices().collect(),
            Tokenizer::Whitespace => split_runs(text, |c| !c.is_whitespace()),
            Tokenizer::Letter | Tokenizer::Lowercase => split_runs(text, char::is_alphabetic),
            Tokenizer::Keyword => {
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![(0, text)]
                }
            }
        };

        let mut tokens: Vec<Token> = spans
            .into_iter()
            .enumerate()
            .map(|(pos, (start, word))| Token::new(word, start, start + word.len(), pos as u32))
            .collect();
        if *self == Tokenizer::Lowercase {
            for token in &mut tokens {
                token.text = token.text.to_lowercase();
            }
        }
        tokens
    }
}

/// Maximal runs of characters satisfying `keep`
fn split_runs(text: &str, keep: impl Fn(char) -> bool) -> Vec<(usize, &str)> {
    let mut runs = Vec::new();
    let mut start = None;

    for (i, c) in text.char_indices() {
        match (keep(c), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, &text[s..i]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, &text[s..]));
    }
    runs
}
