//! Token filters

use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use stop_words::{get, LANGUAGE};

use super::Token;
use crate::error::{AnalyzerComponent, TermdexError};
use crate::Result;

/// The `_english_` stop set
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is",
    "it", "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there",
    "these", "they", "this", "to", "was", "will", "with",
];

/// Load a named stop word preset such as `_english_`
pub fn stop_word_preset(name: &str) -> Result<HashSet<String>> {
    let language = match name {
        "_english_" => {
            return Ok(ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect());
        }
        "_none_" => return Ok(HashSet::new()),
        "_french_" => LANGUAGE::French,
        "_german_" => LANGUAGE::German,
        "_spanish_" => LANGUAGE::Spanish,
        "_italian_" => LANGUAGE::Italian,
        "_portuguese_" => LANGUAGE::Portuguese,
        "_dutch_" => LANGUAGE::Dutch,
        "_russian_" => LANGUAGE::Russian,
        _ => {
            return Err(TermdexError::unknown_component(
                AnalyzerComponent::StopWords,
                name,
            ))
        }
    };
    Ok(get(language).into_iter().map(|s| s.to_lowercase()).collect())
}

/// Snowball stemmer language
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StemLanguage {
    English,
    French,
    German,
    Spanish,
    Italian,
    Portuguese,
    Dutch,
    Russian,
}

impl StemLanguage {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "english" | "porter" => Ok(StemLanguage::English),
            "french" => Ok(StemLanguage::French),
            "german" => Ok(StemLanguage::German),
            "spanish" => Ok(StemLanguage::Spanish),
            "italian" => Ok(StemLanguage::Italian),
            "portuguese" => Ok(StemLanguage::Portuguese),
            "dutch" => Ok(StemLanguage::Dutch),
            "russian" => Ok(StemLanguage::Russian),
            _ => Err(TermdexError::unknown_component(
                AnalyzerComponent::TokenFilter,
                format!("stemmer/{}", name),
            )),
        }
    }

    fn algorithm(self) -> Algorithm {
        match self {
            StemLanguage::English => Algorithm::English,
            StemLanguage::French => Algorithm::French,
            StemLanguage::German => Algorithm::German,
            StemLanguage::Spanish => Algorithm::Spanish,
            StemLanguage::Italian => Algorithm::Italian,
            StemLanguage::Portuguese => Algorithm::Portuguese,
            StemLanguage::Dutch => Algorithm::Dutch,
            StemLanguage::Russian => Algorithm::Russian,
        }
    }
}

/// Compiled token filter
#[derive(Clone, Debug, PartialEq)]
pub enum TokenFilter {
    Lowercase,
    Uppercase,
    /// Drop tokens whose lowercase form is in the set. Positions of the
    /// remaining tokens are left untouched, so removals leave gaps.
    Stop(HashSet<String>),
    /// Split tokens longer than N characters into N-character chunks
    MaxTokenLength(usize),
    Stemmer(StemLanguage),
}

impl TokenFilter {
    /// Resolve a built-in token filter name
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "lowercase" => Some(TokenFilter::Lowercase),
            "uppercase" => Some(TokenFilter::Uppercase),
            "stop" => Some(TokenFilter::Stop(
                ENGLISH_STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            )),
            "porter_stem" | "stemmer" => Some(TokenFilter::Stemmer(StemLanguage::English)),
            _ => None,
        }
    }

    pub fn max_token_length(max: usize) -> Result<Self> {
        if max == 0 {
            return Err(TermdexError::InvalidRequest(
                "max_token_length must be greater than zero".to_string(),
            ));
        }
        Ok(TokenFilter::MaxTokenLength(max))
    }

    /// Apply this filter to a token stream
    pub fn apply(&self, tokens: Vec<Token>) -> Vec<Token> {
        match self {
            TokenFilter::Lowercase => tokens
                .into_iter()
                .map(|mut t| {
                    t.text = t.text.to_lowercase();
                    t
                })
                .collect(),
            TokenFilter::Uppercase => tokens
                .into_iter()
                .map(|mut t| {
                    t.text = t.text.to_uppercase();
                    t
                })
                .collect(),
            TokenFilter::Stop(words) => tokens
                .into_iter()
                .filter(|t| !words.contains(&t.text.to_lowercase()))
                .collect(),
            TokenFilter::MaxTokenLength(max) => split_long_tokens(tokens, *max),
            TokenFilter::Stemmer(language) => {
                let stemmer = Stemmer::create(language.algorithm());
                tokens
                    .into_iter()
                    .map(|mut t| {
                        t.text = stemmer.stem(&t.text).into_owned();
                        t
                    })
                    .collect()
            }
        }
    }
}

/// Chunk long tokens, giving every chunk its own position
fn split_long_tokens(tokens: Vec<Token>, max: usize) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut shift = 0u32;

    for token in tokens {
        let position = token.position + shift;
        if token.text.chars().count() <= max {
            out.push(Token { position, ..token });
            continue;
        }

        let boundaries: Vec<usize> = token
            .text
            .char_indices()
            .map(|(i, _)| i)
            .step_by(max)
            .chain(std::iter::once(token.text.len()))
            .collect();

        for (n, pair) in boundaries.windows(2).enumerate() {
            let start = (token.start_offset + pair[0]).min(token.end_offset);
            let end = (token.start_offset + pair[1]).min(token.end_offset);
            out.push(Token::new(&token.text[pair[0]..pair[1]], start, end, position + n as u32));
        }
        shift += (boundaries.len() - 2) as u32;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Tokenizer;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_lowercase() {
        let tokens = TokenFilter::Lowercase.apply(Tokenizer::Standard.tokenize("GREAT Product"));
        assert_eq!(texts(&tokens), vec!["great", "product"]);
    }

    #[test]
    fn test_stop_leaves_position_gaps() {
        let stop = TokenFilter::Stop(["this", "is", "a"].iter().map(|s| s.to_string()).collect());
        let tokens = stop.apply(Tokenizer::Standard.tokenize("This is a GREAT product!"));
        assert_eq!(texts(&tokens), vec!["GREAT", "product"]);
        assert_eq!(tokens[0].position, 3);
        assert_eq!(tokens[1].position, 4);
    }

    #[test]
    fn test_english_preset() {
        let words = stop_word_preset("_english_").unwrap();
        assert_eq!(words.len(), 33);
        assert!(words.contains("this"));
        assert!(!words.contains("great"));
        assert!(stop_word_preset("_klingon_").is_err());
    }

    #[test]
    fn test_french_preset_from_word_lists() {
        let words = stop_word_preset("_french_").unwrap();
        assert!(words.contains("le"));
    }

    #[test]
    fn test_max_token_length_splits_into_chunks() {
        let tokens = TokenFilter::MaxTokenLength(3).apply(TokenFilter::Lowercase.apply(
            Tokenizer::Standard.tokenize("GREAT product!"),
        ));
        assert_eq!(texts(&tokens), vec!["gre", "at", "pro", "duc", "t"]);
        let positions: Vec<u32> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 1, 2, 3, 4]);
        assert_eq!((tokens[3].start_offset, tokens[3].end_offset), (9, 12));
    }

    #[test]
    fn test_max_token_length_keeps_short_tokens() {
        let tokens = TokenFilter::MaxTokenLength(5).apply(Tokenizer::Standard.tokenize("great product"));
        assert_eq!(texts(&tokens), vec!["great", "produ", "ct"]);
    }

    #[test]
    fn test_max_token_length_rejects_zero() {
        assert!(TokenFilter::max_token_length(0).is_err());
    }

    #[test]
    fn test_stemmer() {
        let tokens = TokenFilter::Stemmer(StemLanguage::English)
            .apply(Tokenizer::Standard.tokenize("running products"));
        assert_eq!(texts(&tokens), vec!["run", "product"]);
    }
}
