//! Analyzer configuration and the compiled analyzer pipeline

use serde::{Deserialize, Serialize};

use super::char_filter::{CharFilter, FilteredText};
use super::filter::{stop_word_preset, StemLanguage, TokenFilter};
use super::tokenizer::Tokenizer;
use super::Token;
use crate::config::AnalysisSettings;
use crate::error::{AnalyzerComponent, TermdexError};
use crate::Result;

/// Stop words given either as a single preset name or a list
///
/// List entries wrapped in underscores (`_english_`) expand to the preset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopWords {
    Preset(String),
    List(Vec<String>),
}

impl StopWords {
    pub fn english() -> Self {
        StopWords::Preset("_english_".to_string())
    }

    pub fn list<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StopWords::List(words.into_iter().map(Into::into).collect())
    }

    /// Expand presets and lowercase every word
    pub fn resolve(&self) -> Result<std::collections::HashSet<String>> {
        let entries: Vec<&str> = match self {
            StopWords::Preset(name) => vec![name.as_str()],
            StopWords::List(words) => words.iter().map(String::as_str).collect(),
        };

        let mut words = std::collections::HashSet::new();
        for entry in entries {
            if entry.len() > 2 && entry.starts_with('_') && entry.ends_with('_') {
                words.extend(stop_word_preset(entry)?);
            } else {
                words.insert(entry.to_lowercase());
            }
        }
        Ok(words)
    }
}

fn default_stop_words() -> StopWords {
    StopWords::english()
}

fn default_stem_language() -> String {
    "english".to_string()
}

/// Declarative token filter definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenFilterConfig {
    Lowercase,
    Uppercase,
    Stop {
        #[serde(default = "default_stop_words")]
        stopwords: StopWords,
    },
    MaxTokenLength {
        max_token_length: usize,
    },
    Stemmer {
        #[serde(default = "default_stem_language")]
        language: String,
    },
}

impl TokenFilterConfig {
    fn compile(&self) -> Result<TokenFilter> {
        match self {
            TokenFilterConfig::Lowercase => Ok(TokenFilter::Lowercase),
            TokenFilterConfig::Uppercase => Ok(TokenFilter::Uppercase),
            TokenFilterConfig::Stop { stopwords } => Ok(TokenFilter::Stop(stopwords.resolve()?)),
            TokenFilterConfig::MaxTokenLength { max_token_length } => {
                TokenFilter::max_token_length(*max_token_length)
            }
            TokenFilterConfig::Stemmer { language } => {
                Ok(TokenFilter::Stemmer(StemLanguage::from_name(language)?))
            }
        }
    }
}

/// Token filter entry of an analyzer: a name or an inline definition
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenFilterSpec {
    Named(String),
    Inline(TokenFilterConfig),
}

impl From<&str> for TokenFilterSpec {
    fn from(name: &str) -> Self {
        TokenFilterSpec::Named(name.to_string())
    }
}

impl From<TokenFilterConfig> for TokenFilterSpec {
    fn from(config: TokenFilterConfig) -> Self {
        TokenFilterSpec::Inline(config)
    }
}

/// Ordered analyzer description: char filters, one tokenizer, token filters
///
/// Deserializes from the analyzer shapes accepted in index settings: a
/// `custom` analyzer listing its components, or a built-in analyzer type such
/// as `standard` with `stopwords` / `max_token_length` parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAnalyzerConfig")]
pub struct AnalyzerConfig {
    #[serde(rename = "char_filter", skip_serializing_if = "Vec::is_empty")]
    pub char_filters: Vec<String>,
    pub tokenizer: String,
    #[serde(rename = "filter", skip_serializing_if = "Vec::is_empty")]
    pub token_filters: Vec<TokenFilterSpec>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self::standard()
    }
}

impl AnalyzerConfig {
    /// A custom analyzer with the given tokenizer and no filters
    pub fn custom(tokenizer: impl Into<String>) -> Self {
        Self {
            char_filters: Vec::new(),
            tokenizer: tokenizer.into(),
            token_filters: Vec::new(),
        }
    }

    /// Standard tokenizer + lowercase, no stop words, no length limit
    pub fn standard() -> Self {
        Self::custom("standard").with_token_filter("lowercase")
    }

    /// Letter runs + lowercase
    pub fn simple() -> Self {
        Self::custom("letter").with_token_filter("lowercase")
    }

    pub fn whitespace() -> Self {
        Self::custom("whitespace")
    }

    pub fn keyword() -> Self {
        Self::custom("keyword")
    }

    /// Letter runs + lowercase + `_english_` stop words
    pub fn stop() -> Self {
        Self::simple().with_stop_words(StopWords::english())
    }

    /// Standard + `_english_` stop words + English stemming
    pub fn english() -> Self {
        Self::standard()
            .with_stop_words(StopWords::english())
            .with_token_filter(TokenFilterConfig::Stemmer {
                language: default_stem_language(),
            })
    }

    pub fn with_char_filter(mut self, name: impl Into<String>) -> Self {
        self.char_filters.push(name.into());
        self
    }

    pub fn with_token_filter(mut self, filter: impl Into<TokenFilterSpec>) -> Self {
        self.token_filters.push(filter.into());
        self
    }

    /// Append a stop word filter
    pub fn with_stop_words(self, stopwords: StopWords) -> Self {
        self.with_token_filter(TokenFilterConfig::Stop { stopwords })
    }

    /// Split tokens longer than `max_token_length` straight after the
    /// tokenizer, ahead of every other token filter
    pub fn with_max_token_length(mut self, max_token_length: usize) -> Self {
        self.token_filters
            .insert(0, TokenFilterConfig::MaxTokenLength { max_token_length }.into());
        self
    }
}

#[derive(Deserialize)]
struct RawAnalyzerConfig {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    char_filter: Vec<String>,
    tokenizer: Option<String>,
    #[serde(default)]
    filter: Vec<TokenFilterSpec>,
    stopwords: Option<StopWords>,
    max_token_length: Option<usize>,
}

impl TryFrom<RawAnalyzerConfig> for AnalyzerConfig {
    type Error = String;

    fn try_from(raw: RawAnalyzerConfig) -> std::result::Result<Self, Self::Error> {
        let mut config = match raw.kind.as_deref() {
            None | Some("custom") => {
                let tokenizer = raw
                    .tokenizer
                    .ok_or_else(|| "custom analyzer requires a tokenizer".to_string())?;
                let mut config = AnalyzerConfig::custom(tokenizer);
                config.char_filters = raw.char_filter;
                config.token_filters = raw.filter;
                return Ok(config);
            }
            Some("standard") => AnalyzerConfig::standard(),
            Some("simple") => AnalyzerConfig::simple(),
            Some("whitespace") => AnalyzerConfig::whitespace(),
            Some("keyword") => AnalyzerConfig::keyword(),
            Some("stop") => AnalyzerConfig::simple(),
            Some("english") => AnalyzerConfig::english(),
            Some(other) => return Err(format!("unknown analyzer type: {}", other)),
        };

        if raw.kind.as_deref() == Some("stop") {
            config = config.with_stop_words(raw.stopwords.unwrap_or_else(StopWords::english));
        } else if let Some(stopwords) = raw.stopwords {
            config = config.with_stop_words(stopwords);
        }
        if let Some(max) = raw.max_token_length {
            config = config.with_max_token_length(max);
        }
        Ok(config)
    }
}

/// Field analyzer reference in a mapping: a registered name or an inline configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalyzerRef {
    Named(String),
    Inline(AnalyzerConfig),
}

impl Default for AnalyzerRef {
    fn default() -> Self {
        AnalyzerRef::Named("standard".to_string())
    }
}

/// Compiled analysis pipeline
///
/// Analysis is a pure function of the input: an analyzer holds no mutable
/// state and can be shared freely between threads.
#[derive(Clone, Debug)]
pub struct Analyzer {
    char_filters: Vec<CharFilter>,
    tokenizer: Tokenizer,
    token_filters: Vec<TokenFilter>,
}

impl Analyzer {
    /// Compile `config`, resolving component names against `settings` first
    /// and the built-in components second
    pub fn build(config: &AnalyzerConfig, settings: &AnalysisSettings) -> Result<Self> {
        let char_filters = config
            .char_filters
            .iter()
            .map(|name| match settings.char_filters.get(name) {
                Some(def) => CharFilter::from_config(name, def),
                None => CharFilter::builtin(name).ok_or_else(|| {
                    TermdexError::unknown_component(AnalyzerComponent::CharFilter, name.as_str())
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        let tokenizer = Tokenizer::from_name(&config.tokenizer)?;

        let token_filters = config
            .token_filters
            .iter()
            .map(|spec| match spec {
                TokenFilterSpec::Inline(def) => def.compile(),
                TokenFilterSpec::Named(name) => match settings.token_filters.get(name) {
                    Some(def) => def.compile(),
                    None => TokenFilter::builtin(name).ok_or_else(|| {
                        TermdexError::unknown_component(
                            AnalyzerComponent::TokenFilter,
                            name.as_str(),
                        )
                    }),
                },
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            char_filters,
            tokenizer,
            token_filters,
        })
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.tokenizer
    }

    /// Run the full pipeline over `text`
    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut filtered = FilteredText::raw(text);
        for filter in &self.char_filters {
            filtered = filter.apply(&filtered);
        }

        let mut tokens = self.tokenizer.tokenize(&filtered.text);
        if !self.char_filters.is_empty() {
            for token in &mut tokens {
                token.start_offset = filtered.original_start(token.start_offset);
                token.end_offset = filtered.original_end(token.end_offset);
            }
        }

        for filter in &self.token_filters {
            tokens = filter.apply(tokens);
        }
        tokens
    }

    /// Analyzed term texts in stream order
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.analyze(text).into_iter().map(|t| t.text).collect()
    }
}
