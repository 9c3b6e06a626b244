//! Character filters
//!
//! Character filters rewrite raw text before tokenization. Every byte of the
//! filtered output remembers the span of raw input it came from so token
//! offsets can be reported against the original text.

use crate::error::TermdexError;
use crate::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Declarative char filter definition, as found in index settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CharFilterConfig {
    /// Remove markup tags and decode character entities
    HtmlStrip,
    /// Replace every regex match with `replacement` (`$1` style groups allowed)
    PatternReplace {
        pattern: String,
        #[serde(default)]
        replacement: String,
    },
    /// Replace literal keys with values, written as `"key => value"`
    Mapping { mappings: Vec<String> },
}

/// Compiled character filter
#[derive(Clone, Debug)]
pub enum CharFilter {
    HtmlStrip,
    PatternReplace { regex: Regex, replacement: String },
    Mapping { rules: Vec<(String, String)> },
}

impl CharFilter {
    /// Resolve a built-in char filter name
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "html_strip" => Some(CharFilter::HtmlStrip),
            _ => None,
        }
    }

    /// Compile a char filter definition
    pub fn from_config(name: &str, config: &CharFilterConfig) -> Result<Self> {
        match config {
            CharFilterConfig::HtmlStrip => Ok(CharFilter::HtmlStrip),
            CharFilterConfig::PatternReplace {
                pattern,
                replacement,
            } => {
                let regex = Regex::new(pattern).map_err(|e| {
                    TermdexError::InvalidRequest(format!(
                        "char filter '{}' has an invalid pattern: {}",
                        name, e
                    ))
                })?;
                Ok(CharFilter::PatternReplace {
                    regex,
                    replacement: replacement.clone(),
                })
            }
            CharFilterConfig::Mapping { mappings } => {
                let mut rules = Vec::with_capacity(mappings.len());
                for rule in mappings {
                    let (from, to) = rule.split_once("=>").ok_or_else(|| {
                        TermdexError::InvalidRequest(format!(
                            "char filter '{}' has an invalid mapping rule: {}",
                            name, rule
                        ))
                    })?;
                    let from = from.trim();
                    if from.is_empty() {
                        return Err(TermdexError::InvalidRequest(format!(
                            "char filter '{}' has an empty mapping key",
                            name
                        )));
                    }
                    rules.push((from.to_string(), to.trim().to_string()));
                }
                // Longest key wins when several keys share a prefix
                rules.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
                Ok(CharFilter::Mapping { rules })
            }
        }
    }

    /// Run this filter over already-filtered text
    pub fn apply(&self, input: &FilteredText) -> FilteredText {
        let out = match self {
            CharFilter::HtmlStrip => strip_html(&input.text),
            CharFilter::PatternReplace { regex, replacement } => {
                pattern_replace(&input.text, regex, replacement)
            }
            CharFilter::Mapping { rules } => map_chars(&input.text, rules),
        };
        out.finish(input)
    }
}

/// Text produced by a chain of char filters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilteredText {
    pub text: String,
    /// Raw input span for every byte of `text`; `None` when the text is unfiltered
    spans: Option<Vec<(usize, usize)>>,
    raw_len: usize,
}

impl FilteredText {
    /// Wrap unfiltered raw text
    pub fn raw(text: &str) -> Self {
        Self {
            text: text.to_string(),
            spans: None,
            raw_len: text.len(),
        }
    }

    /// Map a start byte offset in the filtered text back to the raw text
    pub fn original_start(&self, offset: usize) -> usize {
        match &self.spans {
            None => offset,
            Some(spans) => spans.get(offset).map(|s| s.0).unwrap_or(self.raw_len),
        }
    }

    /// Map an end byte offset in the filtered text back to the raw text
    pub fn original_end(&self, offset: usize) -> usize {
        match &self.spans {
            None => offset,
            Some(_) if offset == 0 => 0,
            Some(spans) => spans
                .get(offset - 1)
                .map(|s| s.1)
                .unwrap_or(self.raw_len),
        }
    }

    fn span_of(&self, start: usize, end: usize) -> (usize, usize) {
        (self.original_start(start), self.original_end(end))
    }
}

/// Output builder tracking which input span produced each output byte
struct OffsetWriter {
    text: String,
    spans: Vec<(usize, usize)>,
}

impl OffsetWriter {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            spans: Vec::with_capacity(capacity),
        }
    }

    /// Copy input verbatim; `start` is its offset in the input
    fn copy(&mut self, s: &str, start: usize) {
        self.text.push_str(s);
        self.spans.extend((start..start + s.len()).map(|i| (i, i + 1)));
    }

    /// Emit `s` in place of the input span `start..end`
    fn replace(&mut self, s: &str, start: usize, end: usize) {
        self.text.push_str(s);
        self.spans.extend(std::iter::repeat((start, end)).take(s.len()));
    }

    /// Compose the spans with those of the input so they point into raw text
    fn finish(self, input: &FilteredText) -> FilteredText {
        let spans = self
            .spans
            .into_iter()
            .map(|(start, end)| input.span_of(start, end))
            .collect();
        FilteredText {
            text: self.text,
            spans: Some(spans),
            raw_len: input.raw_len,
        }
    }
}

const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "big", "cite", "code", "em", "font", "i", "mark", "q", "s", "small",
    "span", "strike", "strong", "sub", "sup", "tt", "u",
];

fn strip_html(input: &str) -> OffsetWriter {
    let mut out = OffsetWriter::with_capacity(input.len());
    let mut i = 0;

    while let Some(ch) = input[i..].chars().next() {
        let rest = &input[i..];

        if rest.starts_with("<!--") {
            let len = rest.find("-->").map(|end| end + 3).unwrap_or(rest.len());
            i += len;
            continue;
        }

        if ch == '<' {
            if let Some(len) = tag_length(rest) {
                if !INLINE_TAGS.contains(&tag_name(&rest[..len]).as_str()) {
                    out.replace("\n", i, i + len);
                }
                i += len;
                continue;
            }
        }

        if ch == '&' {
            if let Some((decoded, len)) = decode_entity(rest) {
                let mut buf = [0u8; 4];
                out.replace(decoded.encode_utf8(&mut buf), i, i + len);
                i += len;
                continue;
            }
        }

        out.copy(&rest[..ch.len_utf8()], i);
        i += ch.len_utf8();
    }

    out
}

/// Byte length of the tag starting at `s[0] == '<'`, if it is one
fn tag_length(s: &str) -> Option<usize> {
    let next = s[1..].chars().next()?;
    if !(next.is_ascii_alphabetic() || next == '/' || next == '!' || next == '?') {
        return None;
    }
    s.find('>').map(|end| end + 1)
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn decode_entity(s: &str) -> Option<(char, usize)> {
    let end = s.char_indices().take(12).find(|&(_, c)| c == ';')?.0;
    let body = &s[1..end];
    let decoded = match body {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        _ => {
            let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                body.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)?
        }
    };
    Some((decoded, end + 1))
}

fn pattern_replace(input: &str, regex: &Regex, replacement: &str) -> OffsetWriter {
    let mut out = OffsetWriter::with_capacity(input.len());
    let mut last = 0;
    let mut expanded = String::new();

    for caps in regex.captures_iter(input) {
        let Some(m) = caps.get(0) else { continue };
        out.copy(&input[last..m.start()], last);
        expanded.clear();
        caps.expand(replacement, &mut expanded);
        out.replace(&expanded, m.start(), m.end());
        last = m.end();
    }
    out.copy(&input[last..], last);
    out
}

fn map_chars(input: &str, rules: &[(String, String)]) -> OffsetWriter {
    let mut out = OffsetWriter::with_capacity(input.len());
    let mut i = 0;

    'outer: while let Some(ch) = input[i..].chars().next() {
        for (from, to) in rules {
            if input[i..].starts_with(from.as_str()) {
                out.replace(to, i, i + from.len());
                i += from.len();
                continue 'outer;
            }
        }
        out.copy(&input[i..i + ch.len_utf8()], i);
        i += ch.len_utf8();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(filter: &CharFilter, text: &str) -> FilteredText {
        filter.apply(&FilteredText::raw(text))
    }

    #[test]
    fn test_html_strip_inline_tags() {
        let out = run(&CharFilter::HtmlStrip, "<b> Example input text </b>");
        assert_eq!(out.text, " Example input text ");
        // "Example" starts at raw offset 4
        assert_eq!(out.original_start(1), 4);
        assert_eq!(out.original_end(8), 11);
    }

    #[test]
    fn test_html_strip_block_tags_break_words() {
        let out = run(&CharFilter::HtmlStrip, "<p>first</p><p>second</p>");
        assert_eq!(out.text, "\nfirst\n\nsecond\n");
    }

    #[test]
    fn test_html_strip_entities_and_comments() {
        let out = run(&CharFilter::HtmlStrip, "fish &amp; chips<!-- hidden --> &#65;&#x42;");
        assert_eq!(out.text, "fish & chips AB");
    }

    #[test]
    fn test_html_strip_keeps_literal_angle_brackets() {
        let out = run(&CharFilter::HtmlStrip, "1 < 2 and 3 > 2");
        assert_eq!(out.text, "1 < 2 and 3 > 2");
    }

    #[test]
    fn test_pattern_replace() {
        let config = CharFilterConfig::PatternReplace {
            pattern: "(\\d+)-(\\d+)".to_string(),
            replacement: "${1}_$2".to_string(),
        };
        let filter = CharFilter::from_config("digits", &config).unwrap();
        let out = run(&filter, "call 555-1234 now");
        assert_eq!(out.text, "call 555_1234 now");
        assert_eq!(out.original_start(14), 14);
    }

    #[test]
    fn test_invalid_pattern() {
        let config = CharFilterConfig::PatternReplace {
            pattern: "(".to_string(),
            replacement: String::new(),
        };
        assert!(CharFilter::from_config("broken", &config).is_err());
    }

    #[test]
    fn test_mapping_prefers_longest_key() {
        let config = CharFilterConfig::Mapping {
            mappings: vec![":) => happy".to_string(), ":)) => very_happy".to_string()],
        };
        let filter = CharFilter::from_config("emoticons", &config).unwrap();
        assert_eq!(run(&filter, "so :)) and :)").text, "so very_happy and happy");
    }

    #[test]
    fn test_chained_offsets_point_into_raw_text() {
        let stripped = run(&CharFilter::HtmlStrip, "<i>a</i>&amp;b");
        let config = CharFilterConfig::Mapping {
            mappings: vec!["& => and".to_string()],
        };
        let mapped = CharFilter::from_config("amp", &config)
            .unwrap()
            .apply(&stripped);
        assert_eq!(mapped.text, "aandb");
        // "and" comes from the raw "&amp;" entity at 8..13
        assert_eq!(mapped.original_start(1), 8);
        assert_eq!(mapped.original_end(4), 13);
    }
}
