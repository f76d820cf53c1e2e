//! # Text Layout
//!
//! Measurement-driven word wrapping and financial token segmentation. The
//! body rules in [`classify`] build on these primitives.
//!
//! Wrapping is greedy over whitespace-delimited tokens. Whitespace runs are
//! tokens too, so the gaps between words are measured exactly as they will
//! be drawn; they are dropped at line starts and trimmed at line ends. A
//! single token wider than the column gets a line of its own.

pub mod classify;

use std::sync::OnceLock;

use regex::Regex;

use crate::style::FontSpec;
use crate::surface::Surface;

/// A measured run of text that is never split across lines.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub text: String,
    /// Currency amount or percentage: drawn bold on a highlight.
    pub financial: bool,
    pub width: f32,
}

impl Token {
    pub fn is_space(&self) -> bool {
        !self.financial && self.text.chars().all(char::is_whitespace)
    }
}

/// One output line of the wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub tokens: Vec<Token>,
    pub width: f32,
}

impl WrappedLine {
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

/// Split text into alternating word and whitespace runs, keeping both.
pub fn split_words(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;
    for (i, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        match in_space {
            Some(prev) if prev != space => {
                out.push(&text[start..i]);
                start = i;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Greedy line breaking over pre-measured tokens.
///
/// Every returned line is at most `max_width` wide unless it consists of a
/// single token that alone exceeds it. Deterministic: the same tokens and
/// width always give the same breaks.
pub fn wrap_tokens(tokens: Vec<Token>, max_width: f32) -> Vec<WrappedLine> {
    let mut lines = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut width = 0.0f32;

    for token in tokens {
        if current.is_empty() && token.is_space() {
            continue;
        }
        if current.is_empty() || width + token.width <= max_width {
            width += token.width;
            current.push(token);
            continue;
        }
        // Overflow: commit and start the next line with this token.
        lines.push(commit_line(std::mem::take(&mut current)));
        width = 0.0;
        if !token.is_space() {
            width = token.width;
            current.push(token);
        }
    }

    if !current.is_empty() {
        let line = commit_line(current);
        if !line.tokens.is_empty() {
            lines.push(line);
        }
    }
    lines
}

fn commit_line(mut tokens: Vec<Token>) -> WrappedLine {
    while tokens.last().is_some_and(Token::is_space) {
        tokens.pop();
    }
    let width = tokens.iter().map(|t| t.width).sum();
    WrappedLine { tokens, width }
}

/// Measure `text` as plain tokens in one font.
pub fn plain_tokens(surface: &dyn Surface, text: &str, font: &FontSpec) -> Vec<Token> {
    split_words(text)
        .into_iter()
        .map(|word| Token {
            text: word.to_string(),
            financial: false,
            width: surface.measure_text(word, font),
        })
        .collect()
}

/// Word-wrap plain text at `max_width`.
pub fn wrap_text(
    surface: &dyn Surface,
    text: &str,
    font: &FontSpec,
    max_width: f32,
) -> Vec<WrappedLine> {
    wrap_tokens(plain_tokens(surface, text, font), max_width)
}

/// A run of a body line: plain prose or a financial token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub financial: bool,
}

fn financial_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:₹|Rs\.?|INR|\$|€|£)\s?\d[\d,]*(?:\.\d+)?|\d+(?:\.\d+)?\s?%")
            .expect("financial token pattern is valid")
    })
}

/// Whether the line holds a currency amount or a percentage.
pub fn has_financial_token(line: &str) -> bool {
    financial_pattern().is_match(line)
}

/// Split a line into alternating plain and financial segments.
pub fn segment_financial(line: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for m in financial_pattern().find_iter(line) {
        if m.start() > last {
            segments.push(Segment {
                text: &line[last..m.start()],
                financial: false,
            });
        }
        segments.push(Segment {
            text: m.as_str(),
            financial: true,
        });
        last = m.end();
    }
    if last < line.len() {
        segments.push(Segment {
            text: &line[last..],
            financial: false,
        });
    }
    segments
}

/// Tokens for a segmented line: plain segments split into words, each
/// financial segment kept whole and measured in `financial_font`.
pub fn financial_tokens(
    surface: &dyn Surface,
    line: &str,
    font: &FontSpec,
    financial_font: &FontSpec,
) -> Vec<Token> {
    let mut tokens = Vec::new();
    for segment in segment_financial(line) {
        if segment.financial {
            tokens.push(Token {
                text: segment.text.to_string(),
                financial: true,
                width: surface.measure_text(segment.text, financial_font),
            });
        } else {
            tokens.extend(plain_tokens(surface, segment.text, font));
        }
    }
    tokens
}
