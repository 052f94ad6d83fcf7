// crates/output_matcher/src/lib.rs

//! Compares an interpreter's output against an example's expected output.
//!
//! The expected text may contain capture tags: `<...>` matches anything,
//! `<name>` matches anything and records what it matched under `name`.
//! Literal text between tags is searched for in order, each literal at its
//! first occurrence after the previous one.

pub mod diff;

use std::collections::{BTreeMap, BTreeSet};

use example_markers::WILDCARD_TAG;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;

static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(\.\.\.|[A-Za-z_][A-Za-z0-9_-]*)>").unwrap());

static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Knobs of the comparison, all switchable per example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Collapse every whitespace run to one space before comparing.
    pub norm_ws: bool,
    /// Interpret capture tags; when off the expected text is all literal.
    pub tags: bool,
    /// Let a wildcard match text containing newlines.
    pub wildcard_spans_lines: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            norm_ws: false,
            tags: true,
            wildcard_spans_lines: true,
        }
    }
}

/// Trailing whitespace on each line and trailing blank lines are dropped.
/// With `norm_ws` every whitespace run becomes a single space.
pub fn normalize(text: &str, norm_ws: bool) -> String {
    if norm_ws {
        return WS_RE.replace_all(text.trim(), " ").into_owned();
    }
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    lines.join("\n").trim_end_matches('\n').to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("the capture tag <{0}> is repeated")]
    RepeatedTag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Wildcard { name: Option<String> },
}

/// Expected output split into literal and wildcard segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedOutputPattern {
    segments: Vec<Segment>,
    options: MatchOptions,
}

impl ExpectedOutputPattern {
    /// Fails when a named tag appears more than once.
    pub fn parse<S: AsRef<str>>(lines: &[S], options: &MatchOptions) -> Result<Self, PatternError> {
        let joined = lines
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<&str>>()
            .join("\n");
        let text = normalize(&joined, options.norm_ws);

        let mut segments = Vec::new();
        if !options.tags {
            if !text.is_empty() {
                segments.push(Segment::Literal(text));
            }
            return Ok(Self {
                segments,
                options: *options,
            });
        }

        let mut seen = BTreeSet::new();
        let mut last = 0;
        for caps in TAG_RE.captures_iter(&text) {
            let (Some(whole), Some(tag)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                segments.push(Segment::Literal(text[last..whole.start()].to_string()));
            }
            let name = (tag.as_str() != "...").then(|| tag.as_str().to_string());
            if let Some(name) = &name {
                if !seen.insert(name.clone()) {
                    return Err(PatternError::RepeatedTag(name.clone()));
                }
            }
            match segments.last_mut() {
                // adjacent wildcards collapse; the first name seen is kept
                Some(Segment::Wildcard { name: previous }) => {
                    if previous.is_none() {
                        *previous = name;
                    }
                }
                _ => segments.push(Segment::Wildcard { name }),
            }
            last = whole.end();
        }
        if last < text.len() {
            segments.push(Segment::Literal(text[last..].to_string()));
        }
        Ok(Self {
            segments,
            options: *options,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn has_wildcards(&self) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Wildcard { .. }))
    }

    /// Renders the pattern back to text, replacing named tags with their
    /// captured values where available.
    pub fn render(&self, captures: &BTreeMap<String, String>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Wildcard { name: Some(name) } => match captures.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('<');
                        out.push_str(name);
                        out.push('>');
                    }
                },
                Segment::Wildcard { name: None } => out.push_str(WILDCARD_TAG),
            }
        }
        out
    }
}

/// Replaces every `<name>` tag in `text` with the value captured under
/// `name`. `<...>` is left alone. On failure returns the first name that
/// has no captured value.
pub fn paste(text: &str, clipboard: &BTreeMap<String, String>) -> Result<String, String> {
    if let Some(missing) = TAG_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|tag| tag.as_str())
        .find(|name| *name != "..." && !clipboard.contains_key(*name))
    {
        return Err(missing.to_string());
    }
    Ok(paste_known(text, clipboard))
}

/// Like [`paste`], but tags without a captured value stay as they are.
pub fn paste_known(text: &str, clipboard: &BTreeMap<String, String>) -> String {
    TAG_RE
        .replace_all(text, |caps: &Captures| {
            caps.get(1)
                .and_then(|tag| clipboard.get(tag.as_str()))
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// A literal segment does not occur where it has to.
    LiteralNotFound,
    /// A wildcard would need to match across a line break.
    WildcardSpansLines,
    /// Output remains after the last literal and the pattern does not end
    /// with a wildcard.
    UnexpectedTrailingOutput,
}

/// Where matching first diverged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// Index of the offending segment (`segments().len()` for trailing output).
    pub segment: usize,
    /// The literal that was looked for; empty for trailing output.
    pub literal: String,
    /// Byte offset into the normalised actual output.
    pub actual_offset: usize,
    pub kind: MismatchKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub passed: bool,
    pub mismatch: Option<Mismatch>,
    pub captures: BTreeMap<String, String>,
    /// The actual output after normalisation.
    pub actual: String,
}

impl MatchResult {
    /// The expected text with named captures filled in, for diffing.
    pub fn expected_with_captures(&self, pattern: &ExpectedOutputPattern) -> String {
        pattern.render(&self.captures)
    }
}

/// Matches `actual` against `pattern`. Deterministic: the same inputs
/// always yield the same result.
pub fn matches(pattern: &ExpectedOutputPattern, actual: &str) -> MatchResult {
    let actual = normalize(actual, pattern.options.norm_ws);
    let mut captures = BTreeMap::new();
    let mismatch = scan(pattern, &actual, &mut captures);
    MatchResult {
        passed: mismatch.is_none(),
        mismatch,
        captures,
        actual,
    }
}

fn scan(
    pattern: &ExpectedOutputPattern,
    actual: &str,
    captures: &mut BTreeMap<String, String>,
) -> Option<Mismatch> {
    let spans_lines = pattern.options.wildcard_spans_lines;
    let mut pos = 0;
    let mut pending: Option<&Option<String>> = None;

    for (segment, entry) in pattern.segments.iter().enumerate() {
        let literal = match entry {
            Segment::Wildcard { name } => {
                pending = Some(name);
                continue;
            }
            Segment::Literal(literal) => literal.as_str(),
        };
        let mismatch = |kind| Mismatch {
            segment,
            literal: literal.to_string(),
            actual_offset: pos,
            kind,
        };
        let rest = &actual[pos..];
        match pending.take() {
            None => {
                if !rest.starts_with(literal) {
                    return Some(mismatch(MismatchKind::LiteralNotFound));
                }
                pos += literal.len();
            }
            Some(name) => {
                let Some(at) = rest.find(literal) else {
                    return Some(mismatch(MismatchKind::LiteralNotFound));
                };
                let gap = &rest[..at];
                if !spans_lines && gap.contains('\n') {
                    return Some(mismatch(MismatchKind::WildcardSpansLines));
                }
                if let Some(name) = name {
                    captures.insert(name.clone(), gap.to_string());
                }
                pos += at + literal.len();
            }
        }
    }

    let tail = &actual[pos..];
    let trailing = |segment, kind| Mismatch {
        segment,
        literal: String::new(),
        actual_offset: pos,
        kind,
    };
    match pending {
        Some(_) if !spans_lines && tail.contains('\n') => Some(trailing(
            pattern.segments.len() - 1,
            MismatchKind::WildcardSpansLines,
        )),
        Some(name) => {
            if let Some(name) = name {
                captures.insert(name.clone(), tail.to_string());
            }
            None
        }
        None if !tail.is_empty() => Some(trailing(
            pattern.segments.len(),
            MismatchKind::UnexpectedTrailingOutput,
        )),
        None => None,
    }
}
