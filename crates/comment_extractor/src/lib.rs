// crates/comment_extractor/src/lib.rs

//! `comment_extractor`: finds the comment blocks of a source file that may
//! hold interactive examples.
//!
//!  * **One rule value per file type** – [`CommentRule`] describes the block
//!    delimiters and the line-comment prefix; [`extract`] is a single scan
//!    parameterised by it.
//!  * **Suppression markers** – an empty block comment (`/* */`, `''' '''`)
//!    opens a region that is never searched, closed by the next empty block.
//!  * **Line comments are opt-in** – a run of `//` lines is only a candidate
//!    when the rule marks line comments searchable.
//!
//! Per-extension rules live in [`rules`].

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub mod rules;

/// Opening and closing delimiter of a block comment (or docstring).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSyntax {
    pub open: String,
    pub close: String,
    /// Only recognise `open` when nothing but blanks precede it on its line.
    pub line_start: bool,
}

impl BlockSyntax {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
            line_start: false,
        }
    }

    pub fn at_line_start(self) -> Self {
        Self {
            line_start: true,
            ..self
        }
    }
}

/// Comment syntax of one file type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRule {
    /// Human readable name used in diagnostics (e.g. "/* ... */").
    pub name: String,
    /// Block delimiters; several may coexist (Python's `"""` and `'''`).
    pub blocks: Vec<BlockSyntax>,
    /// Line comment prefix such as `//` or `#`.
    pub line_prefix: Option<String>,
    /// Whether runs of line comments are searched for examples.
    pub line_comments_searchable: bool,
    /// Replace leading spaces/asterisks of every block line by one space.
    pub strip_decoration: bool,
    /// Treat the whole file as one candidate block.
    pub whole_file: bool,
}

impl CommentRule {
    /// A rule with no comment syntax at all: every file is one block.
    pub fn whole_file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
            line_prefix: None,
            line_comments_searchable: false,
            strip_decoration: false,
            whole_file: true,
        }
    }

    /// Overrides whether line comments are searched.
    #[must_use]
    pub fn with_searchable_line_comments(mut self, searchable: bool) -> Self {
        self.line_comments_searchable = searchable;
        self
    }
}

/// A comment recognised in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBlock {
    /// Byte offset of the opening delimiter (or of the first line prefix).
    pub start: usize,
    /// Byte offset just past the closing delimiter (or the end of the run).
    pub end: usize,
    /// Byte range of the raw comment body inside `start..end`.
    pub inner: Range<usize>,
    /// 1-based line on which the body starts.
    pub line: usize,
    /// Body with decoration removed; it has as many lines as the raw body.
    pub text: String,
}

impl CommentBlock {
    /// The raw body as it appears in `source`.
    pub fn raw<'a>(&self, source: &'a str) -> &'a str {
        &source[self.inner.clone()]
    }
}

/// Problems found while scanning. None of them stops the scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("line {line}: comment opened with `{open}` is never closed; it runs to the end of the file")]
    Unterminated { line: usize, open: String },
    #[error("line {line}: the suppressed region opened here is never closed")]
    UnclosedSuppression { line: usize },
}

/// Result of scanning one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Candidate blocks in source order.
    pub blocks: Vec<CommentBlock>,
    pub diagnostics: Vec<ExtractionError>,
}

// Leading run of spaces and asterisks: ` * >>> 1 + 2` -> ` >>> 1 + 2`
static DECORATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[ \t*]+").unwrap());

enum Opening<'r> {
    Block { at: usize, syntax: &'r BlockSyntax },
    Line { at: usize, prefix: &'r str },
}

impl Opening<'_> {
    fn at(&self) -> usize {
        match self {
            Opening::Block { at, .. } | Opening::Line { at, .. } => *at,
        }
    }

    fn len(&self) -> usize {
        match self {
            Opening::Block { syntax, .. } => syntax.open.len(),
            Opening::Line { prefix, .. } => prefix.len(),
        }
    }
}

/// Forward-only byte offset to line number conversion.
struct LineCounter {
    pos: usize,
    line: usize,
}

impl LineCounter {
    fn new() -> Self {
        Self { pos: 0, line: 1 }
    }

    fn line_at(&mut self, text: &str, at: usize) -> usize {
        if at > self.pos {
            self.line += text[self.pos..at].matches('\n').count();
            self.pos = at;
        }
        self.line
    }
}

/// Scans `text` with `rule` and returns the candidate blocks in source order.
pub fn extract(text: &str, rule: &CommentRule) -> Extraction {
    let mut out = Extraction::default();

    if rule.whole_file {
        if !text.trim().is_empty() {
            out.blocks.push(CommentBlock {
                start: 0,
                end: text.len(),
                inner: 0..text.len(),
                line: 1,
                text: text.to_string(),
            });
        }
        return out;
    }

    let mut lines = LineCounter::new();
    let mut suppressed_since: Option<usize> = None;
    let mut pos = 0;

    while let Some(opening) = next_opening(text, pos, rule) {
        match opening {
            Opening::Block { at, syntax } => {
                let line = lines.line_at(text, at);
                let inner_start = at + syntax.open.len();
                let (inner_end, end) = match text[inner_start..].find(syntax.close.as_str()) {
                    Some(off) => (inner_start + off, inner_start + off + syntax.close.len()),
                    None => {
                        log::warn!(
                            "line {}: unterminated `{}` comment, reading to end of file",
                            line,
                            syntax.open
                        );
                        out.diagnostics.push(ExtractionError::Unterminated {
                            line,
                            open: syntax.open.clone(),
                        });
                        (text.len(), text.len())
                    }
                };
                pos = end;

                let body = &text[inner_start..inner_end];
                if body.trim().is_empty() {
                    suppressed_since = match suppressed_since {
                        Some(_) => {
                            log::debug!("line {}: suppressed region closed", line);
                            None
                        }
                        None => {
                            log::debug!("line {}: suppressed region opened", line);
                            Some(line)
                        }
                    };
                    continue;
                }
                if suppressed_since.is_some() {
                    continue;
                }

                let body_text = if rule.strip_decoration {
                    DECORATION_RE.replace_all(body, " ").into_owned()
                } else {
                    body.to_string()
                };
                out.blocks.push(CommentBlock {
                    start: at,
                    end,
                    inner: inner_start..inner_end,
                    line,
                    text: body_text,
                });
            }
            Opening::Line { at, prefix } => {
                let line_start = text[..at].rfind('\n').map_or(0, |i| i + 1);
                let starts_line = text[line_start..at].trim().is_empty();

                let mut end = end_of_line(text, at);
                if starts_line {
                    while end < text.len() {
                        let next_start = end + 1;
                        let next_end = end_of_line(text, next_start);
                        if text[next_start..next_end].trim_start().starts_with(prefix) {
                            end = next_end;
                        } else {
                            break;
                        }
                    }
                }
                pos = end;

                if !rule.line_comments_searchable || suppressed_since.is_some() {
                    continue;
                }

                let line = lines.line_at(text, at);
                let body_text = text[at..end]
                    .split('\n')
                    .map(|l| {
                        let stripped = l.trim_start();
                        let stripped = stripped.strip_prefix(prefix).unwrap_or(stripped);
                        format!(" {}", stripped)
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                out.blocks.push(CommentBlock {
                    start: at,
                    end,
                    inner: at..end,
                    line,
                    text: body_text,
                });
            }
        }
    }

    if let Some(line) = suppressed_since {
        log::warn!("line {}: suppressed region runs to the end of the file", line);
        out.diagnostics
            .push(ExtractionError::UnclosedSuppression { line });
    }

    out
}

/// Finds the earliest comment opening at or after `from`. On a tie the longest
/// delimiter wins.
fn next_opening<'r>(text: &str, from: usize, rule: &'r CommentRule) -> Option<Opening<'r>> {
    let rest = &text[from..];
    let mut best: Option<Opening<'r>> = None;

    let mut consider = |candidate: Opening<'r>| {
        let better = match &best {
            None => true,
            Some(current) => {
                candidate.at() < current.at()
                    || (candidate.at() == current.at() && candidate.len() > current.len())
            }
        };
        if better {
            best = Some(candidate);
        }
    };

    for syntax in rule.blocks.iter().filter(|b| !b.open.is_empty()) {
        let found = rest
            .match_indices(syntax.open.as_str())
            .map(|(off, _)| off)
            .find(|&off| !syntax.line_start || starts_line(text, from + off));
        if let Some(off) = found {
            consider(Opening::Block {
                at: from + off,
                syntax,
            });
        }
    }
    if let Some(prefix) = rule.line_prefix.as_deref().filter(|p| !p.is_empty()) {
        if let Some(off) = rest.find(prefix) {
            consider(Opening::Line {
                at: from + off,
                prefix,
            });
        }
    }

    best
}

fn starts_line(text: &str, at: usize) -> bool {
    let line_start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    text[line_start..at].chars().all(|c| c == ' ' || c == '\t')
}

fn end_of_line(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |i| from + i)
}
