// crates/example_parser/src/lib.rs

//! Splits the text of a comment block into interactive examples.
//!
//! An example starts at a line carrying a primary prompt (`>>> `), takes
//! the continuation-prompt lines (`... `) right after it, and then every
//! following line as expected output until a blank line, another primary
//! prompt, a line indented less than the prompt, or the end of the block.
//!
//! [`parse`] is lazy: examples are produced as the iterator is driven, and
//! a cloned iterator resumes independently from the same position.

pub mod languages;
pub mod options;

use std::iter::{Enumerate, Peekable};
use std::str::Lines;

use thiserror::Error;

pub use languages::{LanguageRules, PromptRule, RulesError};
pub use options::ExampleOptions;

/// One statement (possibly spanning several lines) and its expected output.
#[derive(Debug, Clone, PartialEq)]
pub struct Example {
    pub language: String,
    /// Statement lines with their prompts removed.
    pub statements: Vec<String>,
    /// Expected output lines with the prompt's indentation removed.
    pub expected: Vec<String>,
    /// 1-based line of the primary prompt in the source file.
    pub line: usize,
    /// Whitespace in front of the primary prompt.
    pub indent: String,
    pub options: ExampleOptions,
}

impl Example {
    /// The code sent to the interpreter.
    pub fn source(&self) -> String {
        self.statements.join("\n")
    }

    pub fn expected_text(&self) -> String {
        self.expected.join("\n")
    }

    /// Last source line occupied by the example.
    pub fn end_line(&self) -> usize {
        self.line + self.statements.len() + self.expected.len() - 1
    }

    /// Renders the example back with its prompts and indentation.
    pub fn to_source(&self, rule: &PromptRule) -> String {
        let mut out = Vec::with_capacity(self.statements.len() + self.expected.len());
        for (i, statement) in self.statements.iter().enumerate() {
            let marker = if i == 0 { &rule.primary } else { &rule.continuation };
            let line = format!("{}{}{}", self.indent, marker, statement);
            if i > 0 && statement.is_empty() {
                out.push(line.trim_end().to_string());
            } else {
                out.push(line);
            }
        }
        for expected in &self.expected {
            out.push(format!("{}{}", self.indent, expected));
        }
        out.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("line {line}: prompt without a statement")]
    EmptyStatement { line: usize },
    #[error("line {line}: invalid option `{option}`")]
    InvalidOption { line: usize, option: String },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::EmptyStatement { line } | ParseError::InvalidOption { line, .. } => *line,
        }
    }
}

/// Lazy, restartable sequence of examples found in one block of text.
///
/// Malformed examples are yielded as `Err` and parsing resumes at the next
/// prompt, so a single bad example never hides the rest of the block.
#[derive(Debug, Clone)]
pub struct Examples<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
    first_line: usize,
    rules: &'a LanguageRules,
}

/// Parses `text`, whose first line is line `first_line` of its file.
pub fn parse<'a>(text: &'a str, first_line: usize, rules: &'a LanguageRules) -> Examples<'a> {
    Examples {
        lines: text.lines().enumerate().peekable(),
        first_line,
        rules,
    }
}

impl<'a> Examples<'a> {
    fn take_continuations(&mut self, rule: &PromptRule, indent: &str) -> Vec<String> {
        let mut statements = Vec::new();
        while let Some(&(_, next)) = self.lines.peek() {
            if self.rules.match_primary(next).is_some() {
                break;
            }
            let Some(unindented) = next.strip_prefix(indent) else {
                break;
            };
            let Some(rest) = rule.strip_continuation(unindented.trim_start()) else {
                break;
            };
            statements.push(rest.to_string());
            self.lines.next();
        }
        statements
    }

    fn take_output(&mut self, indent: &str) -> Vec<String> {
        let mut expected = Vec::new();
        while let Some(&(_, next)) = self.lines.peek() {
            if next.trim().is_empty() || self.rules.match_primary(next).is_some() {
                break;
            }
            let Some(rest) = next.strip_prefix(indent) else {
                break;
            };
            expected.push(rest.to_string());
            self.lines.next();
        }
        expected
    }
}

impl Iterator for Examples<'_> {
    type Item = Result<Example, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (idx, text) = self.lines.next()?;
            let rules = self.rules;
            let Some((rule, indent, first)) = rules.match_primary(text) else {
                continue;
            };
            let line = self.first_line + idx;

            let mut statements = vec![first.to_string()];
            statements.extend(self.take_continuations(rule, indent));
            let expected = self.take_output(indent);

            if first.trim().is_empty() {
                log::debug!("line {}: `{}` prompt without a statement", line, rule.language);
                return Some(Err(ParseError::EmptyStatement { line }));
            }
            let options = match ExampleOptions::from_statements(&statements) {
                Ok(options) => options,
                Err(option) => return Some(Err(ParseError::InvalidOption { line, option })),
            };

            return Some(Ok(Example {
                language: rule.language.clone(),
                statements,
                expected,
                line,
                indent: indent.to_string(),
                options,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examples(text: &str) -> Vec<Example> {
        let rules = LanguageRules::builtin();
        parse(text, 1, &rules).map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_single_python_example() {
        let found = examples("\n >>> 1 + 2\n 3\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].language, "python");
        assert_eq!(found[0].statements, vec!["1 + 2"]);
        assert_eq!(found[0].expected, vec!["3"]);
        assert_eq!(found[0].line, 2);
        assert_eq!(found[0].indent, " ");
    }

    #[test]
    fn test_blank_line_means_no_output() {
        let found = examples(">>> x = 1\n\nprose\n");
        assert_eq!(found.len(), 1);
        assert!(found[0].expected.is_empty());
    }

    #[test]
    fn test_output_stops_at_next_prompt() {
        let found = examples(">>> a = 1\n>>> a\n1\n");
        assert_eq!(found.len(), 2);
        assert!(found[0].expected.is_empty());
        assert_eq!(found[1].expected, vec!["1"]);
        assert_eq!(found[1].line, 2);
    }

    #[test]
    fn test_continuation_lines() {
        let found = examples("  >>> def f():\n  ...     return 1\n  ...\n  >>> f()\n  1\n");
        assert_eq!(found[0].statements, vec!["def f():", "    return 1", ""]);
        assert_eq!(found[0].end_line(), 3);
        assert_eq!(found[1].source(), "f()");
    }

    #[test]
    fn test_less_indented_line_ends_output() {
        let found = examples("    >>> 1\n    1\n  not output\n");
        assert_eq!(found[0].expected, vec!["1"]);
    }

    #[test]
    fn test_output_keeps_extra_indentation() {
        let found = examples("  $ printf ' a\\n'\n   a\n");
        assert_eq!(found[0].expected, vec![" a"]);
    }

    #[test]
    fn test_empty_statement_is_reported_and_skipped() {
        let rules = LanguageRules::builtin();
        let results: Vec<_> = parse(">>> \n>>> 2\n2\n", 10, &rules).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], Err(ParseError::EmptyStatement { line: 10 }));
        assert_eq!(results[1].as_ref().unwrap().expected, vec!["2"]);
    }

    #[test]
    fn test_invalid_option() {
        let rules = LanguageRules::builtin();
        let err = parse("$ true # byexample: +bogus\n", 4, &rules)
            .next()
            .unwrap()
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidOption {
                line: 4,
                option: "+bogus".into()
            }
        );
        assert_eq!(err.line(), 4);
    }

    #[test]
    fn test_oversized_timeout_is_an_invalid_option() {
        let rules = LanguageRules::builtin();
        let results: Vec<_> = parse(">>> x  # byexample: +timeout=1e300\n>>> 2\n2\n", 1, &rules)
            .collect();
        assert_eq!(
            results[0],
            Err(ParseError::InvalidOption {
                line: 1,
                option: "+timeout=1e300".into()
            })
        );
        assert_eq!(results[1].as_ref().unwrap().statements, vec!["2"]);
    }

    #[test]
    fn test_clone_resumes_independently() {
        let rules = LanguageRules::builtin();
        let mut first = parse(">>> 1\n1\n>>> 2\n2\n", 1, &rules);
        assert_eq!(first.next().unwrap().unwrap().statements, vec!["1"]);
        let second = first.clone();
        assert_eq!(first.count(), 1);
        assert_eq!(second.map(|r| r.unwrap().source()).collect::<Vec<_>>(), vec!["2"]);
    }

    #[test]
    fn test_round_trip() {
        let text = "  >>> def f():\n  ...     return 1\n  ...\n  >>> f()\n  1";
        let rules = LanguageRules::builtin();
        let python = rules.get("python").unwrap();
        let rendered: Vec<String> = parse(text, 1, &rules)
            .map(|r| r.unwrap().to_source(python))
            .collect();
        assert_eq!(rendered.join("\n"), text);
    }
}
