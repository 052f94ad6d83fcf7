// crates/run_examples/src/harvest.rs

//! Extract -> parse for one file.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use comment_extractor::{extract, rules, CommentRule, ExtractionError};
use example_parser::{parse, Example, LanguageRules, ParseError};
use thiserror::Error;

/// A recovered problem found while harvesting; never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Every example of a file in source order, plus what was skipped.
#[derive(Debug, Clone, Default)]
pub struct Harvest {
    pub examples: Vec<Example>,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn harvest_str(text: &str, rule: &CommentRule, languages: &LanguageRules) -> Harvest {
    let extraction = extract(text, rule);
    let mut harvest = Harvest {
        examples: Vec::new(),
        diagnostics: extraction
            .diagnostics
            .into_iter()
            .map(Diagnostic::from)
            .collect(),
    };
    for block in &extraction.blocks {
        log::trace!("block at line {} ({} bytes)", block.line, block.text.len());
        for parsed in parse(&block.text, block.line, languages) {
            match parsed {
                Ok(example) => harvest.examples.push(example),
                Err(err) => harvest.diagnostics.push(err.into()),
            }
        }
    }
    harvest
}

/// Reads `path` and harvests it with the rule for its extension.
///
/// An unreadable file or an extension without a comment rule is an error.
pub fn harvest_file(
    path: &Path,
    languages: &LanguageRules,
    search_line_comments: bool,
) -> Result<Harvest> {
    let rule = rules::for_path(path)
        .ok_or_else(|| anyhow!("No comment rule for file type of {}", path.display()))?;
    let rule = if search_line_comments {
        rule.with_searchable_line_comments(true)
    } else {
        rule
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let harvest = harvest_str(&text, &rule, languages);
    for diagnostic in &harvest.diagnostics {
        log::warn!("{}: {}", path.display(), diagnostic);
    }
    log::debug!(
        "{}: {} example(s) using {}",
        path.display(),
        harvest.examples.len(),
        rule.name
    );
    Ok(harvest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_line_comment_examples_are_not_searched() {
        let text = "int x; // >>> 3 * 4\n// 12\n";
        let harvest = harvest_str(text, &rules::c_style(), &LanguageRules::builtin());
        assert!(harvest.examples.is_empty());
        assert!(harvest.diagnostics.is_empty());
    }

    #[test]
    fn test_suppressed_region_yields_nothing() {
        let text = "/**/\n/* >>> 1 + 1\n   2 */\n/**/\n";
        let harvest = harvest_str(text, &rules::c_style(), &LanguageRules::builtin());
        assert!(harvest.examples.is_empty());
    }

    #[test]
    fn test_diagnostics_are_collected() {
        let text = "/* >>> \n   >>> 1\n   1 */\n/* $ x";
        let harvest = harvest_str(text, &rules::c_style(), &LanguageRules::builtin());
        assert_eq!(harvest.examples.len(), 2);
        assert_eq!(harvest.diagnostics.len(), 2);
        assert!(matches!(harvest.diagnostics[0], Diagnostic::Extraction(_)));
        assert!(matches!(
            harvest.diagnostics[1],
            Diagnostic::Parse(ParseError::EmptyStatement { line: 1 })
        ));
    }

    #[test]
    fn test_harvest_file_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".xyz").tempfile().unwrap();
        writeln!(file, ">>> 1").unwrap();
        let err = harvest_file(file.path(), &LanguageRules::builtin(), false).unwrap_err();
        assert!(err.to_string().contains("No comment rule"));
    }

    #[test]
    fn test_harvest_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = harvest_file(&dir.path().join("gone.py"), &LanguageRules::builtin(), false)
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn test_harvest_file_searches_line_comments_on_request() {
        let mut file = tempfile::Builder::new().suffix(".c").tempfile().unwrap();
        write!(file, "// $ echo hi\n// hi\n").unwrap();
        let languages = LanguageRules::builtin();
        assert!(harvest_file(file.path(), &languages, false).unwrap().examples.is_empty());
        let harvest = harvest_file(file.path(), &languages, true).unwrap();
        assert_eq!(harvest.examples.len(), 1);
        assert_eq!(harvest.examples[0].expected, vec!["hi"]);
    }
}
