// crates/output_matcher/src/diff.rs

//! Human-readable explanation of a failed comparison.

use std::fmt;
use std::str::FromStr;

use similar::{Algorithm, ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMode {
    /// Expected and actual output printed one after the other.
    #[default]
    None,
    Unified,
    /// Line-by-line listing with `-`/`+` markers and no context trimming.
    Ndiff,
}

impl FromStr for DiffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(DiffMode::None),
            "unified" => Ok(DiffMode::Unified),
            "ndiff" => Ok(DiffMode::Ndiff),
            other => Err(format!("unknown diff mode `{}`", other)),
        }
    }
}

impl fmt::Display for DiffMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiffMode::None => "none",
            DiffMode::Unified => "unified",
            DiffMode::Ndiff => "ndiff",
        };
        f.write_str(name)
    }
}

pub fn render(expected: &str, actual: &str, mode: DiffMode) -> String {
    match mode {
        DiffMode::None => format!("Expected:\n{}\n\nGot:\n{}\n", expected, actual),
        DiffMode::Unified => TextDiff::configure()
            .algorithm(Algorithm::Myers)
            .diff_lines(expected, actual)
            .unified_diff()
            .context_radius(3)
            .header("expected", "got")
            .to_string(),
        DiffMode::Ndiff => {
            let diff = TextDiff::configure()
                .algorithm(Algorithm::Myers)
                .diff_lines(expected, actual);
            let mut out = String::new();
            for change in diff.iter_all_changes() {
                let sign = match change.tag() {
                    ChangeTag::Equal => "  ",
                    ChangeTag::Delete => "- ",
                    ChangeTag::Insert => "+ ",
                };
                out.push_str(sign);
                out.push_str(change.value().trim_end_matches('\n'));
                out.push('\n');
            }
            out
        }
    }
}
