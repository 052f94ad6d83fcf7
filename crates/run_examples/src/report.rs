// crates/run_examples/src/report.rs

//! Text rendering of outcomes and per-file summaries.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use output_matcher::diff::{self, DiffMode};

use crate::execute::ExampleOutcome;
use crate::state::ExampleState;

const SEPARATOR: &str = "**********************************************************************";

/// Overall result, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verdict {
    Ok,
    Failed,
    /// Some example errored or was never reached.
    Aborted,
    /// The run could not proceed (unreadable file, bad configuration).
    Fatal,
}

impl Verdict {
    pub fn exit_code(self) -> u8 {
        match self {
            Verdict::Ok => 0,
            Verdict::Failed => 1,
            Verdict::Aborted => 2,
            Verdict::Fatal => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Verdict::Ok => "PASS",
            Verdict::Failed => "FAIL",
            Verdict::Aborted => "ABORT",
            Verdict::Fatal => "ERROR",
        }
    }
}

/// Per-file counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub skipped: usize,
    pub not_run: usize,
    pub diagnostics: usize,
    pub elapsed: Duration,
}

impl FileReport {
    pub fn new(
        path: &Path,
        outcomes: &[ExampleOutcome],
        diagnostics: usize,
        elapsed: Duration,
    ) -> Self {
        let count = |state| outcomes.iter().filter(|o| o.state == state).count();
        Self {
            path: path.to_path_buf(),
            total: outcomes.len(),
            passed: count(ExampleState::Passed),
            failed: count(ExampleState::Failed),
            errored: count(ExampleState::Errored),
            skipped: count(ExampleState::Skipped),
            not_run: count(ExampleState::Pending) + count(ExampleState::Running),
            diagnostics,
            elapsed,
        }
    }

    pub fn ran(&self) -> usize {
        self.passed + self.failed + self.errored
    }

    pub fn verdict(&self) -> Verdict {
        if self.errored > 0 || self.not_run > 0 {
            Verdict::Aborted
        } else if self.failed > 0 {
            Verdict::Failed
        } else {
            Verdict::Ok
        }
    }
}

fn header(out: &mut String, path: &Path, outcome: &ExampleOutcome, title: &str) {
    let example = &outcome.example;
    let _ = writeln!(out, "{}", SEPARATOR);
    let _ = writeln!(
        out,
        "File {}, line {}, in {}",
        path.display(),
        example.line,
        example.language
    );
    let _ = writeln!(out, "{}:", title);
    for statement in &example.statements {
        let _ = writeln!(out, "    {}", statement);
    }
}

/// Explanation of a failed or errored example; `None` for anything else.
pub fn render_failure(path: &Path, outcome: &ExampleOutcome, mode: DiffMode) -> Option<String> {
    let mut out = String::new();
    match outcome.state {
        ExampleState::Failed => {
            header(&mut out, path, outcome, "Failed example");
            let (expected, actual) = match (&outcome.pattern, &outcome.result) {
                (Some(pattern), Some(result)) => {
                    (result.expected_with_captures(pattern), result.actual.clone())
                }
                _ => (
                    outcome.example.expected_text(),
                    outcome.output.clone().unwrap_or_default(),
                ),
            };
            out.push_str(&diff::render(&expected, &actual, mode));
        }
        ExampleState::Errored => {
            header(&mut out, path, outcome, "Errored example");
            let reason = outcome.error.as_deref().unwrap_or("unknown error");
            let _ = writeln!(out, "{}", reason);
            if let Some(output) = outcome.output.as_deref().filter(|o| !o.trim().is_empty()) {
                let _ = writeln!(out, "Output so far:\n{}", output.trim_end());
            }
        }
        _ => return None,
    }
    Some(out)
}

pub fn render_summary(report: &FileReport) -> String {
    format!(
        "File {}, {}/{} test ran in {:.2} seconds\n[{}] Pass: {} Fail: {} Skip: {}\n",
        report.path.display(),
        report.ran(),
        report.total,
        report.elapsed.as_secs_f64(),
        report.verdict().label(),
        report.passed,
        report.failed + report.errored,
        report.skipped,
    )
}

/// Summary line for `--dry` runs.
pub fn render_dry(path: &Path, examples: usize, diagnostics: usize) -> String {
    if diagnostics == 0 {
        format!("File {}, {} example(s) found\n", path.display(), examples)
    } else {
        format!(
            "File {}, {} example(s) found, {} problem(s) skipped\n",
            path.display(),
            examples,
            diagnostics
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use example_parser::{Example, ExampleOptions};

    fn outcome(state: ExampleState) -> ExampleOutcome {
        ExampleOutcome {
            example: Example {
                language: "python".into(),
                statements: vec!["1 + 2".into()],
                expected: vec!["3".into()],
                line: 7,
                indent: String::new(),
                options: ExampleOptions::default(),
            },
            state,
            output: Some("4\n".into()),
            pattern: None,
            result: None,
            error: None,
        }
    }

    #[test]
    fn test_counts_and_verdict() {
        let outcomes = vec![
            outcome(ExampleState::Passed),
            outcome(ExampleState::Failed),
            outcome(ExampleState::Skipped),
        ];
        let report = FileReport::new(Path::new("a.py"), &outcomes, 0, Duration::ZERO);
        assert_eq!(report.ran(), 2);
        assert_eq!(report.verdict(), Verdict::Failed);

        let outcomes = vec![outcome(ExampleState::Passed), outcome(ExampleState::Pending)];
        let report = FileReport::new(Path::new("a.py"), &outcomes, 0, Duration::ZERO);
        assert_eq!(report.verdict(), Verdict::Aborted);
        assert_eq!(report.verdict().exit_code(), 2);
    }

    #[test]
    fn test_summary_line() {
        let outcomes = vec![outcome(ExampleState::Passed)];
        let report = FileReport::new(Path::new("a.py"), &outcomes, 0, Duration::from_millis(1500));
        assert_eq!(
            render_summary(&report),
            "File a.py, 1/1 test ran in 1.50 seconds\n[PASS] Pass: 1 Fail: 0 Skip: 0\n"
        );
    }

    #[test]
    fn test_render_failure() {
        let text = render_failure(Path::new("a.py"), &outcome(ExampleState::Failed), DiffMode::None)
            .unwrap();
        assert!(text.contains("File a.py, line 7, in python"));
        assert!(text.contains("Failed example:\n    1 + 2\n"));
        assert!(text.contains("Expected:\n3\n\nGot:\n4\n"));
        assert!(render_failure(Path::new("a.py"), &outcome(ExampleState::Passed), DiffMode::None)
            .is_none());
    }

    #[test]
    fn test_render_errored() {
        let mut errored = outcome(ExampleState::Errored);
        errored.error = Some("timed out after 2.0 seconds".into());
        let text = render_failure(Path::new("a.py"), &errored, DiffMode::Unified).unwrap();
        assert!(text.contains("Errored example:"));
        assert!(text.contains("timed out after 2.0 seconds\nOutput so far:\n4\n"));
    }
}
