// crates/run_examples/src/lib.rs

//! Finds the interactive examples written in comments, runs them against
//! live interpreters and reports which ones no longer hold.
//!
//! Per file: [`harvest`] extracts and parses the examples, [`execute`] runs
//! them and matches their output, [`report`] renders the result.

pub mod config;
pub mod discover;
pub mod execute;
pub mod harvest;
pub mod logging;
pub mod report;
pub mod state;

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Result};
use example_parser::LanguageRules;
use session_runner::SessionFactory;

pub use config::AppConfig;
pub use execute::{run_examples, ExampleOutcome, RunSettings};
pub use harvest::{harvest_file, harvest_str, Diagnostic, Harvest};
pub use report::{FileReport, Verdict};
pub use state::{ExampleRun, ExampleState};

/// Rendered result of one file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub report: FileReport,
    pub text: String,
}

/// Harvests, runs and renders one file.
pub fn check_file(
    path: &Path,
    config: &AppConfig,
    languages: &LanguageRules,
    factory: &dyn SessionFactory,
) -> Result<FileOutcome> {
    let started = Instant::now();
    let harvest = harvest_file(path, languages, config.search_line_comments)?;

    if config.dry {
        let report = FileReport::new(path, &[], harvest.diagnostics.len(), started.elapsed());
        let report = FileReport {
            total: harvest.examples.len(),
            ..report
        };
        let text = if config.quiet {
            String::new()
        } else {
            report::render_dry(path, harvest.examples.len(), harvest.diagnostics.len())
        };
        return Ok(FileOutcome { report, text });
    }

    let outcomes = run_examples(&harvest.examples, factory, &config.run_settings());
    let report = FileReport::new(path, &outcomes, harvest.diagnostics.len(), started.elapsed());

    let mut text = String::new();
    if !config.quiet {
        for outcome in &outcomes {
            if let Some(failure) = report::render_failure(path, outcome, config.diff) {
                text.push_str(&failure);
            }
        }
        text.push_str(&report::render_summary(&report));
    }
    Ok(FileOutcome { report, text })
}

/// Checks every file named by `config`, writing reports to `out` in
/// argument order, and returns the worst verdict.
pub fn run<W: Write>(config: &AppConfig, factory: &dyn SessionFactory, out: &mut W) -> Result<Verdict> {
    let languages = config.language_rules()?;
    let files = discover::discover(&config.files, &config.skip)?;
    if files.is_empty() {
        return Err(anyhow!("No files to check"));
    }

    let next = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel();
    let mut verdict = Verdict::Ok;

    thread::scope(|scope| -> Result<()> {
        for _ in 0..config.jobs.min(files.len()) {
            let tx = tx.clone();
            let (next, stop, files, languages) = (&next, &stop, &files, &languages);
            scope.spawn(move || loop {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                let i = next.fetch_add(1, Ordering::SeqCst);
                let Some(path) = files.get(i) else {
                    break;
                };
                let result = check_file(path, config, languages, factory);
                let halt = match &result {
                    Err(_) => true,
                    Ok(outcome) => config.fail_fast && outcome.report.verdict() != Verdict::Ok,
                };
                if halt {
                    stop.store(true, Ordering::SeqCst);
                }
                if tx.send((i, path, result)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        // workers finish out of order; print in argument order
        let mut ready = BTreeMap::new();
        let mut next_to_print = 0;
        for (i, path, result) in rx {
            ready.insert(i, (path, result));
            while let Some((path, result)) = ready.remove(&next_to_print) {
                next_to_print += 1;
                match result {
                    Ok(outcome) => {
                        out.write_all(outcome.text.as_bytes())?;
                        verdict = verdict.max(outcome.report.verdict());
                    }
                    Err(err) => {
                        eprintln!("Error: {}: {:#}", path.display(), err);
                        verdict = Verdict::Fatal;
                    }
                }
            }
        }
        out.flush()?;
        Ok(())
    })?;

    Ok(verdict)
}
