// crates/run_examples/src/execute.rs

//! Runs the examples of one file against their interpreter sessions.
//!
//! Each language gets one session on its own thread. Within a session the
//! examples are sent strictly in source order because each one may depend
//! on the state left by the previous ones. Named captures of passed
//! examples are kept per session too, so `+paste` only sees captures made
//! by earlier examples of the same language.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use example_parser::{Example, ExampleOptions};
use output_matcher::{
    matches, paste, paste_known, ExpectedOutputPattern, MatchOptions, MatchResult,
};
use session_runner::{RunStatus, Session, SessionFactory};

use crate::state::{ExampleRun, ExampleState};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Per-example timeout unless the example sets `+timeout`.
    pub timeout: Duration,
    /// Stop every session after the first failed or errored example.
    pub fail_fast: bool,
    /// Run-wide options; an example's own options take precedence.
    pub defaults: ExampleOptions,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            fail_fast: false,
            defaults: ExampleOptions::default(),
        }
    }
}

/// What happened to one example.
#[derive(Debug, Clone)]
pub struct ExampleOutcome {
    pub example: Example,
    pub state: ExampleState,
    /// Interpreter output, possibly partial for an errored example.
    pub output: Option<String>,
    pub pattern: Option<ExpectedOutputPattern>,
    pub result: Option<MatchResult>,
    /// Why the example errored.
    pub error: Option<String>,
}

impl ExampleOutcome {
    fn new(example: Example) -> Self {
        Self {
            example,
            state: ExampleState::Pending,
            output: None,
            pattern: None,
            result: None,
            error: None,
        }
    }
}

pub fn match_options(options: &ExampleOptions) -> MatchOptions {
    let base = MatchOptions::default();
    MatchOptions {
        norm_ws: options.norm_ws.unwrap_or(base.norm_ws),
        tags: options.tags.unwrap_or(base.tags),
        wildcard_spans_lines: options.span_lines.unwrap_or(base.wildcard_spans_lines),
    }
}

/// Runs `examples` and returns one outcome per example, in the same order.
pub fn run_examples<F>(
    examples: &[Example],
    factory: &F,
    settings: &RunSettings,
) -> Vec<ExampleOutcome>
where
    F: SessionFactory + ?Sized,
{
    let abort = AtomicBool::new(false);
    let mut by_language: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, example) in examples.iter().enumerate() {
        by_language.entry(example.language.as_str()).or_default().push(i);
    }

    let mut slots: Vec<Option<ExampleOutcome>> = vec![None; examples.len()];
    thread::scope(|scope| {
        let handles: Vec<_> = by_language
            .iter()
            .map(|(language, indices)| {
                let abort = &abort;
                scope.spawn(move || {
                    run_language(language, indices, examples, factory, settings, abort)
                })
            })
            .collect();
        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (i, outcome) in done {
                        slots[i] = Some(outcome);
                    }
                }
                Err(_) => log::error!("a session thread panicked"),
            }
        }
    });

    slots
        .into_iter()
        .zip(examples)
        .map(|(slot, example)| {
            slot.unwrap_or_else(|| {
                let mut outcome = ExampleOutcome::new(example.clone());
                outcome.state = ExampleState::Errored;
                outcome.error = Some("session thread panicked".to_string());
                outcome
            })
        })
        .collect()
}

fn run_language<F>(
    language: &str,
    indices: &[usize],
    examples: &[Example],
    factory: &F,
    settings: &RunSettings,
    abort: &AtomicBool,
) -> Vec<(usize, ExampleOutcome)>
where
    F: SessionFactory + ?Sized,
{
    let mut session: Option<Box<dyn Session + Send>> = None;
    // set once the session can no longer be used
    let mut broken: Option<String> = None;
    // named captures of passed examples, for `+paste`
    let mut clipboard = BTreeMap::new();
    let mut done = Vec::with_capacity(indices.len());

    for &i in indices {
        let example = &examples[i];
        let options = example.options.with_defaults(&settings.defaults);
        let mut run = ExampleRun::new();
        let mut outcome = ExampleOutcome::new(example.clone());

        if abort.load(Ordering::SeqCst) {
            done.push((i, outcome));
            continue;
        }

        let verdict = if !options.executes() {
            run.skip().map(|()| ExampleState::Skipped)
        } else {
            run.start().map(|()| {
                execute_one(
                    example,
                    &options,
                    &mut outcome,
                    &mut session,
                    &mut broken,
                    &mut clipboard,
                    factory,
                    settings,
                )
            })
        };
        match verdict {
            Ok(ExampleState::Skipped) => {}
            Ok(verdict) => {
                if let Err(err) = run.finish(verdict) {
                    log::error!("line {}: {}", example.line, err);
                }
            }
            Err(err) => log::error!("line {}: {}", example.line, err),
        }
        outcome.state = run.state();
        log::debug!("line {} [{}]: {}", example.line, language, outcome.state);

        if settings.fail_fast
            && matches!(outcome.state, ExampleState::Failed | ExampleState::Errored)
        {
            abort.store(true, Ordering::SeqCst);
        }
        done.push((i, outcome));
    }

    if let Some(mut session) = session {
        session.shutdown();
    }
    done
}

#[allow(clippy::too_many_arguments)]
fn execute_one<F>(
    example: &Example,
    options: &ExampleOptions,
    outcome: &mut ExampleOutcome,
    session: &mut Option<Box<dyn Session + Send>>,
    broken: &mut Option<String>,
    clipboard: &mut BTreeMap<String, String>,
    factory: &F,
    settings: &RunSettings,
) -> ExampleState
where
    F: SessionFactory + ?Sized,
{
    if let Some(reason) = broken.as_ref() {
        outcome.error = Some(reason.clone());
        return ExampleState::Errored;
    }

    let statements = if options.paste {
        match example
            .statements
            .iter()
            .map(|s| paste(s, clipboard))
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(statements) => statements,
            Err(name) => {
                outcome.error = Some(format!("nothing was captured as <{}> to paste", name));
                return ExampleState::Errored;
            }
        }
    } else {
        example.statements.clone()
    };

    let pattern = if options.checks_output() {
        let expected: Vec<String> = if options.paste {
            example
                .expected
                .iter()
                .map(|line| paste_known(line, clipboard))
                .collect()
        } else {
            example.expected.clone()
        };
        match ExpectedOutputPattern::parse(&expected, &match_options(options)) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                outcome.error = Some(err.to_string());
                return ExampleState::Errored;
            }
        }
    } else {
        None
    };

    if session.is_none() {
        match factory.open(&example.language) {
            Ok(opened) => *session = Some(opened),
            Err(err) => {
                log::error!("{}", err);
                *broken = Some(err.to_string());
                outcome.error = Some(err.to_string());
                return ExampleState::Errored;
            }
        }
    }
    let Some(active) = session.as_mut() else {
        return ExampleState::Errored;
    };

    let timeout = options.timeout.unwrap_or(settings.timeout);
    let response = match active.run(&statements, timeout) {
        Ok(response) => response,
        Err(err) => {
            *broken = Some(err.to_string());
            outcome.error = Some(err.to_string());
            return ExampleState::Errored;
        }
    };
    outcome.output = Some(response.output);

    match response.status {
        RunStatus::Ok => {}
        RunStatus::TimedOut => {
            let reason = format!("timed out after {:.1} seconds", timeout.as_secs_f64());
            *broken = Some(format!(
                "{} session was closed: the example at line {} {}",
                example.language, example.line, reason
            ));
            outcome.error = Some(reason);
            return ExampleState::Errored;
        }
        RunStatus::Crashed => {
            *broken = Some(format!(
                "{} session was closed: the interpreter exited at line {}",
                example.language, example.line
            ));
            outcome.error = Some("the interpreter exited".to_string());
            return ExampleState::Errored;
        }
    }

    let Some(pattern) = pattern else {
        return ExampleState::Passed;
    };
    let result = matches(&pattern, outcome.output.as_deref().unwrap_or_default());
    let verdict = if result.passed {
        clipboard.extend(result.captures.clone());
        ExampleState::Passed
    } else {
        ExampleState::Failed
    };
    outcome.pattern = Some(pattern);
    outcome.result = Some(result);
    verdict
}
