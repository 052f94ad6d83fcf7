// crates/session_runner/src/lib.rs

//! Persistent interpreter sessions.
//!
//! A [`Session`] keeps one interpreter alive across examples so later
//! statements see the state left by earlier ones. The orchestrator only
//! talks to the traits here; [`interpreter`] provides the process-backed
//! implementation.

pub mod interpreter;
pub mod languages;

use std::io;
use std::time::Duration;

use thiserror::Error;

pub use interpreter::{InterpreterFactory, InterpreterSession};
pub use languages::SessionSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// The interpreter exited or closed its output.
    Crashed,
    /// The statements did not finish within the timeout.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResponse {
    pub output: String,
    pub status: RunStatus,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("failed to start `{program}` for {language}: {source}")]
    Spawn {
        language: String,
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("i/o error talking to the {language} interpreter: {source}")]
    Io {
        language: String,
        #[source]
        source: io::Error,
    },
    #[error("no interpreter configured for `{0}`")]
    UnknownLanguage(String),
    #[error("the {0} session is closed")]
    SessionClosed(String),
}

/// One live interpreter.
pub trait Session {
    fn language(&self) -> &str;

    /// Sends `statements` and waits at most `timeout` for their output.
    /// A crash or timeout is reported in the response and leaves the
    /// session dead; later calls fail with [`RunnerError::SessionClosed`].
    fn run(&mut self, statements: &[String], timeout: Duration) -> Result<RunResponse, RunnerError>;

    fn is_alive(&self) -> bool;

    fn shutdown(&mut self);
}

/// Opens sessions by language tag. Shared between worker threads.
pub trait SessionFactory: Sync {
    fn open(&self, language: &str) -> Result<Box<dyn Session + Send>, RunnerError>;
}
