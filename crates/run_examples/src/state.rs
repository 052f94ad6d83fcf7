// crates/run_examples/src/state.rs

use std::fmt;

use thiserror::Error;

/// Lifecycle of one example.
///
/// `Pending -> Running -> {Passed, Failed, Errored}`, or `Pending -> Skipped`.
/// An example still `Pending` at the end of a run was never reached
/// (fail-fast aborted the run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExampleState {
    Pending,
    Running,
    Passed,
    Failed,
    Errored,
    Skipped,
}

impl ExampleState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExampleState::Passed | ExampleState::Failed | ExampleState::Errored | ExampleState::Skipped
        )
    }
}

impl fmt::Display for ExampleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExampleState::Pending => "PENDING",
            ExampleState::Running => "RUNNING",
            ExampleState::Passed => "PASSED",
            ExampleState::Failed => "FAILED",
            ExampleState::Errored => "ERRORED",
            ExampleState::Skipped => "SKIPPED",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal example transition {from} -> {to}")]
pub struct TransitionError {
    pub from: ExampleState,
    pub to: ExampleState,
}

/// Guards the state of one example so it only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleRun {
    state: ExampleState,
}

impl Default for ExampleRun {
    fn default() -> Self {
        Self::new()
    }
}

impl ExampleRun {
    pub fn new() -> Self {
        Self {
            state: ExampleState::Pending,
        }
    }

    pub fn state(&self) -> ExampleState {
        self.state
    }

    fn move_to(&mut self, to: ExampleState, allowed_from: ExampleState) -> Result<(), TransitionError> {
        if self.state != allowed_from {
            return Err(TransitionError {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.move_to(ExampleState::Running, ExampleState::Pending)
    }

    pub fn skip(&mut self) -> Result<(), TransitionError> {
        self.move_to(ExampleState::Skipped, ExampleState::Pending)
    }

    /// Records the verdict of a running example.
    pub fn finish(&mut self, verdict: ExampleState) -> Result<(), TransitionError> {
        match verdict {
            ExampleState::Passed | ExampleState::Failed | ExampleState::Errored => {
                self.move_to(verdict, ExampleState::Running)
            }
            _ => Err(TransitionError {
                from: self.state,
                to: verdict,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut run = ExampleRun::new();
        assert_eq!(run.state(), ExampleState::Pending);
        run.start().unwrap();
        run.finish(ExampleState::Failed).unwrap();
        assert_eq!(run.state(), ExampleState::Failed);
        assert!(run.state().is_terminal());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut run = ExampleRun::new();
        run.start().unwrap();
        run.finish(ExampleState::Passed).unwrap();
        assert_eq!(
            run.finish(ExampleState::Errored),
            Err(TransitionError {
                from: ExampleState::Passed,
                to: ExampleState::Errored
            })
        );
        assert!(run.start().is_err());
    }

    #[test]
    fn test_cannot_finish_without_starting() {
        let mut run = ExampleRun::new();
        assert!(run.finish(ExampleState::Passed).is_err());
        assert!(run.finish(ExampleState::Running).is_err());
        run.skip().unwrap();
        assert_eq!(run.state(), ExampleState::Skipped);
        assert!(run.start().is_err());
    }
}
