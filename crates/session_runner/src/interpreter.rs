// crates/session_runner/src/interpreter.rs

use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use example_markers::SENTINEL_PREFIX;

use crate::{RunResponse, RunStatus, RunnerError, Session, SessionFactory, SessionSpec};

/// How long an interpreter may take to start and run its init statements.
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Grace period between closing stdin and killing the process.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

enum Event {
    Data(Stream, Vec<u8>),
    Closed(Stream),
}

fn pump<R: Read + Send + 'static>(mut reader: R, stream: Stream, tx: Sender<Event>) {
    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(Event::Data(stream, buf[..n].to_vec())).is_err() {
                        return;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        let _ = tx.send(Event::Closed(stream));
    });
}

/// Text before the line carrying `token`, minus the newline the sentinel
/// printed ahead of it. `None` until the whole token line has arrived.
fn before_token(buf: &[u8], token: &str) -> Option<String> {
    let text = String::from_utf8_lossy(buf);
    let at = text.find(token)?;
    text[at..].find('\n')?;
    let line_start = text[..at].rfind('\n').map_or(0, |i| i + 1);
    let mut output = text[..line_start].to_string();
    if output.ends_with('\n') {
        output.pop();
    }
    Some(output)
}

/// An interpreter process driven through its standard streams.
pub struct InterpreterSession {
    spec: SessionSpec,
    child: Child,
    stdin: Option<ChildStdin>,
    events: Receiver<Event>,
    alive: bool,
    runs: u64,
}

impl InterpreterSession {
    /// Starts the interpreter and waits until it has run `spec.init`.
    pub fn spawn(spec: SessionSpec) -> Result<Self, RunnerError> {
        log::debug!("starting {} session: {} {:?}", spec.language, spec.program, spec.args);
        let mut child = Command::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                language: spec.language.clone(),
                program: spec.program.clone(),
                source,
            })?;

        let (tx, events) = mpsc::channel();
        let stdin = child.stdin.take();
        match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => {
                pump(stdout, Stream::Stdout, tx.clone());
                pump(stderr, Stream::Stderr, tx);
            }
            _ => {
                let _ = child.kill();
                return Err(RunnerError::Io {
                    language: spec.language.clone(),
                    source: io::Error::new(io::ErrorKind::BrokenPipe, "output not captured"),
                });
            }
        }

        let mut session = Self {
            spec,
            child,
            stdin,
            events,
            alive: true,
            runs: 0,
        };
        let init = session.spec.init.clone();
        let response = session.run(&init, STARTUP_TIMEOUT)?;
        if response.status != RunStatus::Ok {
            log::warn!(
                "{} interpreter did not start ({:?}): {}",
                session.spec.language,
                response.status,
                response.output.trim()
            );
            return Err(RunnerError::SessionClosed(session.spec.language.clone()));
        }
        Ok(session)
    }

    pub fn spec(&self) -> &SessionSpec {
        &self.spec
    }

    fn kill(&mut self) {
        self.stdin = None;
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.alive = false;
    }

    fn dead(&mut self, output: String, status: RunStatus) -> RunResponse {
        log::debug!("{} session ended: {:?}", self.spec.language, status);
        self.kill();
        RunResponse { output, status }
    }

    /// Drops output left over from a previous run. Returns false if a
    /// stream was closed in the meantime.
    fn discard_pending(&mut self) -> bool {
        while let Ok(event) = self.events.try_recv() {
            if let Event::Closed(_) = event {
                return false;
            }
        }
        true
    }

    fn send(&mut self, input: &str) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))?;
        stdin.write_all(input.as_bytes())?;
        stdin.flush()
    }

    fn collect(&mut self, token: &str, timeout: Duration) -> RunResponse {
        // None when the timeout is too large to be a point in time
        let deadline = Instant::now().checked_add(timeout);
        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut out_done: Option<String> = None;
        let mut err_done: Option<String> = None;

        loop {
            if let (Some(stdout), Some(stderr)) = (&out_done, &err_done) {
                return RunResponse {
                    output: self.spec.strip_prompts(&join_streams(stdout, stderr)),
                    status: RunStatus::Ok,
                };
            }
            let remaining =
                deadline.map_or(timeout, |at| at.saturating_duration_since(Instant::now()));
            match self.events.recv_timeout(remaining) {
                Ok(Event::Data(Stream::Stdout, bytes)) => {
                    out.extend_from_slice(&bytes);
                    if out_done.is_none() {
                        out_done = before_token(&out, token);
                    }
                }
                Ok(Event::Data(Stream::Stderr, bytes)) => {
                    err.extend_from_slice(&bytes);
                    if err_done.is_none() {
                        err_done = before_token(&err, token);
                    }
                }
                Ok(Event::Closed(_)) | Err(RecvTimeoutError::Disconnected) => {
                    let partial = partial_output(&out, &err);
                    return self.dead(partial, RunStatus::Crashed);
                }
                Err(RecvTimeoutError::Timeout) => {
                    let partial = partial_output(&out, &err);
                    return self.dead(partial, RunStatus::TimedOut);
                }
            }
        }
    }
}

fn join_streams(stdout: &str, stderr: &str) -> String {
    let mut output = stdout.to_string();
    if !stderr.is_empty() {
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(stderr);
    }
    output
}

fn partial_output(out: &[u8], err: &[u8]) -> String {
    join_streams(&String::from_utf8_lossy(out), &String::from_utf8_lossy(err))
}

impl Session for InterpreterSession {
    fn language(&self) -> &str {
        &self.spec.language
    }

    fn run(&mut self, statements: &[String], timeout: Duration) -> Result<RunResponse, RunnerError> {
        if !self.alive {
            return Err(RunnerError::SessionClosed(self.spec.language.clone()));
        }
        if !self.discard_pending() {
            return Ok(self.dead(String::new(), RunStatus::Crashed));
        }

        self.runs += 1;
        let token = format!("{}_{}_{}", SENTINEL_PREFIX, std::process::id(), self.runs);
        let mut input = String::new();
        for statement in statements {
            input.push_str(statement);
            input.push('\n');
        }
        if let Some(terminator) = &self.spec.terminator {
            input.push_str(terminator);
            input.push('\n');
        }
        input.push_str(&self.spec.sentinel_for(&token));
        input.push('\n');

        if let Err(e) = self.send(&input) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                return Ok(self.dead(String::new(), RunStatus::Crashed));
            }
            self.kill();
            return Err(RunnerError::Io {
                language: self.spec.language.clone(),
                source: e,
            });
        }
        Ok(self.collect(&token, timeout))
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn shutdown(&mut self) {
        if !self.alive {
            return;
        }
        // closing stdin asks the interpreter to exit on its own
        self.stdin = None;
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        while Instant::now() < deadline {
            match self.child.try_wait() {
                Ok(Some(_)) | Err(_) => break,
                Ok(None) => thread::sleep(Duration::from_millis(10)),
            }
        }
        self.kill();
    }
}

impl Drop for InterpreterSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawns [`InterpreterSession`]s from a table of [`SessionSpec`]s.
#[derive(Debug, Clone, Default)]
pub struct InterpreterFactory {
    specs: BTreeMap<String, SessionSpec>,
}

impl InterpreterFactory {
    pub fn new(specs: impl IntoIterator<Item = SessionSpec>) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|spec| (spec.language.clone(), spec))
                .collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(SessionSpec::builtin())
    }

    /// Overrides the command line used for `language`.
    pub fn set_command(&mut self, language: &str, command_line: &str) -> Result<(), RunnerError> {
        let spec = self
            .specs
            .get(language)
            .cloned()
            .ok_or_else(|| RunnerError::UnknownLanguage(language.to_string()))?;
        let spec = spec.with_command(command_line).ok_or_else(|| RunnerError::Spawn {
            language: language.to_string(),
            program: String::new(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty command line"),
        })?;
        self.specs.insert(language.to_string(), spec);
        Ok(())
    }

    pub fn spec(&self, language: &str) -> Option<&SessionSpec> {
        self.specs.get(language)
    }
}

impl SessionFactory for InterpreterFactory {
    fn open(&self, language: &str) -> Result<Box<dyn Session + Send>, RunnerError> {
        let spec = self
            .specs
            .get(language)
            .cloned()
            .ok_or_else(|| RunnerError::UnknownLanguage(language.to_string()))?;
        Ok(Box::new(InterpreterSession::spawn(spec)?))
    }
}
