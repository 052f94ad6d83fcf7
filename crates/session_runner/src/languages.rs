// crates/session_runner/src/languages.rs

//! How to start and talk to each supported interpreter.

/// Launch and protocol description of one interpreter.
///
/// `sentinel` is a statement template; `{token}` is replaced by a unique
/// token which the statement must print as `"\n<token>\n"` on stdout and on
/// stderr. Everything before it is the example's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSpec {
    pub language: String,
    pub program: String,
    pub args: Vec<String>,
    /// Statements sent once at start-up; their output is discarded.
    pub init: Vec<String>,
    /// Line sent after every example, e.g. to close an open Python block.
    pub terminator: Option<String>,
    pub sentinel: String,
    /// Prompt residue removed from the start of output lines.
    pub strip_prefixes: Vec<String>,
}

impl SessionSpec {
    pub fn python() -> Self {
        Self {
            language: "python".to_string(),
            program: "python3".to_string(),
            args: vec!["-i".into(), "-q".into(), "-u".into()],
            init: vec!["import sys; sys.ps1 = ''; sys.ps2 = ''".to_string()],
            terminator: Some(String::new()),
            sentinel: r"print('\n{token}'); print('\n{token}', file=sys.stderr)".to_string(),
            strip_prefixes: Vec::new(),
        }
    }

    pub fn ruby() -> Self {
        Self {
            language: "ruby".to_string(),
            program: "irb".to_string(),
            args: vec![
                "--noreadline".into(),
                "--nocolorize".into(),
                "--prompt".into(),
                "null".into(),
            ],
            init: Vec::new(),
            terminator: None,
            // irb echoes the symbol as `=> :<token>`, which ends the stdout part
            sentinel: r#"print("\n"); $stderr.print("\n{token}\n"); :{token}"#.to_string(),
            strip_prefixes: Vec::new(),
        }
    }

    pub fn shell() -> Self {
        Self {
            language: "shell".to_string(),
            program: "bash".to_string(),
            args: vec!["--norc".into(), "--noprofile".into()],
            init: Vec::new(),
            terminator: None,
            sentinel: r"printf '\n%s\n' {token}; printf '\n%s\n' {token} >&2".to_string(),
            strip_prefixes: Vec::new(),
        }
    }

    pub fn cpp() -> Self {
        Self {
            language: "cpp".to_string(),
            program: "cling".to_string(),
            args: vec!["--nologo".into()],
            init: vec!["#include <cstdio>".to_string(), "#include <iostream>".to_string()],
            terminator: None,
            sentinel: r#"std::fflush(stdout); std::printf("\n{token}\n"); std::fflush(stdout); std::fprintf(stderr, "\n{token}\n");"#
                .to_string(),
            strip_prefixes: vec!["[cling]$ ? ".to_string(), "[cling]$ ".to_string()],
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::python(), Self::ruby(), Self::shell(), Self::cpp()]
    }

    /// Replaces program and arguments with a whitespace-separated command
    /// line such as `"python3.12 -i -q -u"`. Returns `None` for a blank one.
    pub fn with_command(mut self, command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        self.program = parts.next()?;
        self.args = parts.collect();
        Some(self)
    }

    pub fn sentinel_for(&self, token: &str) -> String {
        self.sentinel.replace("{token}", token)
    }

    /// Removes any configured prompt residue from the start of each line.
    pub fn strip_prompts(&self, output: &str) -> String {
        if self.strip_prefixes.is_empty() {
            return output.to_string();
        }
        output
            .split_inclusive('\n')
            .map(|line| {
                let mut line = line;
                while let Some(rest) = self
                    .strip_prefixes
                    .iter()
                    .find_map(|p| line.strip_prefix(p.as_str()))
                {
                    line = rest;
                }
                line
            })
            .collect()
    }
}
