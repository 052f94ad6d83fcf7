// crates/run_examples/src/config.rs

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use example_parser::{ExampleOptions, LanguageRules};
use output_matcher::diff::DiffMode;
use session_runner::InterpreterFactory;

use crate::execute::{RunSettings, DEFAULT_TIMEOUT};

/// Seconds; used when `--timeout` is not given.
pub const TIMEOUT_ENV: &str = "RUN_EXAMPLES_TIMEOUT";
/// Worker threads; used when `--jobs` is not given.
pub const JOBS_ENV: &str = "RUN_EXAMPLES_JOBS";

pub fn command() -> Command {
    Command::new("run_examples")
        .version("0.1.0")
        .about("Runs the interactive examples found in the comments of source and documentation files")
        .arg(
            Arg::new("files")
                .help("Files or directories to check")
                .num_args(1..)
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("language")
                .short('l')
                .long("language")
                .action(ArgAction::Append)
                .help("Only run examples of this language (python, ruby, shell, cpp); repeatable"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .num_args(1)
                .help("Seconds each example may run [default: 2]"),
        )
        .arg(
            Arg::new("fail_fast")
                .long("ff")
                .alias("fail-fast")
                .help("Stop at the first failing example")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry")
                .long("dry")
                .help("Parse the examples without running them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("skip")
                .long("skip")
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Do not check this file or directory; repeatable"),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .num_args(1)
                .help("Number of files checked in parallel [default: 1]"),
        )
        .arg(
            Arg::new("diff")
                .short('d')
                .long("diff")
                .value_parser(["none", "unified", "ndiff"])
                .default_value("none")
                .help("How to show a mismatch"),
        )
        .arg(
            Arg::new("options")
                .short('o')
                .long("options")
                .num_args(1)
                .allow_hyphen_values(true)
                .help("Default example options, e.g. \"+norm-ws -tags\"")
                .long_help(
                    "Default example options, e.g. \"+norm-ws -tags +paste\". \
                     Wildcards (<...> and <name>) match up to the first occurrence \
                     of the text that follows them and do not backtrack.",
                ),
        )
        .arg(
            Arg::new("shebang")
                .long("shebang")
                .action(ArgAction::Append)
                .help("Interpreter command line for a language, as <language>=<command>"),
        )
        .arg(
            Arg::new("search_line_comments")
                .long("search-line-comments")
                .help("Also look for examples in line comments (// ...) of every file type")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("More logging; repeat for more")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Print nothing; only the exit status tells the result")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
}

/// Runtime configuration composed from the command line and environment.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub files: Vec<PathBuf>,
    pub skip: Vec<PathBuf>,
    /// Empty means every built-in language.
    pub languages: Vec<String>,
    pub timeout: Duration,
    pub jobs: usize,
    pub fail_fast: bool,
    pub dry: bool,
    pub diff: DiffMode,
    pub options: ExampleOptions,
    /// `(language, command line)` overrides.
    pub shebangs: Vec<(String, String)>,
    pub search_line_comments: bool,
    pub verbosity: u8,
    pub quiet: bool,
}

fn parse_timeout(value: &str) -> Result<Duration> {
    let secs: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid timeout '{}'", value))?;
    if secs <= 0.0 {
        return Err(anyhow!("Timeout must be a positive number of seconds, got '{}'", value));
    }
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("Timeout '{}' is out of range", value))
}

fn parse_jobs(value: &str) -> Result<usize> {
    let jobs: usize = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid number of jobs '{}'", value))?;
    if jobs == 0 {
        return Err(anyhow!("The number of jobs must be at least 1"));
    }
    Ok(jobs)
}

fn parse_shebang(value: &str) -> Result<(String, String)> {
    let (language, command) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid shebang '{}', expected <language>=<command>", value))?;
    if language.trim().is_empty() || command.trim().is_empty() {
        return Err(anyhow!("Invalid shebang '{}', expected <language>=<command>", value));
    }
    Ok((language.trim().to_string(), command.trim().to_string()))
}

impl AppConfig {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        Self::from_matches_with_env(matches, |key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_matches`] with an explicit environment lookup.
    pub fn from_matches_with_env<E>(matches: &ArgMatches, lookup: E) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let strings = |id: &str| -> Vec<String> {
            matches
                .get_many::<String>(id)
                .unwrap_or_default()
                .cloned()
                .collect()
        };
        let paths = |id: &str| -> Vec<PathBuf> {
            matches
                .get_many::<PathBuf>(id)
                .unwrap_or_default()
                .cloned()
                .collect()
        };

        let flag_or_env = |id: &str, key: &str| {
            matches.get_one::<String>(id).cloned().or_else(|| lookup(key))
        };
        let timeout = match flag_or_env("timeout", TIMEOUT_ENV) {
            Some(value) => parse_timeout(&value)?,
            None => DEFAULT_TIMEOUT,
        };
        let jobs = match flag_or_env("jobs", JOBS_ENV) {
            Some(value) => parse_jobs(&value)?,
            None => 1,
        };
        let diff = match matches.get_one::<String>("diff") {
            Some(mode) => mode.parse::<DiffMode>().map_err(|e| anyhow!(e))?,
            None => DiffMode::None,
        };
        let options = match matches.get_one::<String>("options") {
            Some(flags) => ExampleOptions::from_flags(flags)
                .map_err(|bad| anyhow!("Invalid option '{}' in --options", bad))?,
            None => ExampleOptions::default(),
        };
        let shebangs = strings("shebang")
            .iter()
            .map(|s| parse_shebang(s))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            files: paths("files"),
            skip: paths("skip"),
            languages: strings("language"),
            timeout,
            jobs,
            fail_fast: matches.get_flag("fail_fast"),
            dry: matches.get_flag("dry"),
            diff,
            options,
            shebangs,
            search_line_comments: matches.get_flag("search_line_comments"),
            verbosity: matches.get_count("verbose"),
            quiet: matches.get_flag("quiet"),
        })
    }

    pub fn language_rules(&self) -> Result<LanguageRules> {
        let builtin = LanguageRules::builtin();
        if self.languages.is_empty() {
            return Ok(builtin);
        }
        builtin
            .select(&self.languages)
            .context("Invalid --language")
    }

    pub fn session_factory(&self) -> Result<InterpreterFactory> {
        let mut factory = InterpreterFactory::builtin();
        for (language, command) in &self.shebangs {
            factory
                .set_command(language, command)
                .with_context(|| format!("Invalid --shebang for {}", language))?;
        }
        Ok(factory)
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            timeout: self.timeout,
            fail_fast: self.fail_fast,
            defaults: self.options.clone(),
        }
    }
}
