// crates/run_examples/src/main.rs

use std::io;
use std::process::ExitCode;

use anyhow::Result;
use run_examples::config::{self, AppConfig};
use run_examples::{logging, report::Verdict};

fn main() -> ExitCode {
    match try_main() {
        Ok(verdict) => ExitCode::from(verdict.exit_code()),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(Verdict::Fatal.exit_code())
        }
    }
}

fn try_main() -> Result<Verdict> {
    let matches = config::command().get_matches();
    let config = AppConfig::from_matches(&matches)?;
    if let Err(err) = logging::init(config.verbosity, config.quiet) {
        eprintln!("Error: could not install logger: {}", err);
    }
    log::debug!("{:?}", config);

    let factory = config.session_factory()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_examples::run(&config, &factory, &mut out)
}
