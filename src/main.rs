//! `pstow` binary: parse arguments, load defaults, run one stow.
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{CommandFactory as _, Parser as _};

use pstow_cli::cli::Cli;
use pstow_cli::config::{Defaults, defaults};
use pstow_cli::logging::{self, Logger};
use pstow_cli::ownership::SystemOwnership;
use pstow_cli::prompt::{self, TerminalPrompt};
use pstow_cli::stower::{StowOutcome, Stower};

/// Deep source trees recurse once per directory level.
const ENGINE_STACK_SIZE: usize = 256 * 1024 * 1024;

const EXIT_FAILURE: u8 = 1;
const EXIT_ABORTED: u8 = 3;
const EXIT_ENTRY_FAILURES: u8 = 4;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    if let Some(shell) = args.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "pstow", &mut std::io::stdout());
        return ExitCode::SUCCESS;
    }

    logging::init_subscriber(args.verbose);
    let log = Logger::new();

    let worker = std::thread::Builder::new()
        .name("pstow-engine".to_string())
        .stack_size(ENGINE_STACK_SIZE)
        .spawn(move || {
            let code = match run(&args, &log) {
                Ok(code) => code,
                Err(e) => {
                    log.error(&format!("{e:#}"));
                    ExitCode::from(EXIT_FAILURE)
                }
            };
            log.print_summary();
            code
        });

    match worker.map(std::thread::JoinHandle::join) {
        Ok(Ok(code)) => code,
        Ok(Err(_)) => ExitCode::from(EXIT_FAILURE),
        Err(e) => {
            tracing::error!("cannot start engine thread: {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(args: &Cli, log: &Logger) -> Result<ExitCode> {
    let defaults = match args.defaults_path() {
        Some(path) => defaults::load(&path)?,
        None => Defaults::default(),
    };
    let options = args.to_options(&defaults)?;

    prompt::install_interrupt_handler().context("installing Ctrl-C handler")?;

    let ownership = SystemOwnership::current();
    let confirm = TerminalPrompt;
    let mut stower = Stower::new(options, log, &ownership, &confirm)?;

    Ok(match stower.run()? {
        StowOutcome::Linked(report) if report.failed > 0 => ExitCode::from(EXIT_ENTRY_FAILURES),
        StowOutcome::Linked(_) | StowOutcome::Displayed(_) => ExitCode::SUCCESS,
        StowOutcome::Aborted(_) => ExitCode::from(EXIT_ABORTED),
    })
}
