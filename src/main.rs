mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod state;
mod sudo;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use declarative::{ApplyError, DescriptorError};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

/// Fatal apply failure, or any other runtime error
const EXIT_FAILURE: u8 = 1;
/// Descriptor could not be parsed or failed validation
const EXIT_INVALID: u8 = 2;
/// Run cancelled by Ctrl-C
const EXIT_CANCELLED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match run(&ctx, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(report(&e)),
    }
}

fn run(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Apply(args) => commands::declarative::apply(ctx, args),
        Command::Diff(args) => commands::declarative::diff(ctx, args),
        Command::Validate { descriptor } => commands::declarative::validate(ctx, &descriptor),
        Command::Status => commands::status::run(ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "provision", &mut io::stdout());
            Ok(())
        }
    }
}

/// Print an error and pick the exit code for it
fn report(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<ApplyError>() {
        Some(apply) => engine::executor::print_failure(apply),
        None => ui::error(&format!("{e:#}")),
    }
    exit_code(e)
}

fn exit_code(e: &anyhow::Error) -> u8 {
    if let Some(apply) = e.downcast_ref::<ApplyError>() {
        return if apply.is_cancelled() {
            EXIT_CANCELLED
        } else {
            EXIT_FAILURE
        };
    }
    if e.downcast_ref::<DescriptorError>().is_some() {
        EXIT_INVALID
    } else {
        EXIT_FAILURE
    }
}
