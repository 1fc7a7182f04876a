//! Augur - a whole-program static analyzer for PHP-like code.
//!
//! Augur ingests ASTs produced by an external front-end (as `*.ast.json`
//! dumps), builds a global symbol table, infers the type of every
//! expression, and reports diagnostics about undeclared symbols,
//! incompatible types, signature mismatches, unreferenced declarations,
//! and suspicious constructs.
//!
//! # Architecture
//!
//! - **Command layer** ([`commands`]): argument parsing and dispatch
//! - **Configuration layer** ([`config`]): defaults, `augur.toml`,
//!   environment variables, CLI overrides
//! - The analysis itself lives in the `augur-codex` / `augur-analyzer`
//!   crates; the CLI only feeds files in and prints issues out
//!
//! # Exit codes
//!
//! - `0`: analysis completed, no issues surfaced after filtering
//! - `1`: issues were found
//! - `2`: configuration or environment failure

use std::process::ExitCode;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::commands::AugurCommand;
use crate::commands::CliArguments;
use crate::config::Configuration;
use crate::error::Error;
use crate::utils::initialize_logger;

mod commands;
mod config;
mod error;
mod utils;

/// Exit code for tool errors, distinct from "issues were found" (1).
const EXIT_CODE_ERROR: u8 = 2;

pub fn main() -> ExitCode {
    run().unwrap_or_else(|error| {
        tracing::error!("{}", error);
        tracing::trace!("Exiting with error code due to: {:#?}", error);

        ExitCode::from(EXIT_CODE_ERROR)
    })
}

/// Parses arguments, loads configuration, initializes the thread pool, and
/// dispatches to the selected command.
pub fn run() -> Result<ExitCode, Error> {
    let arguments = CliArguments::parse();

    initialize_logger(if cfg!(debug_assertions) { LevelFilter::DEBUG } else { LevelFilter::INFO }, "AUGUR_LOG");

    let configuration = Configuration::load(arguments.workspace.clone(), arguments.config.as_deref())?;

    rayon::ThreadPoolBuilder::new().num_threads(configuration.analysis.processes.max(1)).build_global()?;

    match arguments.command {
        AugurCommand::Analyze(cmd) => cmd.execute(configuration),
        AugurCommand::DumpSignatures(cmd) => cmd.execute(configuration),
        AugurCommand::Init(cmd) => cmd.execute(configuration),
    }
}
