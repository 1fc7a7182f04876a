use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;

pub mod analyze;
pub mod dump_signatures;
pub mod init;

/// Augur - a whole-program static analyzer for PHP-like code.
#[derive(Debug, Parser)]
#[command(name = "augur", version, about)]
pub struct CliArguments {
    /// The workspace directory to operate in.
    #[arg(long, global = true)]
    pub workspace: Option<PathBuf>,

    /// An explicit configuration file, bypassing workspace discovery.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: AugurCommand,
}

#[derive(Debug, Subcommand)]
pub enum AugurCommand {
    /// Analyze a set of AST dumps and report issues.
    Analyze(analyze::AnalyzeCommand),
    /// Print every known function and method signature.
    DumpSignatures(dump_signatures::DumpSignaturesCommand),
    /// Write a starter configuration file.
    Init(init::InitCommand),
}
