//! Error types for the Augur CLI.
//!
//! All failures funnel into [`Error`], which is logged through `tracing`
//! before the process exits with code 2. Variants wrap underlying errors
//! and preserve the chain via [`std::error::Error::source`].

use std::path::PathBuf;

use augur_analyzer::error::DriverError;
use rayon::ThreadPoolBuildError;

/// The main error type for all Augur CLI operations.
#[derive(Debug)]
pub enum Error {
    /// Failed to build or merge configuration from its sources.
    BuildingConfiguration(config::ConfigError),

    /// Failed to serialize the starter configuration during `augur init`.
    SerializingToml(toml::ser::Error),

    /// Failed to write the configuration file to disk.
    WritingConfiguration(std::io::Error),

    /// Failed to read an AST dump from disk.
    ReadingAstFile(PathBuf, std::io::Error),

    /// Failed to deserialize an AST dump.
    ParsingAstFile(PathBuf, serde_json::Error),

    /// No input files were found for analysis.
    NoInputFiles,

    /// Failed to serialize JSON output.
    Json(serde_json::Error),

    /// The driver refused the configuration.
    Driver(DriverError),

    /// Failed to initialize the thread pool for parallel processing.
    ThreadPoolBuildError(ThreadPoolBuildError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BuildingConfiguration(error) => write!(f, "Failed to build the configuration: {error}"),
            Self::SerializingToml(error) => write!(f, "Failed to serialize TOML: {error}"),
            Self::WritingConfiguration(error) => write!(f, "Failed to write the configuration file: {error}"),
            Self::ReadingAstFile(path, error) => {
                write!(f, "Failed to read AST dump `{}`: {error}", path.display())
            }
            Self::ParsingAstFile(path, error) => {
                write!(f, "Failed to parse AST dump `{}`: {error}", path.display())
            }
            Self::NoInputFiles => write!(f, "No input files found; pass paths to `*.ast.json` dumps"),
            Self::Json(error) => write!(f, "Failed to serialize JSON: {error}"),
            Self::Driver(error) => write!(f, "Analysis refused: {error}"),
            Self::ThreadPoolBuildError(error) => write!(f, "Failed to build the thread pool: {error}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BuildingConfiguration(error) => Some(error),
            Self::SerializingToml(error) => Some(error),
            Self::WritingConfiguration(error) => Some(error),
            Self::ReadingAstFile(_, error) => Some(error),
            Self::ParsingAstFile(_, error) => Some(error),
            Self::Json(error) => Some(error),
            Self::Driver(error) => Some(error),
            Self::ThreadPoolBuildError(error) => Some(error),
            Self::NoInputFiles => None,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Self::BuildingConfiguration(error)
    }
}

impl From<toml::ser::Error> for Error {
    fn from(error: toml::ser::Error) -> Self {
        Self::SerializingToml(error)
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<DriverError> for Error {
    fn from(error: DriverError) -> Self {
        Self::Driver(error)
    }
}

impl From<ThreadPoolBuildError> for Error {
    fn from(error: ThreadPoolBuildError) -> Self {
        Self::ThreadPoolBuildError(error)
    }
}
