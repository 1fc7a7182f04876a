use std::process::ExitCode;

use clap::Args;

use crate::config::Configuration;
use crate::error::Error;

/// Write a starter `augur.toml` into the workspace.
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn execute(self, configuration: Configuration) -> Result<ExitCode, Error> {
        let workspace =
            configuration.project_root_directory.clone().unwrap_or_else(|| std::path::PathBuf::from("."));
        let target = workspace.join("augur.toml");

        if target.exists() && !self.force {
            tracing::warn!("{} already exists; pass --force to overwrite", target.display());
            return Ok(ExitCode::FAILURE);
        }

        let rendered = toml::to_string_pretty(&Configuration::default())?;
        std::fs::write(&target, rendered).map_err(Error::WritingConfiguration)?;

        tracing::info!("Wrote {}", target.display());
        Ok(ExitCode::SUCCESS)
    }
}
