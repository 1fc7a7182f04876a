//! Configuration management for the Augur CLI.
//!
//! Configuration merges from the following sources, in order of precedence
//! (highest to lowest):
//!
//! 1. Environment variables prefixed with `AUGUR_` (e.g. `AUGUR_ANALYSIS_PROCESSES=4`)
//! 2. `augur.toml` in the workspace directory (or the `--config` file)
//! 3. Built-in defaults
//!
//! The `[analysis]` table maps onto the analyzer's `Settings`.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use config::Case;
use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use augur_analyzer::settings::Settings;

use crate::error::Error;

const CONFIGURATION_FILE_NAME: &str = "augur.toml";
const ENVIRONMENT_PREFIX: &str = "AUGUR";

fn default_processes() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// The `[analysis]` section: the §-by-§ analyzer configuration record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AnalysisConfiguration {
    /// Minimum severity an issue needs to be reported: 0, 5, or 10.
    #[serde(default)]
    pub minimum_severity: u8,

    #[serde(default)]
    pub quick_mode: bool,

    #[serde(default)]
    pub backward_compatibility_checks: bool,

    /// Incompatible with more than one process.
    #[serde(default)]
    pub dead_code_detection: bool,

    #[serde(default = "default_true")]
    pub analyze_signature_compatibility: bool,

    #[serde(default)]
    pub allow_missing_properties: bool,

    #[serde(default = "default_true")]
    pub generic_types_enabled: bool,

    #[serde(default = "default_true")]
    pub read_type_annotations: bool,

    #[serde(default)]
    pub ignore_undeclared_variables_in_global_scope: bool,

    /// Classes whose children must call `parent::__construct()`.
    #[serde(default)]
    pub parent_constructor_required: Vec<String>,

    #[serde(default)]
    pub exclude_analysis_directory_list: Vec<String>,

    #[serde(default)]
    pub exclude_file_list: Vec<String>,

    #[serde(default)]
    pub suppress_issue_types: Vec<String>,

    #[serde(default)]
    pub whitelist_issue_types: Vec<String>,

    /// Extra always-defined globals, name to type string.
    #[serde(default)]
    pub globals_type_map: HashMap<String, String>,

    #[serde(default)]
    pub runkit_superglobals: Vec<String>,

    /// Number of parallel analysis workers.
    #[serde(default = "default_processes")]
    pub processes: usize,
}

impl Default for AnalysisConfiguration {
    fn default() -> Self {
        Self {
            minimum_severity: 0,
            quick_mode: false,
            backward_compatibility_checks: false,
            dead_code_detection: false,
            analyze_signature_compatibility: true,
            allow_missing_properties: false,
            generic_types_enabled: true,
            read_type_annotations: true,
            ignore_undeclared_variables_in_global_scope: false,
            parent_constructor_required: Vec::new(),
            exclude_analysis_directory_list: Vec::new(),
            exclude_file_list: Vec::new(),
            suppress_issue_types: Vec::new(),
            whitelist_issue_types: Vec::new(),
            globals_type_map: HashMap::new(),
            runkit_superglobals: Vec::new(),
            processes: 1,
        }
    }
}

/// The top-level configuration for the Augur CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Configuration {
    /// The root directory of the analyzed project.
    #[serde(default)]
    pub project_root_directory: Option<PathBuf>,

    #[serde(default)]
    pub analysis: AnalysisConfiguration,
}

impl Configuration {
    /// Loads and merges configuration from defaults, the workspace (or
    /// explicit) file, and `AUGUR_*` environment variables.
    pub fn load(workspace: Option<PathBuf>, file: Option<&Path>) -> Result<Configuration, Error> {
        let workspace_dir = workspace.clone().unwrap_or_else(|| PathBuf::from("."));

        let mut builder = Config::builder().add_source(Config::try_from(&Configuration::default())?);

        if let Some(file) = file {
            tracing::debug!("Sourcing configuration from {}.", file.display());
            builder = builder.add_source(File::from(file).required(true));
        } else {
            let candidate = workspace_dir.join(CONFIGURATION_FILE_NAME);
            if candidate.exists() {
                tracing::debug!("Sourcing configuration from {}.", candidate.display());
                builder = builder.add_source(File::from(candidate).required(false));
            } else {
                tracing::debug!("No configuration file found, using defaults and environment variables.");
            }
        }

        let mut configuration = builder
            .add_source(Environment::with_prefix(ENVIRONMENT_PREFIX).convert_case(Case::Kebab))
            .build()?
            .try_deserialize::<Configuration>()?;

        if configuration.project_root_directory.is_none() {
            configuration.project_root_directory = Some(workspace_dir);
        }

        Ok(configuration)
    }

    /// Maps the loaded configuration onto the analyzer's settings.
    #[must_use]
    pub fn to_settings(&self) -> Settings {
        let analysis = &self.analysis;
        Settings {
            project_root_directory: self
                .project_root_directory
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| String::from(".")),
            minimum_severity: analysis.minimum_severity,
            quick_mode: analysis.quick_mode,
            backward_compatibility_checks: analysis.backward_compatibility_checks,
            dead_code_detection: analysis.dead_code_detection,
            analyze_signature_compatibility: analysis.analyze_signature_compatibility,
            allow_missing_properties: analysis.allow_missing_properties,
            generic_types_enabled: analysis.generic_types_enabled,
            read_type_annotations: analysis.read_type_annotations,
            ignore_undeclared_variables_in_global_scope: analysis.ignore_undeclared_variables_in_global_scope,
            parent_constructor_required: analysis.parent_constructor_required.clone(),
            exclude_analysis_directory_list: analysis.exclude_analysis_directory_list.clone(),
            exclude_file_list: analysis.exclude_file_list.clone(),
            suppress_issue_types: analysis.suppress_issue_types.clone(),
            whitelist_issue_types: analysis.whitelist_issue_types.clone(),
            globals_type_map: analysis.globals_type_map.clone(),
            runkit_superglobals: analysis.runkit_superglobals.clone(),
            processes: analysis.processes.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults_map_to_settings() {
        let configuration = Configuration::default();
        let settings = configuration.to_settings();

        assert_eq!(settings.processes, 1);
        assert!(settings.analyze_signature_compatibility);
        assert!(settings.read_type_annotations);
        assert!(!settings.dead_code_detection);
    }

    #[test]
    fn test_workspace_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIGURATION_FILE_NAME),
            "[analysis]\nminimum-severity = 5\nprocesses = 3\nparent-constructor-required = [\"A\"]\n",
        )
        .unwrap();

        let configuration = Configuration::load(Some(dir.path().to_path_buf()), None).unwrap();

        assert_eq!(configuration.analysis.minimum_severity, 5);
        assert_eq!(configuration.analysis.processes, 3);
        assert_eq!(configuration.analysis.parent_constructor_required, vec!["A".to_string()]);
    }
}
