use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;

use augur_codex::CodeBase;
use augur_codex::populator::hydrate_all;
use augur_codex::scanner::ScanOptions;
use augur_codex::scanner::scan_program;
use itertools::Itertools;

use crate::config::Configuration;
use crate::error::Error;

/// Print every known function and method signature as
/// `<fqsen>: param1, param2, ... → return`.
#[derive(Debug, Args)]
pub struct DumpSignaturesCommand {
    /// Files or directories holding `*.ast.json` dumps.
    pub paths: Vec<PathBuf>,
}

impl DumpSignaturesCommand {
    pub fn execute(self, configuration: Configuration) -> Result<ExitCode, Error> {
        let settings = configuration.to_settings();

        let command = super::analyze::AnalyzeCommand {
            paths: self.paths,
            format: super::analyze::OutputFormat::Plain,
            minimum_severity: None,
            processes: None,
            dead_code_detection: false,
        };
        let (files, _syntax_issues) = command.load_files(&settings)?;

        let scan_options = ScanOptions {
            read_type_annotations: settings.read_type_annotations,
            generic_types_enabled: settings.generic_types_enabled,
        };

        let mut codebase = CodeBase::new();
        for file in &files {
            scan_program(&mut codebase, file.path, &file.root, &scan_options);
        }
        let _ = hydrate_all(&mut codebase);

        for function in codebase.functions().sorted_by_key(|function| function.fqsen.to_atom()) {
            println!("{}", function.to_signature_string());
        }
        for class in codebase.classes().sorted_by_key(|class| class.fqsen.to_atom()) {
            for method in class.methods.values().sorted_by_key(|method| method.name) {
                println!("{}", method.to_signature_string());
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}
