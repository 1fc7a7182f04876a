use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Args;
use clap::ValueEnum;

use augur_analyzer::FileAst;
use augur_ast::Node;
use augur_atom::atom;
use augur_reporting::BufferingCollector;
use augur_reporting::ChainedIssueFilter;
use augur_reporting::Collector;
use augur_reporting::IssueInstance;
use augur_reporting::IssueKind;
use augur_reporting::MinimumSeverityFilter;
use augur_reporting::Severity;
use augur_reporting::SuppressionIssueFilter;
use augur_reporting::WhitelistIssueFilter;

use crate::config::Configuration;
use crate::error::Error;

/// The extension the external front-end gives its AST dumps.
const AST_DUMP_SUFFIX: &str = ".ast.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

/// Analyze a set of AST dumps and report issues.
#[derive(Debug, Args)]
pub struct AnalyzeCommand {
    /// Files or directories to analyze (`*.ast.json` dumps).
    pub paths: Vec<PathBuf>,

    /// Output format for the issue stream.
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
    pub format: OutputFormat,

    /// Override the configured minimum severity (0, 5, or 10).
    #[arg(long)]
    pub minimum_severity: Option<u8>,

    /// Override the configured number of analysis workers.
    #[arg(long)]
    pub processes: Option<usize>,

    /// Enable dead-code detection for this run.
    #[arg(long)]
    pub dead_code_detection: bool,
}

impl AnalyzeCommand {
    pub fn execute(self, configuration: Configuration) -> Result<ExitCode, Error> {
        let mut settings = configuration.to_settings();
        if let Some(minimum_severity) = self.minimum_severity {
            settings.minimum_severity = minimum_severity;
        }
        if let Some(processes) = self.processes {
            settings.processes = processes.max(1);
        }
        if self.dead_code_detection {
            settings.dead_code_detection = true;
        }

        let (files, syntax_issues) = self.load_files(&settings)?;

        tracing::info!("Analyzing {} file(s)", files.len());
        let mut issues = augur_analyzer::run(&settings, &files)?;

        // Dumps the front-end could not produce a tree for still surface
        // as diagnostics, merged back into deterministic order.
        if !syntax_issues.is_empty() {
            let filter = ChainedIssueFilter::new()
                .with(MinimumSeverityFilter::new(Severity::from_value(settings.minimum_severity)))
                .with(SuppressionIssueFilter::new(settings.suppress_issue_types.clone()))
                .with(WhitelistIssueFilter::new(settings.whitelist_issue_types.clone()));

            let mut collector = BufferingCollector::new().with_filter(filter);
            for issue in issues.into_iter().chain(syntax_issues) {
                collector.collect(issue);
            }
            issues = collector.flush();
        }

        match self.format {
            OutputFormat::Plain => {
                for issue in &issues {
                    println!("{issue}");
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&issues.iter().map(JsonIssue::from).collect::<Vec<_>>())?);
            }
        }

        Ok(if issues.is_empty() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }

    /// Discovers and deserializes the AST dumps the command operates on.
    ///
    /// A dump the front-end failed to produce a tree for becomes a
    /// `SyntaxError` issue at the reported line rather than a tool error.
    pub(crate) fn load_files(
        &self,
        settings: &augur_analyzer::settings::Settings,
    ) -> Result<(Vec<FileAst>, Vec<IssueInstance>), Error> {
        let roots = if self.paths.is_empty() {
            vec![PathBuf::from(&settings.project_root_directory)]
        } else {
            self.paths.clone()
        };

        let mut dump_paths = Vec::new();
        for root in &roots {
            collect_ast_dumps(root, &settings.exclude_analysis_directory_list, &mut dump_paths);
        }
        dump_paths.retain(|path| {
            let display = path.display().to_string();
            !settings.exclude_file_list.iter().any(|excluded| display.ends_with(excluded))
        });
        if dump_paths.is_empty() {
            return Err(Error::NoInputFiles);
        }

        let mut files = Vec::with_capacity(dump_paths.len());
        let mut syntax_issues = Vec::new();
        for path in dump_paths {
            match load_ast_dump(&path) {
                Ok(file) => files.push(file),
                Err(Error::ParsingAstFile(path, error)) => {
                    syntax_issues.push(IssueInstance::new(
                        IssueKind::SyntaxError,
                        atom(&original_source_name(&path)),
                        error.line() as u32,
                        vec![error.to_string()],
                    ));
                }
                Err(error) => return Err(error),
            }
        }
        Ok((files, syntax_issues))
    }
}

/// Reads one AST dump; the file the dump was produced from names the
/// analysis context.
fn load_ast_dump(path: &Path) -> Result<FileAst, Error> {
    let source = std::fs::read_to_string(path).map_err(|error| Error::ReadingAstFile(path.to_path_buf(), error))?;
    let root: Node =
        serde_json::from_str(&source).map_err(|error| Error::ParsingAstFile(path.to_path_buf(), error))?;

    Ok(FileAst { path: atom(&original_source_name(path)), root })
}

/// The name of the file the dump was produced from.
fn original_source_name(path: &Path) -> String {
    let display = path.display().to_string();
    display.strip_suffix(AST_DUMP_SUFFIX).unwrap_or(&display).to_string()
}

/// Walks a path collecting AST dumps in deterministic (sorted) order.
fn collect_ast_dumps(root: &Path, excluded_directories: &[String], into: &mut Vec<PathBuf>) {
    if root.is_file() {
        into.push(root.to_path_buf());
        return;
    }

    let Ok(entries) = std::fs::read_dir(root) else {
        tracing::warn!("Skipping unreadable directory {}", root.display());
        return;
    };

    let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            let display = path.display().to_string();
            if excluded_directories.iter().any(|excluded| display.ends_with(excluded)) {
                continue;
            }
            collect_ast_dumps(&path, excluded_directories, into);
        } else if path.display().to_string().ends_with(AST_DUMP_SUFFIX) {
            into.push(path);
        }
    }
}

/// The JSON rendering of one issue.
#[derive(serde::Serialize)]
struct JsonIssue {
    #[serde(rename = "type")]
    type_name: &'static str,
    type_id: u32,
    severity: u8,
    file: String,
    line: u32,
    message: String,
}

impl From<&IssueInstance> for JsonIssue {
    fn from(issue: &IssueInstance) -> Self {
        Self {
            type_name: issue.kind.name(),
            type_id: issue.kind.id(),
            severity: issue.kind.severity().value(),
            file: issue.file.to_string(),
            line: issue.line,
            message: issue.message(),
        }
    }
}
