//! The analysis pass.
//!
//! Walks every AST a second time with a live [`Context`], inferring the
//! union type of every expression, updating scopes through assignments and
//! condition narrowing, merging scopes at branch joins, validating call
//! sites and overrides, and emitting issues.
//!
//! The entry point is [`run`]: a two-phase whole-program driver. The parse
//! pass (the codex scanner) completes over **all** files before analysis
//! begins on **any** file; the analysis phase may be partitioned across
//! worker threads, each holding a private clone of the hydrated
//! [`CodeBase`].

use augur_ast::Node;
use augur_atom::Atom;
use augur_atom::AtomSet;
use augur_codex::CodeBase;
use augur_codex::populator::hydrate_all;
use augur_codex::scanner::ScanOptions;
use augur_codex::scanner::scan_program;
use augur_reporting::BufferingCollector;
use augur_reporting::ChainedIssueFilter;
use augur_reporting::Collector;
use augur_reporting::IssueInstance;
use augur_reporting::IssueKind;
use augur_reporting::MinimumSeverityFilter;
use augur_reporting::Severity;
use augur_reporting::SuppressionIssueFilter;
use augur_reporting::WhitelistIssueFilter;
use rayon::prelude::*;

use crate::context::Context;
use crate::error::DriverError;
use crate::settings::Settings;

pub mod assignment;
pub mod class_like;
pub mod condition;
pub mod context;
pub mod error;
pub mod expression;
pub mod invocation;
pub mod merge;
pub mod settings;
pub mod statement;

/// One input file: its path and the AST the external front-end produced.
#[derive(Debug, Clone)]
pub struct FileAst {
    pub path: Atom,
    pub root: Node,
}

/// The per-worker analysis engine.
///
/// Owns a mutable view of the codebase (types widen as assignments are
/// proven) and accumulates raw issue instances; filtering and ordering
/// happen in the driver.
pub struct Analyzer<'a> {
    pub(crate) codebase: &'a mut CodeBase,
    pub(crate) settings: &'a Settings,
    issues: Vec<IssueInstance>,
    /// Keys of classes whose constructor was seen calling
    /// `parent::__construct()`.
    pub(crate) parent_constructor_calls: AtomSet,
}

impl<'a> Analyzer<'a> {
    #[must_use]
    pub fn new(codebase: &'a mut CodeBase, settings: &'a Settings) -> Self {
        Self { codebase, settings, issues: Vec::new(), parent_constructor_calls: AtomSet::default() }
    }

    /// Runs the analysis pass over one file.
    pub fn analyze_file(&mut self, file: &FileAst) {
        let context = Context::new(file.path);
        self.analyze_statement(context, &file.root);
    }

    #[must_use]
    pub fn into_issues(self) -> Vec<IssueInstance> {
        self.issues
    }

    /// Emits an issue unless a scope-level `@suppress` covers it.
    ///
    /// The global suppress and whitelist lists are applied by the driver's
    /// filter chain; each mechanism is consulted independently.
    pub(crate) fn emit(&mut self, context: &Context, kind: IssueKind, line: u32, arguments: Vec<String>) {
        if context.is_suppressed(kind.name()) {
            return;
        }

        self.issues.push(IssueInstance::new(kind, context.file, line, arguments));
    }

    /// Emission path for the per-class analyzers, which run without a live
    /// context; `suppressions` is the owning element's `@suppress` list.
    pub(crate) fn emit_for_element(
        &mut self,
        suppressions: &[Atom],
        kind: IssueKind,
        file: Atom,
        line: u32,
        arguments: Vec<String>,
    ) {
        if suppressions.iter().any(|name| name.as_str() == kind.name()) {
            return;
        }

        self.issues.push(IssueInstance::new(kind, file, line, arguments));
    }

    pub(crate) fn emit_instance(&mut self, context: &Context, instance: IssueInstance) {
        if context.is_suppressed(instance.kind.name()) {
            return;
        }

        self.issues.push(instance);
    }
}

/// Runs the whole three-layer pipeline over a set of files.
///
/// Files are deduplicated preserving first occurrence. The parse pass and
/// ancestor hydration run single-threaded; the analysis pass partitions
/// the file list into `settings.processes` groups by index modulo N, each
/// worker analyzing its share against a private codebase clone. The
/// returned stream is filtered and deterministically ordered.
///
/// # Errors
///
/// Refuses to combine dead-code detection with more than one process:
/// reference counts require a global view.
pub fn run(settings: &Settings, files: &[FileAst]) -> Result<Vec<IssueInstance>, DriverError> {
    if settings.dead_code_detection && settings.processes > 1 {
        return Err(DriverError::DeadCodeWithMultipleProcesses);
    }

    let mut seen = AtomSet::default();
    let files: Vec<&FileAst> = files.iter().filter(|file| seen.insert(file.path)).collect();

    let scan_options =
        ScanOptions { read_type_annotations: settings.read_type_annotations, generic_types_enabled: settings.generic_types_enabled };

    let mut codebase = CodeBase::new();
    for file in &files {
        tracing::debug!("scanning {}", file.path);
        scan_program(&mut codebase, file.path, &file.root, &scan_options);
    }

    let mut issues = hydrate_all(&mut codebase);

    if settings.processes <= 1 {
        let mut analyzer = Analyzer::new(&mut codebase, settings);
        for file in &files {
            tracing::debug!("analyzing {}", file.path);
            analyzer.analyze_file(file);
        }
        analyzer.analyze_classes(None);
        issues.extend(analyzer.into_issues());
    } else {
        let group_count = settings.processes;
        let mut groups: Vec<Vec<&FileAst>> = vec![Vec::new(); group_count];
        for (index, file) in files.iter().enumerate() {
            groups[index % group_count].push(file);
        }

        let worker_issues: Vec<Vec<IssueInstance>> = groups
            .par_iter()
            .map(|group| {
                let mut worker_codebase = codebase.clone();
                let mut analyzer = Analyzer::new(&mut worker_codebase, settings);
                for file in group {
                    analyzer.analyze_file(file);
                }

                let owned_files: AtomSet = group.iter().map(|file| file.path).collect();
                analyzer.analyze_classes(Some(&owned_files));
                analyzer.into_issues()
            })
            .collect();

        for worker in worker_issues {
            issues.extend(worker);
        }
    }

    let filter = ChainedIssueFilter::new()
        .with(MinimumSeverityFilter::new(Severity::from_value(settings.minimum_severity)))
        .with(SuppressionIssueFilter::new(settings.suppress_issue_types.clone()))
        .with(WhitelistIssueFilter::new(settings.whitelist_issue_types.clone()));

    let mut collector = BufferingCollector::new().with_filter(filter);
    for issue in issues {
        collector.collect(issue);
    }

    Ok(collector.flush())
}
