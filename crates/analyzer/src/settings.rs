use std::collections::HashMap;

/// Configuration settings that control the behavior of the analyzer.
///
/// The CLI maps its layered configuration onto this struct; library users
/// construct it directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// The root directory of the analyzed project.
    pub project_root_directory: String,

    /// Minimum severity an issue needs to be reported (0, 5, or 10).
    pub minimum_severity: u8,

    /// Skip recursive call-graph analysis beyond one level. Defaults to `false`.
    pub quick_mode: bool,

    /// Flag constructs whose meaning changed across major engine versions.
    /// Defaults to `false`.
    pub backward_compatibility_checks: bool,

    /// Report possibly-unreferenced declarations. Requires a single
    /// analysis process. Defaults to `false`.
    pub dead_code_detection: bool,

    /// Check that overriding methods keep compatible signatures.
    /// Defaults to `true`.
    pub analyze_signature_compatibility: bool,

    /// Writes to undeclared properties synthesize the property instead of
    /// reporting it. Defaults to `false`.
    pub allow_missing_properties: bool,

    /// Honor `@template` / `@inherits` generics-by-convention.
    /// Defaults to `true`.
    pub generic_types_enabled: bool,

    /// Parse doc-comment type annotations at all. Defaults to `true`.
    pub read_type_annotations: bool,

    /// Do not report undeclared variables read in the global scope.
    /// Defaults to `false`.
    pub ignore_undeclared_variables_in_global_scope: bool,

    /// Classes whose children must call `parent::__construct()`, as FQSEN
    /// strings.
    pub parent_constructor_required: Vec<String>,

    /// Directories excluded from the analysis phase (still parsed).
    pub exclude_analysis_directory_list: Vec<String>,

    /// Files excluded entirely.
    pub exclude_file_list: Vec<String>,

    /// Issue type names never reported.
    pub suppress_issue_types: Vec<String>,

    /// When non-empty, only these issue types are reported.
    pub whitelist_issue_types: Vec<String>,

    /// Extra always-defined globals, name to type string.
    pub globals_type_map: HashMap<String, String>,

    /// Extra superglobal names registered by the runtime environment.
    pub runkit_superglobals: Vec<String>,

    /// Number of parallel analysis workers. Defaults to `1`.
    pub processes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root_directory: String::from("."),
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
