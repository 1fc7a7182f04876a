use std::fmt;

use augur_codex::MissingSymbol;
use augur_reporting::IssueInstance;

/// An expected child node of a particular kind was not present.
///
/// Typical causes: a dynamic method name, a variable-variable, a malformed
/// tree. Always caught; the construct is treated as unanalyzable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeShapeError {
    pub expected: &'static str,
    pub line: u32,
}

impl fmt::Display for NodeShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {} at line {}", self.expected, self.line)
    }
}

impl std::error::Error for NodeShapeError {}

/// Non-fatal failures raised inside the engine and caught at visitor
/// boundaries.
#[derive(Debug)]
pub enum AnalysisInterrupt {
    /// A requested FQSEN is absent; the catcher usually emits the matching
    /// `Undeclared*` diagnostic.
    MissingSymbol(MissingSymbol),
    /// The tree does not have the expected shape; swallowed.
    NodeShape(NodeShapeError),
    /// Carries a diagnostic for the boundary to emit (or suppress).
    Raise(Box<IssueInstance>),
    /// The engine cannot reason about the construct at all.
    Unanalyzable,
}

impl From<MissingSymbol> for AnalysisInterrupt {
    fn from(error: MissingSymbol) -> Self {
        AnalysisInterrupt::MissingSymbol(error)
    }
}

impl From<NodeShapeError> for AnalysisInterrupt {
    fn from(error: NodeShapeError) -> Self {
        AnalysisInterrupt::NodeShape(error)
    }
}

impl From<IssueInstance> for AnalysisInterrupt {
    fn from(instance: IssueInstance) -> Self {
        AnalysisInterrupt::Raise(Box::new(instance))
    }
}

/// The result type of every expression visitor.
pub type AnalysisResult<T> = Result<T, AnalysisInterrupt>;

/// A configuration combination the driver refuses to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// Reference counts need a global view; partitioned workers cannot
    /// provide one.
    DeadCodeWithMultipleProcesses,
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::DeadCodeWithMultipleProcesses => {
                write!(f, "dead code detection requires a single analysis process")
            }
        }
    }
}

impl std::error::Error for DriverError {}
