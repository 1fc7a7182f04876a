//! The diagnostic model of the Augur analyzer.
//!
//! The catalog of every diagnostic the analyzer can emit lives here as
//! [`IssueKind`]: a fixed set of issue types, each with a category bitmask,
//! a severity, a printf-style message template, a coarse remediation
//! effort, and a stable numeric id. An [`IssueInstance`] binds an issue
//! type to a source location and message arguments.
//!
//! Emission flows through a [`Collector`]; the [`BufferingCollector`]
//! applies a filter chain and buffers passing instances under a sort key so
//! that flushing always produces a deterministic stream.

pub mod collector;
pub mod filter;
pub mod issue;

pub use collector::BufferingCollector;
pub use collector::Collector;
pub use filter::CategoryIssueFilter;
pub use filter::ChainedIssueFilter;
pub use filter::FileIssueFilter;
pub use filter::IssueFilter;
pub use filter::MinimumSeverityFilter;
pub use filter::SuppressionIssueFilter;
pub use filter::WhitelistIssueFilter;
pub use issue::Category;
pub use issue::IssueInstance;
pub use issue::IssueKind;
pub use issue::RemediationEffort;
pub use issue::Severity;
