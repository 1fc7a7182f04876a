use augur_atom::Atom;
use augur_atom::AtomSet;

use crate::issue::Category;
use crate::issue::IssueInstance;
use crate::issue::Severity;

/// A composable predicate over issue instances.
///
/// An instance is emitted only when every filter in the active chain
/// supports it.
pub trait IssueFilter {
    fn supports(&self, instance: &IssueInstance) -> bool;
}

/// Passes issues at or above a minimum severity.
#[derive(Debug, Clone, Copy)]
pub struct MinimumSeverityFilter {
    minimum: Severity,
}

impl MinimumSeverityFilter {
    #[must_use]
    pub fn new(minimum: Severity) -> Self {
        Self { minimum }
    }
}

impl IssueFilter for MinimumSeverityFilter {
    fn supports(&self, instance: &IssueInstance) -> bool {
        instance.kind.severity() >= self.minimum
    }
}

/// Passes issues whose category intersects a mask.
#[derive(Debug, Clone, Copy)]
pub struct CategoryIssueFilter {
    mask: Category,
}

impl CategoryIssueFilter {
    #[must_use]
    pub fn new(mask: Category) -> Self {
        Self { mask }
    }
}

impl IssueFilter for CategoryIssueFilter {
    fn supports(&self, instance: &IssueInstance) -> bool {
        self.mask.intersects(instance.kind.category())
    }
}

/// Passes issues from a fixed set of files.
#[derive(Debug, Clone)]
pub struct FileIssueFilter {
    files: AtomSet,
}

impl FileIssueFilter {
    #[must_use]
    pub fn new(files: impl IntoIterator<Item = Atom>) -> Self {
        Self { files: files.into_iter().collect() }
    }
}

impl IssueFilter for FileIssueFilter {
    fn supports(&self, instance: &IssueInstance) -> bool {
        self.files.contains(&instance.file)
    }
}

/// Rejects issue types on a global suppress list.
#[derive(Debug, Clone, Default)]
pub struct SuppressionIssueFilter {
    suppressed: Vec<String>,
}

impl SuppressionIssueFilter {
    #[must_use]
    pub fn new(suppressed: Vec<String>) -> Self {
        Self { suppressed }
    }
}

impl IssueFilter for SuppressionIssueFilter {
    fn supports(&self, instance: &IssueInstance) -> bool {
        !self.suppressed.iter().any(|name| name == instance.kind.name())
    }
}

/// Passes only whitelisted issue types.
///
/// An empty whitelist passes everything; the whitelist mechanism is opt-in.
#[derive(Debug, Clone, Default)]
pub struct WhitelistIssueFilter {
    whitelisted: Vec<String>,
}

impl WhitelistIssueFilter {
    #[must_use]
    pub fn new(whitelisted: Vec<String>) -> Self {
        Self { whitelisted }
    }
}

impl IssueFilter for WhitelistIssueFilter {
    fn supports(&self, instance: &IssueInstance) -> bool {
        self.whitelisted.is_empty() || self.whitelisted.iter().any(|name| name == instance.kind.name())
    }
}

/// A conjunction of filters.
#[derive(Default)]
pub struct ChainedIssueFilter {
    filters: Vec<Box<dyn IssueFilter + Send + Sync>>,
}

impl ChainedIssueFilter {
    #[must_use]
    pub fn new() -> Self {
        Self { filters: Vec::new() }
    }

    #[must_use]
    pub fn with(mut self, filter: impl IssueFilter + Send + Sync + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
}

impl IssueFilter for ChainedIssueFilter {
    fn supports(&self, instance: &IssueInstance) -> bool {
        self.filters.iter().all(|filter| filter.supports(instance))
    }
}

#[cfg(test)]
mod tests {
    use augur_atom::atom;

    use crate::issue::IssueKind;

    use super::*;

    fn instance(kind: IssueKind) -> IssueInstance {
        IssueInstance::new(kind, atom("a.php"), 1, vec![])
    }

    #[test]
    fn test_minimum_severity_filter() {
        let filter = MinimumSeverityFilter::new(Severity::Normal);

        assert!(filter.supports(&instance(IssueKind::UndeclaredClass)));
        assert!(!filter.supports(&instance(IssueKind::NoopVariable)));
    }

    #[test]
    fn test_category_filter() {
        let filter = CategoryIssueFilter::new(Category::UNDEFINED | Category::TYPE);

        assert!(filter.supports(&instance(IssueKind::UndeclaredClass)));
        assert!(!filter.supports(&instance(IssueKind::ParamTooFewInternal)));
    }

    #[test]
    fn test_whitelist_passes_everything_when_empty() {
        let filter = WhitelistIssueFilter::default();

        assert!(filter.supports(&instance(IssueKind::NoopArray)));
    }

    #[test]
    fn test_chained_filter_is_a_conjunction() {
        let chain = ChainedIssueFilter::new()
            .with(MinimumSeverityFilter::new(Severity::Normal))
            .with(SuppressionIssueFilter::new(vec!["UndeclaredClass".to_string()]));

        assert!(!chain.supports(&instance(IssueKind::UndeclaredClass)));
        assert!(chain.supports(&instance(IssueKind::UndeclaredFunction)));
    }
}
