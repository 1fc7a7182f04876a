use std::collections::BTreeMap;

use crate::filter::IssueFilter;
use crate::issue::IssueInstance;

/// A sink for issue instances.
pub trait Collector {
    fn collect(&mut self, instance: IssueInstance);
}

/// Collects passing instances into a buffer keyed for deterministic output.
///
/// The buffer key is `(file, line zero-padded to five digits, issue type
/// name, rendered message)`, so flushing yields a stream sorted
/// lexicographically by that tuple regardless of emission order. Exact
/// duplicates collapse onto one entry.
pub struct BufferingCollector {
    filter: Option<Box<dyn IssueFilter + Send + Sync>>,
    buffer: BTreeMap<String, IssueInstance>,
}

impl BufferingCollector {
    #[must_use]
    pub fn new() -> Self {
        Self { filter: None, buffer: BTreeMap::new() }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: impl IssueFilter + Send + Sync + 'static) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Number of buffered instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drains the buffer in sorted key order.
    #[must_use]
    pub fn flush(&mut self) -> Vec<IssueInstance> {
        std::mem::take(&mut self.buffer).into_values().collect()
    }

    fn key(instance: &IssueInstance) -> String {
        format!("{}|{:05}|{}|{}", instance.file, instance.line, instance.kind.name(), instance.message())
    }
}

impl Default for BufferingCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector for BufferingCollector {
    fn collect(&mut self, instance: IssueInstance) {
        if let Some(filter) = &self.filter
            && !filter.supports(&instance)
        {
            return;
        }

        self.buffer.insert(Self::key(&instance), instance);
    }
}

#[cfg(test)]
mod tests {
    use augur_atom::atom;

    use crate::filter::MinimumSeverityFilter;
    use crate::issue::IssueKind;
    use crate::issue::Severity;

    use super::*;

    #[test]
    fn test_flush_is_sorted_by_file_line_type_message() {
        let mut collector = BufferingCollector::new();

        collector.collect(IssueInstance::new(IssueKind::UndeclaredClass, atom("b.php"), 3, vec!["\\A".into()]));
        collector.collect(IssueInstance::new(IssueKind::UndeclaredClass, atom("a.php"), 20, vec!["\\A".into()]));
        collector.collect(IssueInstance::new(IssueKind::UndeclaredClass, atom("a.php"), 3, vec!["\\B".into()]));
        collector.collect(IssueInstance::new(IssueKind::NoopVariable, atom("a.php"), 3, vec![]));

        let flushed = collector.flush();
        let summary: Vec<_> = flushed.iter().map(|i| format!("{}:{} {}", i.file, i.line, i.kind.name())).collect();

        assert_eq!(
            summary,
            vec![
                "a.php:3 NoopVariable".to_string(),
                "a.php:3 UndeclaredClass".to_string(),
                "a.php:20 UndeclaredClass".to_string(),
                "b.php:3 UndeclaredClass".to_string(),
            ]
        );
    }

    #[test]
    fn test_zero_padding_orders_lines_numerically() {
        let mut collector = BufferingCollector::new();

        collector.collect(IssueInstance::new(IssueKind::NoopVariable, atom("a.php"), 100, vec![]));
        collector.collect(IssueInstance::new(IssueKind::NoopVariable, atom("a.php"), 9, vec![]));

        let lines: Vec<_> = collector.flush().iter().map(|i| i.line).collect();
        assert_eq!(lines, vec![9, 100]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut collector = BufferingCollector::new();

        let instance = IssueInstance::new(IssueKind::NoopArray, atom("a.php"), 1, vec![]);
        collector.collect(instance.clone());
        collector.collect(instance);

        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_filter_is_applied_on_collect() {
        let mut collector = BufferingCollector::new().with_filter(MinimumSeverityFilter::new(Severity::Critical));

        collector.collect(IssueInstance::new(IssueKind::NoopVariable, atom("a.php"), 1, vec![]));
        collector.collect(IssueInstance::new(IssueKind::UndeclaredClass, atom("a.php"), 1, vec!["\\A".into()]));

        assert_eq!(collector.len(), 1);
    }
}
