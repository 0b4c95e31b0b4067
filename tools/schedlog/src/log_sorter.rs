use crate::chain_cleaner::clean_records;
use crate::errors::SchedlogError;
use crate::labels::{LabelSet, LogRecord};
use crate::sort_key::{SortKey, SortKeyBuilder};
use crate::task_metadata::TaskMetadataIndex;
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct ScheduleBasedLogSorter {
    cleaned: Vec<LogRecord>,
    metadata: TaskMetadataIndex,
}

impl ScheduleBasedLogSorter {
    pub fn new(records: &[LogRecord]) -> Result<Self, SchedlogError> {
        let cleaned = clean_records(records);
        let metadata = TaskMetadataIndex::extract(&cleaned)?;
        Ok(Self { cleaned, metadata })
    }

    pub fn cleaned_records(&self) -> &[LogRecord] {
        &self.cleaned
    }

    pub fn metadata(&self) -> &TaskMetadataIndex {
        &self.metadata
    }

    /// Records in scheduling order, paired with their padded keys. Every key
    /// must share one depth.
    pub fn ordered(&self) -> Result<Vec<(SortKey, &LogRecord)>, SchedlogError> {
        let builder = SortKeyBuilder::new(&self.metadata);
        let mut keyed = self
            .cleaned
            .iter()
            .map(|record| builder.build(record).map(|key| (key, record)))
            .collect::<Result<Vec<_>, _>>()?;

        let depth = keyed
            .first()
            .map_or(builder.required_depth(), |(key, _)| key.dimension());
        if let Some((key, record)) = keyed.iter().find(|(key, _)| key.dimension() != depth) {
            return Err(SchedlogError::IncomparableKeys {
                batch_size: self.cleaned.len(),
                reason: format!(
                    "key depth {} differs from the batch key depth {depth}",
                    key.dimension()
                ),
                record: record.dump(),
            });
        }

        // Stable, so exact ties keep their arrival order.
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(keyed)
    }

    pub fn sort(&self) -> Result<Vec<String>, SchedlogError> {
        let mut lines = Vec::new();
        let mut already_seen: HashSet<String> = HashSet::new();

        for (_, record) in self.ordered()? {
            for header in self.format_ancestors(&record.labels) {
                if already_seen.insert(header.clone()) {
                    lines.push(header);
                }
            }

            let prefix = self.format_labels(&record.labels);
            let mut message_lines = record.message.split('\n');
            let first = message_lines.next().unwrap_or_default();
            lines.push(format!("{prefix}\t{first}"));

            let indent = continuation_indent(&prefix);
            lines.extend(message_lines.map(|line| format!("{indent}{line}")));
        }

        Ok(lines)
    }

    /// `[ts task - thread@source]`, tab-indented once per ancestor of the task.
    pub fn format_labels(&self, labels: &LabelSet) -> String {
        let padding = "\t".repeat(self.metadata.ancestor_count(&labels.task));
        format!(
            "{padding}[{} {} - {}@{}]",
            labels.timestamp, labels.task, labels.thread, labels.source
        )
    }

    pub fn format_ancestors(&self, labels: &LabelSet) -> Vec<String> {
        let mut headers = labels
            .chain()
            .skip(1)
            .map(|ancestor| self.format_labels(ancestor))
            .collect::<Vec<_>>();
        headers.reverse();
        headers
    }
}

/// Whitespace as wide as `prefix` followed by a tab; tabs stay tabs.
pub fn continuation_indent(prefix: &str) -> String {
    prefix
        .chars()
        .chain(std::iter::once('\t'))
        .map(|c| if c == '\t' { '\t' } else { ' ' })
        .collect()
}
