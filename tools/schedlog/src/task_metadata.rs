use crate::errors::SchedlogError;
use crate::labels::{LabelSet, LogRecord};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskMetadata {
    /// Every elapsed-seconds value seen for the task, ascending and distinct.
    pub timestamp_list: Vec<f64>,
    /// Tasks seen anywhere above this one in a chain. Only the size is meaningful.
    pub ancestors: BTreeSet<String>,
}

impl TaskMetadata {
    pub fn first_timestamp(&self) -> Option<f64> {
        self.timestamp_list.first().copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskMetadataIndex {
    tasks: BTreeMap<String, TaskMetadata>,
}

impl TaskMetadataIndex {
    pub fn extract(records: &[LogRecord]) -> Result<Self, SchedlogError> {
        let mut tasks: BTreeMap<String, TaskMetadata> = BTreeMap::new();

        for record in records {
            let links = record.labels.chain().collect::<Vec<&LabelSet>>();
            for (depth, link) in links.iter().enumerate() {
                let seconds = link.elapsed_seconds().ok_or_else(|| {
                    SchedlogError::MalformedTimestamp {
                        timestamp: link.timestamp.clone(),
                        record: record.dump(),
                    }
                })?;
                let entry = tasks.entry(link.task.clone()).or_default();
                entry.timestamp_list.push(seconds);
                entry
                    .ancestors
                    .extend(links[depth + 1..].iter().map(|above| above.task.clone()));
            }
        }

        for metadata in tasks.values_mut() {
            metadata.timestamp_list.sort_by(f64::total_cmp);
            metadata.timestamp_list.dedup();
        }

        Ok(Self { tasks })
    }

    pub fn get(&self, task: &str) -> Option<&TaskMetadata> {
        self.tasks.get(task)
    }

    pub fn first_timestamp(&self, task: &str) -> Option<f64> {
        self.get(task).and_then(TaskMetadata::first_timestamp)
    }

    pub fn ancestor_count(&self, task: &str) -> usize {
        self.get(task).map_or(0, |metadata| metadata.ancestors.len())
    }

    pub fn max_ancestor_count(&self) -> usize {
        self.tasks
            .values()
            .map(|metadata| metadata.ancestors.len())
            .max()
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
