use crate::labels::{LabelSet, LogRecord};
use std::sync::Arc;

pub fn clean_labels(raw: &LabelSet) -> LabelSet {
    if raw.parent().is_none() {
        return raw.clone();
    }

    let mut kept: Vec<&LabelSet> = Vec::new();
    for link in raw.chain() {
        let repeats_previous = kept.last().is_some_and(|previous| previous.task == link.task);
        if !repeats_previous {
            kept.push(link);
        }
    }

    let mut rebuilt: Option<Arc<LabelSet>> = None;
    for link in kept.into_iter().rev() {
        let mut cleaned = link.detached();
        cleaned.scheduling_context = rebuilt.take();
        rebuilt = Some(Arc::new(cleaned));
    }

    match rebuilt {
        Some(cleaned) => Arc::try_unwrap(cleaned).unwrap_or_else(|shared| (*shared).clone()),
        None => raw.clone(),
    }
}

pub fn clean_records(records: &[LogRecord]) -> Vec<LogRecord> {
    records
        .iter()
        .map(|record| LogRecord {
            message: record.message.clone(),
            labels: clean_labels(&record.labels),
        })
        .collect()
}
