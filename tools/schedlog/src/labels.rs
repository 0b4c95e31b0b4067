use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Task value recorded for lines produced outside any scheduled unit.
pub const NO_EVENT_LOOP_TASK: &str = "Not using an event loop";

const SECONDS_SUFFIX: &str = " sec";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduling_context: Option<Arc<LabelSet>>,
    pub timestamp: String,
    pub thread: String,
    pub task: String,
    pub source: String,
}

impl LabelSet {
    pub fn new(
        timestamp: impl Into<String>,
        thread: impl Into<String>,
        task: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            scheduling_context: None,
            timestamp: timestamp.into(),
            thread: thread.into(),
            task: task.into(),
            source: source.into(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<Arc<LabelSet>>) -> Self {
        self.scheduling_context = Some(parent.into());
        self
    }

    pub fn parent(&self) -> Option<&LabelSet> {
        self.scheduling_context.as_deref()
    }

    pub fn detached(&self) -> Self {
        Self {
            scheduling_context: None,
            timestamp: self.timestamp.clone(),
            thread: self.thread.clone(),
            task: self.task.clone(),
            source: self.source.clone(),
        }
    }

    /// Walks this link and then every ancestor, nearest first.
    pub fn chain(&self) -> Chain<'_> {
        Chain { next: Some(self) }
    }

    pub fn chain_len(&self) -> usize {
        self.chain().count()
    }

    pub fn is_no_event_loop(&self) -> bool {
        self.task == NO_EVENT_LOOP_TASK
    }

    pub fn elapsed_seconds(&self) -> Option<f64> {
        parse_elapsed_seconds(&self.timestamp)
    }
}

pub struct Chain<'a> {
    next: Option<&'a LabelSet>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a LabelSet;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent();
        Some(current)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub message: String,
    pub labels: LabelSet,
}

impl LogRecord {
    pub fn new(message: impl Into<String>, labels: LabelSet) -> Self {
        Self {
            message: message.into(),
            labels,
        }
    }

    pub fn dump(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

/// Parses timestamps of the form `"11.344 sec"` into seconds.
pub fn parse_elapsed_seconds(text: &str) -> Option<f64> {
    let number = text.strip_suffix(SECONDS_SUFFIX)?;
    let (whole, fraction) = match number.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (number, None),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
    }
    number.parse::<f64>().ok()
}

pub fn format_elapsed_seconds(elapsed: Duration) -> String {
    format!("{:.3}{SECONDS_SUFFIX}", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::{format_elapsed_seconds, parse_elapsed_seconds, LabelSet, LogRecord};
    use std::time::Duration;

    #[test]
    fn elapsed_seconds_parse_numerically() {
        assert_eq!(parse_elapsed_seconds("2.278 sec"), Some(2.278));
        assert_eq!(parse_elapsed_seconds("11.344 sec"), Some(11.344));
        assert_eq!(parse_elapsed_seconds("3 sec"), Some(3.0));
        assert_eq!(parse_elapsed_seconds("2.278"), None);
        assert_eq!(parse_elapsed_seconds("-1.000 sec"), None);
        assert_eq!(parse_elapsed_seconds(".5 sec"), None);
        assert_eq!(parse_elapsed_seconds("1. sec"), None);
        assert_eq!(parse_elapsed_seconds("soon sec"), None);
    }

    #[test]
    fn elapsed_seconds_format_to_milliseconds() {
        assert_eq!(format_elapsed_seconds(Duration::from_millis(2278)), "2.278 sec");
        assert_eq!(format_elapsed_seconds(Duration::ZERO), "0.000 sec");
    }

    #[test]
    fn chain_walks_nearest_first() {
        let root = LabelSet::new("1.000 sec", "main", "Task-1", "app:10");
        let mid = LabelSet::new("2.000 sec", "main", "Task-2", "app:20").with_parent(root);
        let leaf = LabelSet::new("3.000 sec", "main", "Task-3", "app:30").with_parent(mid);

        let tasks = leaf.chain().map(|l| l.task.as_str()).collect::<Vec<_>>();
        assert_eq!(tasks, vec!["Task-3", "Task-2", "Task-1"]);
        assert_eq!(leaf.chain_len(), 3);
        assert!(leaf.detached().parent().is_none());
    }

    #[test]
    fn record_json_shape_matches_persisted_lines() {
        let text = r#"{"message":"Created branch","labels":{"scheduling_context":{"timestamp":"2.278 sec","thread":"MainThread","task":"Task-36","source":"repo:100"},"timestamp":"4.186 sec","thread":"MainThread","task":"Task-38","source":"repo:195"}}"#;
        let record: LogRecord = serde_json::from_str(text).expect("parse");
        assert_eq!(record.labels.task, "Task-38");
        assert_eq!(record.labels.parent().map(|p| p.task.as_str()), Some("Task-36"));
        assert_eq!(record.dump(), text);

        let orphan = LogRecord::new("hi", LabelSet::new("0.001 sec", "main", "Task-1", "a:1"));
        assert!(!orphan.dump().contains("scheduling_context"));
    }
}
