use crate::errors::SchedlogError;
use crate::labels::{LabelSet, LogRecord};
use crate::task_metadata::TaskMetadataIndex;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy)]
pub struct LeafKey {
    pub first_seen: f64,
    pub at: f64,
}

impl LeafKey {
    pub const PADDING: LeafKey = LeafKey {
        first_seen: 0.0,
        at: 0.0,
    };

    pub fn new(first_seen: f64, at: f64) -> Self {
        Self { first_seen, at }
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.first_seen
            .total_cmp(&other.first_seen)
            .then_with(|| self.at.total_cmp(&other.at))
    }
}

#[derive(Debug, Clone)]
pub enum SortKey {
    Leaf(LeafKey),
    Node(Box<SortKey>, LeafKey),
}

impl SortKey {
    pub fn dimension(&self) -> usize {
        let mut dimension = 1;
        let mut current = self;
        while let SortKey::Node(inner, _) = current {
            dimension += 1;
            current = inner;
        }
        dimension
    }

    pub fn nest(self, leaf: LeafKey) -> Self {
        SortKey::Node(Box::new(self), leaf)
    }

    /// Wraps the key in filler leaves until it reaches `depth`. Deeper keys are
    /// returned as they are.
    pub fn padded(self, depth: usize) -> Self {
        let missing = depth.saturating_sub(self.dimension());
        (0..missing).fold(self, |key, _| key.nest(LeafKey::PADDING))
    }
}

// Keys of different dimension order leaf-first; the builder refuses to hand out
// such pairs, so this only keeps `Ord` total.
impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Leaf(a), SortKey::Leaf(b)) => a.compare(b),
            (SortKey::Node(a_inner, a_leaf), SortKey::Node(b_inner, b_leaf)) => a_inner
                .cmp(b_inner)
                .then_with(|| a_leaf.compare(b_leaf)),
            (SortKey::Leaf(_), SortKey::Node(..)) => Ordering::Less,
            (SortKey::Node(..), SortKey::Leaf(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

pub struct SortKeyBuilder<'a> {
    metadata: &'a TaskMetadataIndex,
    required_depth: usize,
}

impl<'a> SortKeyBuilder<'a> {
    pub fn new(metadata: &'a TaskMetadataIndex) -> Self {
        Self {
            metadata,
            required_depth: 1 + metadata.max_ancestor_count(),
        }
    }

    pub fn required_depth(&self) -> usize {
        self.required_depth
    }

    pub fn leaf(&self, labels: &LabelSet, record: &LogRecord) -> Result<LeafKey, SchedlogError> {
        let at = labels
            .elapsed_seconds()
            .ok_or_else(|| SchedlogError::MalformedTimestamp {
                timestamp: labels.timestamp.clone(),
                record: record.dump(),
            })?;
        if labels.is_no_event_loop() {
            return Ok(LeafKey::new(at, at));
        }
        let first_seen = self
            .metadata
            .first_timestamp(&labels.task)
            .ok_or_else(|| SchedlogError::MissingTaskMetadata(labels.task.clone()))?;
        Ok(LeafKey::new(first_seen, at))
    }

    pub fn hierarchical(&self, record: &LogRecord) -> Result<SortKey, SchedlogError> {
        let links = record.labels.chain().collect::<Vec<_>>();
        let mut outermost_first = links.into_iter().rev();
        let Some(root) = outermost_first.next() else {
            return Err(SchedlogError::MissingTaskMetadata(record.labels.task.clone()));
        };
        let mut key = SortKey::Leaf(self.leaf(root, record)?);
        for link in outermost_first {
            key = key.nest(self.leaf(link, record)?);
        }
        Ok(key)
    }

    /// Keys of chains deeper than `1 + M` stay unpadded; the sorter refuses
    /// batches whose keys disagree on depth.
    pub fn build(&self, record: &LogRecord) -> Result<SortKey, SchedlogError> {
        Ok(self.hierarchical(record)?.padded(self.required_depth))
    }
}
