use crate::labels::LabelSet;
use crate::logger::Logger;
use std::future::Future;
use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

tokio::task_local! {
    static CURRENT_UNIT: ScheduledUnit;
}

static NEXT_UNIT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledUnit {
    pub name: String,
    pub scheduling_context: Option<Arc<LabelSet>>,
}

pub fn current_unit() -> Option<ScheduledUnit> {
    CURRENT_UNIT.try_with(ScheduledUnit::clone).ok()
}

fn next_unit_name() -> String {
    format!("Task-{}", NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Immutable snapshot of the scheduler's labels, chained to its own context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingContext {
    labels: Arc<LabelSet>,
}

impl SchedulingContext {
    #[track_caller]
    pub fn capture(logger: &Logger) -> Self {
        Self::at(logger, Location::caller())
    }

    pub fn at(logger: &Logger, caller: &Location<'_>) -> Self {
        Self {
            labels: Arc::new(logger.snapshot_runtime_context(caller)),
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    fn into_unit(self) -> ScheduledUnit {
        ScheduledUnit {
            name: next_unit_name(),
            scheduling_context: Some(self.labels),
        }
    }
}

/// Runs `future` in place as a new unit scheduled under `context`.
pub fn scope<F>(context: SchedulingContext, future: F) -> impl Future<Output = F::Output>
where
    F: Future,
{
    CURRENT_UNIT.scope(context.into_unit(), future)
}

/// Spawns `future` onto the tokio runtime as a new unit scheduled under `context`.
pub fn spawn<F>(context: SchedulingContext, future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(scope(context, future))
}
