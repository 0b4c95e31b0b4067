use crate::errors::SchedlogError;
use crate::logger::Logger;
use crate::scheduling::{scope, SchedulingContext};
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;
use tokio::task::JoinSet;

pub struct Usher<T> {
    logger: Arc<Logger>,
    pending: JoinSet<T>,
}

impl<T: Send + 'static> Usher<T> {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            logger,
            pending: JoinSet::new(),
        }
    }

    #[track_caller]
    pub fn usher<F>(&mut self, future: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let context = SchedulingContext::at(&self.logger, Location::caller());
        self.pending.spawn(scope(context, future));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub async fn join(mut self) -> Result<Vec<T>, SchedlogError> {
        let mut results = Vec::with_capacity(self.pending.len());
        while let Some(joined) = self.pending.join_next().await {
            results.push(joined.map_err(|e| SchedlogError::Join(e.to_string()))?);
        }
        Ok(results)
    }
}
