use std::{future::Future, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};
use tracing::{debug, error};

/// Runs one tokio task per item with at most `width` of them in flight.
#[derive(Debug, Clone)]
pub struct TaskPool {
    name: String,
    width: usize,
}

impl TaskPool {
    #[must_use]
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width: width.max(1),
        }
    }

    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Processes every item and waits for all of them.
    ///
    /// Returns the outputs of the units that finished, in completion order. A
    /// panicking unit is logged and leaves no output.
    pub async fn run<T, R, F, Fut>(&self, items: impl IntoIterator<Item = T>, mut work: F) -> Vec<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: FnMut(T) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
    {
        let permits = Arc::new(Semaphore::new(self.width));
        let mut tasks = JoinSet::new();

        for item in items {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let unit = work(item);

            tasks.spawn(async move {
                let _permit = permit;
                unit.await
            });
        }

        debug!("⚙️ Pool '{}' waiting for {} task(s)", self.name, tasks.len());

        let mut outputs = Vec::with_capacity(tasks.len());
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(output) => outputs.push(output),
                Err(e) => error!("❌ Task in pool '{}' failed: {}", self.name, e),
            }
        }

        outputs
    }
}
