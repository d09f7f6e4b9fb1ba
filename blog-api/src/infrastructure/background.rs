use std::future::Future;

use tokio_util::task::TaskTracker;

/// Fire-and-forget work that must still finish before the process exits.
#[derive(Debug, Clone, Default)]
pub(crate) struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(task);
    }

    /// Stops accepting new tasks and waits for the running ones.
    pub(crate) async fn shutdown(&self) {
        self.tracker.close();
        tracing::info!(pending = self.tracker.len(), "waiting for background tasks");
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::BackgroundTasks;

    #[tokio::test]
    async fn shutdown_waits_for_spawned_tasks() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        tasks.shutdown().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }
}
