//! Supervised group of connection tasks.

use std::future::Future;
use std::time::Duration;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;

/// How a drain finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainReport {
    /// Tasks that ran to completion (or panicked) on their own.
    pub completed: usize,
    /// Tasks still running at the deadline and aborted.
    pub aborted: usize,
}

/// Owns every handler task so shutdown can await all of them.
#[derive(Debug, Default)]
pub struct TaskGroup {
    tasks: JoinSet<()>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Number of tasks not yet reaped.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Reap the next finished task. Resolves to `None` when the group is empty.
    pub async fn join_next(&mut self) -> Option<Result<(), JoinError>> {
        self.tasks.join_next().await
    }

    /// Wait for every task. With a deadline, tasks still running when it
    /// passes are aborted.
    pub async fn drain(&mut self, deadline: Option<Duration>) -> DrainReport {
        let deadline = deadline.map(|limit| Instant::now() + limit);
        let mut report = DrainReport::default();

        loop {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, self.tasks.join_next()).await {
                    Ok(next) => next,
                    Err(_) => break,
                },
                None => self.tasks.join_next().await,
            };

            match next {
                Some(result) => {
                    log_failure(result);
                    report.completed += 1;
                }
                None => return report,
            }
        }

        report.aborted = self.tasks.len();
        self.tasks.abort_all();
        while self.tasks.join_next().await.is_some() {}
        report
    }
}

/// Log a task that panicked. Cancellation is expected during drain.
pub fn log_failure(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            tracing::error!(error = %e, "Connection task panicked");
        }
    }
}
