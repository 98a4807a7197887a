use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// Outcome of one bounded task
#[derive(Debug, PartialEq, Eq)]
pub enum TaskOutcome<T, E> {
    Done(T),
    Failed(E),
    TimedOut,
}

impl<T, E> TaskOutcome<T, E> {
    /// The successful value, if any
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            _ => None,
        }
    }
}

/// Executes futures concurrently with a concurrency limit and a per-task timeout
///
/// Tasks are polled in place rather than spawned, so dropping the returned future
/// cancels every task still running.
pub struct ParallelProcessor {
    semaphore: Arc<Semaphore>,
    task_timeout: Duration,
}

impl ParallelProcessor {
    /// Creates a new processor; a zero limit is treated as one
    pub fn new(max_concurrent: usize, task_timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            task_timeout,
        }
    }

    /// Runs all tasks and returns their outcomes in input order
    pub async fn process<F, T, E>(&self, tasks: Vec<F>) -> Vec<TaskOutcome<T, E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        let bounded = tasks.into_iter().map(|task| {
            let semaphore = Arc::clone(&self.semaphore);
            let limit = self.task_timeout;
            async move {
                // The semaphore is never closed
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return TaskOutcome::TimedOut,
                };
                match timeout(limit, task).await {
                    Ok(Ok(value)) => TaskOutcome::Done(value),
                    Ok(Err(e)) => TaskOutcome::Failed(e),
                    Err(_) => TaskOutcome::TimedOut,
                }
            }
        });
        join_all(bounded).await
    }
}
