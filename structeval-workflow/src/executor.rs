use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use structeval_core::TaskRecord;
use tokio::sync::Semaphore;

/// Runs one job per record on the tokio runtime, at most `max_concurrency`
/// at a time. Output order always matches input order.
#[derive(Debug, Clone, Copy)]
pub struct BatchExecutor {
    max_concurrency: usize,
}

impl BatchExecutor {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Execute `job` for every record. A job that panics does not take the
    /// batch down: its record is handed to `on_panic` together with the
    /// panic message instead.
    pub async fn execute_batch<J, Fut, P>(
        &self,
        records: Vec<TaskRecord>,
        job: J,
        on_panic: P,
    ) -> Vec<TaskRecord>
    where
        J: Fn(TaskRecord) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TaskRecord> + Send + 'static,
        P: Fn(TaskRecord, String) -> TaskRecord,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let job = Arc::new(job);
        let mut fallbacks = Vec::with_capacity(records.len());
        let mut handles = Vec::with_capacity(records.len());

        for record in records {
            fallbacks.push(record.clone());
            let semaphore = semaphore.clone();
            let job = job.clone();

            handles.push(tokio::spawn(async move {
                // The semaphore is never closed, so acquiring only waits.
                let _permit = semaphore.acquire_owned().await.ok();
                job(record).await
            }));
        }

        join_all(handles)
            .await
            .into_iter()
            .zip(fallbacks)
            .map(|(joined, fallback)| match joined {
                Ok(record) => record,
                Err(err) => {
                    let reason = if err.is_panic() {
                        format!("task panicked: {err}")
                    } else {
                        format!("task cancelled: {err}")
                    };
                    tracing::warn!(task_id = %fallback.task_id, %reason, "task aborted");
                    on_panic(fallback, reason)
                }
            })
            .collect()
    }
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new(structeval_core::DEFAULT_MAX_CONCURRENCY)
    }
}
