//! Background executor for filesystem jobs.
//!
//! Jobs run one at a time, in the order they were submitted, on tokio's
//! blocking pool. Submission order is fixed when [`IoWorker::submit`] is
//! called, so a read submitted after a write always sees that write, and two
//! writes to the same file can never interleave.

use crate::errors::{AppError, AppResult};
use crate::storage::EntryStorage;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error};

type Job = Box<dyn FnOnce(&dyn EntryStorage) + Send>;

#[derive(Clone)]
pub(crate) struct IoWorker {
    jobs: mpsc::UnboundedSender<Job>,
}

impl IoWorker {
    /// Spawns the worker task on the current runtime.
    pub(crate) fn spawn(storage: Arc<dyn EntryStorage>) -> Self {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();

        tokio::spawn(async move {
            while let Some(job) = queue.recv().await {
                let storage = Arc::clone(&storage);
                if let Err(e) = tokio::task::spawn_blocking(move || job(storage.as_ref())).await {
                    error!("Filesystem job panicked: {}", e);
                }
            }
            debug!("I/O worker stopped");
        });

        IoWorker { jobs }
    }

    /// Queues a job and returns a future resolving to its result.
    ///
    /// The job's position in the queue is taken immediately; the returned
    /// future only waits for completion and may be dropped without
    /// cancelling the job.
    pub(crate) fn submit<T, F>(&self, job: F) -> impl Future<Output = AppResult<T>> + Send + 'static
    where
        T: Send + 'static,
        F: FnOnce(&dyn EntryStorage) -> AppResult<T> + Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        let queued = self
            .jobs
            .send(Box::new(move |storage: &dyn EntryStorage| {
                let _ = reply.send(job(storage));
            }))
            .is_ok();

        async move {
            if !queued {
                return Err(AppError::StoreClosed);
            }
            result.await.unwrap_or(Err(AppError::StoreClosed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileSystemStorage;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_jobs_run_in_submission_order() {
        let temp = tempdir().unwrap();
        let worker = IoWorker::spawn(Arc::new(FileSystemStorage::new(temp.path())));

        // Fire-and-forget writes followed by a read: the read must see the last one.
        let mut pending = Vec::new();
        for i in 0..20 {
            pending.push(worker.submit(move |s| s.write("a.md", &format!("revision {i}"))));
        }
        let read = worker.submit(|s| s.read("a.md"));

        assert_eq!(read.await.unwrap(), "revision 19");
        for write in pending {
            write.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_dropped_future_does_not_cancel_job() {
        let temp = tempdir().unwrap();
        let worker = IoWorker::spawn(Arc::new(FileSystemStorage::new(temp.path())));

        drop(worker.submit(|s| s.write("b.md", "kept")));
        let read = worker.submit(|s| s.read("b.md"));

        assert_eq!(read.await.unwrap(), "kept");
    }

    #[tokio::test]
    async fn test_job_errors_are_returned() {
        let temp = tempdir().unwrap();
        let worker = IoWorker::spawn(Arc::new(FileSystemStorage::new(temp.path())));

        let result = worker.submit(|s| s.read("missing.md")).await;
        assert!(result.unwrap_err().is_not_found());
    }
}
