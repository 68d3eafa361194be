//! Periodic cleanup of expired terminal jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::jobs::JobManager;
use crate::store::FileStore;

pub struct Reaper {
    manager: Arc<JobManager>,
    store: Arc<FileStore>,
    interval: Duration,
    max_age_secs: i64,
}

impl Reaper {
    pub fn new(manager: Arc<JobManager>, store: Arc<FileStore>, interval_secs: u64, max_age_secs: i64) -> Self {
        Self { manager, store, interval: Duration::from_secs(interval_secs), max_age_secs }
    }

    /// Run one sweep: remove files and state for every expired terminal job. Never
    /// fails outright — a single job's cleanup error is logged and skipped so the rest
    /// of the pass still runs.
    pub async fn run_once(&self) -> usize {
        let expired = self.manager.collect_expired(self.max_age_secs);
        let mut removed = 0;
        for job_id in expired {
            if let Err(err) = self.store.cleanup(&job_id).await {
                warn!(job_id = %job_id, %err, "reaper failed to clean up job files, removing state anyway");
            }
            self.manager.remove_job(&job_id);
            removed += 1;
        }
        removed
    }

    /// Spawn the periodic background sweep. Runs until `shutdown` is cancelled.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("reaper shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(self.interval) => {
                        let removed = self.run_once().await;
                        if removed > 0 {
                            info!(removed, "reaper swept expired jobs");
                        }
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn sweeps_only_expired_terminal_jobs() {
        let manager = Arc::new(JobManager::new());
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path().join("uploads"), dir.path().join("jobs")));
        let reaper = Reaper::new(manager.clone(), store.clone(), 600, 0);

        let pending = manager.create("p", "a.png");
        let done = manager.create("p", "b.png");
        manager.mark_completed(&done.id, PathBuf::from("/tmp/out.jpg")).unwrap();
        manager.publish_terminal(&done.id).unwrap();

        let removed = reaper.run_once().await;
        assert_eq!(removed, 1);
        assert!(manager.get(&pending.id).is_some());
        assert!(manager.get(&done.id).is_none());
    }

    #[tokio::test]
    async fn second_pass_with_no_new_activity_is_a_no_op() {
        let manager = Arc::new(JobManager::new());
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(FileStore::new(dir.path().join("uploads"), dir.path().join("jobs")));
        let reaper = Reaper::new(manager, store, 600, 0);

        assert_eq!(reaper.run_once().await, 0);
        assert_eq!(reaper.run_once().await, 0);
    }
}
