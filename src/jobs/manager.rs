//! The central job/batch data structure.
//!
//! All mutating methods take `inner` for their entire body (parking_lot's `Mutex`
//! is never held across an `.await`; publishing to a subscriber sink is a
//! non-suspending `UnboundedSender::send`), so state mutations are atomic from the
//! caller's perspective and a Job read by any caller after a method returns is
//! consistent with what subscribers have already seen.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use rand::RngCore;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::jobs::model::{Batch, BatchSnapshot, Job, JobSnapshot, JobStatus, ProgressEvent};

/// Opaque handle returned by `subscribe`, passed back to `unsubscribe`.
pub type SubscriptionId = u64;

struct JobEntry {
    job: Job,
    listeners: Vec<(SubscriptionId, mpsc::UnboundedSender<ProgressEvent>)>,
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<String, JobEntry>,
    batches: HashMap<String, Batch>,
}

pub struct JobManager {
    inner: Mutex<Inner>,
    next_sub_id: AtomicU64,
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

impl JobManager {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Inner::default()), next_sub_id: AtomicU64::new(1) }
    }

    fn fresh_id(existing: &HashMap<String, impl Sized>) -> String {
        // 96-bit random value, hex-encoded and truncated to 12 chars.
        // Collisions are astronomically unlikely; retry defensively anyway.
        loop {
            let mut bytes = [0u8; 12];
            rand::rng().fill_bytes(&mut bytes);
            let id = hex::encode(bytes)[..12].to_string();
            if !existing.contains_key(&id) {
                return id;
            }
        }
    }

    /// Allocate a new Job in the Pending state.
    pub fn create(&self, processor_id: &str, original_filename: &str) -> Job {
        let mut inner = self.inner.lock();
        let id = Self::fresh_id(&inner.jobs);
        let job = Job::new(id.clone(), processor_id.to_string(), original_filename.to_string());
        inner.jobs.insert(id, JobEntry { job: job.clone(), listeners: Vec::new() });
        job
    }

    pub fn get(&self, job_id: &str) -> Option<JobSnapshot> {
        self.inner.lock().jobs.get(job_id).map(|e| e.job.snapshot())
    }

    pub fn get_batch(&self, batch_id: &str) -> Option<BatchSnapshot> {
        self.inner.lock().batches.get(batch_id).map(|b| b.snapshot())
    }

    /// The on-disk result path for a Completed job, if any.
    pub fn result_path(&self, job_id: &str) -> Option<PathBuf> {
        self.inner.lock().jobs.get(job_id).and_then(|e| e.job.result_path.clone())
    }

    /// Group a set of already-created job ids under a new Batch.
    pub fn create_batch(&self, processor_id: &str, job_ids: Vec<String>) -> Batch {
        let mut inner = self.inner.lock();
        let id = Self::fresh_id(&inner.batches);
        let batch = Batch { id: id.clone(), processor_id: processor_id.to_string(), job_ids, created_at: Utc::now() };
        inner.batches.insert(id, batch.clone());
        batch
    }

    /// Mutate `progress`/`message` and publish `{progress, message, status}` to every
    /// current subscriber, in registration order, before returning. The first progress
    /// update transitions a Pending job to Processing.
    pub fn update_progress(&self, job_id: &str, percent: f64, message: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let entry = inner.jobs.get_mut(job_id).ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;

        entry.job.progress = percent.clamp(0.0, 100.0);
        entry.job.message = message.to_string();
        if entry.job.status == JobStatus::Pending {
            entry.job.status = JobStatus::Processing;
        }

        let event = ProgressEvent::from(&entry.job);
        entry.listeners.retain(|(_, tx)| tx.send(event.clone()).is_ok());
        Ok(())
    }

    /// Completed implies a result path, no error, progress == 100.
    /// No event is emitted here; callers MUST follow with `publish_terminal`.
    pub fn mark_completed(&self, job_id: &str, result_path: PathBuf) -> Result<()> {
        let mut inner = self.inner.lock();
        let entry = inner.jobs.get_mut(job_id).ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;
        entry.job.status = JobStatus::Completed;
        entry.job.progress = 100.0;
        entry.job.message = "Done!".to_string();
        entry.job.result_path = Some(result_path);
        entry.job.error = None;
        Ok(())
    }

    /// Failed implies an error message. Progress is left at its
    /// last value. No event is emitted here; callers MUST follow with `publish_terminal`.
    pub fn mark_failed(&self, job_id: &str, error: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let entry = inner.jobs.get_mut(job_id).ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;
        entry.job.status = JobStatus::Failed;
        entry.job.message = format!("Error: {error}");
        entry.job.error = Some(error.to_string());
        Ok(())
    }

    /// Emit exactly one terminal event to every subscriber, reflecting the Job's current
    /// (already-terminal) state. Call this after `mark_completed`/`mark_failed` so a
    /// subscriber waking on the event and then fetching the Job sees a consistent
    /// terminal snapshot.
    pub fn publish_terminal(&self, job_id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        let entry = inner.jobs.get_mut(job_id).ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;
        debug_assert!(entry.job.status.is_terminal(), "publish_terminal called on a non-terminal job");
        let event = ProgressEvent::from(&entry.job);
        for (_, tx) in entry.listeners.drain(..) {
            let _ = tx.send(event.clone());
        }
        Ok(())
    }

    /// Subscribe to a job's progress events. Each sink is an unbounded FIFO queue; a
    /// subscriber that joins mid-flight receives only strictly-newer events (no replay).
    pub fn subscribe(&self, job_id: &str) -> Result<(SubscriptionId, mpsc::UnboundedReceiver<ProgressEvent>)> {
        let mut inner = self.inner.lock();
        let entry = inner.jobs.get_mut(job_id).ok_or_else(|| Error::JobNotFound(job_id.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.next_sub_id.fetch_add(1, Ordering::Relaxed);
        entry.listeners.push((id, tx));
        Ok((id, rx))
    }

    /// Remove a subscriber sink. Tolerates being called with an id it no longer tracks
    /// (e.g. after the job already reached a terminal state and drained its listeners).
    pub fn unsubscribe(&self, job_id: &str, sub_id: SubscriptionId) {
        let mut inner = self.inner.lock();
        if let Some(entry) = inner.jobs.get_mut(job_id) {
            entry.listeners.retain(|(id, _)| *id != sub_id);
        }
    }

    /// Ids of terminal jobs whose `created_at` is older than `max_age_seconds`.
    pub fn collect_expired(&self, max_age_seconds: i64) -> Vec<String> {
        let inner = self.inner.lock();
        let cutoff = Utc::now() - ChronoDuration::seconds(max_age_seconds);
        inner
            .jobs
            .values()
            .filter(|e| e.job.status.is_terminal() && e.job.created_at < cutoff)
            .map(|e| e.job.id.clone())
            .collect()
    }

    /// Remove a Job; remove it from every Batch it appears in; remove any Batch that
    /// becomes empty as a result.
    pub fn remove_job(&self, job_id: &str) {
        let mut inner = self.inner.lock();
        inner.jobs.remove(job_id);
        inner.batches.retain(|_, batch| {
            batch.job_ids.retain(|id| id != job_id);
            !batch.job_ids.is_empty()
        });
    }
}
