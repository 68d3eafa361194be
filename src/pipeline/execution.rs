//! The background task that turns a freshly-created Job into a processor invocation,
//! then records its terminal outcome.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument};

use crate::jobs::JobManager;
use crate::pipeline::worker_pool::WorkerPool;
use crate::processors::{Processor, ProcessorInput, ProgressSink};

/// Adapts the job manager's `update_progress` into the `ProgressSink` a processor
/// expects, so processors never touch `JobManager` directly.
struct ManagerProgressSink {
    manager: Arc<JobManager>,
    job_id: String,
}

#[async_trait]
impl ProgressSink for ManagerProgressSink {
    async fn on_progress(&self, percent: f64, message: &str) {
        if let Err(err) = self.manager.update_progress(&self.job_id, percent, message) {
            error!(job_id = %self.job_id, %err, "failed to publish progress for a job mid-flight");
        }
    }
}

/// Run `processor` for `job_id` under a worker pool permit, then record the terminal
/// outcome. Intended to be handed straight to `tokio::spawn`; never panics on a
/// processor error (that becomes a Failed job instead).
#[instrument(skip(manager, pool, processor, input_paths, options), fields(job_id = %job_id, processor_id = %processor.descriptor().id))]
pub async fn run_job(
    job_id: String,
    manager: Arc<JobManager>,
    pool: Arc<WorkerPool>,
    processor: Arc<dyn Processor>,
    input_path: PathBuf,
    input_paths: Vec<PathBuf>,
    output_dir: PathBuf,
    options: serde_json::Value,
) {
    let _permit = pool.acquire().await;

    let sink = ManagerProgressSink { manager: manager.clone(), job_id: job_id.clone() };
    let input = ProcessorInput {
        input_path: &input_path,
        input_paths: &input_paths,
        output_dir: &output_dir,
        options: &options,
    };

    let outcome = processor.process(input, &sink).await;

    match outcome {
        Ok(result_path) => {
            info!(result = %result_path.display(), "job completed");
            if let Err(err) = manager.mark_completed(&job_id, result_path) {
                error!(%err, "failed to mark job completed");
            }
        }
        Err(err) => {
            error!(%err, "job failed");
            if let Err(mark_err) = manager.mark_failed(&job_id, &err.to_string()) {
                error!(err = %mark_err, "failed to mark job failed");
            }
        }
    }

    if let Err(err) = manager.publish_terminal(&job_id) {
        error!(%err, "failed to publish terminal event");
    }
}
