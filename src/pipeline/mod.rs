//! Execution model: worker pool sizing + the per-job background task.

pub mod execution;
pub mod worker_pool;

pub use execution::run_job;
pub use worker_pool::WorkerPool;
