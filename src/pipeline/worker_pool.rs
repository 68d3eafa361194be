//! Bounded worker pool for CPU-bound processor invocations.
//!
//! Processors in this codebase do their heavy lifting by awaiting subprocesses
//! (`tokio::process::Command`), so "CPU-bound offload" here means bounding how many
//! such subprocesses may run concurrently, not literally moving work onto blocking
//! OS threads. A single `Semaphore` sized `max(2, cpu_count/2)` is shared across all
//! jobs regardless of submission rate.

use std::sync::Arc;

use tokio::sync::{Semaphore, SemaphorePermit};

pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { semaphore: Arc::new(Semaphore::new(capacity)), capacity }
    }

    /// Total permits in the pool. Processors that need their own bounded
    /// per-job fan-out size their private semaphore to this value.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Acquire a permit, suspending until one is free. Holding the guard occupies one
    /// of the pool's shared slots; dropping it returns the slot.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore
            .acquire()
            .await
            .expect("worker pool semaphore is never closed")
    }
}
