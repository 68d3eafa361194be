//! Shared application state handed to every route. The registry and job manager are
//! constructed once at startup and threaded through explicitly, rather than reached
//! for as globals.

use std::sync::Arc;

use crate::jobs::JobManager;
use crate::pipeline::WorkerPool;
use crate::reaper::Reaper;
use crate::registry::ProcessorRegistry;
use crate::store::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<JobManager>,
    pub registry: Arc<ProcessorRegistry>,
    pub store: Arc<FileStore>,
    pub pool: Arc<WorkerPool>,
    pub reaper: Arc<Reaper>,
}
