//! The processor contract.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::registry::options::OptionDef;

/// Static, serializable description of a processor, as served by `GET /processors`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessorDescriptor {
    pub id: String,
    pub label: String,
    pub description: String,
    pub accepted_extensions: Vec<String>,
    #[serde(default)]
    pub accepts_multiple_files: bool,
    pub options_schema: Vec<OptionDef>,
}

/// Progress callback handed to a processor. `on_progress` may be invoked any number of
/// times with `percent` in `[0, 100]`, monotonic-nondecreasing by convention. The returned
/// future MUST be awaited by the processor before continuing, so that subscribers observe
/// progress events in the order the processor emitted them.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn on_progress(&self, percent: f64, message: &str);
}

/// Everything a processor needs to do its work and report on it.
pub struct ProcessorInput<'a> {
    /// The uploaded file for single-file processors, or the first file for
    /// multi-file (`accepts_multiple_files`) processors.
    pub input_path: &'a Path,
    /// All submitted files in submission order. For single-file jobs this is a
    /// one-element slice equal to `[input_path]`.
    pub input_paths: &'a [PathBuf],
    /// A private directory the processor may fill freely. The returned result path
    /// must lie within it.
    pub output_dir: &'a Path,
    /// Already-parsed options. Semantic validation (beyond the server's structural
    /// dimension check) is the processor's responsibility; bad values should surface
    /// as `Error::ProcessingFailure` (the job transitions to Failed).
    pub options: &'a serde_json::Value,
}

/// Trait every processor implements.
#[async_trait]
pub trait Processor: Send + Sync {
    fn descriptor(&self) -> &ProcessorDescriptor;

    /// Run the processor. Must return the absolute path to a single result file
    /// within `input.output_dir`. The processor SHOULD emit an initial progress
    /// event near 0-10%, intermediate events for long phases, and a terminal 100%
    /// event; duplicate terminal events are idempotent (the manager also emits a
    /// synthetic 100% on normal completion).
    async fn process(&self, input: ProcessorInput<'_>, progress: &dyn ProgressSink) -> Result<PathBuf>;
}
