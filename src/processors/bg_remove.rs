//! `bg-remove`: per-frame AI background removal via an external `rembg`-style CLI.
//! Frames are dispatched through a semaphore sized to the shared worker pool, so one
//! large job can never starve concurrent jobs of the pool's capacity.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::Semaphore;

use crate::error::{Error, Result};
use crate::processors::traits::{Processor, ProcessorDescriptor, ProcessorInput, ProgressSink};
use crate::processors::util::{self, IMAGE_EXTENSIONS};
use crate::registry::options::{OptionDef, SelectChoice};

pub struct BgRemoveProcessor {
    descriptor: ProcessorDescriptor,
    pool_capacity: usize,
}

impl BgRemoveProcessor {
    /// `pool_capacity` should match the shared worker pool's size; each job builds its
    /// own semaphore of that size rather than sharing the pool's.
    pub fn new(pool_capacity: usize) -> Self {
        Self {
            descriptor: ProcessorDescriptor {
                id: "bg-remove".to_string(),
                label: "Remove background".to_string(),
                description: "Cut the subject out of one or more frames with an AI segmentation model.".to_string(),
                accepted_extensions: IMAGE_EXTENSIONS.iter().map(|e| format!(".{e}")).collect(),
                accepts_multiple_files: true,
                options_schema: vec![
                    OptionDef::select(
                        "model",
                        "Model",
                        vec![
                            SelectChoice { value: "u2net".into(), label: "u2net (general purpose)".into() },
                            SelectChoice { value: "silueta".into(), label: "silueta (faster, smaller)".into() },
                        ],
                    )
                    .default(serde_json::json!("u2net"))
                    .build(),
                    OptionDef::select(
                        "output_format",
                        "Output format",
                        vec![
                            SelectChoice { value: "png".into(), label: "PNG".into() },
                            SelectChoice { value: "webp".into(), label: "WebP".into() },
                        ],
                    )
                    .default(serde_json::json!("png"))
                    .build(),
                ],
            },
            pool_capacity: pool_capacity.max(1),
        }
    }
}

async fn remove_background_from_frame(
    frame: PathBuf,
    index: usize,
    model: String,
    output_format: String,
    output_dir: PathBuf,
    semaphore: Arc<Semaphore>,
) -> Result<PathBuf> {
    let _permit = semaphore.acquire_owned().await.expect("worker semaphore is never closed");

    let stem = frame.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
    let out_path = output_dir.join(format!("{index:04}_{stem}.{output_format}"));

    let mut cmd = Command::new(std::env::var("REMBG_PATH").unwrap_or_else(|_| "rembg".to_string()));
    cmd.arg("i").arg("-m").arg(&model).arg(&frame).arg(&out_path);
    util::run_to_completion(&mut cmd, "rembg").await?;
    Ok(out_path)
}

#[async_trait]
impl Processor for BgRemoveProcessor {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    async fn process(&self, input: ProcessorInput<'_>, progress: &dyn ProgressSink) -> Result<PathBuf> {
        let model = input.options.get("model").and_then(|v| v.as_str()).unwrap_or("u2net").to_string();
        let output_format = input.options.get("output_format").and_then(|v| v.as_str()).unwrap_or("png").to_string();
        let total = input.input_paths.len();

        progress.on_progress(2.0, format!("Removing background from {total} frame(s)").as_str()).await;

        let semaphore = Arc::new(Semaphore::new(self.pool_capacity));
        let tasks: Vec<_> = input
            .input_paths
            .iter()
            .enumerate()
            .map(|(index, frame)| {
                tokio::spawn(remove_background_from_frame(
                    frame.clone(),
                    index,
                    model.clone(),
                    output_format.clone(),
                    input.output_dir.to_path_buf(),
                    semaphore.clone(),
                ))
            })
            .collect();

        let mut outputs = Vec::with_capacity(tasks.len());
        for (i, task) in tasks.into_iter().enumerate() {
            let out = task.await.map_err(|e| Error::ProcessingFailure(format!("frame task panicked: {e}")))??;
            outputs.push(out);
            let percent = 2.0 + 88.0 * (i + 1) as f64 / total as f64;
            progress.on_progress(percent, format!("Processed frame {}/{total}", i + 1).as_str()).await;
        }

        if outputs.len() == 1 {
            progress.on_progress(100.0, "Done").await;
            return Ok(outputs.into_iter().next().expect("checked len == 1"));
        }

        progress.on_progress(92.0, "Bundling frames").await;
        let archive_path = input.output_dir.join("frames.zip");
        let mut cmd = Command::new(std::env::var("ZIP_PATH").unwrap_or_else(|_| "zip".to_string()));
        cmd.arg("-j").arg(&archive_path);
        cmd.args(&outputs);
        util::run_to_completion(&mut cmd, "zip").await?;

        progress.on_progress(100.0, "Done").await;
        Ok(archive_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_as_combining_processor_with_pool_sized_capacity() {
        let processor = BgRemoveProcessor::new(4);
        assert!(processor.descriptor.accepts_multiple_files);
        assert_eq!(processor.pool_capacity, 4);
    }

    #[test]
    fn capacity_floor_is_one() {
        assert_eq!(BgRemoveProcessor::new(0).pool_capacity, 1);
    }
}
