//! `image-convert`: converts a single image via `ffmpeg`.
//!
//! Reuses the ffmpeg binary the transcode processor already depends on rather than
//! pulling in a second image library, since ffmpeg happily decodes/encodes every
//! format in [`IMAGE_EXTENSIONS`].

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::processors::traits::{Processor, ProcessorDescriptor, ProcessorInput, ProgressSink};
use crate::processors::util::{self, IMAGE_EXTENSIONS};
use crate::registry::options::{OptionDef, SelectChoice};

pub struct ImageConvertProcessor {
    descriptor: ProcessorDescriptor,
}

impl ImageConvertProcessor {
    pub fn new() -> Self {
        Self {
            descriptor: ProcessorDescriptor {
                id: "image-convert".to_string(),
                label: "Convert image".to_string(),
                description: "Convert an image to a different format, optionally resizing it.".to_string(),
                accepted_extensions: IMAGE_EXTENSIONS.iter().map(|e| format!(".{e}")).collect(),
                accepts_multiple_files: false,
                options_schema: vec![
                    OptionDef::select(
                        "format",
                        "Format",
                        vec![
                            SelectChoice { value: "jpg".into(), label: "JPEG".into() },
                            SelectChoice { value: "png".into(), label: "PNG".into() },
                            SelectChoice { value: "webp".into(), label: "WebP".into() },
                            SelectChoice { value: "gif".into(), label: "GIF".into() },
                            SelectChoice { value: "bmp".into(), label: "BMP".into() },
                            SelectChoice { value: "tiff".into(), label: "TIFF".into() },
                        ],
                    )
                    .default(serde_json::json!("jpg"))
                    .build(),
                    OptionDef::number("quality", "Quality")
                        .min_max(1.0, 100.0)
                        .step(1.0)
                        .default(serde_json::json!(85))
                        .build(),
                    OptionDef::dimension("resize", "Resize (width in px)", 16, 8192)
                        .allow_original(true)
                        .default(serde_json::json!("original"))
                        .build(),
                ],
            },
        }
    }
}

impl Default for ImageConvertProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// ffmpeg's `-q:v` is an inverted, codec-dependent scale; map our 1-100 "higher is
/// better" quality knob onto the roughly-2-to-31 range most of its image encoders use.
fn quality_to_qscale(quality: f64) -> i64 {
    let quality = quality.clamp(1.0, 100.0);
    (31.0 - (quality - 1.0) / 99.0 * 29.0).round() as i64
}

#[async_trait]
impl Processor for ImageConvertProcessor {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    async fn process(&self, input: ProcessorInput<'_>, progress: &dyn ProgressSink) -> Result<PathBuf> {
        progress.on_progress(5.0, "Starting conversion").await;

        let format = input.options.get("format").and_then(|v| v.as_str()).unwrap_or("jpg");
        let quality = input.options.get("quality").and_then(|v| v.as_f64()).unwrap_or(85.0);

        let stem = input.input_path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
        let output_path = input.output_dir.join(format!("{stem}.{format}"));

        let mut cmd = Command::new(util::ffmpeg_path());
        cmd.arg("-y").arg("-i").arg(input.input_path);
        cmd.arg("-q:v").arg(quality_to_qscale(quality).to_string());
        if let Some(scale) = util::dimension_scale_filter(input.options, "resize") {
            cmd.arg("-vf").arg(scale);
        }
        cmd.arg(&output_path);

        util::run_ffmpeg_with_progress(&mut cmd, None, progress).await?;

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(Error::ProcessingFailure("ffmpeg exited cleanly but produced no output file".to_string()));
        }
        progress.on_progress(100.0, "Done").await;
        Ok(output_path)
    }
}
