//! `video-transcode`: re-encodes a video (or audio) file via `ffmpeg`.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::processors::traits::{Processor, ProcessorDescriptor, ProcessorInput, ProgressSink};
use crate::processors::util::{self, AUDIO_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::registry::options::{OptionDef, SelectChoice};

pub struct VideoTranscodeProcessor {
    descriptor: ProcessorDescriptor,
}

impl VideoTranscodeProcessor {
    pub fn new() -> Self {
        let accepted_extensions =
            VIDEO_EXTENSIONS.iter().chain(AUDIO_EXTENSIONS.iter()).map(|e| format!(".{e}")).collect();

        Self {
            descriptor: ProcessorDescriptor {
                id: "video-transcode".to_string(),
                label: "Transcode video".to_string(),
                description: "Re-encode a video into a different codec and container with ffmpeg.".to_string(),
                accepted_extensions,
                accepts_multiple_files: false,
                options_schema: vec![
                    OptionDef::select(
                        "video_codec",
                        "Video codec",
                        vec![
                            SelectChoice { value: "copy".into(), label: "Copy (no re-encode)".into() },
                            SelectChoice { value: "h264".into(), label: "H.264".into() },
                            SelectChoice { value: "h265".into(), label: "H.265".into() },
                            SelectChoice { value: "vp9".into(), label: "VP9".into() },
                        ],
                    )
                    .default(serde_json::json!("h264"))
                    .build(),
                    OptionDef::select(
                        "audio_codec",
                        "Audio codec",
                        vec![
                            SelectChoice { value: "copy".into(), label: "Copy (no re-encode)".into() },
                            SelectChoice { value: "aac".into(), label: "AAC".into() },
                            SelectChoice { value: "mp3".into(), label: "MP3".into() },
                            SelectChoice { value: "none".into(), label: "No audio".into() },
                        ],
                    )
                    .default(serde_json::json!("aac"))
                    .build(),
                    OptionDef::select(
                        "format",
                        "Container",
                        vec![
                            SelectChoice { value: "mp4".into(), label: "MP4".into() },
                            SelectChoice { value: "mkv".into(), label: "MKV".into() },
                            SelectChoice { value: "webm".into(), label: "WebM".into() },
                            SelectChoice { value: "mov".into(), label: "QuickTime".into() },
                        ],
                    )
                    .default(serde_json::json!("mp4"))
                    .build(),
                    OptionDef::number("crf", "Quality (CRF, lower is better)")
                        .min_max(0.0, 51.0)
                        .step(1.0)
                        .default(serde_json::json!(23))
                        .build(),
                    OptionDef::dimension("resolution", "Output height", 16, 8192)
                        .allow_original(true)
                        .default(serde_json::json!("original"))
                        .build(),
                ],
            },
        }
    }

    fn video_codec_args(codec: &str) -> [&'static str; 2] {
        match codec {
            "copy" => ["-c:v", "copy"],
            "h265" => ["-c:v", "libx265"],
            "vp9" => ["-c:v", "libvpx-vp9"],
            _ => ["-c:v", "libx264"],
        }
    }

    fn audio_codec_args(codec: &str) -> Vec<&'static str> {
        match codec {
            "copy" => vec!["-c:a", "copy"],
            "mp3" => vec!["-c:a", "libmp3lame"],
            "none" => vec!["-an"],
            _ => vec!["-c:a", "aac"],
        }
    }
}

impl Default for VideoTranscodeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Processor for VideoTranscodeProcessor {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    async fn process(&self, input: ProcessorInput<'_>, progress: &dyn ProgressSink) -> Result<PathBuf> {
        progress.on_progress(2.0, "Probing input").await;

        let video_codec = input.options.get("video_codec").and_then(|v| v.as_str()).unwrap_or("h264");
        let audio_codec = input.options.get("audio_codec").and_then(|v| v.as_str()).unwrap_or("aac");
        let format = input.options.get("format").and_then(|v| v.as_str()).unwrap_or("mp4");
        let crf = input.options.get("crf").and_then(|v| v.as_f64()).unwrap_or(23.0);

        let stem = input.input_path.file_stem().and_then(|s| s.to_str()).unwrap_or("output");
        let output_path = input.output_dir.join(format!("{stem}.{format}"));
        let total_duration_ms = util::probe_duration_ms(input.input_path).await;

        let mut cmd = Command::new(util::ffmpeg_path());
        cmd.arg("-y").arg("-i").arg(input.input_path);
        cmd.args(Self::video_codec_args(video_codec));
        cmd.args(Self::audio_codec_args(audio_codec));
        if video_codec != "copy" {
            cmd.arg("-crf").arg(crf.round().to_string());
        }
        if let Some(scale) = util::dimension_scale_filter(input.options, "resolution") {
            cmd.arg("-vf").arg(scale);
        }
        cmd.arg("-progress").arg("pipe:1").arg("-nostats");
        cmd.arg(&output_path);

        util::run_ffmpeg_with_progress(&mut cmd, total_duration_ms, progress).await?;

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(Error::ProcessingFailure("ffmpeg exited cleanly but produced no output file".to_string()));
        }
        Ok(output_path)
    }
}
