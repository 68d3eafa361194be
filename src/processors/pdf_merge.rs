//! `pdf-merge`: combines every submitted PDF into one via `qpdf`.
//!
//! A combining processor (`accepts_multiple_files = true`): the scheduler hands it one
//! Job spanning every file in a batch submission instead of fanning out per-file.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::processors::traits::{Processor, ProcessorDescriptor, ProcessorInput, ProgressSink};
use crate::processors::util;
use crate::registry::options::OptionDef;

pub struct PdfMergeProcessor {
    descriptor: ProcessorDescriptor,
}

impl PdfMergeProcessor {
    pub fn new() -> Self {
        Self {
            descriptor: ProcessorDescriptor {
                id: "pdf-merge".to_string(),
                label: "Merge PDFs".to_string(),
                description: "Combine multiple PDF files into a single document, in submission order.".to_string(),
                accepted_extensions: vec![".pdf".to_string()],
                accepts_multiple_files: true,
                options_schema: Vec::<OptionDef>::new(),
            },
        }
    }
}

impl Default for PdfMergeProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Processor for PdfMergeProcessor {
    fn descriptor(&self) -> &ProcessorDescriptor {
        &self.descriptor
    }

    async fn process(&self, input: ProcessorInput<'_>, progress: &dyn ProgressSink) -> Result<PathBuf> {
        if input.input_paths.len() < 2 {
            return Err(Error::ProcessingFailure("pdf-merge needs at least two input files".to_string()));
        }

        progress.on_progress(5.0, format!("Merging {} PDFs", input.input_paths.len()).as_str()).await;

        let output_path = input.output_dir.join("merged.pdf");

        let mut cmd = Command::new(util::qpdf_path());
        cmd.arg("--empty").arg("--pages");
        cmd.args(input.input_paths);
        cmd.arg("--").arg(&output_path);

        util::run_to_completion(&mut cmd, "qpdf").await?;

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(Error::ProcessingFailure("qpdf exited cleanly but produced no output file".to_string()));
        }
        progress.on_progress(100.0, "Done").await;
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_as_combining_processor() {
        let descriptor = PdfMergeProcessor::new().descriptor;
        assert!(descriptor.accepts_multiple_files);
        assert_eq!(descriptor.accepted_extensions, vec![".pdf".to_string()]);
    }
}
