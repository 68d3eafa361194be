//! Process-wide processor registry.
//!
//! Read-only after initialization: every processor is registered once at startup,
//! so the read path (`get`/`list`) needs no synchronization beyond the `HashMap`
//! being behind an `Arc` built before any request is served.

pub mod options;

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::processors::traits::{Processor, ProcessorDescriptor};

pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistry {
    pub fn builder() -> ProcessorRegistryBuilder {
        ProcessorRegistryBuilder::default()
    }

    /// Look up a processor by id.
    pub fn get(&self, id: &str) -> Result<Arc<dyn Processor>> {
        self.processors
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownProcessor(id.to_string()))
    }

    /// Public descriptor listing, as served by `GET /processors`.
    pub fn list(&self) -> Vec<ProcessorDescriptor> {
        let mut descriptors: Vec<_> = self.processors.values().map(|p| p.descriptor().clone()).collect();
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        descriptors
    }
}

#[derive(Default)]
pub struct ProcessorRegistryBuilder {
    processors: HashMap<String, Arc<dyn Processor>>,
}

impl ProcessorRegistryBuilder {
    /// Register a processor. Only valid at startup, never while serving requests.
    pub fn register(mut self, processor: Arc<dyn Processor>) -> Self {
        let id = processor.descriptor().id.clone();
        self.processors.insert(id, processor);
        self
    }

    pub fn build(self) -> ProcessorRegistry {
        ProcessorRegistry { processors: self.processors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::traits::{ProcessorInput, ProgressSink};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct Noop(ProcessorDescriptor);

    #[async_trait]
    impl Processor for Noop {
        fn descriptor(&self) -> &ProcessorDescriptor {
            &self.0
        }

        async fn process(&self, _input: ProcessorInput<'_>, _progress: &dyn ProgressSink) -> Result<PathBuf> {
            Ok(Path::new("/tmp/out").to_path_buf())
        }
    }

    fn descriptor(id: &str) -> ProcessorDescriptor {
        ProcessorDescriptor {
            id: id.to_string(),
            label: id.to_string(),
            description: String::new(),
            accepted_extensions: vec![".png".to_string()],
            accepts_multiple_files: false,
            options_schema: vec![],
        }
    }

    #[test]
    fn unknown_processor_errors() {
        let registry = ProcessorRegistry::builder().build();
        let err = registry.get("nope").unwrap_err();
        assert!(matches!(err, Error::UnknownProcessor(_)));
    }

    #[test]
    fn registered_processor_is_found_and_listed() {
        let registry = ProcessorRegistry::builder()
            .register(Arc::new(Noop(descriptor("image-convert"))))
            .register(Arc::new(Noop(descriptor("pdf-merge"))))
            .build();

        assert!(registry.get("image-convert").is_ok());
        let listed = registry.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "image-convert");
        assert_eq!(listed[1].id, "pdf-merge");
    }
}
