//! Per-job scratch directories for uploads and outputs.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

fn io_error(op: &'static str, path: &Path, source: std::io::Error) -> Error {
    Error::Other(format!("{op} at {}: {source}", path.display()))
}

/// Owns the `uploads/<job_id>/` and `jobs/<job_id>/` directory layout.
#[derive(Debug, Clone)]
pub struct FileStore {
    uploads_root: PathBuf,
    jobs_root: PathBuf,
}

impl FileStore {
    pub fn new(uploads_root: PathBuf, jobs_root: PathBuf) -> Self {
        Self { uploads_root, jobs_root }
    }

    /// Persist uploaded bytes under `uploads/<job_id>/<filename>`, creating the directory
    /// if needed. Filenames are used verbatim; callers are responsible for not colliding
    /// within a single job id.
    pub async fn save_upload(&self, job_id: &str, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.uploads_root.join(job_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("creating upload directory", &dir, e))?;

        let path = dir.join(filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_error("writing upload", &path, e))?;
        Ok(path)
    }

    /// Return the working directory for a job's intermediates and final result,
    /// creating it if absent.
    pub async fn job_dir(&self, job_id: &str) -> Result<PathBuf> {
        let dir = self.jobs_root.join(job_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_error("creating job directory", &dir, e))?;
        Ok(dir)
    }

    /// Recursively remove both directories for a job. Idempotent: a missing directory
    /// is not an error.
    pub async fn cleanup(&self, job_id: &str) -> Result<()> {
        for dir in [self.uploads_root.join(job_id), self.jobs_root.join(job_id)] {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(io_error("removing job directory", &dir, e)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("uploads"), dir.path().join("jobs"));
        (dir, store)
    }

    #[tokio::test]
    async fn save_upload_then_cleanup_roundtrip() {
        let (_dir, store) = store();
        let path = store.save_upload("job1", "photo.png", b"hello").await.unwrap();
        assert!(path.exists());
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello");

        let job_dir = store.job_dir("job1").await.unwrap();
        tokio::fs::write(job_dir.join("out.jpg"), b"result").await.unwrap();

        store.cleanup("job1").await.unwrap();
        assert!(!path.exists());
        assert!(!job_dir.exists());
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let (_dir, store) = store();
        store.cleanup("never-existed").await.unwrap();
        store.cleanup("never-existed").await.unwrap();
    }
}
