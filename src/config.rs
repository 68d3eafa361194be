//! Process configuration, loaded from environment variables with struct defaults.

use std::path::PathBuf;

/// Server-wide configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0".
    pub bind_address: String,
    /// Bind port.
    pub port: u16,
    /// Enable permissive CORS (local tool; no auth/multi-tenant boundary to protect).
    pub enable_cors: bool,
    /// Root directory for `uploads/<job_id>/` and `jobs/<job_id>/`.
    pub data_dir: PathBuf,
    /// Shared worker pool size for CPU-bound processor invocations.
    pub worker_pool_size: usize,
    /// Reaper sweep interval, in seconds.
    pub reaper_interval_secs: u64,
    /// Age (seconds) after which a terminal job becomes eligible for reaping.
    pub job_max_age_secs: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 8088,
            enable_cors: true,
            data_dir: PathBuf::from("data"),
            worker_pool_size: default_worker_pool_size(),
            reaper_interval_secs: 600,
            job_max_age_secs: 3600,
        }
    }
}

/// `max(2, cpu_count / 2)`.
fn default_worker_pool_size() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cpus / 2).max(2)
}

impl ServerConfig {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// Supported env vars:
    /// - `BIND_ADDRESS`, `PORT`
    /// - `DATA_DIR`
    /// - `WORKER_POOL_SIZE`
    /// - `REAPER_INTERVAL_SECS`, `JOB_MAX_AGE_SECS`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("BIND_ADDRESS") {
            if !v.trim().is_empty() {
                config.bind_address = v;
            }
        }
        if let Ok(v) = std::env::var("PORT") {
            if let Ok(parsed) = v.parse() {
                config.port = parsed;
            }
        }
        if let Ok(v) = std::env::var("DATA_DIR") {
            if !v.trim().is_empty() {
                config.data_dir = PathBuf::from(v);
            }
        }
        if let Ok(v) = std::env::var("WORKER_POOL_SIZE") {
            if let Ok(parsed) = v.parse::<usize>() {
                if parsed > 0 {
                    config.worker_pool_size = parsed;
                }
            }
        }
        if let Ok(v) = std::env::var("REAPER_INTERVAL_SECS") {
            if let Ok(parsed) = v.parse() {
                config.reaper_interval_secs = parsed;
            }
        }
        if let Ok(v) = std::env::var("JOB_MAX_AGE_SECS") {
            if let Ok(parsed) = v.parse() {
                config.job_max_age_secs = parsed;
            }
        }

        config
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.data_dir.join("jobs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert!(config.enable_cors);
        assert!(config.worker_pool_size >= 2);
        assert_eq!(config.reaper_interval_secs, 600);
        assert_eq!(config.job_max_age_secs, 3600);
    }
}
