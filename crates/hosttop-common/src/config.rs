//! Global configuration model for hosttop.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{HostTopError, Result};

/// Root configuration for a monitoring session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostTopConfig {
    /// Command-line prefix that identifies a worker process.
    pub worker_marker: String,
    /// Requests per second at or above which a row is highlighted.
    pub rps_threshold: u64,
    /// Syscall number to intercept. `None` selects the receive syscall
    /// of the architecture hosttop was built for.
    pub syscall_nr: Option<u64>,
    /// Report refresh interval in milliseconds.
    pub tick_millis: u64,
    /// Maximum bytes copied from a traced process per intercepted receive.
    /// `None` copies everything the receive returned.
    pub max_capture_bytes: Option<usize>,
    /// Maximum number of distinct hosts tracked. `None` is unbounded.
    pub max_hosts: Option<usize>,
}

impl Default for HostTopConfig {
    fn default() -> Self {
        Self {
            worker_marker: constants::DEFAULT_WORKER_MARKER.to_owned(),
            rps_threshold: constants::DEFAULT_RPS_THRESHOLD,
            syscall_nr: None,
            tick_millis: constants::DEFAULT_TICK_MILLIS,
            max_capture_bytes: None,
            max_hosts: None,
        }
    }
}

impl HostTopConfig {
    /// Loads a configuration from a JSON file. Missing fields take their
    /// default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// holds values rejected by [`HostTopConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| HostTopError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`HostTopError::Config`] for an empty marker, a zero tick,
    /// a zero capture size or a zero host bound.
    pub fn validate(&self) -> Result<()> {
        if self.worker_marker.is_empty() {
            return Err(config_error("worker_marker must not be empty"));
        }
        if self.tick_millis == 0 {
            return Err(config_error("tick_millis must be greater than zero"));
        }
        if self.max_capture_bytes == Some(0) {
            return Err(config_error("max_capture_bytes must be greater than zero when set"));
        }
        if self.max_hosts == Some(0) {
            return Err(config_error("max_hosts must be greater than zero when set"));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> HostTopError {
    HostTopError::Config {
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_nginx_workers() {
        let config = HostTopConfig::default();
        assert_eq!(config.worker_marker, "nginx: worker process");
        assert_eq!(config.rps_threshold, 100);
        assert_eq!(config.tick_millis, 1000);
        assert_eq!(config.max_hosts, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hosttop.json");
        std::fs::write(&path, r#"{ "rps_threshold": 250, "max_hosts": 500 }"#).expect("write");

        let config = HostTopConfig::load(&path).expect("should load");
        assert_eq!(config.rps_threshold, 250);
        assert_eq!(config.max_hosts, Some(500));
        assert_eq!(config.worker_marker, "nginx: worker process");
        assert_eq!(config.max_capture_bytes, None);
    }

    #[test]
    fn load_rejects_zero_tick() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hosttop.json");
        std::fs::write(&path, r#"{ "tick_millis": 0 }"#).expect("write");

        let err = HostTopConfig::load(&path).expect_err("zero tick is invalid");
        assert!(matches!(err, HostTopError::Config { .. }));
    }

    #[test]
    fn capture_cap_is_unbounded_unless_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hosttop.json");
        std::fs::write(&path, r#"{ "max_capture_bytes": 4096 }"#).expect("write");
        let config = HostTopConfig::load(&path).expect("should load");
        assert_eq!(config.max_capture_bytes, Some(4096));

        std::fs::write(&path, r#"{ "max_capture_bytes": 0 }"#).expect("write");
        let err = HostTopConfig::load(&path).expect_err("zero cap is invalid");
        assert!(matches!(err, HostTopError::Config { .. }));
    }

    #[test]
    fn load_reports_missing_file_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let err = HostTopConfig::load(&path).expect_err("file is missing");
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn load_rejects_malformed_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hosttop.json");
        std::fs::write(&path, "{ not json").expect("write");

        let err = HostTopConfig::load(&path).expect_err("malformed");
        assert!(matches!(err, HostTopError::Serialization { .. }));
    }

    #[test]
    fn zero_host_bound_is_rejected() {
        let config = HostTopConfig {
            max_hosts: Some(0),
            ..HostTopConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
