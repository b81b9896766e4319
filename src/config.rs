// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Configuration management.
//!
//! Configuration is resolved once, at construction, from the following
//! sources (later sources override earlier ones):
//!
//! 1. Built-in defaults
//! 2. qutrials.yaml file (or an explicit path)
//! 3. Environment variables (QUTRIALS_*)
//!
//! Backends read their settings from the resulting [`Config`]; nothing in
//! the library consults the environment at call time.

use std::env;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::storage::{ApiStorage, LocalStorage, S3Storage, Storage};

/// Default artifact size soft limit, in bytes.
pub const DEFAULT_MAX_ARTIFACT_SIZE: u64 = 5_000_000;

/// Which storage substrate to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Local filesystem
    Local,
    /// S3-compatible object storage
    S3,
    /// Remote HTTP API
    Api,
}

impl Default for StorageKind {
    fn default() -> Self {
        StorageKind::Local
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Selected storage substrate
    #[serde(default)]
    pub storage: StorageKind,

    /// Local filesystem settings
    #[serde(default)]
    pub local: LocalConfig,

    /// Object storage settings
    #[serde(default)]
    pub s3: S3Config,

    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Artifact size soft limit in bytes; oversized artifacts are stored
    /// with a warning, never rejected
    #[serde(default = "default_max_artifact_size")]
    pub max_artifact_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageKind::default(),
            local: LocalConfig::default(),
            s3: S3Config::default(),
            api: ApiConfig::default(),
            max_artifact_size: default_max_artifact_size(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        if let Some(path) = config_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                config = serde_yaml::from_str(&content)?;
            }
        } else {
            for path in &["qutrials.yaml", "qutrials.yml"] {
                let path = Path::new(path);
                if path.exists() {
                    let content = std::fs::read_to_string(path)?;
                    config = serde_yaml::from_str(&content)?;
                    break;
                }
            }
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("QUTRIALS_STORAGE") {
            match val.to_lowercase().as_str() {
                "local" => self.storage = StorageKind::Local,
                "s3" => self.storage = StorageKind::S3,
                "api" => self.storage = StorageKind::Api,
                _ => {}
            }
        }
        if let Ok(val) = env::var("QUTRIALS_LOCAL_PATH") {
            self.local.path = val;
        }
        if let Ok(val) = env::var("QUTRIALS_S3_BUCKET") {
            self.s3.bucket = Some(val);
        }
        if let Ok(val) = env::var("QUTRIALS_S3_ENDPOINT") {
            self.s3.endpoint = Some(val);
        }
        if let Ok(val) = env::var("QUTRIALS_S3_REGION") {
            self.s3.region = val;
        }
        if let Ok(val) = env::var("QUTRIALS_S3_ACCESS_KEY") {
            self.s3.access_key = Some(val);
        }
        if let Ok(val) = env::var("QUTRIALS_S3_SECRET_ACCESS_KEY") {
            self.s3.secret_access_key = Some(val);
        }
        if let Ok(val) = env::var("QUTRIALS_API_HOST") {
            self.api.host = Some(val);
        }
        if let Ok(val) = env::var("QUTRIALS_API_USERNAME") {
            self.api.username = Some(val);
        }
        if let Ok(val) = env::var("QUTRIALS_API_PASSWORD") {
            self.api.password = Some(val);
        }
        if let Ok(val) = env::var("QUTRIALS_API_TIMEOUT_SEC") {
            if let Ok(seconds) = val.parse() {
                self.api.timeout_sec = seconds;
            }
        }
        if let Ok(val) = env::var("QUTRIALS_MAX_ARTIFACT_SIZE") {
            if let Ok(bytes) = val.parse() {
                self.max_artifact_size = bytes;
            }
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_sec == 0 {
            return Err(Error::Config("API timeout cannot be 0".into()));
        }
        if self.max_artifact_size == 0 {
            return Err(Error::Config("artifact size limit cannot be 0".into()));
        }
        Ok(())
    }

    /// Construct the selected storage backend.
    pub fn build_storage(&self) -> Result<Arc<dyn Storage>> {
        match self.storage {
            StorageKind::Local => Ok(Arc::new(LocalStorage::new(&self.local.path))),
            StorageKind::S3 => Ok(Arc::new(S3Storage::from_config(&self.s3)?)),
            StorageKind::Api => Ok(Arc::new(ApiStorage::from_config(&self.api)?)),
        }
    }
}

/// Local filesystem settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Root directory for trial files
    #[serde(default = "default_local_path")]
    pub path: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            path: default_local_path(),
        }
    }
}

/// Object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket name
    #[serde(default)]
    pub bucket: Option<String>,

    /// Custom endpoint URL (minio, localstack); implies path-style access
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Region name
    #[serde(default = "default_s3_region")]
    pub region: String,

    /// Access key; falls back to the standard credential chain when unset
    #[serde(default)]
    pub access_key: Option<String>,

    /// Secret access key
    #[serde(default)]
    pub secret_access_key: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: None,
            endpoint: None,
            region: default_s3_region(),
            access_key: None,
            secret_access_key: None,
        }
    }
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API host, e.g. `http://localhost:8000`
    #[serde(default)]
    pub host: Option<String>,

    /// Username for the one-time token exchange
    #[serde(default)]
    pub username: Option<String>,

    /// Password for the one-time token exchange
    #[serde(default)]
    pub password: Option<String>,

    /// Fixed per-request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_sec: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: None,
            username: None,
            password: None,
            timeout_sec: default_api_timeout(),
        }
    }
}

fn default_local_path() -> String {
    "./trials".into()
}

fn default_s3_region() -> String {
    "us-east-1".into()
}

fn default_api_timeout() -> u64 {
    30
}

fn default_max_artifact_size() -> u64 {
    DEFAULT_MAX_ARTIFACT_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage, StorageKind::Local);
        assert_eq!(config.local.path, "./trials");
        assert_eq!(config.s3.region, "us-east-1");
        assert_eq!(config.api.timeout_sec, 30);
        assert_eq!(config.max_artifact_size, 5_000_000);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let mut bad_config = Config::default();
        bad_config.api.timeout_sec = 0;
        assert!(bad_config.validate().is_err());

        let mut bad_config = Config::default();
        bad_config.max_artifact_size = 0;
        assert!(bad_config.validate().is_err());
    }

    #[test]
    fn test_config_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
storage: s3
s3:
  bucket: "trial-bucket"
  region: "eu-central-1"
max_artifact_size: 1024
"#
        )
        .unwrap();

        let config = Config::load(Some(f.path())).unwrap();
        assert_eq!(config.storage, StorageKind::S3);
        assert_eq!(config.s3.bucket.as_deref(), Some("trial-bucket"));
        assert_eq!(config.s3.region, "eu-central-1");
        assert_eq!(config.max_artifact_size, 1024);
        // Untouched sections keep their defaults.
        assert_eq!(config.api.timeout_sec, 30);
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let path = std::path::Path::new("/tmp/does_not_exist_qutrials_test.yaml");
        let config = Config::load(Some(path)).unwrap();
        assert_eq!(config.storage, StorageKind::Local);
    }

    #[test]
    fn test_config_load_invalid_yaml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{{{{not: valid: yaml::::").unwrap();

        assert!(Config::load(Some(f.path())).is_err());
    }

    #[test]
    fn test_env_override_storage_kind() {
        let mut config = Config::default();
        std::env::set_var("QUTRIALS_STORAGE", "api");
        config.apply_env_overrides();
        assert_eq!(config.storage, StorageKind::Api);

        // An unknown selector leaves the current kind untouched.
        std::env::set_var("QUTRIALS_STORAGE", "punchcards");
        config.apply_env_overrides();
        assert_eq!(config.storage, StorageKind::Api);
        std::env::remove_var("QUTRIALS_STORAGE");
    }

    #[test]
    fn test_env_override_s3_bucket() {
        let mut config = Config::default();
        std::env::set_var("QUTRIALS_S3_BUCKET", "env-bucket");
        config.apply_env_overrides();
        assert_eq!(config.s3.bucket.as_deref(), Some("env-bucket"));
        std::env::remove_var("QUTRIALS_S3_BUCKET");
    }

    #[test]
    fn test_env_override_api_timeout() {
        let mut config = Config::default();
        std::env::set_var("QUTRIALS_API_TIMEOUT_SEC", "5");
        config.apply_env_overrides();
        assert_eq!(config.api.timeout_sec, 5);
        std::env::remove_var("QUTRIALS_API_TIMEOUT_SEC");
    }

    #[test]
    fn test_env_override_max_artifact_size() {
        let mut config = Config::default();
        std::env::set_var("QUTRIALS_MAX_ARTIFACT_SIZE", "123456");
        config.apply_env_overrides();
        assert_eq!(config.max_artifact_size, 123_456);
        std::env::remove_var("QUTRIALS_MAX_ARTIFACT_SIZE");
    }

    #[test]
    fn test_build_storage_local() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.local.path = dir.path().display().to_string();

        let storage = config.build_storage().unwrap();
        let trial = crate::trial::Trial::new("t");
        storage.save(&trial).unwrap();
        assert!(storage.get(&trial.uuid().to_string()).is_ok());
    }

    #[test]
    fn test_build_storage_s3_without_bucket_fails() {
        let mut config = Config::default();
        config.storage = StorageKind::S3;
        assert!(matches!(config.build_storage(), Err(Error::Config(_))));
    }

    #[test]
    fn test_build_storage_api_without_host_fails() {
        let mut config = Config::default();
        config.storage = StorageKind::Api;
        assert!(matches!(config.build_storage(), Err(Error::Config(_))));
    }
}
