// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Object storage backend.
//!
//! One object per trial, keyed by uuid, in an S3-compatible bucket.
//! Listing walks the bucket's paginated key enumeration with a page size
//! equal to the requested limit and stops as soon as the window is covered,
//! so it is O(offset + limit) in fetched objects; object stores expose no
//! random-access index over insertion order, and enumeration follows the
//! store's native key order.

use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use crate::codec::document;
use crate::config::S3Config;
use crate::error::{Error, Result};
use crate::storage::{ListQuery, Storage};
use crate::trial::Trial;

/// S3-compatible object storage for trials.
pub struct S3Storage {
    bucket: Box<Bucket>,
}

impl S3Storage {
    /// Build the backend from configuration.
    ///
    /// Explicit access keys take precedence; without them the standard
    /// credential chain (environment, profile) is consulted. Fails with
    /// [`Error::Config`] when the bucket is missing or no credentials can
    /// be resolved.
    pub fn from_config(config: &S3Config) -> Result<Self> {
        let bucket_name = config.bucket.clone().ok_or_else(|| {
            Error::Config("S3 bucket not configured. Set QUTRIALS_S3_BUCKET or config.s3.bucket".into())
        })?;

        let credentials = match (&config.access_key, &config.secret_access_key) {
            (Some(access), Some(secret)) => {
                Credentials::new(Some(access), Some(secret), None, None, None)
            }
            _ => Credentials::default(),
        }
        .map_err(|e| Error::Config(format!("S3 credentials unavailable: {}", e)))?;

        let region = match &config.endpoint {
            Some(endpoint) => Region::Custom {
                region: config.region.clone(),
                endpoint: endpoint.trim_end_matches('/').to_string(),
            },
            None => config
                .region
                .parse()
                .map_err(|e| Error::Config(format!("invalid S3 region: {}", e)))?,
        };

        let mut bucket = Bucket::new(&bucket_name, region, credentials)
            .map_err(|e| Error::Config(format!("failed to configure bucket: {}", e)))?;
        if config.endpoint.is_some() {
            // Custom endpoints (minio, localstack) expect path-style access.
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket })
    }

    /// The configured bucket name.
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    fn fetch_object(&self, key: &str) -> Result<Trial> {
        let response = self.bucket.get_object(key).map_err(transport_error)?;
        match response.status_code() {
            200..=299 => document::from_json_bytes(response.bytes()),
            404 => Err(Error::NotFound(key.to_string())),
            code => Err(Error::Storage {
                status: Some(code),
                message: String::from_utf8_lossy(response.bytes()).into_owned(),
            }),
        }
    }
}

impl Storage for S3Storage {
    fn save(&self, trial: &Trial) -> Result<String> {
        let key = trial.uuid().to_string();
        let body = document::to_json_bytes(trial)?;

        let response = self
            .bucket
            .put_object(&key, &body)
            .map_err(transport_error)?;
        let code = response.status_code();
        if !(200..300).contains(&code) {
            return Err(Error::Storage {
                status: Some(code),
                message: String::from_utf8_lossy(response.bytes()).into_owned(),
            });
        }

        debug!(key = %key, bucket = %self.bucket.name(), "Stored trial object");
        Ok(key)
    }

    fn get(&self, trial_id: &str) -> Result<Trial> {
        self.fetch_object(trial_id)
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Trial>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let wanted = query.offset + query.limit;
        let mut matches: Vec<Trial> = Vec::new();
        let mut continuation: Option<String> = None;

        'pages: loop {
            let (page, _code) = self
                .bucket
                .list_page(
                    String::new(),
                    None,
                    continuation.take(),
                    None,
                    Some(query.limit),
                )
                .map_err(transport_error)?;

            for object in &page.contents {
                let trial = self.fetch_object(&object.key)?;
                if query.matches(&trial) {
                    matches.push(trial);
                }
                if matches.len() >= wanted {
                    break 'pages;
                }
            }

            match page.next_continuation_token {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(matches
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }
}

fn transport_error(err: s3::error::S3Error) -> Error {
    Error::Storage {
        status: None,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> S3Config {
        S3Config {
            bucket: Some("trials".into()),
            endpoint: Some("http://localhost:4566/".into()),
            region: "us-east-1".into(),
            access_key: Some("test".into()),
            secret_access_key: Some("test".into()),
        }
    }

    #[test]
    fn test_from_config_missing_bucket() {
        let config = S3Config {
            bucket: None,
            ..offline_config()
        };
        assert!(matches!(
            S3Storage::from_config(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_config_with_endpoint_and_keys() {
        let storage = S3Storage::from_config(&offline_config()).unwrap();
        assert_eq!(storage.bucket_name(), "trials");
    }
}
