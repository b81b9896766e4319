// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Remote API backend.
//!
//! Talks to a trial-tracking HTTP API backed by a relational database.
//! Credentials are exchanged exactly once at construction for a bearer token
//! (`POST /token`), which is cached for the backend's lifetime with no
//! refresh, so the instance's useful lifetime is bounded by the token's
//! validity. Requests carry one fixed timeout and are never retried.
//!
//! The HTTP layer sits behind the [`ApiClient`] trait so backend logic can
//! be tested without a server; [`ReqwestApiClient`] is the production
//! implementation and [`MockApiClient`] an in-memory fake.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::codec::document;
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::storage::{ListQuery, Storage};
use crate::trial::Trial;

/// Token endpoint response.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access: String,
}

/// Abstract HTTP client for the trial API.
///
/// This trait enables testing the backend without real HTTP calls.
pub trait ApiClient: Send + Sync {
    /// Exchange credentials for a bearer token.
    fn fetch_token(&self, username: &str, password: &str) -> Result<String>;

    /// Create a trial record; returns the server's representation.
    fn create_trial(&self, token: &str, document: &Value) -> Result<Value>;

    /// Fetch one trial document by record id.
    fn fetch_trial(&self, token: &str, trial_id: &str) -> Result<Value>;

    /// Fetch a page of trial documents.
    fn fetch_trials(
        &self,
        token: &str,
        query: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<Value>;
}

/// Production HTTP client using reqwest's blocking API.
pub struct ReqwestApiClient {
    client: reqwest::blocking::Client,
    host: String,
}

impl ReqwestApiClient {
    /// Create a client for the given host with one fixed per-request timeout.
    pub fn new(host: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Storage {
                status: None,
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
        })
    }

    fn check_success(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(Error::Storage {
            status: Some(status.as_u16()),
            message: body,
        })
    }
}

impl ApiClient for ReqwestApiClient {
    fn fetch_token(&self, username: &str, password: &str) -> Result<String> {
        let url = format!("{}/token", self.host);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "username": username, "password": password }))
            .send()?;

        let token: TokenResponse = Self::check_success(response)?
            .json()
            .map_err(|e| Error::Serialization(format!("failed to parse token response: {}", e)))?;
        Ok(token.access)
    }

    fn create_trial(&self, token: &str, document: &Value) -> Result<Value> {
        let url = format!("{}/trials", self.host);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(document)
            .send()?;

        Self::check_success(response)?
            .json()
            .map_err(|e| Error::Serialization(format!("failed to parse create response: {}", e)))
    }

    fn fetch_trial(&self, token: &str, trial_id: &str) -> Result<Value> {
        let url = format!("{}/trials/{}", self.host, trial_id);
        let response = self.client.get(&url).bearer_auth(token).send()?;

        let status = response.status();
        let body = response.text()?;
        if status == reqwest::StatusCode::NOT_FOUND || body.contains("Not found.") {
            return Err(Error::NotFound(trial_id.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Storage {
                status: Some(status.as_u16()),
                message: body,
            });
        }
        serde_json::from_str(&body)
            .map_err(|e| Error::Serialization(format!("failed to parse trial response: {}", e)))
    }

    fn fetch_trials(
        &self,
        token: &str,
        query: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<Value> {
        let url = format!("{}/trials", self.host);
        let mut params: Vec<(&str, String)> = vec![
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(text) = query {
            params.push(("query", text.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .query(&params)
            .send()?;

        Self::check_success(response)?
            .json()
            .map_err(|e| Error::Serialization(format!("failed to parse list response: {}", e)))
    }
}

/// Remote-API-backed trial storage.
pub struct ApiStorage {
    client: Arc<dyn ApiClient>,
    token: SecretString,
}

impl fmt::Debug for ApiStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiStorage")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl ApiStorage {
    /// Build the production backend from configuration.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let host = config.host.clone().ok_or_else(|| {
            Error::Config("API host not configured. Set QUTRIALS_API_HOST or config.api.host".into())
        })?;
        let username = config.username.clone().ok_or_else(|| {
            Error::Config(
                "API username not configured. Set QUTRIALS_API_USERNAME or config.api.username"
                    .into(),
            )
        })?;
        let password = config.password.clone().ok_or_else(|| {
            Error::Config(
                "API password not configured. Set QUTRIALS_API_PASSWORD or config.api.password"
                    .into(),
            )
        })?;

        let client = ReqwestApiClient::new(&host, Duration::from_secs(config.timeout_sec))?;
        Self::with_client(Arc::new(client), &username, &password)
    }

    /// Build the backend over a caller-supplied client.
    ///
    /// The credential exchange happens here, once; the resulting token is
    /// cached for the instance's lifetime.
    pub fn with_client(
        client: Arc<dyn ApiClient>,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let token = client.fetch_token(username, password)?;
        info!("Authenticated against the trial API");
        Ok(Self {
            client,
            token: SecretString::from(token),
        })
    }
}

impl Storage for ApiStorage {
    fn save(&self, trial: &Trial) -> Result<String> {
        let doc = document::encode(trial);
        let created = self
            .client
            .create_trial(self.token.expose_secret(), &doc)?;

        // The server assigns the record id; fall back to the trial name when
        // the response carries none.
        let location = match created.get("id") {
            Some(Value::Number(id)) => id.to_string(),
            Some(Value::String(id)) => id.clone(),
            _ => trial.name().to_string(),
        };
        debug!(record = %location, "Saved trial to API");
        Ok(location)
    }

    fn get(&self, trial_id: &str) -> Result<Trial> {
        let doc = self.client.fetch_trial(self.token.expose_secret(), trial_id)?;
        document::decode(&doc)
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Trial>> {
        let response = self.client.fetch_trials(
            self.token.expose_secret(),
            query.query.as_deref(),
            query.offset,
            query.limit,
        )?;

        let items = response
            .as_array()
            .ok_or_else(|| Error::Serialization("trial list response must be a JSON array".into()))?;

        // One undecodable element fails the whole call; a silently shortened
        // listing would be indistinguishable from a complete one.
        items.iter().map(document::decode).collect()
    }
}

/// In-memory fake of the trial API for tests.
///
/// Assigns row ids like the real server, filters on name/description, and
/// paginates server-side.
pub struct MockApiClient {
    token: String,
    auth_ok: bool,
    records: Mutex<Vec<Value>>,
    token_requests: Mutex<u32>,
}

impl Default for MockApiClient {
    fn default() -> Self {
        Self {
            token: "mock-access-token".to_string(),
            auth_ok: true,
            records: Mutex::new(Vec::new()),
            token_requests: Mutex::new(0),
        }
    }
}

impl MockApiClient {
    /// A fake that accepts any credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake that rejects the credential exchange.
    pub fn rejecting_auth() -> Self {
        Self {
            auth_ok: false,
            ..Self::default()
        }
    }

    /// Number of token exchanges performed.
    pub fn token_requests(&self) -> u32 {
        *self.token_requests.lock().unwrap()
    }

    /// Inject a raw record, bypassing the save path.
    pub fn inject_record(&self, record: Value) {
        self.records.lock().unwrap().push(record);
    }
}

impl ApiClient for MockApiClient {
    fn fetch_token(&self, _username: &str, _password: &str) -> Result<String> {
        *self.token_requests.lock().unwrap() += 1;
        if !self.auth_ok {
            return Err(Error::Storage {
                status: Some(401),
                message: "invalid credentials".into(),
            });
        }
        Ok(self.token.clone())
    }

    fn create_trial(&self, token: &str, document: &Value) -> Result<Value> {
        assert_eq!(token, self.token);
        let mut records = self.records.lock().unwrap();
        let mut stored = document.clone();
        stored["id"] = json!(records.len() as i64 + 1);
        records.push(stored.clone());
        Ok(stored)
    }

    fn fetch_trial(&self, token: &str, trial_id: &str) -> Result<Value> {
        assert_eq!(token, self.token);
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|record| record["id"].to_string() == trial_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(trial_id.to_string()))
    }

    fn fetch_trials(
        &self,
        token: &str,
        query: Option<&str>,
        offset: usize,
        limit: usize,
    ) -> Result<Value> {
        assert_eq!(token, self.token);
        let records = self.records.lock().unwrap();
        let matches: Vec<Value> = records
            .iter()
            .filter(|record| match query {
                None | Some("") => true,
                Some(text) => {
                    record["name"].as_str().is_some_and(|name| name.contains(text))
                        || record["description"]
                            .as_str()
                            .is_some_and(|descr| descr.contains(text))
                }
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(Value::Array(matches))
    }
}
