// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! The trial record: one tracked experiment run.
//!
//! A [`Trial`] collects metrics, parameters, circuits, operators, arrays,
//! artifacts, texts, and tags in insertion order. Collections are strictly
//! additive; entries are never updated or removed. A trial may be bound to a
//! storage backend for the `save`/`read` convenience calls, and the binding
//! itself is never part of the persisted document.

use std::fmt;
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::config::DEFAULT_MAX_ARTIFACT_SIZE;
use crate::error::{Error, Result};
use crate::storage::Storage;
use crate::types::{Artifact, Circuit, MetricValue, NumericArray, Operator};

/// One tracked experiment run.
pub struct Trial {
    pub(crate) uuid: Uuid,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) tags: Vec<String>,
    pub(crate) metrics: Vec<(String, MetricValue)>,
    pub(crate) parameters: Vec<(String, String)>,
    pub(crate) circuits: Vec<(String, Circuit)>,
    pub(crate) operators: Vec<(String, Operator)>,
    pub(crate) arrays: Vec<(String, NumericArray)>,
    pub(crate) artifacts: Vec<(String, Artifact)>,
    pub(crate) texts: Vec<(String, String)>,
    pub(crate) versions: Vec<(String, String)>,
    pub(crate) storage: Option<Arc<dyn Storage>>,
    artifact_limit: u64,
}

impl Trial {
    /// Create a new trial with a fresh uuid and no storage binding.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            metrics: Vec::new(),
            parameters: Vec::new(),
            circuits: Vec::new(),
            operators: Vec::new(),
            arrays: Vec::new(),
            artifacts: Vec::new(),
            texts: Vec::new(),
            versions: Vec::new(),
            storage: None,
            artifact_limit: DEFAULT_MAX_ARTIFACT_SIZE,
        }
    }

    /// Create a new trial bound to a storage backend.
    pub fn with_storage(name: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        let mut trial = Self::new(name);
        trial.storage = Some(storage);
        trial
    }

    /// Override the artifact size soft limit, in bytes.
    pub fn with_artifact_limit(mut self, limit: u64) -> Self {
        self.artifact_limit = limit;
        self
    }

    /// Adopt a pre-existing uuid, for reconstruction or import paths. The
    /// uuid is otherwise assigned once at construction and never changes.
    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = uuid;
        self
    }

    /// Bind (or rebind) this trial to a storage backend.
    pub fn bind(&mut self, storage: Arc<dyn Storage>) {
        self.storage = Some(storage);
    }

    /// The bound storage backend, if any.
    pub fn storage(&self) -> Option<&Arc<dyn Storage>> {
        self.storage.as_ref()
    }

    /// Immutable trial identifier, assigned at construction.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Human-readable label; not guaranteed unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set the free-text description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Tags, in insertion order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Recorded metrics, in insertion order. Names may repeat.
    pub fn metrics(&self) -> &[(String, MetricValue)] {
        &self.metrics
    }

    /// Recorded parameters, in insertion order.
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// Recorded circuits, in insertion order.
    pub fn circuits(&self) -> &[(String, Circuit)] {
        &self.circuits
    }

    /// Recorded operators, in insertion order.
    pub fn operators(&self) -> &[(String, Operator)] {
        &self.operators
    }

    /// Recorded numeric arrays, in insertion order.
    pub fn arrays(&self) -> &[(String, NumericArray)] {
        &self.arrays
    }

    /// Recorded artifacts, in insertion order.
    pub fn artifacts(&self) -> &[(String, Artifact)] {
        &self.artifacts
    }

    /// Recorded texts, in insertion order.
    pub fn texts(&self) -> &[(String, String)] {
        &self.texts
    }

    /// Recorded library versions.
    pub fn versions(&self) -> &[(String, String)] {
        &self.versions
    }

    /// Record a metric, e.g. a qubit count or a fidelity estimate. The same
    /// metric name may be recorded repeatedly to form a time series.
    pub fn add_metric(&mut self, name: impl Into<String>, value: impl Into<MetricValue>) {
        self.metrics.push((name.into(), value.into()));
    }

    /// Record a parameter, e.g. an environment detail.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.parameters.push((name.into(), value.into()));
    }

    /// Record a circuit.
    pub fn add_circuit(&mut self, name: impl Into<String>, circuit: Circuit) {
        self.circuits.push((name.into(), circuit));
    }

    /// Record an operator.
    pub fn add_operator(&mut self, name: impl Into<String>, operator: Operator) {
        self.operators.push((name.into(), operator));
    }

    /// Record a numeric array, e.g. measurement results.
    pub fn add_array(&mut self, name: impl Into<String>, array: NumericArray) {
        self.arrays.push((name.into(), array));
    }

    /// Record an opaque artifact.
    ///
    /// Oversized artifacts are stored anyway; the size limit only emits a
    /// warning.
    pub fn add_artifact(&mut self, name: impl Into<String>, artifact: Artifact) {
        let name = name.into();
        let size = artifact.size_bytes() as u64;
        if size >= self.artifact_limit {
            warn!(
                artifact = %name,
                size_bytes = size,
                limit_bytes = self.artifact_limit,
                "Artifact exceeds the configured size limit"
            );
        }
        self.artifacts.push((name, artifact));
    }

    /// Record a titled block of text.
    pub fn add_text(&mut self, title: impl Into<String>, text: impl Into<String>) {
        self.texts.push((title.into(), text.into()));
    }

    /// Record a tag.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    /// Record a library name/version pair.
    pub fn add_version(&mut self, library: impl Into<String>, version: impl Into<String>) {
        self.versions.push((library.into(), version.into()));
    }

    /// Persist this trial through its bound storage backend.
    ///
    /// Returns the backend's location identifier (path, object key, or
    /// remote record id). Fails with [`Error::Config`] when the trial is
    /// unbound; decoded trials are always unbound and must be re-bound
    /// explicitly before saving.
    pub fn save(&self) -> Result<String> {
        self.bound_storage()?.save(self)
    }

    /// Fetch a trial by id through this trial's bound storage backend.
    pub fn read(&self, trial_id: &str) -> Result<Trial> {
        self.bound_storage()?.get(trial_id)
    }

    /// Close the trial: stamp the tracking library version into `versions`
    /// and persist.
    pub fn close(&mut self) -> Result<String> {
        let name = env!("CARGO_PKG_NAME");
        if !self.versions.iter().any(|(lib, _)| lib == name) {
            self.versions
                .push((name.to_string(), crate::VERSION.to_string()));
        }
        self.save()
    }

    fn bound_storage(&self) -> Result<&Arc<dyn Storage>> {
        self.storage
            .as_ref()
            .ok_or_else(|| Error::Config("trial is not bound to a storage backend".into()))
    }
}

impl Clone for Trial {
    fn clone(&self) -> Self {
        Self {
            uuid: self.uuid,
            name: self.name.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            metrics: self.metrics.clone(),
            parameters: self.parameters.clone(),
            circuits: self.circuits.clone(),
            operators: self.operators.clone(),
            arrays: self.arrays.clone(),
            artifacts: self.artifacts.clone(),
            texts: self.texts.clone(),
            versions: self.versions.clone(),
            storage: self.storage.clone(),
            artifact_limit: self.artifact_limit,
        }
    }
}

// Equality covers trial content only; the storage binding and the artifact
// limit are runtime wiring, not recorded data.
impl PartialEq for Trial {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
            && self.name == other.name
            && self.description == other.description
            && self.tags == other.tags
            && self.metrics == other.metrics
            && self.parameters == other.parameters
            && self.circuits == other.circuits
            && self.operators == other.operators
            && self.arrays == other.arrays
            && self.artifacts == other.artifacts
            && self.texts == other.texts
            && self.versions == other.versions
    }
}

impl fmt::Debug for Trial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trial")
            .field("uuid", &self.uuid)
            .field("name", &self.name)
            .field("metrics", &self.metrics.len())
            .field("parameters", &self.parameters.len())
            .field("circuits", &self.circuits.len())
            .field("operators", &self.operators.len())
            .field("arrays", &self.arrays.len())
            .field("artifacts", &self.artifacts.len())
            .field("texts", &self.texts.len())
            .field("tags", &self.tags)
            .field("bound", &self.storage.is_some())
            .finish()
    }
}
