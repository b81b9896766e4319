// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Qutrials: experiment tracking for quantum computing workflows.
//!
//! A [`Trial`] records the data of one experiment run (metrics, parameters,
//! circuits, operators, numeric arrays, artifacts, texts, and tags) and
//! persists it as a single self-describing JSON document through a pluggable
//! storage backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   Trial                      │
//! ├──────────────────────────────────────────────┤
//! │           Codec (document / value)           │
//! ├──────────────────────────────────────────────┤
//! │               Storage trait                  │
//! ├──────────────┬──────────────┬────────────────┤
//! │ LocalStorage │  S3Storage   │   ApiStorage   │
//! │ (filesystem) │  (rust-s3)   │   (reqwest)    │
//! └──────────────┴──────────────┴────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use qutrials::{Circuit, ListQuery, LocalStorage, Storage, Trial};
//!
//! # fn main() -> qutrials::Result<()> {
//! let storage = Arc::new(LocalStorage::new("./trials"));
//!
//! let mut trial = Trial::with_storage("bell-state", storage.clone());
//! trial.add_metric("qubits", 2);
//! trial.add_circuit(
//!     "bell",
//!     Circuit::from_qasm("OPENQASM 3.0;\nqubit[2] q;\nh q[0];\ncx q[0], q[1];"),
//! );
//! trial.add_tag("entanglement");
//! trial.save()?;
//!
//! let recent = storage.list(&ListQuery::new().with_query("bell"))?;
//! # let _ = recent;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`trial`]: the trial record
//! - [`codec`]: typed-value and whole-document serialization
//! - [`storage`]: the storage trait and its three backends
//! - [`config`]: configuration management
//! - [`types`]: domain payload types
//! - [`error`]: error types

pub mod codec;
pub mod config;
pub mod error;
pub mod storage;
pub mod trial;
pub mod types;

pub use config::{Config, StorageKind};
pub use error::{Error, Result};
pub use storage::{ApiStorage, ListQuery, LocalStorage, S3Storage, Storage};
pub use trial::Trial;
pub use types::{Artifact, Circuit, MetricValue, NumericArray, Operator};

#[cfg(test)]
pub mod test_utils;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
