// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Storage backends for trial persistence.
//!
//! This module provides the [`Storage`] trait and implementations for the
//! three supported substrates:
//!
//! - [`local::LocalStorage`]: one JSON file per trial under a directory
//! - [`s3::S3Storage`]: one object per trial in an S3-compatible bucket
//! - [`api::ApiStorage`]: a remote HTTP API backed by a relational database
//!
//! All backends speak the same trial document format and share the
//! [`ListQuery`] pagination/search semantics: filter first, then slice
//! `[offset, offset + limit)` over most-recently-modified-first ordering
//! where the substrate can determine it.

pub mod api;
pub mod local;
pub mod s3;

pub use api::{ApiClient, ApiStorage, MockApiClient, ReqwestApiClient};
pub use local::LocalStorage;
pub use s3::S3Storage;

use crate::error::Result;
use crate::trial::Trial;

/// Default page size for [`Storage::list`].
pub const DEFAULT_LIST_LIMIT: usize = 10;

/// Capability interface implemented by every storage substrate.
pub trait Storage: Send + Sync {
    /// Persist the trial's serialized form.
    ///
    /// Returns an implementation-defined location identifier: a file path,
    /// an object key, or a remote record id. Saving the same uuid-keyed
    /// trial twice overwrites in place.
    fn save(&self, trial: &Trial) -> Result<String>;

    /// Fetch and deserialize one trial.
    ///
    /// Fails with [`crate::Error::NotFound`] when no record matches; never
    /// returns a partially populated trial.
    fn get(&self, trial_id: &str) -> Result<Trial>;

    /// List trials matching `query`, paginated.
    fn list(&self, query: &ListQuery) -> Result<Vec<Trial>>;
}

/// Pagination window and search filter for [`Storage::list`].
///
/// A non-empty `query` keeps a trial iff the text appears as a substring of
/// its name or description, or exactly matches one of its tags.
#[derive(Debug, Clone)]
pub struct ListQuery {
    /// Free-text filter; `None` keeps everything.
    pub query: Option<String>,
    /// Maximum number of trials returned.
    pub limit: usize,
    /// Number of matching trials skipped before the window starts.
    pub offset: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            query: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ListQuery {
    /// A query with the defaults: no filter, limit 10, offset 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text filter.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Set the page size.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the page offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Whether the trial passes the search filter.
    pub fn matches(&self, trial: &Trial) -> bool {
        match self.query.as_deref() {
            None | Some("") => true,
            Some(text) => {
                trial.name().contains(text)
                    || trial.description().contains(text)
                    || trial.tags().iter().any(|tag| tag == text)
            }
        }
    }
}

/// Filter, then slice `[offset, offset + limit)`, so the window paginates
/// the filtered result set rather than the raw store.
pub(crate) fn select_page(trials: Vec<Trial>, query: &ListQuery) -> Vec<Trial> {
    trials
        .into_iter()
        .filter(|trial| query.matches(trial))
        .skip(query.offset)
        .take(query.limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Trial {
        Trial::new(name)
    }

    #[test]
    fn test_defaults() {
        let query = ListQuery::new();
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 0);
        assert!(query.query.is_none());
    }

    #[test]
    fn test_builder() {
        let query = ListQuery::new()
            .with_query("alpha")
            .with_limit(5)
            .with_offset(20);
        assert_eq!(query.query.as_deref(), Some("alpha"));
        assert_eq!(query.limit, 5);
        assert_eq!(query.offset, 20);
    }

    #[test]
    fn test_match_on_name_substring() {
        let query = ListQuery::new().with_query("alpha");
        assert!(query.matches(&named("alpha")));
        assert!(query.matches(&named("gamma-alpha")));
        assert!(!query.matches(&named("beta")));
    }

    #[test]
    fn test_match_on_description_substring() {
        let query = ListQuery::new().with_query("witness");
        let mut trial = named("t");
        trial.set_description("entanglement witness sweep");
        assert!(query.matches(&trial));
    }

    #[test]
    fn test_match_on_tag_is_exact() {
        let query = ListQuery::new().with_query("quantum");
        let mut tagged = named("t");
        tagged.add_tag("quantum");
        assert!(query.matches(&tagged));

        let mut near_miss = named("t");
        near_miss.add_tag("quantum-hardware");
        assert!(!near_miss.name().contains("quantum"));
        assert!(!query.matches(&near_miss));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = ListQuery::new().with_query("");
        assert!(query.matches(&named("anything")));
    }

    #[test]
    fn test_select_page_boundaries() {
        let trials: Vec<Trial> = (0..25).map(|i| named(&format!("trial-{}", i))).collect();

        let first = select_page(trials.clone(), &ListQuery::new());
        assert_eq!(first.len(), 10);

        let tail = select_page(trials.clone(), &ListQuery::new().with_offset(20));
        assert_eq!(tail.len(), 5);

        let past_end = select_page(trials, &ListQuery::new().with_offset(30));
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_filter_applies_before_slicing() {
        let mut trials = Vec::new();
        for i in 0..5 {
            trials.push(named(&format!("keep-{}", i)));
            trials.push(named(&format!("drop-{}", i)));
        }

        let page = select_page(
            trials,
            &ListQuery::new().with_query("keep").with_limit(3).with_offset(2),
        );
        let names: Vec<&str> = page.iter().map(Trial::name).collect();
        assert_eq!(names, vec!["keep-2", "keep-3", "keep-4"]);
    }
}
