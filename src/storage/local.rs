// Copyright 2026 Qutrials Contributors
// SPDX-License-Identifier: Apache-2.0

//! Local filesystem backend.
//!
//! One `<uuid>.json` file per trial under a root directory. The directory is
//! created on first save. Listing orders by file modification time, newest
//! first.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::codec::document;
use crate::error::{Error, Result};
use crate::storage::{select_page, ListQuery, Storage};
use crate::trial::Trial;

/// Filesystem-backed trial storage.
pub struct LocalStorage {
    path: PathBuf,
    name_keys: bool,
}

impl LocalStorage {
    /// Storage rooted at `path`, keyed by trial uuid.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name_keys: false,
        }
    }

    /// Legacy compatibility mode: key files by trial name plus an
    /// hour-resolution timestamp suffix instead of by uuid.
    ///
    /// Saves within the same clock-resolution bucket overwrite each other
    /// silently, and distinct trials sharing a name collide. Do not mix a
    /// name-keyed directory with a uuid-keyed one.
    pub fn with_name_keys(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name_keys: true,
        }
    }

    /// The storage root directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_key(&self, trial: &Trial) -> String {
        if self.name_keys {
            format!("{}{}", trial.name(), chrono::Local::now().format("%Y%m%d%H"))
        } else {
            trial.uuid().to_string()
        }
    }

    fn file_path(&self, trial_id: &str) -> PathBuf {
        self.path.join(format!("{}.json", trial_id))
    }
}

impl Storage for LocalStorage {
    fn save(&self, trial: &Trial) -> Result<String> {
        fs::create_dir_all(&self.path)?;

        let file = self.file_path(&self.storage_key(trial));
        fs::write(&file, document::to_json_bytes(trial)?)?;
        debug!(file = %file.display(), "Saved trial");

        Ok(file.display().to_string())
    }

    fn get(&self, trial_id: &str) -> Result<Trial> {
        let file = self.file_path(trial_id);
        if !file.is_file() {
            warn!(file = %file.display(), "Trial file does not exist");
            return Err(Error::NotFound(trial_id.to_string()));
        }
        document::from_json_bytes(&fs::read(&file)?)
    }

    fn list(&self, query: &ListQuery) -> Result<Vec<Trial>> {
        if !self.path.is_dir() {
            return Ok(Vec::new());
        }

        let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let modified = entry
                .metadata()?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, path));
        }

        // Newest first.
        files.sort_by(|a, b| b.0.cmp(&a.0));

        let mut trials = Vec::with_capacity(files.len());
        for (_, path) in files {
            trials.push(document::from_json_bytes(&fs::read(&path)?)?);
        }

        Ok(select_page(trials, query))
    }
}
