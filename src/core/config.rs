//! Configuration management with layered hierarchy

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;
use tracing::warn;

use crate::core::project::Project;
use crate::core::reorder::PersistPolicy;
use crate::core::store::DEFAULT_STALE_AFTER_SECS;

/// Default number of products per listed page
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// shelf configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Products per page for paged listings
    pub page_size: Option<usize>,

    /// Seconds before fetched data turns stale; 0 disables age-based staleness
    pub stale_after_secs: Option<u64>,

    /// Which positions an order save sends
    pub reorder_policy: Option<PersistPolicy>,

    /// Re-fetch a list right after a change is confirmed
    pub refresh_on_commit: Option<bool>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/shelf/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 3. Project config (.shelf/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.config_path()) {
                config.merge(project_config);
            }
        }

        // 4. Environment variables
        config.apply_env(|name| std::env::var(name).ok());

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "shelf")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Overlay `SHELF_*` variables; malformed values are skipped
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("SHELF_PAGE_SIZE") {
            match raw.trim().parse() {
                Ok(n) => self.page_size = Some(n),
                Err(_) => warn!(value = %raw, "SHELF_PAGE_SIZE is not a number"),
            }
        }
        if let Some(raw) = lookup("SHELF_STALE_AFTER_SECS") {
            match raw.trim().parse() {
                Ok(n) => self.stale_after_secs = Some(n),
                Err(_) => warn!(value = %raw, "SHELF_STALE_AFTER_SECS is not a number"),
            }
        }
        if let Some(raw) = lookup("SHELF_REORDER_POLICY") {
            match raw.parse() {
                Ok(policy) => self.reorder_policy = Some(policy),
                Err(e) => warn!(error = %e, "ignoring SHELF_REORDER_POLICY"),
            }
        }
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.page_size.is_some() {
            self.page_size = other.page_size;
        }
        if other.stale_after_secs.is_some() {
            self.stale_after_secs = other.stale_after_secs;
        }
        if other.reorder_policy.is_some() {
            self.reorder_policy = other.reorder_policy;
        }
        if other.refresh_on_commit.is_some() {
            self.refresh_on_commit = other.refresh_on_commit;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size.filter(|n| *n > 0).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Freshness window for the store (`None`: stale only after invalidation)
    ///
    /// A window too large to represent counts as no window at all.
    pub fn stale_after(&self) -> Option<Duration> {
        match self.stale_after_secs {
            Some(0) => None,
            Some(secs) => i64::try_from(secs).ok().and_then(Duration::try_seconds),
            None => Some(Duration::seconds(DEFAULT_STALE_AFTER_SECS)),
        }
    }

    pub fn reorder_policy(&self) -> PersistPolicy {
        self.reorder_policy.unwrap_or_default()
    }

    pub fn refresh_on_commit(&self) -> bool {
        self.refresh_on_commit.unwrap_or(true)
    }
}
