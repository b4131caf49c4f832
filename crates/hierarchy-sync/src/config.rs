//! Sync configuration
//!
//! ```toml
//! freshness_window_ms = 300000
//! strict_ingestion = true
//!
//! [retry]
//! max_attempts = 3
//! base_delay_ms = 500
//! max_delay_ms = 5000
//! ```

use crate::error::ConfigError;
use crate::retry::RetryPolicy;
use hierarchy_cache::DEFAULT_FRESHNESS_WINDOW;
use hierarchy_tree::IngestMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for [`HierarchySync`](crate::HierarchySync)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// How long fetched data counts as fresh
    pub freshness_window_ms: u64,
    /// Backoff for read requests
    pub retry: RetryPolicy,
    /// Reject malformed tree payloads instead of skipping bad nodes
    pub strict_ingestion: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            freshness_window_ms: u64::try_from(DEFAULT_FRESHNESS_WINDOW.as_millis()).unwrap_or(u64::MAX),
            retry: RetryPolicy::default(),
            strict_ingestion: true,
        }
    }
}

impl SyncConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set freshness window
    #[must_use]
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set ingestion mode
    #[must_use]
    pub fn with_strict_ingestion(mut self, strict: bool) -> Self {
        self.strict_ingestion = strict;
        self
    }

    /// Freshness window as a duration
    #[inline]
    #[must_use]
    pub fn freshness_window(&self) -> Duration {
        Duration::from_millis(self.freshness_window_ms)
    }

    /// Ingestion mode for tree payloads
    #[inline]
    #[must_use]
    pub fn ingest_mode(&self) -> IngestMode {
        if self.strict_ingestion {
            IngestMode::Strict
        } else {
            IngestMode::Lenient
        }
    }

    /// Parse from TOML; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
