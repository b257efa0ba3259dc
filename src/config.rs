//! Configuration for SectionDB
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Main configuration for a storage root
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory holding the index and all section files
    /// Internal structure:
    ///   {root_dir}/
    ///     ├── index            (key → section id archive)
    ///     └── data/            (one file per section)
    pub root_dir: PathBuf,

    // -------------------------------------------------------------------------
    // File Lock Configuration
    // -------------------------------------------------------------------------
    /// How long to keep retrying when a file is locked by another holder
    pub open_retry: RetryPolicy,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    pub index: IndexOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./sectiondb_data"),
            open_retry: RetryPolicy::default(),
            index: IndexOptions::default(),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage root directory
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.root_dir = path.into();
        self
    }

    /// Set the file lock retry policy (used for sections and the index)
    pub fn open_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.index.open_retry = policy.clone();
        self.config.open_retry = policy;
        self
    }

    /// Set the number of stale index records that triggers compaction
    pub fn compact_min_stale(mut self, count: u64) -> Self {
        self.config.index.compact_min_stale = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Retry Policy
// =============================================================================

/// Sleep hook used between lock attempts
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// Bounded retry used when a file is locked by another process
///
/// The default ceiling is 50 attempts × 100 ms ≈ 5 s.
#[derive(Clone)]
pub struct RetryPolicy {
    /// Maximum number of lock attempts before giving up
    pub attempts: u32,

    /// Delay between two attempts
    pub delay: Duration,

    sleeper: Sleeper,
}

impl RetryPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 50;
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
            sleeper: Arc::new(std::thread::sleep),
        }
    }

    /// Replace the sleep function (tests use this to count waits
    /// without actually blocking)
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub(crate) fn sleep(&self) {
        (self.sleeper)(self.delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("attempts", &self.attempts)
            .field("delay", &self.delay)
            .finish()
    }
}

// =============================================================================
// Index Options
// =============================================================================

/// Tuning for the index archive
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Minimum number of superseded records before the archive is rewritten.
    /// Compaction also requires stale records to outnumber live entries.
    pub compact_min_stale: u64,

    /// Lock retry used when opening the archive file
    pub open_retry: RetryPolicy,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            compact_min_stale: 1024,
            open_retry: RetryPolicy::default(),
        }
    }
}
