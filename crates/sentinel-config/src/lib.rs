//! Configuration management for the sentinel feed
//!
//! This module handles loading, validation, and management of
//! sentinel configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Live feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Maximum number of transactions kept in the feed window
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Number of transactions shown when the feed starts
    #[serde(default = "default_initial_batch")]
    pub initial_batch: usize,
    /// Milliseconds between two ingested transactions
    #[serde(default = "default_feed_interval")]
    pub tick_interval_ms: u64,
    /// Milliseconds a new transaction stays highlighted
    #[serde(default = "default_highlight")]
    pub highlight_ms: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            initial_batch: default_initial_batch(),
            tick_interval_ms: default_feed_interval(),
            highlight_ms: default_highlight(),
        }
    }
}

fn default_capacity() -> usize {
    15
}

fn default_initial_batch() -> usize {
    8
}

fn default_feed_interval() -> u64 {
    3000
}

fn default_highlight() -> u64 {
    2000
}

/// Risk thresholds supplied by the settings provider.
///
/// Both values are inclusive lower bounds: a score of at least
/// `high_risk_score` is High, at least `medium_risk_score` is Medium,
/// anything below is Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_medium_risk")]
    pub medium_risk_score: u8,
    #[serde(default = "default_high_risk")]
    pub high_risk_score: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            medium_risk_score: default_medium_risk(),
            high_risk_score: default_high_risk(),
        }
    }
}

fn default_medium_risk() -> u8 {
    31
}

fn default_high_risk() -> u8 {
    61
}

/// Simulated audit scan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Milliseconds between two progress updates
    #[serde(default = "default_audit_interval")]
    pub tick_interval_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_audit_interval(),
        }
    }
}

fn default_audit_interval() -> u64 {
    200
}

/// Where transactions come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind
    #[serde(default)]
    pub kind: SourceKind,
    /// JSON file with transactions (replay only)
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Number of transactions the mock generator produces before it runs
    /// dry; 0 keeps it generating forever
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Fixed RNG seed for reproducible mock data
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Mock,
            path: None,
            pool_size: default_pool_size(),
            seed: None,
        }
    }
}

fn default_pool_size() -> usize {
    50
}

/// Transaction source enumeration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Randomly generated demo transactions
    Mock,
    /// Transactions replayed from a JSON file
    Replay,
}

impl Default for SourceKind {
    fn default() -> Self {
        SourceKind::Mock
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(SourceKind::Mock),
            "replay" => Ok(SourceKind::Replay),
            _ => Err(format!("Invalid source kind: {}", s)),
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Mock => write!(f, "mock"),
            SourceKind::Replay => write!(f, "replay"),
        }
    }
}

/// Keyboard shortcut settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortcutsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Feed window settings
    #[serde(default)]
    pub feed: FeedConfig,
    /// Risk thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// Audit scan settings
    #[serde(default)]
    pub audit: AuditConfig,
    /// Transaction source
    #[serde(default)]
    pub source: SourceConfig,
    /// Keyboard shortcuts
    #[serde(default)]
    pub shortcuts: ShortcutsConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::IoError)?;

        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|_| ConfigError::InvalidYaml)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "feed.capacity".to_string(),
                reason: "Capacity must be greater than 0".to_string(),
            });
        }

        if self.feed.initial_batch > self.feed.capacity {
            return Err(ConfigError::InvalidValue {
                field: "feed.initial_batch".to_string(),
                reason: format!(
                    "Initial batch must not exceed the capacity ({})",
                    self.feed.capacity
                ),
            });
        }

        if self.feed.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "feed.tick_interval_ms".to_string(),
                reason: "Feed interval must be greater than 0".to_string(),
            });
        }

        if self.audit.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "audit.tick_interval_ms".to_string(),
                reason: "Audit interval must be greater than 0".to_string(),
            });
        }

        // Buckets must partition [0, 100]: Low and High both non-empty
        let thresholds = &self.thresholds;
        if thresholds.medium_risk_score == 0
            || thresholds.medium_risk_score >= thresholds.high_risk_score
            || thresholds.high_risk_score > 100
        {
            return Err(ConfigError::InvalidValue {
                field: "thresholds".to_string(),
                reason: format!(
                    "Expected 0 < medium_risk_score < high_risk_score <= 100, got {} and {}",
                    thresholds.medium_risk_score, thresholds.high_risk_score
                ),
            });
        }

        if self.source.kind == SourceKind::Replay && self.source.path.is_none() {
            return Err(ConfigError::MissingField {
                field: "source.path".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Get the feed interval as a duration
    pub fn feed_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.feed.tick_interval_ms)
    }

    /// Get the highlight window as a duration
    pub fn highlight_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.feed.highlight_ms)
    }

    /// Get the audit progress interval as a duration
    pub fn audit_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.audit.tick_interval_ms)
    }
}

// ==================== Tests ====================
