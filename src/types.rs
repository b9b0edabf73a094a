//! Configuration and statistics types for the LSM R-tree
//!
//! This module provides serializable configuration plus the read-only
//! statistics snapshots reported by trees and the level orchestrator.
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Index configuration
///
/// Fixed at construction time. Designed to be easily serializable and
/// loadable from JSON or TOML.
///
/// # Example
///
/// ```rust
/// use spatio_lsm::Config;
///
/// // Create default config
/// let config = Config::default();
/// assert!(config.validate().is_ok());
///
/// // Load from JSON
/// let json = r#"{
///     "growth_factor": 2,
///     "min_records": 2,
///     "max_records": 4,
///     "memtable_capacity": 4
/// }"#;
/// let config: Config = serde_json::from_str(json).unwrap();
/// assert_eq!(config.level_threshold(0), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Size ratio T between consecutive levels
    #[serde(default = "Config::default_growth_factor")]
    pub growth_factor: u32,

    /// Minimum records per non-root node (m)
    #[serde(default = "Config::default_min_records")]
    pub min_records: usize,

    /// Maximum records per node (M)
    #[serde(default = "Config::default_max_records")]
    pub max_records: usize,

    /// Number of records the memtable absorbs before it is flushed
    #[serde(default = "Config::default_memtable_capacity")]
    pub memtable_capacity: usize,

    /// Make `insert` wait for the level-0 merge of a flushed memtable
    #[serde(default)]
    pub blocking_flush: bool,
}

impl Config {
    const fn default_growth_factor() -> u32 {
        10
    }

    const fn default_min_records() -> usize {
        4
    }

    const fn default_max_records() -> usize {
        8
    }

    const fn default_memtable_capacity() -> usize {
        1000
    }

    pub fn with_growth_factor(mut self, growth_factor: u32) -> Self {
        self.growth_factor = growth_factor;
        self
    }

    /// Set the fanout bounds (m, M).
    pub fn with_fanout(mut self, min_records: usize, max_records: usize) -> Self {
        self.min_records = min_records;
        self.max_records = max_records;
        self
    }

    pub fn with_memtable_capacity(mut self, capacity: usize) -> Self {
        self.memtable_capacity = capacity;
        self
    }

    pub fn with_blocking_flush(mut self, blocking: bool) -> Self {
        self.blocking_flush = blocking;
        self
    }

    /// Record count at which `level` cascades into the next level:
    /// `T^(level+1) * memtable_capacity`, saturating.
    pub fn level_threshold(&self, level: usize) -> u64 {
        let exponent = u32::try_from(level.saturating_add(1)).unwrap_or(u32::MAX);
        u64::from(self.growth_factor)
            .checked_pow(exponent)
            .and_then(|factor| factor.checked_mul(self.memtable_capacity as u64))
            .unwrap_or(u64::MAX)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.growth_factor < 2 {
            return Err("Growth factor must be at least 2".to_string());
        }

        if self.memtable_capacity == 0 {
            return Err("Memtable capacity must be greater than zero".to_string());
        }

        crate::compute::validation::validate_fanout(self.min_records, self.max_records)
            .map_err(|e| e.to_string())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a `.json` or (with the toml feature) `.toml`
    /// file, chosen by extension.
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::from_json(&text)?),
            #[cfg(feature = "toml")]
            Some("toml") => {
                Self::from_toml(&text).map_err(|e| crate::error::LsmError::Parse(e.to_string()))
            }
            other => Err(crate::error::LsmError::Parse(format!(
                "unsupported config file extension: {:?}",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            growth_factor: Self::default_growth_factor(),
            min_records: Self::default_min_records(),
            max_records: Self::default_max_records(),
            memtable_capacity: Self::default_memtable_capacity(),
            blocking_flush: false,
        }
    }
}

/// Shape and bookkeeping of a single tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeStats {
    /// Height of the root (0 = the root is a leaf)
    pub height: u32,
    /// Total number of nodes
    pub node_count: usize,
    /// Number of leaf nodes
    pub leaf_node_count: usize,
    /// Live record count
    pub record_count: usize,
    /// Number of split passes performed while building this tree
    pub split_count: usize,
    /// Multi-way splits that chose the (x, y) axis
    pub axis_splits: (usize, usize),
}

/// Per-level snapshot reported by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LevelStats {
    pub level: usize,
    pub record_count: usize,
    /// Count at which this level cascades into the next one
    pub threshold: u64,
    pub tree: TreeStats,
}

/// Statistics for the whole index
#[derive(Debug, Clone, Default, Serialize)]
pub struct LsmStats {
    /// Records currently in the memtable
    pub memtable_records: usize,
    /// Records in detached trees waiting to be absorbed by a level
    pub in_transit_records: usize,
    pub levels: Vec<LevelStats>,
    /// Memtable flushes handed off so far
    pub flush_count: u64,
    /// Cascades from one level into the next so far
    pub cascade_count: u64,
    /// Wall time spent inside bulk merges, summed over all levels
    pub merge_time: Duration,
    /// Background merge tasks that failed or panicked
    pub failed_tasks: u64,
}

impl LsmStats {
    /// Total records across memtable, levels and in-flight hand-offs.
    pub fn total_records(&self) -> usize {
        self.memtable_records
            + self.in_transit_records
            + self.levels.iter().map(|l| l.record_count).sum::<usize>()
    }
}
