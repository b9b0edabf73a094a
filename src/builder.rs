//! Index builder for flexible configuration
//!
//! This module provides a builder pattern for creating an `LsmRTree`,
//! either from a complete `Config` or one setting at a time.

use crate::db::LsmRTree;
use crate::error::Result;
use crate::types::Config;
use spatio_types::LeafPayload;

/// Builder for index configuration.
///
/// ```rust
/// use spatio_lsm::LsmBuilder;
/// use spatio_types::BoundingBox;
///
/// let index = LsmBuilder::new()
///     .fanout(2, 6)
///     .memtable_capacity(64)
///     .build::<BoundingBox>()
///     .unwrap();
/// assert_eq!(index.config().max_records, 6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LsmBuilder {
    config: Config,
}

impl LsmBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Size ratio between consecutive levels.
    pub fn growth_factor(mut self, growth_factor: u32) -> Self {
        self.config = self.config.with_growth_factor(growth_factor);
        self
    }

    /// Minimum and maximum records per node.
    pub fn fanout(mut self, min_records: usize, max_records: usize) -> Self {
        self.config = self.config.with_fanout(min_records, max_records);
        self
    }

    pub fn memtable_capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.with_memtable_capacity(capacity);
        self
    }

    /// Make inserts that fill the memtable wait for the level-0 merge.
    pub fn blocking_flush(mut self, blocking: bool) -> Self {
        self.config = self.config.with_blocking_flush(blocking);
        self
    }

    /// Validate the configuration and build the index.
    pub fn build<P: LeafPayload>(self) -> Result<LsmRTree<P>> {
        LsmRTree::new(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LsmError;
    use spatio_types::BoundingBox;

    #[test]
    fn test_builder_default() {
        let builder = LsmBuilder::new();
        assert_eq!(builder.config, Config::default());
    }

    #[test]
    fn test_builder_settings() {
        let index = LsmBuilder::new()
            .growth_factor(3)
            .fanout(2, 5)
            .memtable_capacity(10)
            .blocking_flush(true)
            .build::<BoundingBox>()
            .unwrap();

        let config = index.config();
        assert_eq!(config.growth_factor, 3);
        assert_eq!((config.min_records, config.max_records), (2, 5));
        assert_eq!(config.memtable_capacity, 10);
        assert!(config.blocking_flush);
        assert_eq!(index.level_threshold(1), 90);
    }

    #[test]
    fn test_builder_with_config() {
        let config = Config::default().with_memtable_capacity(32);
        let index = LsmBuilder::new().config(config.clone()).build::<BoundingBox>().unwrap();
        assert_eq!(index.config(), &config);
    }

    #[test]
    fn test_builder_validates() {
        let result = LsmBuilder::new().memtable_capacity(0).build::<BoundingBox>();
        assert!(matches!(result, Err(LsmError::InvalidConfig(_))));
    }
}
