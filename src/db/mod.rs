//! Level orchestrator for the LSM R-tree.
//!
//! This module defines `LsmRTree`: a small memtable tree absorbing inserts,
//! plus a cascade of level trees that grow by the configured growth factor.
//! Full memtables and overflowing levels are handed to per-level workers
//! that bulk-merge them into the next level in the background.

use crate::compute::spatial::rtree::MergeTree;
use crate::compute::validation::validate_bbox;
use crate::error::{LsmError, Result};
use crate::types::{Config, LevelStats, LsmStats};
use spatio_types::{BoundingBox, LeafPayload};
use std::sync::Arc;
use std::sync::atomic::Ordering;

mod internal;
mod level;
mod tasks;

use internal::Shared;

/// Write-optimised spatial index (thread-safe).
///
/// Inserts go into an in-memory memtable and are immediately searchable.
/// When the memtable reaches `memtable_capacity` records it is swapped for
/// an empty tree and merged into level 0 by that level's worker thread.
/// Level `L` cascades into level `L + 1` once it holds
/// `growth_factor^(L+1) * memtable_capacity` records.
///
/// All methods take `&self`; share the index between threads with an
/// `Arc`.
///
/// # Examples
///
/// ```rust
/// use spatio_lsm::{Config, LsmRTree};
/// use spatio_types::BoundingBox;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default()
///     .with_growth_factor(2)
///     .with_fanout(2, 4)
///     .with_memtable_capacity(4);
/// let index = LsmRTree::new(config)?;
///
/// for i in 0..9 {
///     let x = i as f64 * 2.0;
///     index.insert(BoundingBox::new(x, 0.0, x + 1.0, 1.0))?;
/// }
/// index.await_all()?;
///
/// assert_eq!(index.record_count(), 9);
/// let (hits, _visited) = index.search(&BoundingBox::new(0.0, 0.0, 3.0, 1.0))?;
/// assert_eq!(hits.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct LsmRTree<P: LeafPayload> {
    shared: Arc<Shared<P>>,
}

impl<P: LeafPayload> LsmRTree<P> {
    /// Create an empty index. Fails with `InvalidConfig` when the
    /// configuration does not validate.
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            shared: Arc::new(Shared::new(config)?),
        })
    }

    /// Create an index builder.
    pub fn builder() -> crate::builder::LsmBuilder {
        crate::builder::LsmBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Insert one payload into the memtable.
    ///
    /// The payload is visible to `search` as soon as this returns. When the
    /// memtable becomes full it is handed to level 0; with `blocking_flush`
    /// enabled this call waits for that hand-off to be processed.
    pub fn insert(&self, payload: P) -> Result<()> {
        if self.shared.is_closed() {
            return Err(LsmError::ShutDown);
        }
        validate_bbox(&payload.bbox())?;

        let full = {
            let mut memtable = self.shared.memtable.write();
            memtable.insert(payload)?;
            memtable.record_count() >= self.shared.config.memtable_capacity
        };

        if full {
            self.shared.flush()?;
        }
        Ok(())
    }

    /// Find every payload whose box intersects `query`.
    ///
    /// Returns the payloads and the number of nodes visited across the
    /// memtable, every level and every tree in transit between levels. The
    /// result is a consistent snapshot: a record moving between levels is
    /// reported exactly once.
    pub fn search(&self, query: &BoundingBox) -> Result<(Vec<P>, usize)> {
        validate_bbox(query)?;

        let levels = self.shared.levels.read();
        let memtable = self.shared.memtable.read();
        let trees: Vec<_> = levels.iter().map(|level| level.tree.read()).collect();
        let handoffs = self.shared.handoffs.read();

        let mut results = Vec::new();
        let mut visited = memtable.search_into(query, &mut results);
        for tree in &trees {
            visited += tree.search_into(query, &mut results);
        }
        for parked in handoffs.values() {
            visited += parked.search_into(query, &mut results);
        }

        Ok((results, visited))
    }

    /// Block until every scheduled flush and cascade has finished.
    ///
    /// Reports `BackgroundTask` when background merges failed since the
    /// previous call. Failed merges are not retried.
    pub fn await_all(&self) -> Result<()> {
        self.shared.tasks.wait_idle();
        match self.shared.tasks.take_failures() {
            0 => Ok(()),
            failed => Err(LsmError::BackgroundTask { failed }),
        }
    }

    /// Records in the memtable, every level and every tree in transit.
    pub fn record_count(&self) -> usize {
        let levels = self.shared.levels.read();
        let memtable = self.shared.memtable.read();
        let trees: Vec<_> = levels.iter().map(|level| level.tree.read()).collect();
        let handoffs = self.shared.handoffs.read();

        memtable.record_count()
            + trees.iter().map(|tree| tree.record_count()).sum::<usize>()
            + handoffs.values().map(MergeTree::record_count).sum::<usize>()
    }

    pub fn memtable_record_count(&self) -> usize {
        self.shared.memtable.read().record_count()
    }

    /// Number of levels created so far.
    pub fn level_count(&self) -> usize {
        self.shared.levels.read().len()
    }

    /// Records held by `level`; zero for a level that does not exist.
    pub fn level_record_count(&self, level: usize) -> usize {
        let levels = self.shared.levels.read();
        levels.get(level).map_or(0, |level| level.record_count())
    }

    /// Record count at which `level` cascades into the next level.
    pub fn level_threshold(&self, level: usize) -> u64 {
        self.shared.config.level_threshold(level)
    }

    /// Run `f` against the tree of `level` under its read lock.
    ///
    /// Returns `None` when the level does not exist.
    pub fn with_level<R>(&self, level: usize, f: impl FnOnce(&MergeTree<P>) -> R) -> Option<R> {
        let levels = self.shared.levels.read();
        let level = levels.get(level)?;
        let tree = level.tree.read();
        Some(f(&tree))
    }

    /// Check the structural invariants of the memtable and every level.
    pub fn check_invariants(&self) -> Result<()> {
        let levels = self.shared.levels.read();
        self.shared.memtable.read().check_invariants()?;
        for level in levels.iter() {
            level.tree.read().check_invariants().map_err(|e| match e {
                LsmError::InvariantViolation(msg) => {
                    LsmError::InvariantViolation(format!("level {}: {}", level.index, msg))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    pub fn stats(&self) -> LsmStats {
        let levels = self.shared.levels.read();
        let memtable = self.shared.memtable.read();
        let trees: Vec<_> = levels.iter().map(|level| level.tree.read()).collect();
        let handoffs = self.shared.handoffs.read();

        let counters = &self.shared.counters;
        LsmStats {
            memtable_records: memtable.record_count(),
            in_transit_records: handoffs.values().map(MergeTree::record_count).sum(),
            levels: trees
                .iter()
                .enumerate()
                .map(|(index, tree)| LevelStats {
                    level: index,
                    record_count: tree.record_count(),
                    threshold: self.shared.config.level_threshold(index),
                    tree: tree.stats(),
                })
                .collect(),
            flush_count: counters.flushes.load(Ordering::Relaxed),
            cascade_count: counters.cascades.load(Ordering::Relaxed),
            merge_time: counters.merge_time(),
            failed_tasks: self.shared.tasks.total_failures(),
        }
    }

    /// Wait for background work, then stop every level worker.
    ///
    /// Further inserts fail with `ShutDown`; searches keep working on the
    /// final state. Calling `close` twice is harmless.
    pub fn close(&self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        self.shared.tasks.wait_idle();
        let levels: Vec<_> = self.shared.levels.read().iter().cloned().collect();
        for level in &levels {
            level.shutdown();
        }
        log::debug!("Closed index with {} levels", levels.len());

        match self.shared.tasks.take_failures() {
            0 => Ok(()),
            failed => Err(LsmError::BackgroundTask { failed }),
        }
    }
}

impl<P: LeafPayload> Drop for LsmRTree<P> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Error while closing index: {}", e);
        }
    }
}
