//! Shared orchestrator state and the flush/cascade operations.
//!
//! Lock order, for every path that takes more than one lock:
//! level list, memtable, level trees by ascending index, hand-off registry.
//! Writers hold a single tree lock and then the registry; the level list is
//! only written while no other lock is held.

use super::level::{Absorb, Level};
use super::tasks::TaskTracker;
use crate::compute::spatial::rtree::MergeTree;
use crate::error::{LsmError, Result};
use crate::types::Config;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use spatio_types::LeafPayload;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Running totals reported through `LsmStats`.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub flushes: AtomicU64,
    pub cascades: AtomicU64,
    pub merge_nanos: AtomicU64,
}

impl Counters {
    pub fn merge_time(&self) -> Duration {
        Duration::from_nanos(self.merge_nanos.load(Ordering::Relaxed))
    }
}

pub(crate) struct Shared<P> {
    pub config: Config,
    pub memtable: RwLock<MergeTree<P>>,
    pub levels: RwLock<Vec<Arc<Level<P>>>>,
    /// Detached trees on their way into a level, keyed by hand-off id.
    /// Search reads them so records stay visible while in transit.
    pub handoffs: RwLock<FxHashMap<u64, MergeTree<P>>>,
    pub tasks: TaskTracker,
    pub counters: Counters,
    pub closed: AtomicBool,
    next_handoff: AtomicU64,
}

impl<P: LeafPayload> Shared<P> {
    pub fn new(config: Config) -> Result<Self> {
        config.validate().map_err(LsmError::InvalidConfig)?;
        let memtable = MergeTree::with_config(&config)?;
        Ok(Self {
            config,
            memtable: RwLock::new(memtable),
            levels: RwLock::new(Vec::new()),
            handoffs: RwLock::new(FxHashMap::default()),
            tasks: TaskTracker::default(),
            counters: Counters::default(),
            closed: AtomicBool::new(false),
            next_handoff: AtomicU64::new(0),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Register a detached tree for hand-off and return its key.
    pub fn park(&self, tree: MergeTree<P>) -> u64 {
        let id = self.next_handoff.fetch_add(1, Ordering::Relaxed);
        self.handoffs.write().insert(id, tree);
        id
    }

    /// Level `index`, creating it and every missing level below it.
    ///
    /// Must be called without holding any other lock.
    pub fn ensure_level(self: &Arc<Self>, index: usize) -> Result<Arc<Level<P>>> {
        if let Some(level) = self.levels.read().get(index) {
            return Ok(Arc::clone(level));
        }

        let mut levels = self.levels.write();
        while levels.len() <= index {
            let level = Level::spawn(self, levels.len())?;
            log::info!(
                "Created level {} (threshold {} records)",
                level.index,
                self.config.level_threshold(level.index)
            );
            levels.push(level);
        }
        Ok(Arc::clone(&levels[index]))
    }

    /// Swap a full memtable for an empty one and hand it to level 0.
    pub fn flush(self: &Arc<Self>) -> Result<()> {
        let level0 = self.ensure_level(0)?;

        let handoff = {
            let mut memtable = self.memtable.write();
            // another writer may have flushed first
            if memtable.record_count() < self.config.memtable_capacity {
                return Ok(());
            }
            let detached = memtable.detach();
            log::debug!("Flushing memtable with {} records", detached.record_count());
            self.park(detached)
        };
        self.counters.flushes.fetch_add(1, Ordering::Relaxed);

        let (ack, done) = if self.config.blocking_flush {
            let (tx, rx) = crossbeam_channel::bounded(1);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        self.tasks.begin();
        if let Err(e) = level0.send(Absorb { handoff, ack }) {
            self.tasks.finish();
            return Err(e);
        }

        if let Some(done) = done {
            done.recv().map_err(|_| LsmError::ShutDown)?;
        }
        Ok(())
    }

    /// Worker body: absorb parked tree `handoff` into `level`, then cascade
    /// if the level reached its threshold.
    pub fn absorb(self: &Arc<Self>, level: &Level<P>, handoff: u64) -> Result<()> {
        let count = {
            let mut tree = level.tree.write();
            let Some(incoming) = self.handoffs.write().remove(&handoff) else {
                log::warn!("Hand-off {} for level {} was already taken", handoff, level.index);
                return Ok(());
            };

            if tree.is_empty() {
                log::debug!(
                    "Installing {} records as level {}",
                    incoming.record_count(),
                    level.index
                );
            } else {
                log::debug!(
                    "Merging {} records into level {} ({} records)",
                    incoming.record_count(),
                    level.index,
                    tree.record_count()
                );
            }

            let started = Instant::now();
            tree.merge(incoming);
            let nanos = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
            self.counters.merge_nanos.fetch_add(nanos, Ordering::Relaxed);

            tree.record_count()
        };

        let threshold = self.config.level_threshold(level.index);
        if (count as u64) < threshold {
            return Ok(());
        }

        self.cascade(level, threshold)
    }

    /// Detach `level` and hand it to the next level.
    fn cascade(self: &Arc<Self>, level: &Level<P>, threshold: u64) -> Result<()> {
        let next = self.ensure_level(level.index + 1)?;

        let handoff = {
            let mut tree = level.tree.write();
            log::info!(
                "Level {} reached {} records (threshold {}), cascading into level {}",
                level.index,
                tree.record_count(),
                threshold,
                next.index
            );
            let detached = tree.detach();
            self.park(detached)
        };
        self.counters.cascades.fetch_add(1, Ordering::Relaxed);

        self.tasks.begin();
        if let Err(e) = next.send(Absorb { handoff, ack: None }) {
            self.tasks.finish();
            return Err(e);
        }
        Ok(())
    }
}
