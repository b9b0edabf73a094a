//! Mergeable 2D R-tree.
//!
//! `MergeTree` is the per-level tree of the LSM index. It supports two write
//! paths:
//!
//! 1. **Single-record insertion** (`insert`): Guttman's choose-leaf by least
//!    area enlargement with a quadratic split on overflow. The memtable only
//!    ever uses this path.
//!
//! 2. **Bulk merge** (`merge`): a whole source tree is poured into the target
//!    top-down. Subtrees of the source are kept intact whenever a cost
//!    criterion says that placing them whole is no worse than distributing
//!    their children, so most leaves are never touched individually.
//!    Overflowing nodes are split with an R*-style multi-way split.
//!
//! ## Example
//!
//! ```rust
//! use spatio_lsm::compute::spatial::rtree::MergeTree;
//! use spatio_types::BoundingBox;
//!
//! let mut level = MergeTree::new(2, 4).unwrap();
//! let mut incoming = MergeTree::new(2, 4).unwrap();
//! for i in 0..10 {
//!     let x = i as f64 * 2.0;
//!     level.insert(BoundingBox::new(x, 0.0, x + 1.0, 1.0)).unwrap();
//!     incoming.insert(BoundingBox::new(x, 5.0, x + 1.0, 6.0)).unwrap();
//! }
//!
//! level.merge(incoming);
//! assert_eq!(level.record_count(), 20);
//! assert!(level.is_valid());
//!
//! let (hits, visited) = level.search(&BoundingBox::new(0.0, 0.0, 3.0, 6.0));
//! assert_eq!(hits.len(), 4);
//! assert!(visited >= 1);
//! ```

mod diagnostics;
mod insert;
mod merge;
pub mod node;
mod split;

pub use node::{Entry, Node, NodeId};

use crate::compute::validation::validate_fanout;
use crate::error::Result;
use crate::types::Config;
use spatio_types::{BoundingBox, LeafPayload};

/// Counters shared by the insertion and merge split paths.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SplitTally {
    pub splits: usize,
    pub x_axis: usize,
    pub y_axis: usize,
}

impl SplitTally {
    fn absorb(&mut self, other: SplitTally) {
        self.splits += other.splits;
        self.x_axis += other.x_axis;
        self.y_axis += other.y_axis;
    }
}

/// A two-dimensional R-tree that can absorb another tree in bulk.
#[derive(Debug, Clone)]
pub struct MergeTree<P> {
    root: Node<P>,
    min_records: usize,
    max_records: usize,
    record_count: usize,
    tally: SplitTally,
}

impl<P: LeafPayload> MergeTree<P> {
    /// Dimensionality of every tree; the split rule sorts along x then y.
    pub const DIMENSIONS: usize = 2;

    /// Create an empty tree with fanout bounds `m = min_records`,
    /// `M = max_records`.
    pub fn new(min_records: usize, max_records: usize) -> Result<Self> {
        validate_fanout(min_records, max_records)?;
        Ok(Self::empty(min_records, max_records))
    }

    /// Create an empty tree using the fanout bounds of `config`.
    pub fn with_config(config: &Config) -> Result<Self> {
        Self::new(config.min_records, config.max_records)
    }

    pub(crate) fn empty(min_records: usize, max_records: usize) -> Self {
        Self {
            root: Node::empty(0),
            min_records,
            max_records,
            record_count: 0,
            tally: SplitTally::default(),
        }
    }

    /// Swap this tree for an empty one with the same fanout and return the
    /// previous contents.
    pub fn detach(&mut self) -> Self {
        std::mem::replace(self, Self::empty(self.min_records, self.max_records))
    }

    pub fn root(&self) -> &Node<P> {
        &self.root
    }

    pub fn height(&self) -> u32 {
        self.root.height
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn split_count(&self) -> usize {
        self.tally.splits
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn min_records(&self) -> usize {
        self.min_records
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    /// Find every payload whose box intersects `query`.
    ///
    /// Returns the payloads together with the number of nodes visited. The
    /// root is always visited; a query with non-finite coordinates is
    /// rejected and visits nothing.
    pub fn search(&self, query: &BoundingBox) -> (Vec<P>, usize) {
        let mut results = Vec::new();
        let visited = self.search_into(query, &mut results);
        (results, visited)
    }

    /// Like [`search`](Self::search) but appends into `results` and returns
    /// only the visit count.
    pub fn search_into(&self, query: &BoundingBox, results: &mut Vec<P>) -> usize {
        if !query.is_finite() {
            log::warn!("Rejecting bounding box query with non-finite coordinates");
            return 0;
        }

        let mut visited = 0;
        search_recursive(&self.root, query, results, &mut visited);
        visited
    }
}

fn search_recursive<P: LeafPayload>(
    node: &Node<P>,
    query: &BoundingBox,
    results: &mut Vec<P>,
    visited: &mut usize,
) {
    *visited += 1;
    for entry in &node.entries {
        if !entry.bbox().intersects(query) {
            continue;
        }
        match entry {
            Entry::Leaf { payload, .. } => results.push(payload.clone()),
            Entry::Internal { child, .. } => search_recursive(child, query, results, visited),
        }
    }
}

/// Index of the entry needing the least area enlargement to cover `bbox`,
/// ties broken by the smaller current area.
pub(crate) fn least_enlargement<P>(entries: &[Entry<P>], bbox: &BoundingBox) -> Option<usize> {
    let mut best: Option<(usize, f64, f64)> = None;
    for (idx, entry) in entries.iter().enumerate() {
        let enlargement = entry.bbox().enlargement(bbox);
        let area = entry.bbox().area();
        let better = match best {
            None => true,
            Some((_, best_enlargement, best_area)) => {
                enlargement < best_enlargement
                    || (enlargement == best_enlargement && area < best_area)
            }
        };
        if better {
            best = Some((idx, enlargement, area));
        }
    }
    best.map(|(idx, _, _)| idx)
}
