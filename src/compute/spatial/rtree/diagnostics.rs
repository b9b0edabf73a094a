//! Read-only structural checks and quality measures.
//!
//! None of these run during normal operation; tests and benchmarks call
//! them after merges to assert the tree is still well formed.

use super::MergeTree;
use super::node::{Entry, Node, NodeId};
use crate::error::{LsmError, Result};
use crate::types::TreeStats;
use rustc_hash::FxHashSet;
use spatio_types::{BoundingBox, LeafPayload};

impl<P: LeafPayload> MergeTree<P> {
    /// Every non-root node holds between `m` and `M` entries and the root
    /// holds at most `M`.
    pub fn is_valid(&self) -> bool {
        self.root.len() <= self.max_records && self.nodes().skip(1).all(|node| {
            node.len() >= self.min_records && node.len() <= self.max_records
        })
    }

    pub fn has_duplicate_nodes(&self) -> bool {
        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        for node in self.nodes() {
            if !seen.insert(node.id) {
                log::warn!("Duplicate node id {} in tree", node.id);
                return true;
            }
        }
        false
    }

    /// Any entry or non-empty node whose box is non-finite or inverted.
    pub fn has_degenerate_boxes(&self) -> bool {
        self.nodes().any(|node| {
            let node_box_bad = match node.bbox() {
                Some(bbox) => bbox.is_degenerate(),
                None => !node.is_empty(),
            };
            node_box_bad || node.entries.iter().any(|e| e.bbox().is_degenerate())
        })
    }

    /// Cached node boxes and internal entry boxes equal the exact union of
    /// what they cover.
    pub fn has_tight_boxes(&self) -> bool {
        self.nodes().all(|node| {
            let exact = BoundingBox::union_all(node.entries.iter().map(Entry::bbox));
            node.bbox == exact
                && node.entries.iter().all(|entry| match entry {
                    Entry::Internal { bbox, child } => child.bbox == Some(*bbox),
                    Entry::Leaf { .. } => true,
                })
        })
    }

    /// Leaves hold only leaf entries, internal nodes only internal entries,
    /// and every child is exactly one level below its parent.
    pub fn has_consistent_heights(&self) -> bool {
        self.nodes().all(|node| {
            node.entries.iter().all(|entry| match entry {
                Entry::Leaf { .. } => node.is_leaf(),
                Entry::Internal { child, .. } => child.height + 1 == node.height,
            })
        })
    }

    /// Number of leaf entries reachable from the root.
    pub fn count_leaf_records(&self) -> usize {
        self.nodes()
            .filter(|node| node.is_leaf())
            .map(Node::len)
            .sum()
    }

    /// Average over nodes of the overlap between sibling entries, relative
    /// to the entries' total area. Every ordered pair of distinct siblings
    /// is counted, so each overlapping pair contributes twice. Nodes whose
    /// entries have no area are skipped; 0.0 when nothing was measured.
    pub fn overlap_ratio(&self) -> f64 {
        average(self.nodes().filter_map(|node| {
            let entries = &node.entries;
            let total_area: f64 = entries.iter().map(|e| e.bbox().area()).sum();
            if total_area == 0.0 || total_area.is_nan() {
                return None;
            }
            let mut overlap = 0.0;
            for (i, a) in entries.iter().enumerate() {
                for (j, b) in entries.iter().enumerate() {
                    if i != j {
                        overlap += a.bbox().overlap(b.bbox());
                    }
                }
            }
            Some(overlap / total_area)
        }))
    }

    /// Average over nodes of the summed entry area relative to the node's
    /// own area. Zero-area nodes are skipped.
    pub fn coverage_ratio(&self) -> f64 {
        average(self.nodes().filter_map(|node| {
            let node_area = node.bbox()?.area();
            if node_area == 0.0 || node_area.is_nan() {
                return None;
            }
            let covered: f64 = node.entries.iter().map(|e| e.bbox().area()).sum();
            Some(covered / node_area)
        }))
    }

    /// Average leaf occupancy as a percentage of `M`.
    pub fn fill_factor(&self) -> f64 {
        let max = self.max_records as f64;
        average(
            self.nodes()
                .filter(|node| node.is_leaf())
                .map(|node| node.len() as f64 / max * 100.0),
        )
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            height: self.height(),
            record_count: self.record_count,
            split_count: self.tally.splits,
            axis_splits: (self.tally.x_axis, self.tally.y_axis),
            ..Default::default()
        };
        for node in self.nodes() {
            stats.node_count += 1;
            if node.is_leaf() {
                stats.leaf_node_count += 1;
            }
        }
        stats
    }

    /// Run every structural check and report the first failure.
    pub fn check_invariants(&self) -> Result<()> {
        if !self.is_valid() {
            return Err(LsmError::InvariantViolation(format!(
                "node outside fanout bounds [{}, {}]",
                self.min_records, self.max_records
            )));
        }
        if !self.has_consistent_heights() {
            return Err(LsmError::InvariantViolation(
                "inconsistent node heights or entry kinds".to_string(),
            ));
        }
        if self.has_degenerate_boxes() {
            return Err(LsmError::InvariantViolation(
                "degenerate bounding box".to_string(),
            ));
        }
        if !self.has_tight_boxes() {
            return Err(LsmError::InvariantViolation(
                "cached box differs from the union of its entries".to_string(),
            ));
        }
        if self.has_duplicate_nodes() {
            return Err(LsmError::InvariantViolation(
                "node reachable twice".to_string(),
            ));
        }
        let leaves = self.count_leaf_records();
        if leaves != self.record_count {
            return Err(LsmError::InvariantViolation(format!(
                "record count {} but {} leaf records",
                self.record_count, leaves
            )));
        }
        Ok(())
    }

    /// Pre-order walk over every node, root first.
    fn nodes(&self) -> Nodes<'_, P> {
        Nodes {
            stack: vec![&self.root],
        }
    }
}

struct Nodes<'a, P> {
    stack: Vec<&'a Node<P>>,
}

impl<'a, P> Iterator for Nodes<'a, P> {
    type Item = &'a Node<P>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.entries.iter().rev().filter_map(|e| e.child()));
        Some(node)
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
