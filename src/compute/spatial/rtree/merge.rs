//! Bulk merge of one tree into another.
//!
//! The source root's entries are queued at the target root and routed
//! top-down. At every internal node a queued subtree is either placed whole
//! (into a child, or as a direct entry of the node) or flattened into its
//! children, depending on whether the whole placement costs no more than
//! distributing the children one by one. Leaf entries always descend to the
//! child with the least enlargement. Nodes that overflow on the way back up
//! are split with the multi-way split and handed to their parent.

use super::node::{Entry, Node, NodeId};
use super::split::{SplitNodes, split_entries};
use super::{MergeTree, SplitTally, least_enlargement};
use rustc_hash::FxHashMap;
use spatio_types::{BoundingBox, LeafPayload};
use std::collections::VecDeque;

impl<P: LeafPayload> MergeTree<P> {
    /// Merge every record of `source` into this tree.
    ///
    /// Record and split counters are summed. An empty source leaves the tree
    /// untouched; an empty target simply adopts the source root.
    pub fn merge(&mut self, mut source: MergeTree<P>) {
        if source.is_empty() {
            return;
        }

        if self.is_empty() {
            log::debug!(
                "Installing {} records directly into empty tree",
                source.record_count
            );
            self.root = source.root;
            self.record_count += source.record_count;
            self.tally.absorb(source.tally);
            return;
        }

        if source.height() > self.height() {
            std::mem::swap(&mut self.root, &mut source.root);
        }

        let mut ctx = MergeContext::new(self.min_records, self.max_records);
        let seed: VecDeque<Entry<P>> = std::mem::take(&mut source.root.entries).into();
        ctx.inbound.insert(self.root.id, seed);

        while let Some(nodes) = ctx.route(&mut self.root) {
            let height = self.root.height + 1;
            log::trace!("Merge split the root into {} nodes", nodes.len());
            self.root = Node::with_entries(height, nodes.into_iter().map(Entry::internal).collect());
        }

        self.record_count += source.record_count;
        self.tally.absorb(source.tally);
        self.tally.absorb(ctx.tally);
    }
}

/// Per-merge state. Inbound queues are keyed by node id so nodes carry no
/// merge-only fields.
struct MergeContext<P> {
    inbound: FxHashMap<NodeId, VecDeque<Entry<P>>>,
    min: usize,
    max: usize,
    tally: SplitTally,
}

impl<P: LeafPayload> MergeContext<P> {
    fn new(min: usize, max: usize) -> Self {
        Self {
            inbound: FxHashMap::default(),
            min,
            max,
            tally: SplitTally::default(),
        }
    }

    /// Run the routing pass at `node`. Returns the split pieces when the
    /// node overflowed; `node` is left empty in that case and the caller
    /// replaces it.
    fn route(&mut self, node: &mut Node<P>) -> Option<SplitNodes<P>> {
        let mut inbound = self.inbound.remove(&node.id).unwrap_or_default();
        let mut local: Vec<Entry<P>> = Vec::new();

        if node.is_leaf() {
            while let Some(entry) = inbound.pop_front() {
                match entry {
                    Entry::Leaf { .. } => node.entries.push(entry),
                    Entry::Internal { child, .. } => inbound.extend(child.entries),
                }
            }
        } else {
            while let Some(entry) = inbound.pop_front() {
                self.dispatch(node, entry, &mut inbound, &mut local);
            }
            self.route_children(node, &mut local);
        }

        node.entries.append(&mut local);
        node.recompute_bbox();

        if node.entries.len() <= self.max {
            return None;
        }

        let entries = std::mem::take(&mut node.entries);
        node.bbox = None;
        Some(split_entries(
            entries,
            node.height,
            self.min,
            self.max,
            &mut self.tally,
        ))
    }

    /// Decide where one queued entry goes at internal node `node`.
    fn dispatch(
        &mut self,
        node: &mut Node<P>,
        entry: Entry<P>,
        inbound: &mut VecDeque<Entry<P>>,
        local: &mut Vec<Entry<P>>,
    ) {
        if entry.is_leaf() {
            let idx = child_slot(node, entry.bbox());
            self.enqueue(&mut node.entries[idx], entry);
            return;
        }
        let Some((child_height, child_len)) = entry.child().map(|c| (c.height, c.len())) else {
            return;
        };

        if child_len >= self.min {
            if child_height + 1 < node.height {
                if let Some(idx) = area_criterion(&node.entries, &entry) {
                    self.enqueue(&mut node.entries[idx], entry);
                    return;
                }
            } else if child_height + 1 == node.height && overlap_criterion(&node.entries, &entry) {
                local.push(entry);
                return;
            }
        }

        log::trace!(
            "Flattening subtree of height {} with {} entries",
            child_height,
            child_len
        );
        if let Entry::Internal { child, .. } = entry {
            inbound.extend(child.entries);
        }
    }

    /// Queue `entry` for the child owned by `slot` and grow the slot's box
    /// so later routing decisions at this node see the pending records.
    fn enqueue(&mut self, slot: &mut Entry<P>, entry: Entry<P>) {
        if let Entry::Internal { bbox, child } = slot {
            *bbox = if bbox.is_degenerate() {
                *entry.bbox()
            } else {
                bbox.union(entry.bbox())
            };
            self.inbound.entry(child.id).or_default().push_back(entry);
        }
    }

    /// Recurse into every child with queued entries. Split children are
    /// replaced by their pieces, which join the local queue.
    fn route_children(&mut self, node: &mut Node<P>, local: &mut Vec<Entry<P>>) {
        let entries = std::mem::take(&mut node.entries);
        let mut kept = Vec::with_capacity(entries.len());

        for mut entry in entries {
            let pending = entry
                .child()
                .is_some_and(|child| self.inbound.contains_key(&child.id));
            if pending && let Some(child) = entry.child_mut() {
                if let Some(pieces) = self.route(child) {
                    local.extend(pieces.into_iter().map(Entry::internal));
                    continue;
                }
                entry.refresh_bbox();
            }
            kept.push(entry);
        }

        node.entries = kept;
    }
}

/// Child to receive a leaf entry. An internal node without children gets
/// a fresh empty one.
fn child_slot<P: LeafPayload>(node: &mut Node<P>, bbox: &BoundingBox) -> usize {
    match least_enlargement(&node.entries, bbox) {
        Some(idx) => idx,
        None => {
            node.entries.push(Entry::internal(Node::empty(node.height - 1)));
            node.entries.len() - 1
        }
    }
}

/// Area criterion for a subtree at least two levels shorter than the node.
///
/// Returns the child that should take the whole subtree, or `None` when
/// distributing the subtree's children is cheaper.
fn area_criterion<P>(children: &[Entry<P>], subtree: &Entry<P>) -> Option<usize> {
    let whole_idx = least_enlargement(children, subtree.bbox())?;
    let whole = children[whole_idx].bbox().enlargement(subtree.bbox());

    // simulate placing every child of the subtree individually
    let mut grown: FxHashMap<usize, BoundingBox> = FxHashMap::default();
    for grandchild in subtree_entries(subtree) {
        let Some(idx) = least_enlargement(children, grandchild.bbox()) else {
            continue;
        };
        let current = grown.get(&idx).copied().unwrap_or(*children[idx].bbox());
        grown.insert(idx, current.union(grandchild.bbox()));
    }
    let distributed: f64 = grown
        .iter()
        .map(|(idx, bbox)| bbox.area() - children[*idx].bbox().area())
        .sum();

    (whole <= distributed).then_some(whole_idx)
}

/// Overlap criterion for a subtree whose root sits one level below the
/// node: may the subtree become a direct entry of the node?
fn overlap_criterion<P>(entries: &[Entry<P>], subtree: &Entry<P>) -> bool {
    let whole: f64 = entries
        .iter()
        .map(|entry| entry.bbox().overlap(subtree.bbox()))
        .sum();

    let distributed: f64 = subtree_entries(subtree)
        .iter()
        .map(|grandchild| single_entry_overlap(entries, grandchild.bbox()))
        .sum();

    whole <= distributed
}

/// Overlap left behind when `bbox` is placed into its least-enlargement
/// entry; zero when that entry already covers it.
fn single_entry_overlap<P>(entries: &[Entry<P>], bbox: &BoundingBox) -> f64 {
    let mut best: Option<(&Entry<P>, f64)> = None;
    for entry in entries {
        let enlargement = entry.bbox().enlargement(bbox);
        if best.is_none_or(|(_, min)| enlargement < min) {
            best = Some((entry, enlargement));
        }
    }
    match best {
        Some((_, enlargement)) if enlargement == 0.0 => 0.0,
        Some((entry, _)) => entry.bbox().overlap(bbox),
        None => 0.0,
    }
}

fn subtree_entries<P>(subtree: &Entry<P>) -> &[Entry<P>] {
    subtree.child().map(|child| child.entries()).unwrap_or(&[])
}
