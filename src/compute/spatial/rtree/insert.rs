//! Single-record insertion with Guttman's quadratic split.

use super::node::{Entry, Node};
use super::{MergeTree, least_enlargement};
use crate::compute::validation::validate_bbox;
use crate::error::Result;
use spatio_types::{BoundingBox, LeafPayload};

impl<P: LeafPayload> MergeTree<P> {
    /// Insert one payload, descending by least area enlargement and splitting
    /// overflowing nodes on the way back up.
    pub fn insert(&mut self, payload: P) -> Result<()> {
        let entry = Entry::leaf(payload);
        validate_bbox(entry.bbox())?;

        if let Some(sibling) = self.insert_recursive_root(entry) {
            let old_root = std::mem::replace(&mut self.root, Node::empty(0));
            let height = old_root.height + 1;
            self.root = Node::with_entries(
                height,
                vec![Entry::internal(old_root), Entry::internal(sibling)],
            );
        }

        self.record_count += 1;
        Ok(())
    }

    fn insert_recursive_root(&mut self, entry: Entry<P>) -> Option<Node<P>> {
        let (min, max) = (self.min_records, self.max_records);
        insert_recursive(&mut self.root, entry, min, max, &mut self.tally.splits)
    }
}

/// Returns the new sibling when `node` had to split.
fn insert_recursive<P: LeafPayload>(
    node: &mut Node<P>,
    entry: Entry<P>,
    min: usize,
    max: usize,
    splits: &mut usize,
) -> Option<Node<P>> {
    if node.is_leaf() {
        node.entries.push(entry);
    } else {
        let idx = least_enlargement(&node.entries, entry.bbox())?;
        let sibling = match node.entries[idx].child_mut() {
            Some(child) => insert_recursive(child, entry, min, max, splits),
            None => return None,
        };
        node.entries[idx].refresh_bbox();
        if let Some(sibling) = sibling {
            node.entries.push(Entry::internal(sibling));
        }
    }

    if node.entries.len() <= max {
        node.recompute_bbox();
        return None;
    }

    *splits += 1;
    let entries = std::mem::take(&mut node.entries);
    let (left, right) = quadratic_split(entries, min);
    node.entries = left;
    node.recompute_bbox();
    Some(Node::with_entries(node.height, right))
}

/// Guttman's quadratic split: seed the two groups with the pair wasting the
/// most area, then repeatedly assign the entry with the strongest preference.
///
/// Each group ends up with at least `min` entries. Only single-record
/// insertion uses this split; bulk merge uses the multi-way split.
pub(crate) fn quadratic_split<P>(
    mut entries: Vec<Entry<P>>,
    min: usize,
) -> (Vec<Entry<P>>, Vec<Entry<P>>) {
    let (seed_a, seed_b) = pick_seeds(&entries);

    // remove the higher index first so the lower one stays valid
    let second = entries.swap_remove(seed_b.max(seed_a));
    let first = entries.swap_remove(seed_a.min(seed_b));

    let mut box_a = *first.bbox();
    let mut box_b = *second.bbox();
    let mut group_a = vec![first];
    let mut group_b = vec![second];

    while !entries.is_empty() {
        if group_a.len() + entries.len() == min {
            group_a.append(&mut entries);
            break;
        }
        if group_b.len() + entries.len() == min {
            group_b.append(&mut entries);
            break;
        }

        let (idx, grow_a, grow_b) = pick_next(&entries, &box_a, &box_b);
        let entry = entries.swap_remove(idx);
        let to_a = grow_a < grow_b
            || (grow_a == grow_b
                && (box_a.area() < box_b.area()
                    || (box_a.area() == box_b.area() && group_a.len() <= group_b.len())));
        if to_a {
            box_a = box_a.union(entry.bbox());
            group_a.push(entry);
        } else {
            box_b = box_b.union(entry.bbox());
            group_b.push(entry);
        }
    }

    (group_a, group_b)
}

fn pick_seeds<P>(entries: &[Entry<P>]) -> (usize, usize) {
    let mut best = (0, 1);
    let mut worst_waste = f64::NEG_INFINITY;
    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let a = entries[i].bbox();
            let b = entries[j].bbox();
            let waste = a.union(b).area() - a.area() - b.area();
            if waste > worst_waste {
                worst_waste = waste;
                best = (i, j);
            }
        }
    }
    best
}

fn pick_next<P>(entries: &[Entry<P>], box_a: &BoundingBox, box_b: &BoundingBox) -> (usize, f64, f64) {
    let mut pick = (0, 0.0, 0.0);
    let mut strongest = f64::NEG_INFINITY;
    for (idx, entry) in entries.iter().enumerate() {
        let grow_a = box_a.enlargement(entry.bbox());
        let grow_b = box_b.enlargement(entry.bbox());
        let preference = (grow_a - grow_b).abs();
        if preference > strongest {
            strongest = preference;
            pick = (idx, grow_a, grow_b);
        }
    }
    pick
}
