//! R*-style multi-way split used by bulk merge.
//!
//! A node may overflow by far more than one entry during a merge, so the
//! split keeps partitioning until every piece holds at most `M` entries.

use super::SplitTally;
use super::node::{Entry, Node};
use smallvec::SmallVec;
use spatio_types::BoundingBox;

/// Split results. Almost always two nodes, unless a merge poured many
/// entries into one node.
pub(crate) type SplitNodes<P> = SmallVec<[Node<P>; 2]>;

/// Goodness of a candidate partition, compared lexicographically.
#[derive(Debug, Clone, Copy)]
struct Goodness {
    overlap: f64,
    area: f64,
    margin: f64,
}

impl Goodness {
    const WORST: Goodness = Goodness {
        overlap: f64::MAX,
        area: f64::MAX,
        margin: f64::MAX,
    };

    fn of(left: &BoundingBox, right: &BoundingBox) -> Self {
        Self {
            overlap: left.overlap(right),
            area: left.area() + right.area(),
            margin: left.margin() + right.margin(),
        }
    }

    fn beats(&self, other: &Goodness) -> bool {
        self.overlap < other.overlap
            || (self.overlap == other.overlap
                && (self.area < other.area
                    || (self.area == other.area && self.margin < other.margin)))
    }
}

/// Partition `entries` into nodes of height `height`, each holding between
/// `min` and `max` entries.
pub(crate) fn split_entries<P>(
    entries: Vec<Entry<P>>,
    height: u32,
    min: usize,
    max: usize,
    tally: &mut SplitTally,
) -> SplitNodes<P> {
    let mut result = SplitNodes::new();
    let mut pending = vec![entries];

    while let Some(group) = pending.pop() {
        if group.len() <= max {
            result.push(Node::with_entries(height, group));
            continue;
        }
        let (left, right) = partition(group, min, max, tally);
        // right first so pieces come out in sorted order
        pending.push(right);
        pending.push(left);
    }

    result
}

/// One binary partition step: choose the axis and index minimising
/// (overlap, area, margin) and cut the sorted entries there.
fn partition<P>(
    mut entries: Vec<Entry<P>>,
    min: usize,
    max: usize,
    tally: &mut SplitTally,
) -> (Vec<Entry<P>>, Vec<Entry<P>>) {
    tally.splits += 1;

    let count = entries.len();
    let l = count * min / (max + 1);

    let mut best_axis = 0;
    let mut best_k = count / 2;
    let mut best = Goodness::WORST;

    for axis in 0..2 {
        sort_by_axis(&mut entries, axis);
        let (prefix, suffix) = running_boxes(&entries);
        for k in l..(count - l) {
            if k == 0 {
                continue;
            }
            let goodness = Goodness::of(&prefix[k - 1], &suffix[k]);
            if goodness.beats(&best) {
                best = goodness;
                best_axis = axis;
                best_k = k;
            }
        }
    }

    if best_axis == 0 {
        tally.x_axis += 1;
    } else {
        tally.y_axis += 1;
    }

    // the last loop left the entries sorted along y
    sort_by_axis(&mut entries, best_axis);
    let right = entries.split_off(best_k);
    (entries, right)
}

fn sort_by_axis<P>(entries: &mut [Entry<P>], axis: usize) {
    entries.sort_by(|a, b| a.bbox().low(axis).total_cmp(&b.bbox().low(axis)));
}

/// `prefix[i]` covers entries `0..=i`, `suffix[i]` covers entries `i..`.
fn running_boxes<P>(entries: &[Entry<P>]) -> (Vec<BoundingBox>, Vec<BoundingBox>) {
    let mut prefix: Vec<BoundingBox> = Vec::with_capacity(entries.len());
    for entry in entries {
        let next = match prefix.last() {
            Some(acc) => acc.union(entry.bbox()),
            None => *entry.bbox(),
        };
        prefix.push(next);
    }

    let mut suffix: Vec<BoundingBox> = Vec::with_capacity(entries.len());
    for entry in entries.iter().rev() {
        let next = match suffix.last() {
            Some(acc) => acc.union(entry.bbox()),
            None => *entry.bbox(),
        };
        suffix.push(next);
    }
    suffix.reverse();

    (prefix, suffix)
}
