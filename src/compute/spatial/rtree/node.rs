//! Node and entry model shared by single-record insertion and bulk merge.

use spatio_types::{BoundingBox, LeafPayload};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of a node, used by diagnostics and by the merge side tables.
pub type NodeId = u64;

// Process-wide so that ids stay unique after trees built separately are merged.
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A record stored in a node.
#[derive(Debug, Clone)]
pub enum Entry<P> {
    /// Leaf record pointing at a payload.
    Leaf { bbox: BoundingBox, payload: P },
    /// Internal record owning a subtree.
    Internal { bbox: BoundingBox, child: Box<Node<P>> },
}

impl<P: LeafPayload> Entry<P> {
    pub fn leaf(payload: P) -> Self {
        Entry::Leaf {
            bbox: payload.bbox(),
            payload,
        }
    }

    /// Wrap a node into an internal record whose box is the node's box.
    ///
    /// Empty nodes have no box; they get an all-NaN placeholder that the
    /// first routed entry replaces and diagnostics otherwise report.
    pub fn internal(child: Node<P>) -> Self {
        let bbox = child
            .bbox
            .unwrap_or_else(|| BoundingBox::new(f64::NAN, f64::NAN, f64::NAN, f64::NAN));
        Entry::Internal {
            bbox,
            child: Box::new(child),
        }
    }
}

impl<P> Entry<P> {
    pub fn bbox(&self) -> &BoundingBox {
        match self {
            Entry::Leaf { bbox, .. } | Entry::Internal { bbox, .. } => bbox,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Entry::Leaf { .. })
    }

    pub fn child(&self) -> Option<&Node<P>> {
        match self {
            Entry::Internal { child, .. } => Some(child),
            Entry::Leaf { .. } => None,
        }
    }

    pub fn child_mut(&mut self) -> Option<&mut Node<P>> {
        match self {
            Entry::Internal { child, .. } => Some(child),
            Entry::Leaf { .. } => None,
        }
    }

    /// Re-read the cached box of the owned child after it changed.
    pub(crate) fn refresh_bbox(&mut self) {
        if let Entry::Internal { bbox, child } = self
            && let Some(child_box) = child.bbox
        {
            *bbox = child_box;
        }
    }
}

/// A tree node. Height 0 is a leaf; heights increase toward the root.
#[derive(Debug, Clone)]
pub struct Node<P> {
    pub(crate) id: NodeId,
    pub(crate) height: u32,
    pub(crate) entries: Vec<Entry<P>>,
    pub(crate) bbox: Option<BoundingBox>,
}

impl<P> Node<P> {
    pub fn empty(height: u32) -> Self {
        Self {
            id: next_node_id(),
            height,
            entries: Vec::new(),
            bbox: None,
        }
    }

    pub fn with_entries(height: u32, entries: Vec<Entry<P>>) -> Self {
        let mut node = Self {
            id: next_node_id(),
            height,
            entries,
            bbox: None,
        };
        node.recompute_bbox();
        node
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_leaf(&self) -> bool {
        self.height == 0
    }

    pub fn entries(&self) -> &[Entry<P>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached union of the entries' boxes, `None` for an empty node.
    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    /// Recompute the cached box as the exact union of the entries' boxes.
    pub(crate) fn recompute_bbox(&mut self) {
        self.bbox = BoundingBox::union_all(self.entries.iter().map(Entry::bbox));
    }
}
