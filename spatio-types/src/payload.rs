//! Leaf payload abstraction.

use crate::bbox::BoundingBox;

/// An opaque spatial object stored in the leaves of the tree.
///
/// The tree only ever asks a payload for its bounding box. Payloads are
/// cloned out of the index when a search reports them and move between
/// background merge threads, hence the `Clone + Send + Sync` bounds.
pub trait LeafPayload: Clone + Send + Sync + 'static {
    fn bbox(&self) -> BoundingBox;
}

impl LeafPayload for BoundingBox {
    fn bbox(&self) -> BoundingBox {
        *self
    }
}
