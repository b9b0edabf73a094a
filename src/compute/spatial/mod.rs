//! Spatial indexing algorithms.

pub mod rtree;

pub use rtree::MergeTree;
