//! Compute layer: the mergeable R-tree and input validation.
//!
//! The compute layer is independent of the level orchestration in `db` and
//! focuses on tree algorithms: insertion, bulk merge, splitting, search and
//! structural diagnostics.

pub mod spatial;
pub mod validation;
