//! Write-optimised 2D spatial index: an LSM cascade of bulk-merged R-trees.
//!
//! ```rust
//! use spatio_lsm::{Config, LsmRTree};
//! use spatio_types::TrajectoryPoint;
//! use spatio_types::BoundingBox;
//!
//! let index = LsmRTree::new(Config::default().with_memtable_capacity(16))?;
//! for seq in 0..100 {
//!     index.insert(TrajectoryPoint::new(1, seq, seq as f64, 0.5))?;
//! }
//! index.await_all()?;
//!
//! let (hits, _visited) = index.search(&BoundingBox::new(10.0, 0.0, 19.0, 1.0))?;
//! assert_eq!(hits.len(), 10);
//! # Ok::<(), spatio_lsm::LsmError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod db;
pub mod error;
pub mod import;
pub mod types;

pub use builder::LsmBuilder;
pub use compute::spatial::rtree::{Entry, MergeTree, Node, NodeId};
pub use db::LsmRTree;
pub use error::{LsmError, Result};
pub use types::{Config, LevelStats, LsmStats, TreeStats};

pub use geo::{Point, Rect};
pub use spatio_types::{BoundingBox, LeafPayload, TrajectoryPoint};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{LsmBuilder, LsmError, LsmRTree, MergeTree, Result};

    pub use crate::{Config, LsmStats, TreeStats};

    pub use spatio_types::{BoundingBox, LeafPayload, TrajectoryPoint};

    pub use geo::{Point, Rect};

    pub use crate::import::{load_trajectory_points, read_polylines};
}
