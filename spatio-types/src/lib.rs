//! # spatio-types
//!
//! Geometry and payload types shared by the spatio LSM R-tree.
//!
//! This crate provides the collaborators the tree engine consumes but does
//! not own:
//!
//! - **Geometry**: [`BoundingBox`], an axis-aligned rectangle with the cost
//!   functions R-tree algorithms need (area, margin, overlap, enlargement)
//! - **Payloads**: the [`LeafPayload`] trait and [`TrajectoryPoint`], one GPS
//!   sample of a trajectory
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use spatio_types::bbox::BoundingBox;
//! use spatio_types::payload::LeafPayload;
//! use spatio_types::point::TrajectoryPoint;
//!
//! let sample = TrajectoryPoint::new(7, 0, -8.618643, 41.141412);
//! let area = BoundingBox::new(-8.7, 41.0, -8.5, 41.2);
//! assert!(area.intersects(&sample.bbox()));
//! ```

pub mod bbox;
pub mod payload;
pub mod point;

pub use bbox::BoundingBox;
pub use payload::LeafPayload;
pub use point::TrajectoryPoint;
