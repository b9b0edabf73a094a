use crate::bbox::BoundingBox;
use crate::payload::LeafPayload;
use geo::Point;
use serde::{Deserialize, Serialize};

/// One GPS sample of a trajectory.
///
/// Trajectory datasets (taxi trips, vessel tracks) arrive as polylines; each
/// vertex becomes an independent leaf payload tagged with the trip it came
/// from and its position within that trip.
///
/// # Examples
///
/// ```
/// use spatio_types::point::TrajectoryPoint;
/// use spatio_types::payload::LeafPayload;
///
/// let sample = TrajectoryPoint::new(12, 3, -8.61, 41.14);
/// assert_eq!(sample.trip(), 12);
/// assert_eq!(sample.bbox().area(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Index of the trajectory this sample belongs to
    pub trip: u64,
    /// Position of the sample within its trajectory
    pub seq: u32,
    /// The 2D location (longitude/latitude or x/y)
    pub point: Point<f64>,
}

impl TrajectoryPoint {
    pub fn new(trip: u64, seq: u32, x: f64, y: f64) -> Self {
        Self {
            trip,
            seq,
            point: Point::new(x, y),
        }
    }

    /// Get the trajectory index.
    pub fn trip(&self) -> u64 {
        self.trip
    }

    /// Get the sequence number within the trajectory.
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Get the x coordinate (longitude).
    pub fn x(&self) -> f64 {
        self.point.x()
    }

    /// Get the y coordinate (latitude).
    pub fn y(&self) -> f64 {
        self.point.y()
    }
}

impl LeafPayload for TrajectoryPoint {
    fn bbox(&self) -> BoundingBox {
        BoundingBox::from_point(self.point)
    }
}
