use geo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A 2D axis-aligned bounding box.
///
/// Represents a rectangular area defined by minimum and maximum coordinates.
/// This is a wrapper around `geo::Rect` carrying the cost functions used by
/// R-tree routing and splitting: area, margin, overlap and enlargement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// The underlying geometric rectangle
    pub rect: Rect,
}

impl BoundingBox {
    /// Create a new bounding box from minimum and maximum coordinates.
    ///
    /// Corners are normalised, so swapped arguments still describe the same
    /// rectangle.
    ///
    /// # Examples
    ///
    /// ```
    /// use spatio_types::bbox::BoundingBox;
    ///
    /// let bbox = BoundingBox::new(0.0, 0.0, 2.0, 3.0);
    /// assert_eq!(bbox.area(), 6.0);
    /// assert_eq!(bbox.margin(), 10.0);
    /// ```
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            rect: Rect::new(
                geo::coord! { x: min_x, y: min_y },
                geo::coord! { x: max_x, y: max_y },
            ),
        }
    }

    /// Create a degenerate (zero-area) box around a single point.
    pub fn from_point(point: Point<f64>) -> Self {
        Self::new(point.x(), point.y(), point.x(), point.y())
    }

    /// Create a bounding box from a `geo::Rect`.
    pub fn from_rect(rect: Rect) -> Self {
        Self { rect }
    }

    /// Get the minimum x coordinate.
    pub fn min_x(&self) -> f64 {
        self.rect.min().x
    }

    /// Get the minimum y coordinate.
    pub fn min_y(&self) -> f64 {
        self.rect.min().y
    }

    /// Get the maximum x coordinate.
    pub fn max_x(&self) -> f64 {
        self.rect.max().x
    }

    /// Get the maximum y coordinate.
    pub fn max_y(&self) -> f64 {
        self.rect.max().y
    }

    /// Low coordinate along `axis` (0 = x, 1 = y).
    pub fn low(&self, axis: usize) -> f64 {
        match axis {
            0 => self.min_x(),
            _ => self.min_y(),
        }
    }

    /// Get the width of the bounding box.
    pub fn width(&self) -> f64 {
        self.max_x() - self.min_x()
    }

    /// Get the height of the bounding box.
    pub fn height(&self) -> f64 {
        self.max_y() - self.min_y()
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Perimeter of the box, the R*-tree "margin".
    pub fn margin(&self) -> f64 {
        2.0 * (self.width() + self.height())
    }

    /// Check if this bounding box intersects with another.
    ///
    /// Boxes that only touch along an edge or corner intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.max_x() < other.min_x()
            || self.min_x() > other.max_x()
            || self.max_y() < other.min_y()
            || self.min_y() > other.max_y())
    }

    /// Area of the intersection of the two boxes, zero when they are disjoint.
    pub fn overlap(&self, other: &BoundingBox) -> f64 {
        let dx = self.max_x().min(other.max_x()) - self.min_x().max(other.min_x());
        let dy = self.max_y().min(other.max_y()) - self.min_y().max(other.min_y());
        if dx <= 0.0 || dy <= 0.0 {
            0.0
        } else {
            dx * dy
        }
    }

    /// Smallest box enclosing both boxes.
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self::new(
            self.min_x().min(other.min_x()),
            self.min_y().min(other.min_y()),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// Area growth needed for this box to also cover `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use spatio_types::bbox::BoundingBox;
    ///
    /// let unit = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    /// let right = BoundingBox::new(1.0, 0.0, 2.0, 1.0);
    /// assert_eq!(unit.enlargement(&right), 1.0);
    /// assert_eq!(unit.enlargement(&unit), 0.0);
    /// ```
    pub fn enlargement(&self, other: &BoundingBox) -> f64 {
        self.union(other).area() - self.area()
    }

    /// Union of every box in the iterator, `None` when it is empty.
    pub fn union_all<'a, I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, bbox| match acc {
                Some(acc) => Some(acc.union(bbox)),
                None => Some(*bbox),
            })
    }

    /// Check if this box fully contains another.
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min_x() <= other.min_x()
            && self.min_y() <= other.min_y()
            && self.max_x() >= other.max_x()
            && self.max_y() >= other.max_y()
    }

    pub fn is_finite(&self) -> bool {
        [self.min_x(), self.min_y(), self.max_x(), self.max_y()]
            .iter()
            .all(|v| v.is_finite())
    }

    /// A box is degenerate when a coordinate is NaN or infinite, or its
    /// corners are inverted.
    pub fn is_degenerate(&self) -> bool {
        !self.is_finite() || self.min_x() > self.max_x() || self.min_y() > self.max_y()
    }

    /// Get the center point of the bounding box.
    pub fn center(&self) -> Point<f64> {
        Point::new(
            (self.min_x() + self.max_x()) / 2.0,
            (self.min_y() + self.max_y()) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners_are_normalised() {
        let bbox = BoundingBox::new(3.0, 4.0, 1.0, 2.0);
        assert_eq!(bbox.min_x(), 1.0);
        assert_eq!(bbox.min_y(), 2.0);
        assert_eq!(bbox.max_x(), 3.0);
        assert_eq!(bbox.max_y(), 4.0);
    }

    #[test]
    fn test_overlap_and_intersection() {
        let a = BoundingBox::new(0.0, 0.0, 2.0, 2.0);
        let b = BoundingBox::new(1.0, 1.0, 3.0, 3.0);
        let touching = BoundingBox::new(2.0, 0.0, 4.0, 2.0);
        let far = BoundingBox::new(10.0, 10.0, 11.0, 11.0);

        assert_eq!(a.overlap(&b), 1.0);
        assert_eq!(a.overlap(&touching), 0.0);
        assert!(a.intersects(&touching));
        assert!(!a.intersects(&far));
        assert_eq!(a.overlap(&far), 0.0);
    }

    #[test]
    fn test_union_and_enlargement() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(2.0, 2.0, 3.0, 3.0);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(0.0, 0.0, 3.0, 3.0));
        assert_eq!(a.enlargement(&b), 8.0);
        assert!(u.contains(&a) && u.contains(&b));
    }

    #[test]
    fn test_union_all() {
        assert!(BoundingBox::union_all([].iter()).is_none());
        let boxes = [
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            BoundingBox::new(-1.0, 5.0, 0.0, 6.0),
        ];
        assert_eq!(
            BoundingBox::union_all(boxes.iter()),
            Some(BoundingBox::new(-1.0, 0.0, 1.0, 6.0))
        );
    }

    #[test]
    fn test_degenerate_detection() {
        assert!(!BoundingBox::new(0.0, 0.0, 0.0, 0.0).is_degenerate());
        assert!(BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).is_degenerate());
        assert!(BoundingBox::new(0.0, 0.0, f64::INFINITY, 1.0).is_degenerate());
    }
}
