//! Validation for fanout bounds and input geometry.

use crate::error::{LsmError, Result};
use spatio_types::BoundingBox;

/// Validates R-tree fanout bounds.
///
/// The split rule needs `1 <= m <= M / 2` so that every overflowing node can
/// be partitioned into halves that each hold at least `m` records.
///
/// # Examples
///
/// ```
/// use spatio_lsm::compute::validation::validate_fanout;
///
/// assert!(validate_fanout(2, 4).is_ok());
/// assert!(validate_fanout(3, 4).is_err());
/// assert!(validate_fanout(0, 4).is_err());
/// ```
pub fn validate_fanout(min_records: usize, max_records: usize) -> Result<()> {
    if max_records < 2 {
        return Err(LsmError::InvalidConfig(format!(
            "Maximum records per node must be at least 2, got: {}",
            max_records
        )));
    }

    if min_records < 1 {
        return Err(LsmError::InvalidConfig(
            "Minimum records per node must be at least 1".to_string(),
        ));
    }

    if min_records > max_records / 2 {
        return Err(LsmError::InvalidConfig(format!(
            "Fanout bounds must satisfy m <= M/2, got m={} M={}",
            min_records, max_records
        )));
    }

    Ok(())
}

/// Validates that a box has finite coordinates.
///
/// # Examples
///
/// ```
/// use spatio_lsm::compute::validation::validate_bbox;
/// use spatio_types::BoundingBox;
///
/// assert!(validate_bbox(&BoundingBox::new(0.0, 0.0, 1.0, 1.0)).is_ok());
/// assert!(validate_bbox(&BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0)).is_err());
/// ```
pub fn validate_bbox(bbox: &BoundingBox) -> Result<()> {
    if bbox.is_degenerate() {
        return Err(LsmError::InvalidInput(format!(
            "Bounding box coordinates must be finite, got: ({}, {}) - ({}, {})",
            bbox.min_x(),
            bbox.min_y(),
            bbox.max_x(),
            bbox.max_y()
        )));
    }

    Ok(())
}
