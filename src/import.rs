//! Trajectory dataset import and coordinate export.
//!
//! Reads line-oriented trip datasets (such as the Porto taxi trips CSV) in
//! which the last field of every line is a quoted JSON list of `[x, y]`
//! pairs, and turns them into [`TrajectoryPoint`] payloads. Lines that do
//! not carry such a list, including header lines, are skipped.

use crate::error::Result;
use spatio_types::TrajectoryPoint;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One trip: its coordinates in recorded order.
pub type Polyline = Vec<(f64, f64)>;

/// Read up to `limit` lines of `path` (all lines when `None`) and parse
/// the polyline of each.
pub fn read_polylines<Q: AsRef<Path>>(path: Q, limit: Option<usize>) -> Result<Vec<Polyline>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut polylines = Vec::new();

    for (number, line) in reader
        .lines()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
    {
        let line = line?;
        match parse_polyline_line(&line) {
            Some(polyline) => polylines.push(polyline),
            None => log::debug!("Skipping line {} without a polyline", number + 1),
        }
    }

    log::debug!(
        "Read {} polylines from {}",
        polylines.len(),
        path.as_ref().display()
    );
    Ok(polylines)
}

/// Parse the polyline in the last field of one dataset line.
///
/// The last field starts after the final `,"` of the line. It must be a
/// nested list `[[x,y],...]`; anything else yields `None`.
///
/// ```
/// use spatio_lsm::import::parse_polyline_line;
///
/// let line = r#""1372636858620000589","C","[[-8.618643,41.141412],[-8.618499,41.141376]]""#;
/// let polyline = parse_polyline_line(line).unwrap();
/// assert_eq!(polyline.len(), 2);
/// assert_eq!(polyline[0], (-8.618643, 41.141412));
///
/// assert!(parse_polyline_line(r#""TRIP_ID","POLYLINE""#).is_none());
/// ```
pub fn parse_polyline_line(line: &str) -> Option<Polyline> {
    let field = match line.rfind(",\"") {
        Some(pos) => &line[pos + 1..],
        None => line,
    };
    let field = field.trim();
    let field = field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field);

    if !(field.starts_with("[[") && field.ends_with("]]")) {
        return None;
    }

    let pairs: Vec<Vec<f64>> = match serde_json::from_str(field) {
        Ok(pairs) => pairs,
        Err(e) => {
            log::warn!("Skipping malformed polyline: {}", e);
            return None;
        }
    };

    pairs
        .into_iter()
        .map(|pair| match pair.as_slice() {
            [x, y, ..] => Some((*x, *y)),
            _ => {
                log::warn!("Skipping polyline with a coordinate of {} values", pair.len());
                None
            }
        })
        .collect()
}

/// Turn polylines into point payloads, numbering trips in input order.
pub fn to_payloads(polylines: &[Polyline]) -> Vec<TrajectoryPoint> {
    polylines
        .iter()
        .enumerate()
        .flat_map(|(trip, polyline)| {
            polyline
                .iter()
                .enumerate()
                .map(move |(seq, &(x, y))| TrajectoryPoint::new(trip as u64, seq as u32, x, y))
        })
        .collect()
}

/// Read `path` and convert it straight into payloads.
pub fn load_trajectory_points<Q: AsRef<Path>>(
    path: Q,
    limit: Option<usize>,
) -> Result<Vec<TrajectoryPoint>> {
    let polylines = read_polylines(path, limit)?;
    Ok(to_payloads(&polylines))
}

/// Write every coordinate as an `x,y` line. Returns the number written.
pub fn export_coordinates<Q: AsRef<Path>>(polylines: &[Polyline], path: Q) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    let mut written = 0;

    for (x, y) in polylines.iter().flatten() {
        writeln!(writer, "{},{}", x, y)?;
        written += 1;
    }
    writer.flush()?;

    log::info!(
        "Exported {} coordinates to {}",
        written,
        path.as_ref().display()
    );
    Ok(written)
}
