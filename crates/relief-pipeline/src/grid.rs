//! Scattered-to-grid resampling of ground points.
//!
//! Builds a regular mesh over the points' bounding box and assigns each
//! node the elevation of its nearest sample (a Voronoi assignment). The
//! nearest lookup goes through an [`rstar::RTree`] bulk-loaded with the
//! samples, so gridding costs `O((n + m) log n)` rather than `O(n * m)`.
//!
//! # Mesh layout
//!
//! Node coordinates along each axis follow a half-open range:
//! `min, min + res, min + 2 * res, ...` for `ceil((max - min) / res)`
//! nodes, so the maximum coordinate is only included when it falls on a
//! step. The mesh is indexed `[ix][iy]` and then rotated 90°
//! counter-clockwise for display, so row 0 holds the northernmost nodes
//! (largest y) and column 0 the westernmost (smallest x).

use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::points::{BoundingBox, GroundPoints};
use crate::types::{Dimensions, ElevationRaster, PipelineError};

/// A sample position tagged with its elevation.
type Sample = GeomWithData<[f64; 2], f64>;

/// Largest cell count whose `f64` buffer can be allocated.
const MAX_CELLS: usize = isize::MAX.unsigned_abs() / size_of::<f64>();

/// Number of mesh nodes along one axis for a half-open range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn axis_len(span: f64, resolution: f64) -> usize {
    (span / resolution).ceil() as usize
}

/// Grid dimensions for a bounding box at the given resolution.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `resolution` is not a
/// positive finite number, [`PipelineError::EmptyDataset`] if the box is
/// flat along either axis, and [`PipelineError::ComputationFailure`] if
/// the grid would not fit in `u32` dimensions or its cell count exceeds
/// what a raster buffer can address.
pub fn grid_dimensions(bbox: &BoundingBox, resolution: f64) -> Result<Dimensions, PipelineError> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(PipelineError::InvalidParameter(format!(
            "resolution must be a positive number, got {resolution}"
        )));
    }
    if bbox.width() <= 0.0 || bbox.height() <= 0.0 {
        return Err(PipelineError::EmptyDataset(format!(
            "ground points span a degenerate extent ({} x {})",
            bbox.width(),
            bbox.height()
        )));
    }
    let cols = axis_len(bbox.width(), resolution);
    let rows = axis_len(bbox.height(), resolution);
    let width = u32::try_from(cols).map_err(|_| too_large(cols, rows))?;
    let height = u32::try_from(rows).map_err(|_| too_large(cols, rows))?;
    match cols.checked_mul(rows) {
        Some(cells) if cells <= MAX_CELLS => Ok(Dimensions { width, height }),
        _ => Err(too_large(cols, rows)),
    }
}

fn too_large(cols: usize, rows: usize) -> PipelineError {
    PipelineError::ComputationFailure(format!("grid of {cols} x {rows} nodes is too large"))
}

/// Resample ground points onto a north-up elevation raster.
///
/// Every node takes the `z` of the nearest sample, so the raster never
/// leaves the sample value range and never extrapolates.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyDataset`] if there are no points or
/// their extent is degenerate, [`PipelineError::InvalidParameter`] for a
/// non-positive resolution, and [`PipelineError::ComputationFailure`] if
/// any sample coordinate is not finite.
pub fn interpolate_nearest(
    points: &GroundPoints,
    resolution: f64,
) -> Result<ElevationRaster, PipelineError> {
    let Some(bbox) = points.bounding_box() else {
        return Err(PipelineError::EmptyDataset(
            "zero ground-classified points".to_string(),
        ));
    };
    let non_finite = points
        .x()
        .iter()
        .chain(points.y())
        .chain(points.z())
        .any(|v| !v.is_finite());
    if non_finite {
        return Err(PipelineError::ComputationFailure(
            "ground points contain non-finite coordinates".to_string(),
        ));
    }

    let dimensions = grid_dimensions(&bbox, resolution)?;

    let samples: Vec<Sample> = points
        .x()
        .iter()
        .zip(points.y())
        .zip(points.z())
        .map(|((&x, &y), &z)| GeomWithData::new([x, y], z))
        .collect();
    let tree = RTree::bulk_load(samples);

    // Row r of the rotated raster is mesh column iy = height - 1 - r.
    let raster = ElevationRaster::from_fn(dimensions, |row, col| {
        let iy = dimensions.height - 1 - row;
        let x = f64::from(col).mul_add(resolution, bbox.min_x);
        let y = f64::from(iy).mul_add(resolution, bbox.min_y);
        tree.nearest_neighbor(&[x, y]).map_or(f64::NAN, |s| s.data)
    });
    Ok(raster)
}
