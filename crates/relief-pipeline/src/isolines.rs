//! Isocontour overlay: smoothing, level generation, tracing, border
//! filtering and stamping.
//!
//! The elevation raster is first smoothed with a Gaussian kernel, then
//! traced at a family of levels between the smoothed minimum and one
//! tenth of the smoothed maximum:
//!
//! ```text
//! level[k] = 10^(k / (n - 1)) * (lo + (k / (n - 1)) * (hi / 10 - lo))
//! ```
//!
//! The log factor packs levels densely at low elevations and sparsely
//! near the top. Levels are sorted ascending before tracing.
//!
//! # Border filtering
//!
//! Contours tend to hug the raster frame where smoothing meets the edge.
//! For each traced path, points on the row boundary and points on the
//! column boundary are counted. When both counts are non-zero, the points
//! on the axis with more boundary points (the row axis on ties) are
//! dropped. Paths that touch at most one axis are left alone. The
//! boundary rows/columns are selected by [`BorderRule`].
//!
//! Surviving points are stamped as single black pixels into an otherwise
//! transparent overlay.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::blur::gaussian_blur;
use crate::contour::{ContourTracer, ContourTracerKind};
use crate::types::{ContourPath, Dimensions, ElevationRaster, GridIndex, PipelineError};

/// Overlay background: transparent white.
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 0]);

/// Which grid lines count as the raster border when filtering paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BorderRule {
    /// Both the first and the last row (or column).
    #[default]
    Symmetric,
    /// Only the last row (or column). Reproduces maps rendered by earlier
    /// versions of this tool, which kept frame-hugging lines along the
    /// top and left edges.
    UpperOnly,
}

impl BorderRule {
    fn on_boundary(self, index: u32, len: u32) -> bool {
        let last = len.saturating_sub(1);
        match self {
            Self::Symmetric => index == 0 || index == last,
            Self::UpperOnly => index == last,
        }
    }
}

/// Parameters for the isocontour overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourConfig {
    /// Gaussian smoothing sigma applied before tracing. Non-positive
    /// values disable smoothing.
    pub sigma: f32,

    /// Number of contour levels.
    pub level_count: usize,

    /// Alpha of stamped contour pixels.
    pub alpha: u8,

    /// Tracing algorithm and its saddle/winding conventions.
    pub tracer: ContourTracerKind,

    /// Border filtering rule.
    pub border_rule: BorderRule,
}

impl ContourConfig {
    /// Default smoothing sigma.
    pub const DEFAULT_SIGMA: f32 = 1.0;

    /// Default number of contour levels.
    pub const DEFAULT_LEVEL_COUNT: usize = 200;

    /// Default alpha of contour pixels (half transparent).
    pub const DEFAULT_ALPHA: u8 = 128;

    /// Check the contour parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] if `level_count` is
    /// zero or `sigma` is `NaN`/infinite.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.level_count == 0 {
            return Err(PipelineError::InvalidParameter(
                "contour level count must be at least 1".to_string(),
            ));
        }
        if !self.sigma.is_finite() {
            return Err(PipelineError::InvalidParameter(format!(
                "contour smoothing sigma must be finite, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            sigma: Self::DEFAULT_SIGMA,
            level_count: Self::DEFAULT_LEVEL_COUNT,
            alpha: Self::DEFAULT_ALPHA,
            tracer: ContourTracerKind::default(),
            border_rule: BorderRule::default(),
        }
    }
}

/// Output of [`extract_isolines`].
#[derive(Debug, Clone)]
pub struct IsolineLayer {
    /// Levels traced, ascending.
    pub levels: Vec<f64>,
    /// Paths traced before border filtering.
    pub traced_count: usize,
    /// Non-empty paths after border filtering.
    pub paths: Vec<ContourPath>,
    /// Transparent overlay with the surviving paths stamped in.
    pub overlay: RgbaImage,
}

/// Generate `count` ascending contour levels for `raster`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `count` is zero and
/// [`PipelineError::ComputationFailure`] if the raster holds no finite
/// value.
#[allow(clippy::cast_precision_loss)]
pub fn contour_levels(raster: &ElevationRaster, count: usize) -> Result<Vec<f64>, PipelineError> {
    if count == 0 {
        return Err(PipelineError::InvalidParameter(
            "contour level count must be at least 1".to_string(),
        ));
    }
    let (lo, hi) = raster.finite_range().ok_or_else(|| {
        PipelineError::ComputationFailure(
            "cannot derive contour levels from a raster with no finite values".to_string(),
        )
    })?;
    if count == 1 {
        return Ok(vec![lo]);
    }

    let stop = hi / 10.0;
    let last = count - 1;
    let mut levels: Vec<f64> = (0..count)
        .map(|k| {
            let t = k as f64 / last as f64;
            let linear = if k == last { stop } else { t.mul_add(stop - lo, lo) };
            10f64.powf(t) * linear
        })
        .collect();
    levels.sort_by(f64::total_cmp);
    Ok(levels)
}

/// Drop frame-hugging points from `path`.
///
/// Leaves the path unchanged unless it has points on both the row and
/// column boundary.
#[must_use]
pub fn filter_border(path: ContourPath, dimensions: Dimensions, rule: BorderRule) -> ContourPath {
    let on_row_boundary = |p: &GridIndex| rule.on_boundary(p.row, dimensions.height);
    let on_col_boundary = |p: &GridIndex| rule.on_boundary(p.col, dimensions.width);

    let row_hits = path.points.iter().filter(|p| on_row_boundary(p)).count();
    let col_hits = path.points.iter().filter(|p| on_col_boundary(p)).count();
    if row_hits == 0 || col_hits == 0 {
        return path;
    }

    let drop_rows = row_hits >= col_hits;
    let points = path
        .points
        .into_iter()
        .filter(|p| {
            if drop_rows {
                !on_row_boundary(p)
            } else {
                !on_col_boundary(p)
            }
        })
        .collect();
    ContourPath {
        level: path.level,
        points,
    }
}

/// Stamp `paths` into a transparent overlay of the given size.
///
/// Points outside the overlay are ignored.
#[must_use]
pub fn stamp(paths: &[ContourPath], dimensions: Dimensions, alpha: u8) -> RgbaImage {
    let mut overlay = RgbaImage::from_pixel(dimensions.width, dimensions.height, BACKGROUND);
    let ink = Rgba([0, 0, 0, alpha]);
    for p in paths.iter().flat_map(|path| &path.points) {
        if p.col < dimensions.width && p.row < dimensions.height {
            overlay.put_pixel(p.col, p.row, ink);
        }
    }
    overlay
}

/// Build the isocontour overlay for an elevation raster.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] if `config` fails
/// [`ContourConfig::validate`] and [`PipelineError::ComputationFailure`]
/// if the smoothed raster has no finite values.
pub fn extract_isolines(
    elevation: &ElevationRaster,
    config: &ContourConfig,
) -> Result<IsolineLayer, PipelineError> {
    config.validate()?;
    let dimensions = elevation.dimensions();
    let smoothed = gaussian_blur(elevation, config.sigma);
    let levels = contour_levels(&smoothed, config.level_count)?;

    let mut traced_count = 0;
    let mut paths = Vec::new();
    for &level in &levels {
        for polyline in config.tracer.trace(&smoothed, level) {
            traced_count += 1;
            let path = ContourPath {
                level,
                points: polyline
                    .points()
                    .iter()
                    .map(|p| p.to_grid_index())
                    .collect(),
            };
            let path = filter_border(path, dimensions, config.border_rule);
            if !path.points.is_empty() {
                paths.push(path);
            }
        }
    }

    let overlay = stamp(&paths, dimensions, config.alpha);
    Ok(IsolineLayer {
        levels,
        traced_count,
        paths,
        overlay,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn path(points: &[(u32, u32)]) -> ContourPath {
        ContourPath {
            level: 1.0,
            points: points.iter().map(|&(row, col)| GridIndex::new(row, col)).collect(),
        }
    }

    /// Flat ground with a smooth round hill in the middle.
    fn hill(size: u32, radius: f64) -> ElevationRaster {
        let center = f64::from(size) / 2.0;
        ElevationRaster::from_fn(dims(size, size), |row, col| {
            let d = (f64::from(row) - center).hypot(f64::from(col) - center);
            if d < radius { 10.0 * (1.0 - d / radius) } else { 0.0 }
        })
    }

    /// A bowl: high frame, low floor.
    fn basin(size: u32) -> ElevationRaster {
        ElevationRaster::from_fn(dims(size, size), |row, col| {
            let edge = row == 0 || col == 0 || row == size - 1 || col == size - 1;
            if edge { 10.0 } else { 0.0 }
        })
    }

    #[test]
    fn default_config_matches_documented_values() {
        let c = ContourConfig::default();
        assert!((c.sigma - 1.0).abs() < f32::EPSILON);
        assert_eq!(c.level_count, 200);
        assert_eq!(c.alpha, 128);
        assert_eq!(c.border_rule, BorderRule::Symmetric);
    }

    #[test]
    fn levels_have_requested_count_and_ascend() {
        let r = hill(20, 6.0);
        let levels = contour_levels(&r, 200).unwrap();
        assert_eq!(levels.len(), 200);
        assert!(levels.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn levels_span_min_to_max() {
        let r = ElevationRaster::from_fn(dims(3, 1), |_, c| [5.0, 50.0, 500.0][c as usize]);
        let levels = contour_levels(&r, 11).unwrap();
        // First level is lo * 10^0, last is (hi / 10) * 10^1.
        assert!((levels[0] - 5.0).abs() < 1e-9);
        assert!((levels[10] - 500.0).abs() < 1e-9);
    }

    #[test]
    fn levels_sorted_even_when_ramp_descends() {
        // hi / 10 < lo makes the linear ramp decrease.
        let r = ElevationRaster::from_fn(dims(2, 1), |_, c| if c == 0 { 90.0 } else { 100.0 });
        let levels = contour_levels(&r, 50).unwrap();
        assert!(levels.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn single_level_is_minimum() {
        let r = ElevationRaster::from_fn(dims(2, 2), |row, _| f64::from(row) + 3.0);
        assert_eq!(contour_levels(&r, 1).unwrap(), vec![3.0]);
    }

    #[test]
    fn zero_levels_rejected() {
        let r = hill(10, 3.0);
        assert!(matches!(
            contour_levels(&r, 0),
            Err(PipelineError::InvalidParameter(_))
        ));
        let config = ContourConfig {
            level_count: 0,
            ..ContourConfig::default()
        };
        assert!(matches!(
            extract_isolines(&r, &config),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn all_nan_raster_fails() {
        let r = ElevationRaster::from_fn(dims(4, 4), |_, _| f64::NAN);
        assert!(matches!(
            contour_levels(&r, 10),
            Err(PipelineError::ComputationFailure(_))
        ));
    }

    #[test]
    fn symmetric_rule_drops_dominant_axis() {
        // Three points on row 0 and one on col 0 (besides the corner).
        let p = path(&[(0, 3), (0, 4), (0, 5), (2, 0), (3, 3)]);
        let filtered = filter_border(p, dims(10, 10), BorderRule::Symmetric);
        assert_eq!(filtered.points, path(&[(2, 0), (3, 3)]).points);
    }

    #[test]
    fn ties_drop_row_boundary() {
        let p = path(&[(9, 4), (5, 9), (4, 4)]);
        let filtered = filter_border(p, dims(10, 10), BorderRule::Symmetric);
        assert_eq!(filtered.points, path(&[(5, 9), (4, 4)]).points);
    }

    #[test]
    fn single_axis_paths_are_kept() {
        let p = path(&[(0, 1), (0, 2), (0, 3)]);
        let filtered = filter_border(p.clone(), dims(10, 10), BorderRule::Symmetric);
        assert_eq!(filtered, p);
    }

    #[test]
    fn upper_only_ignores_first_row_and_column() {
        let p = path(&[(0, 3), (0, 4), (0, 5), (2, 0), (3, 3)]);
        let filtered = filter_border(p.clone(), dims(10, 10), BorderRule::UpperOnly);
        assert_eq!(filtered, p);

        // The last row and column still count.
        let p = path(&[(9, 3), (9, 4), (2, 9), (3, 3)]);
        let filtered = filter_border(p, dims(10, 10), BorderRule::UpperOnly);
        assert_eq!(filtered.points, path(&[(2, 9), (3, 3)]).points);
    }

    #[test]
    fn frame_hugging_ring_is_trimmed_by_symmetric_rule() {
        // Tracing the basin at mid height gives a ring half a pixel inside
        // the frame, which lands on row 0 and col 0 once truncated.
        let r = basin(10);
        let ring = ContourTracerKind::default().trace(&r, 5.0);
        assert_eq!(ring.len(), 1);
        let ring = ContourPath {
            level: 5.0,
            points: ring[0].points().iter().map(|p| p.to_grid_index()).collect(),
        };
        let before = ring.points.len();

        let symmetric = filter_border(ring.clone(), r.dimensions(), BorderRule::Symmetric);
        assert!(
            symmetric.points.iter().all(|p| p.row != 0)
                || symmetric.points.iter().all(|p| p.col != 0)
        );
        assert!(symmetric.points.len() + 8 <= before);

        // Nothing reaches row 9 or col 9, so the historical rule keeps it all.
        let upper = filter_border(ring, r.dimensions(), BorderRule::UpperOnly);
        assert_eq!(upper.points.len(), before);
    }

    #[test]
    fn hill_contours_stay_off_the_frame() {
        let r = hill(40, 8.0);
        let layer = extract_isolines(&r, &ContourConfig::default()).unwrap();
        assert_eq!(layer.levels.len(), ContourConfig::DEFAULT_LEVEL_COUNT);
        assert!(!layer.paths.is_empty());

        let mut stamped = 0;
        for (x, y, px) in layer.overlay.enumerate_pixels() {
            if px.0[3] == 0 {
                assert_eq!(px.0, [255, 255, 255, 0]);
                continue;
            }
            stamped += 1;
            assert_eq!(px.0, [0, 0, 0, 128]);
            assert!(x > 0 && y > 0 && x < 39 && y < 39, "frame pixel ({x}, {y})");
            let d = (f64::from(x) - 20.0).hypot(f64::from(y) - 20.0);
            assert!(d < 14.0, "pixel ({x}, {y}) far from the hill");
        }
        assert!(stamped > 0);
    }

    #[test]
    fn overlay_matches_raster_shape() {
        let r = ElevationRaster::from_fn(dims(13, 7), |row, col| f64::from(row + col));
        let layer = extract_isolines(&r, &ContourConfig::default()).unwrap();
        assert_eq!(layer.overlay.dimensions(), (13, 7));
    }

    #[test]
    fn zero_alpha_stamps_invisible_pixels() {
        let config = ContourConfig {
            alpha: 0,
            ..ContourConfig::default()
        };
        let layer = extract_isolines(&hill(30, 6.0), &config).unwrap();
        assert!(layer.overlay.pixels().all(|px| px.0[3] == 0));
    }

    #[test]
    fn flat_raster_has_no_contours() {
        let r = ElevationRaster::from_fn(dims(8, 8), |_, _| 42.0);
        let config = ContourConfig {
            sigma: 0.0,
            ..ContourConfig::default()
        };
        let layer = extract_isolines(&r, &config).unwrap();
        assert_eq!(layer.traced_count, 0);
        assert!(layer.paths.is_empty());
    }

    #[test]
    fn extraction_is_pure() {
        let r = hill(24, 7.0);
        let a = extract_isolines(&r, &ContourConfig::default()).unwrap();
        let b = extract_isolines(&r, &ContourConfig::default()).unwrap();
        assert_eq!(a.paths, b.paths);
        assert_eq!(a.overlay, b.overlay);
    }
}
