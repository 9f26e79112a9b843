//! Shared types for the relief elevation pipeline.

use serde::{Deserialize, Serialize};

use crate::colormap::Colormap;
use crate::composite::PasteMode;
use crate::hillshade::HillshadeParams;
use crate::isolines::ContourConfig;
use crate::normalize::Normalization;

/// Re-export `RgbaImage` so downstream crates can reference the color,
/// contour and output rasters without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in raster coordinates with sub-pixel precision.
///
/// Produced by contour tracing, where crossings are interpolated along
/// cell edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Column position (fractional).
    pub x: f64,
    /// Row position (fractional).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The integer pixel containing this point (coordinates truncated
    /// toward zero).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_grid_index(self) -> GridIndex {
        GridIndex {
            row: self.y as u32,
            col: self.x as u32,
        }
    }
}

/// A sequence of connected points forming one traced isoline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Whether the path ends where it starts.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.len() > 2 && self.first() == self.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Integer pixel coordinate in a raster (row-major, row 0 at the top).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    /// Row (vertical position from the top).
    pub row: u32,
    /// Column (horizontal position from the left).
    pub col: u32,
}

impl GridIndex {
    /// Create a new grid index.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// One traced isoline at a given level, in integer pixel coordinates.
///
/// May be open (ends on the raster border or a no-data hole) or closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourPath {
    /// Elevation threshold this path was traced at.
    pub level: f64,
    /// Ordered pixel coordinates along the path.
    pub points: Vec<GridIndex>,
}

/// Raster dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels (number of columns).
    pub width: u32,
    /// Height in pixels (number of rows).
    pub height: u32,
}

impl Dimensions {
    /// Total number of pixels.
    #[must_use]
    pub const fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A row-major 2D raster of `f64` samples.
///
/// `NaN` marks no-data cells. Used for both elevations and hillshade
/// intensities; see [`ElevationRaster`] and [`ShadeRaster`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarRaster {
    dimensions: Dimensions,
    data: Vec<f64>,
}

/// Elevation samples on the regular output grid, north-up.
pub type ElevationRaster = ScalarRaster;

/// Hillshade illumination intensities in `[0, 255]`.
pub type ShadeRaster = ScalarRaster;

impl ScalarRaster {
    /// Wrap row-major samples.
    ///
    /// Returns `None` if `data.len()` does not match the dimensions.
    #[must_use]
    pub fn from_vec(dimensions: Dimensions, data: Vec<f64>) -> Option<Self> {
        (data.len() == dimensions.pixel_count()).then_some(Self { dimensions, data })
    }

    /// Build a raster by evaluating `f(row, col)` at every cell.
    pub fn from_fn(dimensions: Dimensions, mut f: impl FnMut(u32, u32) -> f64) -> Self {
        let mut data = Vec::with_capacity(dimensions.pixel_count());
        for row in 0..dimensions.height {
            for col in 0..dimensions.width {
                data.push(f(row, col));
            }
        }
        Self { dimensions, data }
    }

    /// Raster dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.dimensions.height
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.dimensions.width
    }

    /// Sample at (`row`, `col`). Panics on out-of-bounds access like
    /// slice indexing does.
    #[must_use]
    pub fn get(&self, row: u32, col: u32) -> f64 {
        self.data[row as usize * self.dimensions.width as usize + col as usize]
    }

    /// All samples in row-major order.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Consume the raster and return its row-major samples.
    #[must_use]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Minimum and maximum over finite samples, ignoring `NaN`/`Inf`.
    ///
    /// Returns `None` if the raster has no finite sample.
    #[must_use]
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Bounds of the color normalization domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LevelBounds {
    /// Explicit elevation bounds.
    Fixed {
        /// Elevation mapped to the low end of the colormap.
        min_level: f64,
        /// Elevation mapped to the high end of the colormap.
        max_level: f64,
    },
    /// Use the finite minimum and maximum of the elevation raster.
    Auto,
}

impl Default for LevelBounds {
    fn default() -> Self {
        Self::Fixed {
            min_level: MapConfig::DEFAULT_MIN_LEVEL,
            max_level: MapConfig::DEFAULT_MAX_LEVEL,
        }
    }
}

/// Configuration for the full map rendering pipeline.
///
/// Every tunable numeric constant of every stage lives here (or in the
/// nested stage configs) so a run is fully described by one value.
/// [`MapConfig::validate`] checks the whole tree up-front; each stage
/// also re-checks the parameters it consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Grid spacing, in the point cloud's horizontal units.
    pub resolution: f64,

    /// Elevation range spread across the colormap.
    pub levels: LevelBounds,

    /// Which colormap to render elevations with.
    pub colormap: Colormap,

    /// How elevations are mapped into `[0, 1]` before the colormap.
    pub normalization: Normalization,

    /// Whether to blend a hillshade into the colored raster.
    pub shading: bool,

    /// Light source and slope model for the hillshade.
    pub hillshade: HillshadeParams,

    /// Hillshade blend factor: 0 = pure color, 1 = pure shade.
    pub shade_blend: f64,

    /// Whether to draw the isocontour overlay.
    pub isocontours: bool,

    /// Smoothing, level generation, tracing and stamping parameters.
    pub contours: ContourConfig,

    /// How the contour overlay is pasted onto the colored raster.
    pub paste_mode: PasteMode,
}

impl MapConfig {
    /// Default grid resolution.
    pub const DEFAULT_RESOLUTION: f64 = 1.0;

    /// Default lower color bound (just below sea level).
    pub const DEFAULT_MIN_LEVEL: f64 = -40.0;

    /// Default upper color bound.
    pub const DEFAULT_MAX_LEVEL: f64 = 4000.0;

    /// Default hillshade blend factor.
    pub const DEFAULT_SHADE_BLEND: f64 = 0.2;

    /// Check every parameter of the configuration tree.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "resolution must be a positive number, got {}",
                self.resolution
            )));
        }
        if let LevelBounds::Fixed {
            min_level,
            max_level,
        } = self.levels
        {
            self.normalization.validate(min_level, max_level)?;
        }
        if !(0.0..=1.0).contains(&self.shade_blend) {
            return Err(PipelineError::InvalidParameter(format!(
                "shade blend must lie in [0, 1], got {}",
                self.shade_blend
            )));
        }
        self.hillshade.validate()?;
        self.contours.validate()?;
        Ok(())
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            resolution: Self::DEFAULT_RESOLUTION,
            levels: LevelBounds::default(),
            colormap: Colormap::default(),
            normalization: Normalization::default(),
            shading: true,
            hillshade: HillshadeParams::default(),
            shade_blend: Self::DEFAULT_SHADE_BLEND,
            isocontours: true,
            contours: ContourConfig::default(),
            paste_mode: PasteMode::default(),
        }
    }
}

/// Result of running the full pipeline: the composited map only.
#[derive(Debug, Clone)]
pub struct MapResult {
    /// Final RGBA map (color + optional shade + optional contours).
    pub image: RgbaImage,

    /// Dimensions of the elevation grid (and thus of `image`).
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with every intermediate preserved.
///
/// Each field captures the output of one stage so callers can inspect
/// or export intermediates (e.g. the contour overlay on its own).
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 1: number of points read and kept by the loader.
    pub point_counts: PointCounts,
    /// Stage 2: interpolated north-up elevation raster.
    pub elevation: ElevationRaster,
    /// Stage 3: hillshade (`Some` only when shading is enabled).
    pub shade: Option<ShadeRaster>,
    /// Stage 4: surviving contour paths (`Some` only when isocontours are enabled).
    pub contour_paths: Option<Vec<ContourPath>>,
    /// Stage 4: transparent overlay with the stamped contour paths.
    pub contour_overlay: Option<RgbaImage>,
    /// Stage 5: colored (and possibly shaded) elevation raster.
    pub colored: RgbaImage,
    /// Stage 6: final composited map.
    pub output: RgbaImage,
    /// Grid dimensions in pixels.
    pub dimensions: Dimensions,
}

impl StagedResult {
    /// Drop the intermediates, keeping only the final map.
    #[must_use]
    pub fn into_map(self) -> MapResult {
        MapResult {
            image: self.output,
            dimensions: self.dimensions,
        }
    }
}

/// Points seen by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCounts {
    /// Points decoded from the source.
    pub read: u64,
    /// Ground-classified points kept.
    pub kept: u64,
}

/// Errors that can occur during map rendering.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The point cloud could not be decoded.
    #[error("failed to read point cloud: {0}")]
    InvalidInput(#[from] las::Error),

    /// The point cloud bytes were empty.
    #[error("point cloud data is empty")]
    EmptyInput,

    /// No usable ground points, or their extent is degenerate.
    #[error("no usable ground points: {0}")]
    EmptyDataset(String),

    /// A parameter is out of range or unknown.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A numeric degeneracy (`NaN`/`Inf`) would reach the output.
    #[error("numeric failure: {0}")]
    ComputationFailure(String),

    /// Encoding the output image failed.
    #[error("failed to encode image: {0}")]
    ImageEncode(#[from] image::ImageError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    // --- Point / Polyline ---

    #[test]
    fn grid_index_truncates_toward_zero() {
        let p = Point::new(3.99, 7.5);
        assert_eq!(p.to_grid_index(), GridIndex::new(7, 3));
    }

    #[test]
    fn polyline_closed_detection() {
        let open = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(!open.is_closed());

        let closed = Polyline::new(vec![
            Point::new(0.0, 0.5),
            Point::new(0.5, 0.0),
            Point::new(1.0, 0.5),
            Point::new(0.0, 0.5),
        ]);
        assert!(closed.is_closed());
    }

    #[test]
    fn polyline_empty() {
        let pl = Polyline::new(vec![]);
        assert!(pl.is_empty());
        assert_eq!(pl.len(), 0);
        assert!(pl.first().is_none());
        assert!(pl.last().is_none());
    }

    // --- ScalarRaster ---

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(ScalarRaster::from_vec(dims(2, 2), vec![0.0; 3]).is_none());
        assert!(ScalarRaster::from_vec(dims(2, 2), vec![0.0; 4]).is_some());
    }

    #[test]
    fn from_fn_is_row_major() {
        let r = ScalarRaster::from_fn(dims(3, 2), |row, col| f64::from(row * 10 + col));
        assert_eq!(r.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert!((r.get(1, 2) - 12.0).abs() < f64::EPSILON);
        assert_eq!(r.rows(), 2);
        assert_eq!(r.cols(), 3);
    }

    #[test]
    fn finite_range_skips_nan() {
        let r = ScalarRaster::from_vec(dims(4, 1), vec![f64::NAN, 3.0, -1.0, f64::INFINITY])
            .unwrap();
        assert_eq!(r.finite_range(), Some((-1.0, 3.0)));
    }

    #[test]
    fn finite_range_all_nan_is_none() {
        let r = ScalarRaster::from_vec(dims(2, 1), vec![f64::NAN, f64::NAN]).unwrap();
        assert_eq!(r.finite_range(), None);
    }

    // --- MapConfig ---

    #[test]
    fn map_config_defaults() {
        let config = MapConfig::default();
        assert!((config.resolution - 1.0).abs() < f64::EPSILON);
        assert_eq!(
            config.levels,
            LevelBounds::Fixed {
                min_level: -40.0,
                max_level: 4000.0
            }
        );
        assert_eq!(config.colormap, Colormap::GistEarth);
        assert!(matches!(config.normalization, Normalization::SymLog { .. }));
        assert!(config.shading);
        assert!(config.isocontours);
        assert!((config.shade_blend - 0.2).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_non_positive_resolution() {
        for resolution in [0.0, -1.0, f64::NAN] {
            let config = MapConfig {
                resolution,
                ..MapConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(PipelineError::InvalidParameter(_))),
                "resolution {resolution} should be rejected",
            );
        }
    }

    #[test]
    fn validate_rejects_equal_levels() {
        let config = MapConfig {
            levels: LevelBounds::Fixed {
                min_level: 5.0,
                max_level: 5.0,
            },
            ..MapConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn validate_rejects_blend_out_of_range() {
        let config = MapConfig {
            shade_blend: 1.5,
            ..MapConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn map_config_serde_round_trip() {
        let config = MapConfig {
            resolution: 0.5,
            levels: LevelBounds::Auto,
            colormap: Colormap::Terrain,
            normalization: Normalization::Linear,
            shading: false,
            isocontours: false,
            ..MapConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: MapConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn map_config_partial_json_uses_defaults() {
        let config: MapConfig = serde_json::from_str(r#"{"resolution": 2.5}"#).unwrap();
        assert!((config.resolution - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.colormap, Colormap::GistEarth);
    }

    // --- PipelineError ---

    #[test]
    fn error_display() {
        assert_eq!(
            PipelineError::EmptyInput.to_string(),
            "point cloud data is empty"
        );
        assert_eq!(
            PipelineError::InvalidParameter("unknown colormap 'x'".to_string()).to_string(),
            "invalid parameter: unknown colormap 'x'",
        );
        assert_eq!(
            PipelineError::EmptyDataset("zero ground points".to_string()).to_string(),
            "no usable ground points: zero ground points",
        );
    }
}
