//! relief-pipeline: Pure elevation map rendering pipeline (sans-IO).
//!
//! Turns LIDAR ground points into a single RGBA map through:
//! ground filtering -> nearest-sample gridding -> hillshade ->
//! isocontours -> coloring -> compositing.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and point arrays and returns structured data. File
//! discovery, logging and writing the PNG live in the `relief` binary.

pub mod blur;
pub mod colorize;
pub mod colormap;
pub mod composite;
pub mod contour;
pub mod diagnostics;
pub mod grid;
pub mod hillshade;
pub mod isolines;
pub mod normalize;
pub mod pipeline;
pub mod points;
pub mod types;

pub use colormap::Colormap;
pub use composite::{PasteMode, encode_png};
pub use contour::{ContourTracer, ContourTracerKind};
pub use diagnostics::{Clock, PipelineDiagnostics, process_staged_with_diagnostics};
pub use hillshade::{HillshadeParams, SlopeMagnitude};
pub use isolines::{BorderRule, ContourConfig};
pub use normalize::Normalization;
pub use pipeline::Pipeline;
pub use points::GroundPoints;
pub use types::{
    ContourPath, Dimensions, ElevationRaster, LevelBounds, MapConfig, MapResult, PipelineError,
    Point, PointCounts, Polyline, RgbaImage, ShadeRaster, StagedResult,
};

/// Render a map from LAS/LAZ bytes.
///
/// # Pipeline steps
///
/// 1. Decode the point cloud and keep ground points
/// 2. Nearest-sample gridding onto a north-up raster
/// 3. Hillshade (when `config.shading`)
/// 4. Isocontour overlay (when `config.isocontours`)
/// 5. Colormap with optional shade blending
/// 6. Stencil-paste the overlay onto the colored raster
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `las_bytes` is empty,
/// [`PipelineError::InvalidInput`] if decoding fails,
/// [`PipelineError::EmptyDataset`] if no usable ground point remains and
/// [`PipelineError::InvalidParameter`] for an invalid config.
pub fn process(las_bytes: &[u8], config: &MapConfig) -> Result<MapResult, PipelineError> {
    process_staged(las_bytes, config).map(StagedResult::into_map)
}

/// Render a map from LAS/LAZ bytes, keeping every intermediate.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_staged(las_bytes: &[u8], config: &MapConfig) -> Result<StagedResult, PipelineError> {
    Pipeline::new(las_bytes.to_vec(), config.clone())
        .load()?
        .grid()?
        .shade()?
        .trace_contours()?
        .colorize()?
        .composite()
        .map(pipeline::Composited::into_result)
}

/// Render a map from ground points already in memory.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidParameter`] for an invalid config and
/// the gridding and coloring errors of [`process`].
pub fn render_points(points: GroundPoints, config: &MapConfig) -> Result<MapResult, PipelineError> {
    config.validate()?;
    let staged = Pipeline::from_points(points, config.clone())
        .grid()?
        .shade()?
        .trace_contours()?
        .colorize()?
        .composite()?
        .into_result();
    Ok(staged.into_map())
}
