//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process_staged`] which runs the entire pipeline in one
//! call, [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use relief_pipeline::{MapConfig, Pipeline, PipelineError};
//! # fn run(las: Vec<u8>) -> Result<(), PipelineError> {
//! let staged = Pipeline::new(las, MapConfig::default())
//!     .load()?
//!     .grid()?
//!     .shade()?
//!     .trace_contours()?
//!     .colorize()?
//!     .composite()?
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state,
//! carrying the intermediates later stages (or the caller) still need.
//! The hillshade and contour stages are no-ops when disabled in the
//! config, so the chain is the same for every configuration.
//!
//! # Memory
//!
//! Raw point arrays are dropped once the grid is built; only their
//! counts travel on. From [`Gridded`] onward every stage retains the
//! elevation raster, and each branch output (shade, contour overlay,
//! colored image) is kept until [`Composited::into_result`] hands them
//! all to [`StagedResult`].

use crate::colorize::{colorize_shaded, resolve_bounds};
use crate::composite::composite;
use crate::diagnostics::StageMetrics;
use crate::grid::interpolate_nearest;
use crate::hillshade::hillshade;
use crate::isolines::{IsolineLayer, extract_isolines};
use crate::points::GroundPoints;
use crate::types::{
    ContourPath, Dimensions, ElevationRaster, MapConfig, PipelineError, PointCounts, RgbaImage,
    ShadeRaster, StagedResult,
};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The point cloud bytes and config are stored but not yet touched.
/// Call [`load`](Self::load) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .load() to continue"]
pub struct Pending {
    config: MapConfig,
    source: Vec<u8>,
}

impl Pending {
    /// The raw point cloud bytes.
    #[must_use]
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Validate the config, decode the point cloud and keep its ground
    /// points.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] if the config is
    /// invalid, [`PipelineError::EmptyInput`] if the bytes are empty and
    /// [`PipelineError::InvalidInput`] if decoding fails.
    pub fn load(self) -> Result<Loaded, PipelineError> {
        self.config.validate()?;
        let points = GroundPoints::from_bytes(&self.source)?;
        Ok(Loaded {
            config: self.config,
            points,
            source_len: self.source.len(),
        })
    }
}

// ───────────────────────── Stage 1: Loaded ───────────────────────────

/// Pipeline state after decoding and ground filtering.
///
/// Call [`grid`](Self::grid) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .grid() to continue"]
pub struct Loaded {
    config: MapConfig,
    points: GroundPoints,
    source_len: usize,
}

impl Loaded {
    /// The ground-classified points.
    #[must_use]
    pub const fn points(&self) -> &GroundPoints {
        &self.points
    }

    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let counts = self.points.counts();
        StageMetrics::Load {
            input_bytes: self.source_len,
            points_read: counts.read,
            ground_points: counts.kept,
        }
    }

    /// Resample the ground points onto the elevation grid.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyDataset`] if no ground point survived
    /// or their extent is degenerate, and the errors of
    /// [`interpolate_nearest`].
    pub fn grid(self) -> Result<Gridded, PipelineError> {
        let elevation = interpolate_nearest(&self.points, self.config.resolution)?;
        Ok(Gridded {
            config: self.config,
            counts: self.points.counts(),
            elevation,
        })
    }
}

// ───────────────────────── Stage 2: Gridded ──────────────────────────

/// Pipeline state after nearest-sample gridding.
///
/// Call [`shade`](Self::shade) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .shade() to continue"]
pub struct Gridded {
    config: MapConfig,
    counts: PointCounts,
    elevation: ElevationRaster,
}

impl Gridded {
    /// The north-up elevation raster.
    #[must_use]
    pub const fn elevation(&self) -> &ElevationRaster {
        &self.elevation
    }

    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let dimensions = self.elevation.dimensions();
        let range = self.elevation.finite_range();
        StageMetrics::Grid {
            resolution: self.config.resolution,
            width: dimensions.width,
            height: dimensions.height,
            cell_count: u64::from(dimensions.width) * u64::from(dimensions.height),
            min_elevation: range.map(|(lo, _)| lo),
            max_elevation: range.map(|(_, hi)| hi),
        }
    }

    /// Compute the hillshade when shading is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] if the light source
    /// parameters are invalid.
    pub fn shade(self) -> Result<Shaded, PipelineError> {
        let shade = if self.config.shading {
            Some(hillshade(&self.elevation, &self.config.hillshade)?)
        } else {
            None
        };
        Ok(Shaded {
            config: self.config,
            counts: self.counts,
            elevation: self.elevation,
            shade,
        })
    }
}

// ───────────────────────── Stage 3: Shaded ───────────────────────────

/// Pipeline state after the (optional) hillshade branch.
///
/// Call [`trace_contours`](Self::trace_contours) to advance to the next
/// stage.
#[must_use = "pipeline stages are consumed by advancing; call .trace_contours() to continue"]
pub struct Shaded {
    config: MapConfig,
    counts: PointCounts,
    elevation: ElevationRaster,
    shade: Option<ShadeRaster>,
}

impl Shaded {
    /// The hillshade, or `None` if shading is disabled.
    #[must_use]
    pub const fn shade(&self) -> Option<&ShadeRaster> {
        self.shade.as_ref()
    }

    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn stage_metrics(&self) -> Option<StageMetrics> {
        let shade = self.shade.as_ref()?;
        let (sum, count) = shade
            .as_slice()
            .iter()
            .filter(|v| v.is_finite())
            .fold((0.0, 0_usize), |(sum, count), &v| (sum + v, count + 1));
        let params = &self.config.hillshade;
        Some(StageMetrics::Hillshade {
            azimuth: params.wrapped_azimuth(),
            altitude: params.altitude,
            slope_magnitude: format!("{:?}", params.slope_magnitude),
            mean_shade: if count == 0 { 0.0 } else { sum / count as f64 },
        })
    }

    /// Trace the isocontour overlay when isocontours are enabled.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`extract_isolines`].
    pub fn trace_contours(self) -> Result<ContoursTraced, PipelineError> {
        let isolines = if self.config.isocontours {
            Some(extract_isolines(&self.elevation, &self.config.contours)?)
        } else {
            None
        };
        Ok(ContoursTraced {
            config: self.config,
            counts: self.counts,
            elevation: self.elevation,
            shade: self.shade,
            isolines,
        })
    }
}

// ───────────────────────── Stage 4: ContoursTraced ───────────────────

/// Pipeline state after the (optional) isocontour branch.
///
/// Call [`colorize`](Self::colorize) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .colorize() to continue"]
pub struct ContoursTraced {
    config: MapConfig,
    counts: PointCounts,
    elevation: ElevationRaster,
    shade: Option<ShadeRaster>,
    isolines: Option<IsolineLayer>,
}

impl ContoursTraced {
    /// Surviving contour paths, or `None` if isocontours are disabled.
    #[must_use]
    pub fn contour_paths(&self) -> Option<&[ContourPath]> {
        self.isolines.as_ref().map(|layer| layer.paths.as_slice())
    }

    /// The stamped overlay, or `None` if isocontours are disabled.
    #[must_use]
    pub fn overlay(&self) -> Option<&RgbaImage> {
        self.isolines.as_ref().map(|layer| &layer.overlay)
    }

    pub(crate) fn stage_metrics(&self) -> Option<StageMetrics> {
        let layer = self.isolines.as_ref()?;
        Some(StageMetrics::ContourTracing {
            sigma: self.config.contours.sigma,
            level_count: layer.levels.len(),
            traced_count: layer.traced_count,
            kept_count: layer.paths.len(),
            total_point_count: layer.paths.iter().map(|p| p.points.len()).sum(),
            border_rule: format!("{:?}", self.config.contours.border_rule),
        })
    }

    /// Color the elevation raster and blend in the shade, if any.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`colorize_shaded`].
    pub fn colorize(self) -> Result<Colorized, PipelineError> {
        let bounds = resolve_bounds(self.config.levels, &self.elevation)?;
        let colored = colorize_shaded(
            &self.elevation,
            self.shade.as_ref(),
            self.config.colormap,
            self.config.normalization,
            self.config.levels,
            self.config.shade_blend,
        )?;
        Ok(Colorized {
            config: self.config,
            counts: self.counts,
            elevation: self.elevation,
            shade: self.shade,
            isolines: self.isolines,
            bounds,
            colored,
        })
    }
}

// ───────────────────────── Stage 5: Colorized ────────────────────────

/// Pipeline state after coloring.
///
/// Call [`composite`](Self::composite) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing; call .composite() to continue"]
pub struct Colorized {
    config: MapConfig,
    counts: PointCounts,
    elevation: ElevationRaster,
    shade: Option<ShadeRaster>,
    isolines: Option<IsolineLayer>,
    bounds: (f64, f64),
    colored: RgbaImage,
}

impl Colorized {
    /// The colored (and possibly shaded) raster.
    #[must_use]
    pub const fn colored(&self) -> &RgbaImage {
        &self.colored
    }

    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        StageMetrics::Colorize {
            colormap: self.config.colormap.name().to_string(),
            normalization: format!("{:?}", self.config.normalization),
            min_level: self.bounds.0,
            max_level: self.bounds.1,
            shaded: self.shade.is_some(),
        }
    }

    /// Paste the contour overlay onto the colored raster.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`composite`].
    pub fn composite(self) -> Result<Composited, PipelineError> {
        let overlay = self.isolines.as_ref().map(|layer| &layer.overlay);
        let output = composite(&self.colored, overlay, self.config.paste_mode)?;
        Ok(Composited {
            config: self.config,
            counts: self.counts,
            elevation: self.elevation,
            shade: self.shade,
            isolines: self.isolines,
            colored: self.colored,
            output,
        })
    }
}

// ───────────────────────── Stage 6: Composited ───────────────────────

/// Pipeline state after compositing: the final map is ready.
#[must_use = "call .into_result() to take the staged result"]
pub struct Composited {
    config: MapConfig,
    counts: PointCounts,
    elevation: ElevationRaster,
    shade: Option<ShadeRaster>,
    isolines: Option<IsolineLayer>,
    colored: RgbaImage,
    output: RgbaImage,
}

impl Composited {
    /// The final map.
    #[must_use]
    pub const fn output(&self) -> &RgbaImage {
        &self.output
    }

    /// Grid dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        self.elevation.dimensions()
    }

    pub(crate) fn stage_metrics(&self) -> StageMetrics {
        let overlay_pixel_count = self.isolines.as_ref().map_or(0, |layer| {
            layer
                .overlay
                .pixels()
                .map(|px| u64::from(px.0[3] != 0))
                .sum()
        });
        StageMetrics::Composite {
            paste_mode: format!("{:?}", self.config.paste_mode),
            width: self.output.width(),
            height: self.output.height(),
            overlay_pixel_count,
        }
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        let dimensions = self.elevation.dimensions();
        let (contour_paths, contour_overlay) = match self.isolines {
            Some(layer) => (Some(layer.paths), Some(layer.overlay)),
            None => (None, None),
        };
        StagedResult {
            point_counts: self.counts,
            elevation: self.elevation,
            shade: self.shade,
            contour_paths,
            contour_overlay,
            colored: self.colored,
            output: self.output,
            dimensions,
        }
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 7;

/// The output produced by a single pipeline stage.
///
/// Each variant borrows the data that the corresponding stage computed.
#[must_use]
pub enum StageOutput<'a> {
    /// Point cloud bytes (not yet decoded).
    Source {
        /// The raw bytes.
        bytes: &'a [u8],
    },
    /// Ground points.
    Loaded {
        /// The ground-classified points.
        points: &'a GroundPoints,
    },
    /// Elevation raster.
    Gridded {
        /// The north-up elevation raster.
        elevation: &'a ElevationRaster,
    },
    /// Hillshade branch.
    Shaded {
        /// The hillshade, or `None` if disabled.
        shade: Option<&'a ShadeRaster>,
    },
    /// Isocontour branch.
    ContoursTraced {
        /// Surviving contour paths, or `None` if disabled.
        paths: Option<&'a [ContourPath]>,
        /// Stamped overlay, or `None` if disabled.
        overlay: Option<&'a RgbaImage>,
    },
    /// Colored raster.
    Colorized {
        /// The colored (and possibly shaded) raster.
        colored: &'a RgbaImage,
    },
    /// Final map.
    Composited {
        /// The composited map.
        output: &'a RgbaImage,
        /// Grid dimensions.
        dimensions: Dimensions,
    },
}

/// Trait implemented by every pipeline stage, enabling uniform iteration.
///
/// Each stage struct implements it, and [`Stage`] delegates to whichever
/// variant it holds.
pub trait PipelineStage: Sized {
    /// Human-readable name of this stage (e.g. `"source"`, `"grid"`).
    const NAME: &str;

    /// Zero-based index of this stage (`0` for Pending through `6` for
    /// Composited).
    const INDEX: usize;

    /// The output this stage produced.
    fn output(&self) -> StageOutput<'_>;

    /// Stage-specific metrics for diagnostics.
    ///
    /// Returns `None` for [`Pending`], which has done no work, and for
    /// branch stages that are disabled in the config.
    fn metrics(&self) -> Option<StageMetrics>;

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(stage))` on success, `Ok(None)` if already at
    /// the final stage, or `Err` if the stage transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the transition fails.
    fn next(self) -> Result<Option<Stage>, PipelineError>;

    /// Run all remaining stages to completion and return the final
    /// [`StagedResult`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining stage fails.
    fn complete(self) -> Result<StagedResult, PipelineError>;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Source {
            bytes: &self.source,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Loaded(self.load()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.load()?.complete()
    }
}

impl PipelineStage for Loaded {
    const NAME: &str = "load";
    const INDEX: usize = 1;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Loaded {
            points: &self.points,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Gridded(self.grid()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.grid()?.complete()
    }
}

impl PipelineStage for Gridded {
    const NAME: &str = "grid";
    const INDEX: usize = 2;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Gridded {
            elevation: &self.elevation,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Shaded(self.shade()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.shade()?.complete()
    }
}

impl PipelineStage for Shaded {
    const NAME: &str = "hillshade";
    const INDEX: usize = 3;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Shaded {
            shade: self.shade.as_ref(),
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        self.stage_metrics()
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::ContoursTraced(self.trace_contours()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.trace_contours()?.complete()
    }
}

impl PipelineStage for ContoursTraced {
    const NAME: &str = "contours";
    const INDEX: usize = 4;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::ContoursTraced {
            paths: self.contour_paths(),
            overlay: self.overlay(),
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        self.stage_metrics()
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Colorized(self.colorize()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.colorize()?.complete()
    }
}

impl PipelineStage for Colorized {
    const NAME: &str = "colorize";
    const INDEX: usize = 5;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Colorized {
            colored: &self.colored,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Composited(self.composite()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        Ok(self.composite()?.into_result())
    }
}

impl PipelineStage for Composited {
    const NAME: &str = "composite";
    const INDEX: usize = 6;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Composited {
            output: &self.output,
            dimensions: self.dimensions(),
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(self.stage_metrics())
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(None)
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        Ok(self.into_result())
    }
}

/// Enum wrapping all pipeline stages for uniform, loopable access.
///
/// ```rust
/// # use relief_pipeline::{MapConfig, Pipeline, PipelineError};
/// # use relief_pipeline::pipeline::{Advance, Stage};
/// # fn run(las: Vec<u8>) -> Result<(), PipelineError> {
/// let mut stage: Stage = Pipeline::new(las, MapConfig::default()).into();
/// loop {
///     match stage.advance()? {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete()?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`Loaded`].
    Loaded(Loaded),
    /// See [`Gridded`].
    Gridded(Gridded),
    /// See [`Shaded`].
    Shaded(Shaded),
    /// See [`ContoursTraced`].
    ContoursTraced(ContoursTraced),
    /// See [`Colorized`].
    Colorized(Colorized),
    /// See [`Composited`].
    Composited(Composited),
}

/// Fails to build when a [`Stage`] variant is added without bumping
/// [`STAGE_COUNT`].
#[allow(dead_code, clippy::match_same_arms)]
const fn _stage_count_guard(s: &Stage) {
    match s {
        Stage::Pending(_)
        | Stage::Loaded(_)
        | Stage::Gridded(_)
        | Stage::Shaded(_)
        | Stage::ContoursTraced(_)
        | Stage::Colorized(_)
        | Stage::Composited(_) => {}
    }
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The pipeline advanced to this next stage.
    Next(Stage),
    /// The pipeline was already at the final stage.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::Loaded(s) => s.$method($($arg),*),
            Self::Gridded(s) => s.$method($($arg),*),
            Self::Shaded(s) => s.$method($($arg),*),
            Self::ContoursTraced(s) => s.$method($($arg),*),
            Self::Colorized(s) => s.$method($($arg),*),
            Self::Composited(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Human-readable name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// The output this stage produced.
    pub fn output(&self) -> StageOutput<'_> {
        // Composited has an inherent `output` accessor; name the trait.
        match self {
            Self::Pending(s) => PipelineStage::output(s),
            Self::Loaded(s) => PipelineStage::output(s),
            Self::Gridded(s) => PipelineStage::output(s),
            Self::Shaded(s) => PipelineStage::output(s),
            Self::ContoursTraced(s) => PipelineStage::output(s),
            Self::Colorized(s) => PipelineStage::output(s),
            Self::Composited(s) => PipelineStage::output(s),
        }
    }

    /// Stage-specific metrics for diagnostics.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        delegate!(self, metrics)
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Composited(_))
    }

    /// Advance to the next stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the transition fails.
    pub fn next(self) -> Result<Option<Self>, PipelineError> {
        delegate!(self, next)
    }

    /// Advance to the next stage, returning `self` unchanged if already
    /// complete.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the transition fails.
    pub fn advance(self) -> Result<Advance, PipelineError> {
        if self.is_complete() {
            return Ok(Advance::Complete(self));
        }
        match self.next()? {
            Some(next) => Ok(Advance::Next(next)),
            None => Err(PipelineError::ComputationFailure(
                "pipeline ended before the composite stage".to_string(),
            )),
        }
    }

    /// Run all remaining stages to completion.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining stage fails.
    pub fn complete(self) -> Result<StagedResult, PipelineError> {
        delegate!(self, complete)
    }
}

// Lets the delegate macro read the associated constants through `&self`.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

macro_rules! stage_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Stage {
                fn from(s: $variant) -> Self {
                    Self::$variant(s)
                }
            }
        )*
    };
}

stage_from!(
    Pending,
    Loaded,
    Gridded,
    Shaded,
    ContoursTraced,
    Colorized,
    Composited
);

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental map rendering pipeline.
///
/// Created via [`Pipeline::new`] from point cloud bytes, or via
/// [`Pipeline::from_points`] from already-loaded ground points. Each
/// stage method consumes the current state and returns the next, making
/// it a compile-time error to skip stages or call them out of order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from LAS/LAZ bytes and config.
    ///
    /// No processing is performed until [`Pending::load`] is called.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(las_bytes: Vec<u8>, config: MapConfig) -> Pending {
        Pending {
            config,
            source: las_bytes,
        }
    }

    /// Start a pipeline from ground points that are already in memory.
    ///
    /// The config is validated stage by stage as the pipeline advances.
    pub const fn from_points(points: GroundPoints, config: MapConfig) -> Loaded {
        Loaded {
            config,
            points,
            source_len: 0,
        }
    }
}
