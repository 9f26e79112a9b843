//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`process_staged_with_diagnostics`] runs the typed pipeline and
//! records how long each stage took alongside the counts that matter for
//! tuning (ground points kept, grid size, contour paths surviving the
//! border filter, and so on).
//!
//! The crate has no clock of its own: callers pass a [`Clock`], so the
//! same code runs natively, under test with a fake clock, or anywhere
//! else a monotonic timestamp is available.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::types::{MapConfig, PipelineError, StagedResult};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of monotonic timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// The current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
///
/// Branch stages that are disabled in the config have `None` entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: point cloud decoding and ground filtering.
    pub load: StageDiagnostics,
    /// Stage 2: nearest-sample gridding.
    pub grid: StageDiagnostics,
    /// Stage 3: hillshade (only when shading is enabled).
    pub hillshade: Option<StageDiagnostics>,
    /// Stage 4: isocontour overlay (only when isocontours are enabled).
    pub contours: Option<StageDiagnostics>,
    /// Stage 5: coloring and shade blending.
    pub colorize: StageDiagnostics,
    /// Stage 6: overlay compositing.
    pub composite: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Point cloud loading metrics.
    Load {
        /// Size of the input bytes (0 when started from points).
        input_bytes: usize,
        /// Points decoded.
        points_read: u64,
        /// Ground points kept.
        ground_points: u64,
    },
    /// Gridding metrics.
    Grid {
        /// Grid spacing.
        resolution: f64,
        /// Columns.
        width: u32,
        /// Rows.
        height: u32,
        /// `width * height`.
        cell_count: u64,
        /// Lowest finite elevation.
        min_elevation: Option<f64>,
        /// Highest finite elevation.
        max_elevation: Option<f64>,
    },
    /// Hillshade metrics.
    Hillshade {
        /// Light azimuth in degrees, wrapped into `[0, 360)`.
        azimuth: f64,
        /// Light altitude in degrees.
        altitude: f64,
        /// Slope magnitude model.
        slope_magnitude: String,
        /// Mean illumination over finite cells.
        mean_shade: f64,
    },
    /// Isocontour metrics.
    ContourTracing {
        /// Smoothing sigma.
        sigma: f32,
        /// Levels traced.
        level_count: usize,
        /// Paths traced before border filtering.
        traced_count: usize,
        /// Non-empty paths after border filtering.
        kept_count: usize,
        /// Pixel coordinates across kept paths.
        total_point_count: usize,
        /// Border filtering rule.
        border_rule: String,
    },
    /// Coloring metrics.
    Colorize {
        /// Colormap name.
        colormap: String,
        /// Normalization curve.
        normalization: String,
        /// Elevation at the low end of the colormap.
        min_level: f64,
        /// Elevation at the high end of the colormap.
        max_level: f64,
        /// Whether the hillshade was blended in.
        shaded: bool,
    },
    /// Compositing metrics.
    Composite {
        /// Paste mode.
        paste_mode: String,
        /// Output width in pixels.
        width: u32,
        /// Output height in pixels.
        height: u32,
        /// Overlay pixels with non-zero alpha.
        overlay_pixel_count: u64,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Points decoded.
    pub points_read: u64,
    /// Ground points kept.
    pub ground_points: u64,
    /// Contour paths drawn (0 when isocontours are disabled).
    pub contour_path_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Map: {}x{} from {} ground points ({} read)",
            self.summary.width,
            self.summary.height,
            self.summary.ground_points,
            self.summary.points_read,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let mut stages: Vec<(&str, &StageDiagnostics)> =
            vec![("Load", &self.load), ("Grid", &self.grid)];
        if let Some(ref h) = self.hillshade {
            stages.push(("Hillshade", h));
        }
        if let Some(ref c) = self.contours {
            stages.push(("Contours", c));
        }
        stages.push(("Colorize", &self.colorize));
        stages.push(("Composite", &self.composite));

        for (name, diag) in &stages {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Contour paths drawn: {}",
            self.summary.contour_path_count
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Load {
            input_bytes,
            points_read,
            ground_points,
        } => format!("{input_bytes} bytes -> {ground_points}/{points_read} ground"),
        StageMetrics::Grid {
            resolution,
            width,
            height,
            min_elevation,
            max_elevation,
            ..
        } => match (min_elevation, max_elevation) {
            (Some(lo), Some(hi)) => {
                format!("res={resolution} {width}x{height} z=[{lo:.2}, {hi:.2}]")
            }
            _ => format!("res={resolution} {width}x{height}"),
        },
        StageMetrics::Hillshade {
            azimuth,
            altitude,
            slope_magnitude,
            mean_shade,
        } => format!("az={azimuth:.1} alt={altitude:.1} {slope_magnitude} mean={mean_shade:.1}"),
        StageMetrics::ContourTracing {
            sigma,
            level_count,
            traced_count,
            kept_count,
            total_point_count,
            border_rule,
        } => format!(
            "sigma={sigma:.2} levels={level_count} paths={traced_count}->{kept_count} ({border_rule}) pts={total_point_count}",
        ),
        StageMetrics::Colorize {
            colormap,
            normalization,
            min_level,
            max_level,
            shaded,
        } => {
            let shade = if *shaded { " +shade" } else { "" };
            format!("{colormap} {normalization} [{min_level}, {max_level}]{shade}")
        }
        StageMetrics::Composite {
            paste_mode,
            width,
            height,
            overlay_pixel_count,
        } => format!("{paste_mode} {width}x{height} ink={overlay_pixel_count}"),
    }
}

/// Run the full pipeline, timing every stage with `clock`.
///
/// # Errors
///
/// Returns the first [`PipelineError`] raised by any stage.
pub fn process_staged_with_diagnostics<C: Clock>(
    las_bytes: &[u8],
    config: &MapConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let total_start = clock.now();

    let start = clock.now();
    let loaded = Pipeline::new(las_bytes.to_vec(), config.clone()).load()?;
    let load = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: loaded.stage_metrics(),
    };

    let start = clock.now();
    let gridded = loaded.grid()?;
    let grid = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: gridded.stage_metrics(),
    };

    let start = clock.now();
    let shaded = gridded.shade()?;
    let duration = clock.elapsed(&start);
    let hillshade = shaded
        .stage_metrics()
        .map(|metrics| StageDiagnostics { duration, metrics });

    let start = clock.now();
    let traced = shaded.trace_contours()?;
    let duration = clock.elapsed(&start);
    let contours = traced
        .stage_metrics()
        .map(|metrics| StageDiagnostics { duration, metrics });

    let start = clock.now();
    let colorized = traced.colorize()?;
    let colorize = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: colorized.stage_metrics(),
    };

    let start = clock.now();
    let composited = colorized.composite()?;
    let composite = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: composited.stage_metrics(),
    };

    let total_duration = clock.elapsed(&total_start);
    let staged = composited.into_result();

    let summary = PipelineSummary {
        width: staged.dimensions.width,
        height: staged.dimensions.height,
        points_read: staged.point_counts.read,
        ground_points: staged.point_counts.kept,
        contour_path_count: staged.contour_paths.as_ref().map_or(0, Vec::len),
    };

    Ok((
        staged,
        PipelineDiagnostics {
            load,
            grid,
            hillshade,
            contours,
            colorize,
            composite,
            total_duration,
            summary,
        },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;
    use std::io::Cursor;

    use las::point::Classification;

    use super::*;

    /// Fake clock advancing one millisecond per reading.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn las_bytes() -> Vec<u8> {
        let header = las::Builder::from((1, 2)).into_header().unwrap();
        let mut writer = las::Writer::new(Cursor::new(Vec::new()), header).unwrap();
        for i in 0..12 {
            for j in 0..10 {
                let (x, y) = (f64::from(i), f64::from(j));
                let point = las::Point {
                    x,
                    y,
                    z: x.mul_add(2.0, y),
                    classification: Classification::new(if (i + j) % 7 == 0 { 5 } else { 2 })
                        .unwrap(),
                    ..las::Point::default()
                };
                writer.write_point(point).unwrap();
            }
        }
        writer.into_inner().unwrap().into_inner()
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        assert!((duration_ms(d) - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_cover_every_enabled_stage() {
        let clock = TickClock(Cell::new(0));
        let (staged, diag) =
            process_staged_with_diagnostics(&las_bytes(), &MapConfig::default(), &clock).unwrap();

        assert!(diag.hillshade.is_some());
        assert!(diag.contours.is_some());
        assert_eq!(diag.summary.points_read, 120);
        assert_eq!(diag.summary.ground_points, staged.point_counts.kept);
        assert!(diag.summary.ground_points < 120);
        assert_eq!(diag.load.duration, Duration::from_millis(1));
        assert!(diag.total_duration > diag.grid.duration);
        assert!(matches!(
            diag.grid.metrics,
            StageMetrics::Grid {
                width: 11,
                height: 9,
                ..
            }
        ));
    }

    #[test]
    fn disabled_branches_have_no_diagnostics() {
        let config = MapConfig {
            shading: false,
            isocontours: false,
            ..MapConfig::default()
        };
        let clock = TickClock(Cell::new(0));
        let (_, diag) = process_staged_with_diagnostics(&las_bytes(), &config, &clock).unwrap();
        assert!(diag.hillshade.is_none());
        assert!(diag.contours.is_none());
        assert_eq!(diag.summary.contour_path_count, 0);
        let report = diag.report();
        assert!(!report.contains("Hillshade"));
        assert!(report.contains("Composite"));
    }

    #[test]
    fn errors_propagate() {
        let clock = TickClock(Cell::new(0));
        let result = process_staged_with_diagnostics(&[], &MapConfig::default(), &clock);
        assert!(matches!(result, Err(PipelineError::EmptyInput)));
    }

    #[test]
    fn report_and_json_round_trip() {
        let clock = TickClock(Cell::new(0));
        let (_, diag) =
            process_staged_with_diagnostics(&las_bytes(), &MapConfig::default(), &clock).unwrap();

        let report = diag.report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        assert!(report.contains("gist_earth"));
        assert!(report.contains("Contours"));

        let json = serde_json::to_string(&diag).unwrap();
        let back: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.grid.metrics, diag.grid.metrics);
        assert_eq!(back.total_duration, diag.total_duration);
    }
}
