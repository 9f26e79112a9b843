//! relief: render an elevation map from a LIDAR point cloud.
//!
//! Reads a LAS/LAZ file, keeps the ground-classified points and writes a
//! single PNG: the colored elevation raster, optionally blended with a
//! hillshade and overlaid with isocontours.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin relief -- [OPTIONS] <INPUT>
//! ```
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default
//! `info`). The per-stage diagnostics report is printed to stdout, as
//! JSON with `--json`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use relief_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use relief_pipeline::{
    BorderRule, Colormap, ContourConfig, HillshadeParams, LevelBounds, MapConfig, Normalization,
    PasteMode, SlopeMagnitude,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Render a colored, hill-shaded elevation map with isocontours.
///
/// Ground points (ASPRS class 2) are resampled onto a regular grid,
/// colored through a colormap and written as one PNG.
#[derive(Parser)]
#[command(name = "relief", version)]
struct Cli {
    /// Path to the input point cloud (LAS or LAZ).
    input: PathBuf,

    /// Grid spacing in the point cloud's horizontal units.
    #[arg(long, default_value_t = MapConfig::DEFAULT_RESOLUTION)]
    resolution: f64,

    /// Elevation at the low end of the colormap.
    #[arg(long, default_value_t = MapConfig::DEFAULT_MIN_LEVEL, allow_negative_numbers = true)]
    min_level: f64,

    /// Elevation at the high end of the colormap.
    #[arg(long, default_value_t = MapConfig::DEFAULT_MAX_LEVEL, allow_negative_numbers = true)]
    max_level: f64,

    /// Take the colormap range from the data instead of --min-level/--max-level.
    #[arg(long, conflicts_with_all = ["min_level", "max_level"])]
    auto_levels: bool,

    /// Colormap (gist_earth, terrain, Greys).
    #[arg(long, default_value_t = Colormap::default(), value_parser = parse_colormap)]
    colormap: Colormap,

    /// Map elevations linearly instead of on a symmetric log scale.
    #[arg(long)]
    linear: bool,

    /// Half-width of the linear region of the symmetric log scale.
    #[arg(long, default_value_t = Normalization::DEFAULT_LINTHRESH, conflicts_with = "linear")]
    linthresh: f64,

    /// Disable the hillshade.
    #[arg(long)]
    no_shading: bool,

    /// Disable the isocontour overlay.
    #[arg(long)]
    no_isocontours: bool,

    /// Alpha of isocontour pixels (0-255).
    #[arg(long, default_value_t = ContourConfig::DEFAULT_ALPHA)]
    isocontour_alpha: u8,

    /// Gaussian sigma applied before contour tracing (0 disables smoothing).
    #[arg(long, default_value_t = ContourConfig::DEFAULT_SIGMA)]
    sigma: f32,

    /// Number of contour levels.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_LEVEL_COUNT, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    contour_levels: usize,

    /// Which raster edges count as the border when trimming contours.
    #[arg(long, value_enum, default_value_t = Border::Symmetric)]
    border_rule: Border,

    /// Light azimuth in degrees.
    #[arg(long, default_value_t = HillshadeParams::DEFAULT_AZIMUTH, allow_negative_numbers = true)]
    azimuth: f64,

    /// Light altitude above the horizon in degrees.
    #[arg(long, default_value_t = HillshadeParams::DEFAULT_ALTITUDE)]
    altitude: f64,

    /// Slope magnitude model for the hillshade.
    #[arg(long, value_enum, default_value_t = Slope::TwoAxis)]
    slope: Slope,

    /// Hillshade blend factor: 0 = pure color, 1 = pure shade.
    #[arg(long, default_value_t = MapConfig::DEFAULT_SHADE_BLEND)]
    shade_blend: f64,

    /// How isocontours are pasted onto the map.
    #[arg(long, value_enum, default_value_t = Paste::Stencil)]
    paste_mode: Paste,

    /// Output file stem; the map is written to `<output-dir>/<output-name>.png`.
    #[arg(long, default_value = "map")]
    output_name: String,

    /// Output directory.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Print diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Full map config as a JSON string.
    ///
    /// When provided, all other map parameter flags are ignored.
    /// The JSON must be a valid `MapConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Border rule selection.
#[derive(Clone, Copy, ValueEnum)]
enum Border {
    /// First and last row/column.
    Symmetric,
    /// Last row/column only.
    UpperOnly,
}

/// Slope magnitude selection.
#[derive(Clone, Copy, ValueEnum)]
enum Slope {
    /// Both gradient components.
    TwoAxis,
    /// Row-axis gradient only.
    RowAxisOnly,
}

/// Paste mode selection.
#[derive(Clone, Copy, ValueEnum)]
enum Paste {
    /// Contour pixels replace the map color.
    Stencil,
    /// Contour pixels are mixed in by their alpha.
    Blend,
}

/// Resolve `--colormap` by its canonical name (case-insensitive).
fn parse_colormap(name: &str) -> Result<Colormap, String> {
    Colormap::from_name(name).map_err(|e| e.to_string())
}

/// Build a [`MapConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<MapConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(MapConfig {
        resolution: cli.resolution,
        levels: if cli.auto_levels {
            LevelBounds::Auto
        } else {
            LevelBounds::Fixed {
                min_level: cli.min_level,
                max_level: cli.max_level,
            }
        },
        colormap: cli.colormap,
        normalization: if cli.linear {
            Normalization::Linear
        } else {
            Normalization::SymLog {
                linthresh: cli.linthresh,
            }
        },
        shading: !cli.no_shading,
        hillshade: HillshadeParams {
            azimuth: cli.azimuth,
            altitude: cli.altitude,
            slope_magnitude: match cli.slope {
                Slope::TwoAxis => SlopeMagnitude::TwoAxis,
                Slope::RowAxisOnly => SlopeMagnitude::RowAxisOnly,
            },
        },
        shade_blend: cli.shade_blend,
        isocontours: !cli.no_isocontours,
        contours: ContourConfig {
            sigma: cli.sigma,
            level_count: cli.contour_levels,
            alpha: cli.isocontour_alpha,
            border_rule: match cli.border_rule {
                Border::Symmetric => BorderRule::Symmetric,
                Border::UpperOnly => BorderRule::UpperOnly,
            },
            ..ContourConfig::default()
        },
        paste_mode: match cli.paste_mode {
            Paste::Stencil => PasteMode::Stencil,
            Paste::Blend => PasteMode::Blend,
        },
    })
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            error!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    debug!(?config, "map config");

    let destination = match output::output_path(&cli.output_dir, &cli.output_name) {
        Ok(path) => path,
        Err(e) => {
            error!("Invalid output: {e}");
            return ExitCode::FAILURE;
        }
    };

    let las_bytes = match std::fs::read(&cli.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Error reading {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };
    info!(
        input = %cli.input.display(),
        bytes = las_bytes.len(),
        "read point cloud"
    );

    let (staged, diagnostics) = match relief_pipeline::process_staged_with_diagnostics(
        &las_bytes, &config, &StdClock,
    ) {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };
    log_stages(&diagnostics);

    if cli.json {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
    }

    let png = match relief_pipeline::encode_png(&staged.output) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = output::write_atomic(&destination, &png) {
        error!("Error writing {}: {e}", destination.display());
        return ExitCode::FAILURE;
    }
    info!(
        path = %destination.display(),
        bytes = png.len(),
        width = staged.dimensions.width,
        height = staged.dimensions.height,
        "map written"
    );

    ExitCode::SUCCESS
}

/// Emit one `info` event per executed stage.
fn log_stages(diagnostics: &PipelineDiagnostics) {
    let summary = &diagnostics.summary;
    info!(
        points_read = summary.points_read,
        ground_points = summary.ground_points,
        ms = ms(diagnostics.load.duration),
        "loaded point cloud"
    );
    info!(
        width = summary.width,
        height = summary.height,
        ms = ms(diagnostics.grid.duration),
        "gridded elevations"
    );
    if let Some(ref shade) = diagnostics.hillshade {
        info!(ms = ms(shade.duration), "computed hillshade");
    }
    if let Some(ref contours) = diagnostics.contours {
        info!(
            paths = summary.contour_path_count,
            ms = ms(contours.duration),
            "traced isocontours"
        );
    }
    info!(ms = ms(diagnostics.colorize.duration), "colored elevations");
    info!(
        ms = ms(diagnostics.composite.duration),
        total_ms = ms(diagnostics.total_duration),
        "composited map"
    );
}

fn ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}
