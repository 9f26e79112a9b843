//! Contour tracing: extract isolines of a scalar raster at one level.
//!
//! This module defines the [`ContourTracer`] trait for pluggable contour
//! tracing algorithms and the [`ContourTracerKind`] enum for selecting
//! which algorithm to use at runtime.
//!
//! # Marching squares
//!
//! Every 2x2 block of samples ("square") is classified by which corners
//! lie strictly above the level. Crossed square edges get a point by
//! linear interpolation, and each square contributes up to two segments.
//! Neighboring squares compute shared edge points from the same two
//! samples with the same arithmetic, so segments are stitched into paths
//! by exact endpoint matching.
//!
//! Squares with a `NaN` corner are skipped, so no-data holes open up
//! paths instead of producing spurious crossings.
//!
//! Output points use `x` = column and `y` = row (fractional).

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::types::{ElevationRaster, Point, Polyline};

/// Saddle resolution for squares whose diagonal corners disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// High diagonal corners are joined through the square center.
    #[default]
    High,
    /// Low diagonal corners are joined through the square center.
    Low,
}

/// Winding convention of traced paths.
///
/// Both conventions wind every path the same way relative to the field;
/// they differ only by which side of the path the high values lie on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Paths wind counter-clockwise around regions above the level.
    #[default]
    High,
    /// Paths wind counter-clockwise around regions below the level.
    Low,
}

/// Selects which contour tracing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContourTracerKind {
    /// Marching squares with linear edge interpolation.
    MarchingSquares {
        /// Saddle resolution.
        connectivity: Connectivity,
        /// Path winding.
        orientation: Orientation,
    },
}

impl Default for ContourTracerKind {
    fn default() -> Self {
        Self::MarchingSquares {
            connectivity: Connectivity::default(),
            orientation: Orientation::default(),
        }
    }
}

/// Trait for contour tracing strategies.
///
/// Input: a scalar raster and a level.
/// Output: the open and closed paths where the raster crosses the level.
pub trait ContourTracer {
    /// Trace the isolines of `raster` at `level`.
    fn trace(&self, raster: &ElevationRaster, level: f64) -> Vec<Polyline>;
}

impl ContourTracer for ContourTracerKind {
    fn trace(&self, raster: &ElevationRaster, level: f64) -> Vec<Polyline> {
        match *self {
            Self::MarchingSquares {
                connectivity,
                orientation,
            } => {
                let paths = trace_marching_squares(raster, level, connectivity);
                match orientation {
                    Orientation::Low => paths,
                    Orientation::High => paths
                        .into_iter()
                        .map(|path| Polyline::new(path.into_points().into_iter().rev().collect()))
                        .collect(),
                }
            }
        }
    }
}

/// Interpolated position of `level` between two samples, in `[0, 1]`.
fn crossing(from: f64, to: f64, level: f64) -> f64 {
    (level - from) / (to - from)
}

/// Marching squares over every square of `raster`, in row-major order.
fn trace_marching_squares(
    raster: &ElevationRaster,
    level: f64,
    connectivity: Connectivity,
) -> Vec<Polyline> {
    let rows = raster.rows();
    let cols = raster.cols();
    if rows < 2 || cols < 2 {
        return Vec::new();
    }

    let mut assembler = SegmentAssembler::default();

    let high = connectivity == Connectivity::High;
    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            let ul = raster.get(r, c);
            let ur = raster.get(r, c + 1);
            let ll = raster.get(r + 1, c);
            let lr = raster.get(r + 1, c + 1);
            if ul.is_nan() || ur.is_nan() || ll.is_nan() || lr.is_nan() {
                continue;
            }

            let case = u8::from(ul > level)
                | u8::from(ur > level) << 1
                | u8::from(ll > level) << 2
                | u8::from(lr > level) << 3;
            if case == 0 || case == 15 {
                continue;
            }

            let (rf, cf) = (f64::from(r), f64::from(c));
            let top = || Point::new(cf + crossing(ul, ur, level), rf);
            let bottom = || Point::new(cf + crossing(ll, lr, level), rf + 1.0);
            let left = || Point::new(cf, rf + crossing(ul, ll, level));
            let right = || Point::new(cf + 1.0, rf + crossing(ur, lr, level));

            match case {
                1 => assembler.add(top(), left()),
                2 => assembler.add(right(), top()),
                3 => assembler.add(right(), left()),
                4 => assembler.add(left(), bottom()),
                5 => assembler.add(top(), bottom()),
                6 if high => {
                    assembler.add(left(), top());
                    assembler.add(right(), bottom());
                }
                6 => {
                    assembler.add(right(), top());
                    assembler.add(left(), bottom());
                }
                7 => assembler.add(right(), bottom()),
                8 => assembler.add(bottom(), right()),
                9 if high => {
                    assembler.add(top(), right());
                    assembler.add(bottom(), left());
                }
                9 => {
                    assembler.add(top(), left());
                    assembler.add(bottom(), right());
                }
                10 => assembler.add(bottom(), top()),
                11 => assembler.add(bottom(), left()),
                12 => assembler.add(left(), right()),
                13 => assembler.add(top(), right()),
                14 => assembler.add(left(), top()),
                _ => {}
            }
        }
    }

    assembler.finish()
}

/// Exact-match key for a segment endpoint. `+ 0.0` folds `-0.0` into `0.0`.
fn key(p: Point) -> (u64, u64) {
    ((p.x + 0.0).to_bits(), (p.y + 0.0).to_bits())
}

/// Stitches directed segments into paths by matching endpoints.
///
/// Paths are reported in the order they were started, so output is
/// deterministic for a given scan order.
#[derive(Default)]
struct SegmentAssembler {
    paths: Vec<Option<VecDeque<Point>>>,
    /// Path index by first point.
    starts: HashMap<(u64, u64), usize>,
    /// Path index by last point.
    ends: HashMap<(u64, u64), usize>,
}

impl SegmentAssembler {
    fn add(&mut self, from: Point, to: Point) {
        if key(from) == key(to) {
            return;
        }
        let tail = self.starts.remove(&key(to));
        let head = self.ends.remove(&key(from));

        match (head, tail) {
            (Some(h), Some(t)) if h == t => {
                // The segment closes a loop.
                if let Some(path) = self.paths[h].as_mut() {
                    path.push_back(to);
                }
            }
            (Some(h), Some(t)) => {
                // The segment bridges two paths: merge into the older one.
                let (Some(mut head_path), Some(tail_path)) =
                    (self.paths[h].take(), self.paths[t].take())
                else {
                    return;
                };
                if h < t {
                    head_path.extend(tail_path);
                    if let Some(&last) = head_path.back() {
                        self.ends.insert(key(last), h);
                    }
                    self.paths[h] = Some(head_path);
                } else {
                    let mut merged = head_path;
                    merged.extend(tail_path);
                    if let Some(&first) = merged.front() {
                        self.starts.insert(key(first), t);
                    }
                    if let Some(&last) = merged.back() {
                        self.ends.insert(key(last), t);
                    }
                    self.paths[t] = Some(merged);
                }
            }
            (Some(h), None) => {
                if let Some(path) = self.paths[h].as_mut() {
                    path.push_back(to);
                }
                self.ends.insert(key(to), h);
            }
            (None, Some(t)) => {
                if let Some(path) = self.paths[t].as_mut() {
                    path.push_front(from);
                }
                self.starts.insert(key(from), t);
            }
            (None, None) => {
                let index = self.paths.len();
                self.paths.push(Some(VecDeque::from([from, to])));
                self.starts.insert(key(from), index);
                self.ends.insert(key(to), index);
            }
        }
    }

    fn finish(self) -> Vec<Polyline> {
        self.paths
            .into_iter()
            .flatten()
            .map(|path| Polyline::new(path.into()))
            .collect()
    }
}
