//! Point cloud loading: LAS/LAZ decoding and ground filtering.
//!
//! Only samples an upstream classifier labeled as ground (ASPRS class 2)
//! are kept. Everything else (vegetation, buildings, noise, unclassified)
//! is dropped before gridding.
//!
//! Decoding goes through [`las::Reader`], which handles plain LAS and
//! compressed LAZ (including cloud-optimized COPC files, which are valid
//! LAZ 1.4). The loader never opens files itself: callers hand it any
//! `Read + Seek` source or an in-memory byte buffer.

use std::io::{Cursor, Read, Seek};

use crate::types::{PipelineError, PointCounts};

/// ASPRS classification code for ground points.
pub const GROUND_CLASS: u8 = 2;

/// A single decoded point cloud sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSample {
    /// Easting.
    pub x: f64,
    /// Northing.
    pub y: f64,
    /// Elevation.
    pub z: f64,
    /// ASPRS classification code.
    pub classification: u8,
}

impl PointSample {
    /// Whether this sample survives ground filtering.
    #[must_use]
    pub const fn is_ground(&self) -> bool {
        self.classification == GROUND_CLASS
    }
}

/// Horizontal extent of a point set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Smallest x.
    pub min_x: f64,
    /// Largest x.
    pub max_x: f64,
    /// Smallest y.
    pub min_y: f64,
    /// Largest y.
    pub max_y: f64,
}

impl BoundingBox {
    /// Extent along x.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent along y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Ground-classified samples as parallel coordinate arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundPoints {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
    counts: PointCounts,
}

impl GroundPoints {
    /// Build from already-filtered coordinate arrays.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] if the arrays differ
    /// in length.
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self, PipelineError> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(PipelineError::InvalidParameter(format!(
                "coordinate arrays differ in length (x={}, y={}, z={})",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        let n = x.len() as u64;
        Ok(Self {
            x,
            y,
            z,
            counts: PointCounts { read: n, kept: n },
        })
    }

    /// Keep the ground samples out of an arbitrary sample stream.
    pub fn from_samples(samples: impl IntoIterator<Item = PointSample>) -> Self {
        let mut points = Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            counts: PointCounts { read: 0, kept: 0 },
        };
        for sample in samples {
            points.counts.read += 1;
            if sample.is_ground() {
                points.push(sample);
            }
        }
        points
    }

    /// Decode a LAS/LAZ stream and keep its ground samples.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidInput`] if the header or any point
    /// record fails to decode.
    pub fn from_reader<R>(source: R) -> Result<Self, PipelineError>
    where
        R: Read + Seek + Send + Sync + 'static,
    {
        let mut reader = las::Reader::new(source)?;
        let mut points = Self {
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            counts: PointCounts { read: 0, kept: 0 },
        };
        for point_result in reader.points() {
            let point = point_result?;
            points.counts.read += 1;
            let sample = PointSample {
                x: point.x,
                y: point.y,
                z: point.z,
                classification: u8::from(point.classification),
            };
            if sample.is_ground() {
                points.push(sample);
            }
        }
        Ok(points)
    }

    /// Decode an in-memory LAS/LAZ file and keep its ground samples.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyInput`] if `bytes` is empty and
    /// [`PipelineError::InvalidInput`] if decoding fails.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::EmptyInput);
        }
        Self::from_reader(Cursor::new(bytes.to_vec()))
    }

    fn push(&mut self, sample: PointSample) {
        self.x.push(sample.x);
        self.y.push(sample.y);
        self.z.push(sample.z);
        self.counts.kept += 1;
    }

    /// Number of ground points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether no ground point survived filtering.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Eastings.
    #[must_use]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// Northings.
    #[must_use]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// Elevations.
    #[must_use]
    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// Read/kept counts from loading.
    #[must_use]
    pub const fn counts(&self) -> PointCounts {
        self.counts
    }

    /// Horizontal extent, or `None` when there are no points.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let (&x0, &y0) = (self.x.first()?, self.y.first()?);
        let init = BoundingBox {
            min_x: x0,
            max_x: x0,
            min_y: y0,
            max_y: y0,
        };
        Some(
            self.x
                .iter()
                .zip(&self.y)
                .fold(init, |bb, (&x, &y)| BoundingBox {
                    min_x: bb.min_x.min(x),
                    max_x: bb.max_x.max(x),
                    min_y: bb.min_y.min(y),
                    max_y: bb.max_y.max(y),
                }),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use las::point::Classification;

    /// Write a minimal LAS 1.2 file containing the given
    /// `(x, y, z, class)` points.
    fn las_bytes(points: &[(f64, f64, f64, u8)]) -> Vec<u8> {
        let header = las::Builder::from((1, 2)).into_header().unwrap();
        let mut writer = las::Writer::new(Cursor::new(Vec::new()), header).unwrap();
        for &(x, y, z, class) in points {
            let point = las::Point {
                x,
                y,
                z,
                classification: Classification::new(class).unwrap(),
                ..las::Point::default()
            };
            writer.write_point(point).unwrap();
        }
        writer.into_inner().unwrap().into_inner()
    }

    /// Same as [`las_bytes`] but LAZ-compressed in a LAS 1.4 container.
    fn laz_bytes(points: &[(f64, f64, f64, u8)]) -> Vec<u8> {
        let mut builder = las::Builder::from((1, 4));
        builder.point_format.is_compressed = true;
        let header = builder.into_header().unwrap();
        let mut writer = las::Writer::new(Cursor::new(Vec::new()), header).unwrap();
        for &(x, y, z, class) in points {
            let point = las::Point {
                x,
                y,
                z,
                classification: Classification::new(class).unwrap(),
                ..las::Point::default()
            };
            writer.write_point(point).unwrap();
        }
        writer.into_inner().unwrap().into_inner()
    }

    #[test]
    fn decodes_compressed_laz() {
        let samples: Vec<_> = (0..10)
            .map(|i| {
                let v = f64::from(i);
                (v, 2.0 * v, 100.0 + v, if i % 2 == 0 { 2 } else { 5 })
            })
            .collect();
        let points = GroundPoints::from_bytes(&laz_bytes(&samples)).unwrap();
        assert_eq!(points.counts(), PointCounts { read: 10, kept: 5 });
        assert_eq!(points.x(), &[0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(points.y(), &[0.0, 4.0, 8.0, 12.0, 16.0]);
        assert_eq!(points.z(), &[100.0, 102.0, 104.0, 106.0, 108.0]);
    }

    #[test]
    fn reads_from_any_seekable_source() {
        let bytes = las_bytes(&[(1.0, 1.0, 5.0, 2), (3.0, 2.0, 6.0, 2)]);
        let points = GroundPoints::from_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points.z(), &[5.0, 6.0]);
    }

    #[test]
    fn empty_bytes_is_empty_input() {
        assert!(matches!(
            GroundPoints::from_bytes(&[]),
            Err(PipelineError::EmptyInput)
        ));
    }

    #[test]
    fn garbage_bytes_is_invalid_input() {
        let result = GroundPoints::from_bytes(b"definitely not a LAS header");
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn keeps_only_ground_points() {
        let bytes = las_bytes(&[
            (1.0, 2.0, 3.0, 2),
            (4.0, 5.0, 6.0, 5), // high vegetation
            (7.0, 8.0, 9.0, 2),
            (0.0, 0.0, 0.0, 1), // unclassified
        ]);
        let points = GroundPoints::from_bytes(&bytes).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points.counts(), PointCounts { read: 4, kept: 2 });
        assert!((points.x()[1] - 7.0).abs() < 1e-3);
        assert!((points.y()[1] - 8.0).abs() < 1e-3);
        assert!((points.z()[1] - 9.0).abs() < 1e-3);
    }

    #[test]
    fn file_without_ground_points_loads_empty() {
        let bytes = las_bytes(&[(1.0, 1.0, 1.0, 6)]);
        let points = GroundPoints::from_bytes(&bytes).unwrap();
        assert!(points.is_empty());
        assert_eq!(points.counts().read, 1);
    }

    #[test]
    fn from_samples_filters_by_class() {
        let samples = [
            PointSample {
                x: 0.0,
                y: 0.0,
                z: 1.0,
                classification: 2,
            },
            PointSample {
                x: 1.0,
                y: 0.0,
                z: 9.0,
                classification: 6,
            },
        ];
        let points = GroundPoints::from_samples(samples);
        assert_eq!(points.z(), &[1.0]);
        assert_eq!(points.counts(), PointCounts { read: 2, kept: 1 });
    }

    #[test]
    fn new_rejects_mismatched_lengths() {
        let result = GroundPoints::new(vec![0.0, 1.0], vec![0.0], vec![0.0, 1.0]);
        assert!(matches!(result, Err(PipelineError::InvalidParameter(_))));
    }

    #[test]
    fn bounding_box_spans_points() {
        let points =
            GroundPoints::new(vec![3.0, -1.0, 2.0], vec![0.5, 4.0, -2.0], vec![0.0; 3]).unwrap();
        let bb = points.bounding_box().unwrap();
        assert!((bb.min_x + 1.0).abs() < f64::EPSILON);
        assert!((bb.max_x - 3.0).abs() < f64::EPSILON);
        assert!((bb.min_y + 2.0).abs() < f64::EPSILON);
        assert!((bb.max_y - 4.0).abs() < f64::EPSILON);
        assert!((bb.width() - 4.0).abs() < f64::EPSILON);
        assert!((bb.height() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bounding_box_of_empty_is_none() {
        let points = GroundPoints::new(vec![], vec![], vec![]).unwrap();
        assert!(points.bounding_box().is_none());
    }
}
