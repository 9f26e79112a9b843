//! Named colormaps and multi-stop interpolation.
//!
//! A colormap turns a normalized value in `[0, 1]` into an opaque RGBA
//! pixel by linear interpolation between color stops. Values outside the
//! unit interval clamp to the end colors; `NaN` maps to fully transparent
//! black so no-data cells drop out of the composite.
//!
//! The set of maps is closed: names are resolved once, when the
//! configuration is parsed, and an unknown name is a parameter error.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// Fully transparent pixel used for `NaN` inputs.
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// A color stop: position in `[0, 1]` mapped to an RGB color in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position along the map.
    pub t: f64,
    /// Red, green and blue intensities.
    pub rgb: [f64; 3],
}

impl ColorStop {
    const fn new(t: f64, r: f64, g: f64, b: f64) -> Self {
        Self { t, rgb: [r, g, b] }
    }
}

/// Available colormaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colormap {
    /// Black -> deep blue -> green -> tan -> white.
    #[default]
    GistEarth,
    /// Blue -> cyan -> green -> yellow -> brown -> white.
    Terrain,
    /// White -> black. Used to render the hillshade.
    #[serde(rename = "Greys", alias = "greys")]
    Greys,
}

impl Colormap {
    /// All available colormaps.
    pub const ALL: &[Self] = &[Self::GistEarth, Self::Terrain, Self::Greys];

    /// Identifier accepted by [`Colormap::from_name`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::GistEarth => "gist_earth",
            Self::Terrain => "terrain",
            Self::Greys => "Greys",
        }
    }

    /// Resolve a colormap by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] for an unknown name.
    pub fn from_name(name: &str) -> Result<Self, PipelineError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|c| c.name()).collect();
                PipelineError::InvalidParameter(format!(
                    "unknown colormap {name:?} (expected one of: {})",
                    known.join(", ")
                ))
            })
    }

    /// Color stops, sorted by position, spanning `0..=1`.
    #[must_use]
    pub const fn stops(self) -> &'static [ColorStop] {
        match self {
            Self::GistEarth => GIST_EARTH_STOPS,
            Self::Terrain => TERRAIN_STOPS,
            Self::Greys => GREYS_STOPS,
        }
    }

    /// Map a normalized value to an RGBA pixel.
    #[must_use]
    pub fn rgba(self, t: f64) -> [u8; 4] {
        if t.is_nan() {
            return TRANSPARENT;
        }
        let [r, g, b] = interpolate(self.stops(), t.clamp(0.0, 1.0));
        [to_byte(r), to_byte(g), to_byte(b), 255]
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colormap {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Intensity in `[0, 1]` to a byte, truncating.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(c: f64) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0) as u8
}

/// Piecewise-linear interpolation through `stops` at `t` in `[0, 1]`.
fn interpolate(stops: &[ColorStop], t: f64) -> [f64; 3] {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return [0.0; 3];
    };
    if t <= first.t {
        return first.rgb;
    }
    if t >= last.t {
        return last.rgb;
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.t {
            let f = (t - a.t) / (b.t - a.t);
            return [
                (b.rgb[0] - a.rgb[0]).mul_add(f, a.rgb[0]),
                (b.rgb[1] - a.rgb[1]).mul_add(f, a.rgb[1]),
                (b.rgb[2] - a.rgb[2]).mul_add(f, a.rgb[2]),
            ];
        }
    }
    last.rgb
}

// Stop tables follow the matplotlib segment data. gist_earth defines
// each channel on its own breakpoints; the stops below merge them, with
// every channel evaluated at the union of breakpoints.

const GIST_EARTH_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0000, 0.000000, 0.000000, 0.000000),
    ColorStop::new(0.0039, 0.002599, 0.000000, 0.168400),
    ColorStop::new(0.0078, 0.005198, 0.000000, 0.221200),
    ColorStop::new(0.0275, 0.018327, 0.000000, 0.432900),
    ColorStop::new(0.0314, 0.020926, 0.008970, 0.454900),
    ColorStop::new(0.1098, 0.073174, 0.189300, 0.469112),
    ColorStop::new(0.1647, 0.109761, 0.303500, 0.479064),
    ColorStop::new(0.2078, 0.138484, 0.384100, 0.486877),
    ColorStop::new(0.2824, 0.188200, 0.502000, 0.500400),
    ColorStop::new(0.4588, 0.271400, 0.603548, 0.284470),
    ColorStop::new(0.4667, 0.288960, 0.608096, 0.274800),
    ColorStop::new(0.5216, 0.410994, 0.639700, 0.306802),
    ColorStop::new(0.5451, 0.463231, 0.650011, 0.320500),
    ColorStop::new(0.5490, 0.471900, 0.651722, 0.321733),
    ColorStop::new(0.6980, 0.717600, 0.717100, 0.368825),
    ColorStop::new(0.7843, 0.753670, 0.642568, 0.396100),
    ColorStop::new(0.7882, 0.755300, 0.639200, 0.405655),
    ColorStop::new(0.7922, 0.759774, 0.641300, 0.415454),
    ColorStop::new(0.8000, 0.768498, 0.644700, 0.434564),
    ColorStop::new(0.8078, 0.777223, 0.648100, 0.453673),
    ColorStop::new(0.8157, 0.786059, 0.654900, 0.473027),
    ColorStop::new(0.8667, 0.843103, 0.699100, 0.597972),
    ColorStop::new(0.8745, 0.851827, 0.710300, 0.617082),
    ColorStop::new(0.8824, 0.860663, 0.721600, 0.636436),
    ColorStop::new(0.8902, 0.869388, 0.732300, 0.655545),
    ColorStop::new(0.8941, 0.873750, 0.737650, 0.665100),
    ColorStop::new(0.8980, 0.878112, 0.743000, 0.676855),
    ColorStop::new(0.9412, 0.926432, 0.827500, 0.807067),
    ColorStop::new(0.9569, 0.943992, 0.863500, 0.854390),
    ColorStop::new(0.9647, 0.952717, 0.881600, 0.877900),
    ColorStop::new(0.9961, 0.987838, 0.973300, 0.972545),
    ColorStop::new(1.0000, 0.992200, 0.984300, 0.984300),
];

const TERRAIN_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 0.2, 0.2, 0.6),
    ColorStop::new(0.15, 0.0, 0.6, 1.0),
    ColorStop::new(0.25, 0.0, 0.8, 0.4),
    ColorStop::new(0.50, 1.0, 1.0, 0.6),
    ColorStop::new(0.75, 0.5, 0.36, 0.33),
    ColorStop::new(1.00, 1.0, 1.0, 1.0),
];

const GREYS_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 1.0, 1.0, 1.0),
    ColorStop::new(1.0, 0.0, 0.0, 0.0),
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Rec. 601 luma, for ordering checks.
    fn luma(px: [u8; 4]) -> f64 {
        0.299f64.mul_add(
            f64::from(px[0]),
            0.587f64.mul_add(f64::from(px[1]), 0.114 * f64::from(px[2])),
        )
    }

    #[test]
    fn stops_span_unit_interval_in_order() {
        for &map in Colormap::ALL {
            let stops = map.stops();
            assert!(stops.first().unwrap().t.abs() < f64::EPSILON, "{map}");
            assert!((stops.last().unwrap().t - 1.0).abs() < f64::EPSILON, "{map}");
            assert!(stops.windows(2).all(|w| w[0].t < w[1].t), "{map}");
        }
    }

    #[test]
    fn ends_match_first_and_last_stop() {
        assert_eq!(Colormap::GistEarth.rgba(0.0), [0, 0, 0, 255]);
        assert_eq!(Colormap::GistEarth.rgba(1.0), [253, 250, 250, 255]);
        assert_eq!(Colormap::Terrain.rgba(0.0), [51, 51, 153, 255]);
        assert_eq!(Colormap::Terrain.rgba(1.0), [255, 255, 255, 255]);
        assert_eq!(Colormap::Greys.rgba(0.0), [255, 255, 255, 255]);
        assert_eq!(Colormap::Greys.rgba(1.0), [0, 0, 0, 255]);
    }

    #[test]
    fn out_of_range_clamps_to_ends() {
        for &map in Colormap::ALL {
            assert_eq!(map.rgba(-3.0), map.rgba(0.0));
            assert_eq!(map.rgba(7.5), map.rgba(1.0));
        }
    }

    #[test]
    fn nan_is_transparent() {
        for &map in Colormap::ALL {
            assert_eq!(map.rgba(f64::NAN), TRANSPARENT);
        }
    }

    #[test]
    fn interpolates_between_stops() {
        // Halfway between white and black.
        assert_eq!(Colormap::Greys.rgba(0.5), [127, 127, 127, 255]);
        // Terrain at 0.375 lies halfway between (0,.8,.4) and (1,1,.6).
        assert_eq!(Colormap::Terrain.rgba(0.375), [127, 229, 127, 255]);
    }

    #[test]
    fn gist_earth_keeps_its_steep_low_end() {
        // Blue climbs to 0.4329 within the first 2.75% of the map.
        assert_eq!(Colormap::GistEarth.rgba(0.0275), [4, 0, 110, 255]);
        // Blue peaks at 0.2824 and falls back by 0.4667.
        assert_eq!(Colormap::GistEarth.rgba(0.2824), [47, 128, 127, 255]);
        assert_eq!(Colormap::GistEarth.rgba(0.4667), [73, 155, 70, 255]);
    }

    #[test]
    fn gist_earth_brightens_overall() {
        assert!(luma(Colormap::GistEarth.rgba(1.0)) > luma(Colormap::GistEarth.rgba(0.5)));
        assert!(luma(Colormap::GistEarth.rgba(0.5)) > luma(Colormap::GistEarth.rgba(0.0)));
    }

    #[test]
    fn greys_darkens_monotonically() {
        let mut previous = f64::INFINITY;
        for i in 0..=100 {
            let l = luma(Colormap::Greys.rgba(f64::from(i) / 100.0));
            assert!(l <= previous);
            previous = l;
        }
    }

    #[test]
    fn from_name_resolves_known_maps() {
        assert_eq!(Colormap::from_name("gist_earth").unwrap(), Colormap::GistEarth);
        assert_eq!(Colormap::from_name("TERRAIN").unwrap(), Colormap::Terrain);
        assert_eq!("greys".parse::<Colormap>().unwrap(), Colormap::Greys);
        for &map in Colormap::ALL {
            assert_eq!(Colormap::from_name(map.name()).unwrap(), map);
        }
    }

    #[test]
    fn from_name_rejects_unknown() {
        let err = Colormap::from_name("viridis").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidParameter(_)));
        assert!(err.to_string().contains("viridis"));
    }

    #[test]
    fn serde_uses_snake_case_names() {
        let json = serde_json::to_string(&Colormap::GistEarth).unwrap();
        assert_eq!(json, "\"gist_earth\"");
        let map: Colormap = serde_json::from_str("\"terrain\"").unwrap();
        assert_eq!(map, Colormap::Terrain);
    }

    #[test]
    fn serde_names_match_display() {
        for &map in Colormap::ALL {
            let json = serde_json::to_string(&map).unwrap();
            assert_eq!(json, format!("\"{map}\""));
            let back: Colormap = serde_json::from_str(&json).unwrap();
            assert_eq!(back, map);
        }
        let lower: Colormap = serde_json::from_str("\"greys\"").unwrap();
        assert_eq!(lower, Colormap::Greys);
    }
}
