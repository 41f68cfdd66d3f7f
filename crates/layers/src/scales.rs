use std::collections::BTreeMap;
use std::f64::consts::PI;

use foundation::math::vec::hypotenuse;
use scene::entity::Measure;

use crate::profiles::ProfileConstants;

/// Neutral fill used when an entity has no color value.
pub const COLOR_WHITEISH: &str = "rgb(253, 253, 253)";

/// Radius of a bubble with the given area.
///
/// The size scale works in areas so that perceived bubble size stays
/// proportional to the underlying value; the radius is always derived as
/// the square root, never scaled directly.
pub fn area_to_radius(area: f64) -> f64 {
    (area / PI).sqrt()
}

pub fn radius_to_area(radius: f64) -> f64 {
    radius * radius * PI
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ScaleKind {
    Linear,
    Log,
    /// Symmetric log that passes through zero, for measures that can be
    /// zero or negative.
    GenericLog,
    Pow,
}

/// Pixel radius bounds derived from a layout profile.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RadiusLimits {
    pub min_radius_px: f64,
    pub max_radius_px: f64,
}

/// Area-preserving size scale.
///
/// The domain is the data extent (two or more stops); the range is in
/// bubble areas. `update_size_limits` remaps the range whenever the
/// container or the data domain changes.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeScale {
    kind: ScaleKind,
    /// Exponent for `ScaleKind::Pow`.
    exponent: f64,
    domain: Vec<f64>,
    range: Vec<f64>,
}

impl SizeScale {
    pub fn new(kind: ScaleKind, domain: Vec<f64>) -> Self {
        assert!(domain.len() >= 2, "size scale needs at least two domain stops");
        let range = vec![0.0; domain.len()];
        Self {
            kind,
            exponent: 0.5,
            domain,
            range,
        }
    }

    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = exponent;
        self
    }

    pub fn kind(&self) -> ScaleKind {
        self.kind
    }

    pub fn domain(&self) -> &[f64] {
        &self.domain
    }

    pub fn range(&self) -> &[f64] {
        &self.range
    }

    /// Scaled output (a bubble area) for a raw measure value.
    ///
    /// Piecewise-linear between the transformed domain stops, as a
    /// polylinear scale.
    pub fn scaled(&self, value: f64) -> f64 {
        let t = self.transform(value);
        let stops: Vec<f64> = self.domain.iter().map(|d| self.transform(*d)).collect();

        // Find the segment; values beyond the ends use the edge segments.
        let last = stops.len() - 1;
        let mut hi = 1;
        while hi < last && t > stops[hi] {
            hi += 1;
        }
        let lo = hi - 1;

        let span = stops[hi] - stops[lo];
        let frac = if span == 0.0 { 0.0 } else { (t - stops[lo]) / span };
        self.range[lo] + (self.range[hi] - self.range[lo]) * frac
    }

    /// Remaps the output range to the area equivalents of the profile's
    /// radius bounds, respecting a normalized `[0, 1]` extent sub-range
    /// (user-driven narrowing of the radius range).
    ///
    /// Returns the pixel radius limits so the host can surface them in its
    /// size dialog.
    pub fn update_size_limits(
        &mut self,
        constants: &ProfileConstants,
        width: f64,
        height: f64,
        extent: [f64; 2],
    ) -> RadiusLimits {
        let min_radius = constants.min_radius_px;
        let max_radius = constants
            .min_radius_px
            .max(constants.max_radius_frac * hypotenuse(width, height));

        let min_area = radius_to_area((max_radius * extent[0]).max(min_radius));
        let max_area = radius_to_area((max_radius * extent[1]).max(min_radius));

        let n = self.domain.len();
        self.range = if min_area == max_area {
            vec![min_area; n]
        } else {
            let step = (max_area - min_area) / (n - 1) as f64;
            let mut range: Vec<f64> = (0..n - 1).map(|i| min_area + step * i as f64).collect();
            range.push(max_area);
            range
        };

        RadiusLimits {
            min_radius_px: min_radius,
            max_radius_px: max_radius,
        }
    }

    fn transform(&self, v: f64) -> f64 {
        match self.kind {
            ScaleKind::Linear => v,
            ScaleKind::Log => v.ln(),
            ScaleKind::GenericLog => v.signum() * (1.0 + v.abs()).ln(),
            ScaleKind::Pow => v.signum() * v.abs().powf(self.exponent),
        }
    }
}

/// Fill-color assignment. Color transitions are never eased; the scale only
/// maps values to colors.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorScale {
    /// Category value → palette color.
    Ordinal(BTreeMap<String, String>),
    /// Numeric value interpolated between rgb stops; domain and stops have
    /// equal length.
    Numeric {
        domain: Vec<f64>,
        stops: Vec<[u8; 3]>,
    },
}

impl ColorScale {
    /// Color for a measure; absent or unmapped values get the neutral fill.
    pub fn color(&self, measure: Option<&Measure>) -> String {
        match (self, measure) {
            (_, None) => COLOR_WHITEISH.to_string(),
            (ColorScale::Ordinal(palette), Some(Measure::Category(c))) => palette
                .get(c)
                .cloned()
                .unwrap_or_else(|| COLOR_WHITEISH.to_string()),
            (ColorScale::Numeric { domain, stops }, Some(Measure::Number(v))) => {
                interpolate_rgb(domain, stops, *v)
            }
            _ => COLOR_WHITEISH.to_string(),
        }
    }
}

fn interpolate_rgb(domain: &[f64], stops: &[[u8; 3]], v: f64) -> String {
    if domain.len() < 2 || domain.len() != stops.len() {
        return COLOR_WHITEISH.to_string();
    }

    let v = v.clamp(domain[0], domain[domain.len() - 1]);
    let last = domain.len() - 1;
    let mut hi = 1;
    while hi < last && v > domain[hi] {
        hi += 1;
    }
    let lo = hi - 1;

    let span = domain[hi] - domain[lo];
    let t = if span == 0.0 { 0.0 } else { (v - domain[lo]) / span };
    let channel = |c: usize| {
        (stops[lo][c] as f64 + (stops[hi][c] as f64 - stops[lo][c] as f64) * t).round() as u8
    };
    format!("rgb({}, {}, {})", channel(0), channel(1), channel(2))
}

#[cfg(test)]
mod tests {
    use super::{
        COLOR_WHITEISH, ColorScale, ScaleKind, SizeScale, area_to_radius, radius_to_area,
    };
    use crate::profiles::LayoutProfile;
    use scene::entity::Measure;
    use std::collections::BTreeMap;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn doubling_the_area_does_not_double_the_radius() {
        let r1 = area_to_radius(10.0);
        let r2 = area_to_radius(20.0);
        // Area is linear in the value; radius grows with the square root.
        assert_close(r2 / r1, 2.0_f64.sqrt(), 1e-12);
        assert_close(radius_to_area(r2) / radius_to_area(r1), 2.0, 1e-12);
    }

    #[test]
    fn area_radius_round_trip() {
        assert_close(radius_to_area(area_to_radius(42.0)), 42.0, 1e-12);
    }

    #[test]
    fn linear_scale_interpolates_areas() {
        let mut scale = SizeScale::new(ScaleKind::Linear, vec![0.0, 100.0]);
        scale.update_size_limits(
            &LayoutProfile::Medium.constants(),
            300.0,
            400.0,
            [0.0, 1.0],
        );

        // Medium: min radius 1px, max radius 0.05 * 500 = 25px.
        let min_area = radius_to_area(1.0);
        let max_area = radius_to_area(25.0);
        assert_close(scale.scaled(0.0), min_area, 1e-9);
        assert_close(scale.scaled(100.0), max_area, 1e-9);
        assert_close(scale.scaled(50.0), (min_area + max_area) / 2.0, 1e-9);
    }

    #[test]
    fn extent_narrows_the_radius_range() {
        let mut scale = SizeScale::new(ScaleKind::Linear, vec![0.0, 1.0]);
        let limits = scale.update_size_limits(
            &LayoutProfile::Medium.constants(),
            300.0,
            400.0,
            [0.4, 0.8],
        );

        assert_eq!(limits.max_radius_px, 25.0);
        assert_close(scale.scaled(0.0), radius_to_area(25.0 * 0.4), 1e-9);
        assert_close(scale.scaled(1.0), radius_to_area(25.0 * 0.8), 1e-9);
    }

    #[test]
    fn extent_floor_is_the_minimum_radius() {
        let mut scale = SizeScale::new(ScaleKind::Linear, vec![0.0, 1.0]);
        scale.update_size_limits(
            &LayoutProfile::Medium.constants(),
            300.0,
            400.0,
            [0.0, 1.0],
        );
        // extent[0] of 0 would give a zero radius; the profile minimum wins.
        assert_close(scale.scaled(0.0), radius_to_area(1.0), 1e-9);
    }

    #[test]
    fn multi_stop_domains_get_evenly_spaced_ranges() {
        let mut scale = SizeScale::new(ScaleKind::Linear, vec![0.0, 10.0, 100.0]);
        scale.update_size_limits(
            &LayoutProfile::Medium.constants(),
            300.0,
            400.0,
            [0.0, 1.0],
        );
        let range = scale.range();
        assert_eq!(range.len(), 3);
        let mid = (range[0] + range[2]) / 2.0;
        assert_close(range[1], mid, 1e-9);
    }

    #[test]
    fn generic_log_passes_through_zero() {
        let mut scale = SizeScale::new(ScaleKind::GenericLog, vec![-100.0, 0.0, 100.0]);
        scale.update_size_limits(
            &LayoutProfile::Medium.constants(),
            300.0,
            400.0,
            [0.0, 1.0],
        );
        let mid = (scale.range()[0] + scale.range()[2]) / 2.0;
        assert_close(scale.scaled(0.0), mid, 1e-9);
    }

    #[test]
    fn absent_color_gets_the_neutral_fill() {
        let scale = ColorScale::Ordinal(BTreeMap::new());
        assert_eq!(scale.color(None), COLOR_WHITEISH);
    }

    #[test]
    fn ordinal_palette_lookup() {
        let mut palette = BTreeMap::new();
        palette.insert("asia".to_string(), "rgb(255, 94, 0)".to_string());
        let scale = ColorScale::Ordinal(palette);

        assert_eq!(
            scale.color(Some(&Measure::Category("asia".to_string()))),
            "rgb(255, 94, 0)"
        );
        assert_eq!(
            scale.color(Some(&Measure::Category("atlantis".to_string()))),
            COLOR_WHITEISH
        );
    }

    #[test]
    fn numeric_color_interpolates_between_stops() {
        let scale = ColorScale::Numeric {
            domain: vec![0.0, 100.0],
            stops: vec![[0, 0, 0], [200, 100, 50]],
        };
        assert_eq!(
            scale.color(Some(&Measure::Number(50.0))),
            "rgb(100, 50, 25)"
        );
        // Out-of-domain values clamp to the edges.
        assert_eq!(
            scale.color(Some(&Measure::Number(1e9))),
            "rgb(200, 100, 50)"
        );
    }
}
