//! Raw cartographic projections.
//!
//! These are the unscaled "sphere to plane" mappings the viewport fitter
//! composes with its fit transform. Output is in abstract projected units
//! with x growing east and y growing *down* (screen convention), roughly
//! spanning `[-pi, pi]` in x for a full globe.
//!
//! The catalog is fixed: projections are selected by name from chart
//! configuration, and an unknown name is a configuration error reported by
//! the caller, not a panic here.

use super::Vec2;

const DEG2RAD: f64 = std::f64::consts::PI / 180.0;

/// Robinson interpolation table, one entry per 5 degrees of latitude.
/// Columns: parallel length factor, parallel distance factor.
const ROBINSON_TABLE: [[f64; 2]; 19] = [
    [1.0000, 0.0000],
    [0.9986, 0.0620],
    [0.9954, 0.1240],
    [0.9900, 0.1860],
    [0.9822, 0.2480],
    [0.9730, 0.3100],
    [0.9600, 0.3720],
    [0.9427, 0.4340],
    [0.9216, 0.4958],
    [0.8962, 0.5571],
    [0.8679, 0.6176],
    [0.8350, 0.6769],
    [0.7986, 0.7346],
    [0.7597, 0.7903],
    [0.7186, 0.8435],
    [0.6732, 0.8936],
    [0.6213, 0.9394],
    [0.5722, 0.9761],
    [0.5322, 1.0000],
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProjectionKind {
    Equirectangular,
    CylindricalEqualArea,
    Aitoff,
    Robinson,
}

impl ProjectionKind {
    /// Resolves a configured projection name against the catalog.
    ///
    /// Accepts both bare names ("aitoff") and the upstream `geo`-prefixed
    /// spelling ("geoAitoff"); matching is case-insensitive.
    pub fn by_name(name: &str) -> Option<Self> {
        let bare = name.strip_prefix("geo").unwrap_or(name);
        match bare.to_ascii_lowercase().as_str() {
            "equirectangular" => Some(Self::Equirectangular),
            "cylindricalequalarea" | "equalarea" => Some(Self::CylindricalEqualArea),
            "aitoff" => Some(Self::Aitoff),
            "robinson" => Some(Self::Robinson),
            _ => None,
        }
    }
}

/// A raw projection with an optional globe rotation applied up front.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RawProjection {
    pub kind: ProjectionKind,
    /// `[delta_lambda, delta_phi]` in degrees.
    pub rotate: [f64; 2],
}

impl RawProjection {
    pub fn new(kind: ProjectionKind) -> Self {
        Self {
            kind,
            rotate: [0.0, 0.0],
        }
    }

    pub fn with_rotate(kind: ProjectionKind, rotate: [f64; 2]) -> Self {
        Self { kind, rotate }
    }

    /// Projects geographic degrees to unscaled planar units.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> Vec2 {
        let (lambda, phi) = rotate_sphere(
            lon_deg * DEG2RAD,
            lat_deg * DEG2RAD,
            self.rotate[0] * DEG2RAD,
            self.rotate[1] * DEG2RAD,
        );

        let planar = match self.kind {
            ProjectionKind::Equirectangular => Vec2::new(lambda, phi),
            ProjectionKind::CylindricalEqualArea => Vec2::new(lambda, phi.sin()),
            ProjectionKind::Aitoff => aitoff(lambda, phi),
            ProjectionKind::Robinson => robinson(lambda, phi),
        };

        // Flip to screen convention: north maps to smaller y.
        Vec2::new(planar.x, -planar.y)
    }
}

fn rotate_sphere(lambda: f64, phi: f64, d_lambda: f64, d_phi: f64) -> (f64, f64) {
    let lambda = wrap_longitude(lambda + d_lambda);
    if d_phi == 0.0 {
        return (lambda, phi);
    }

    let cos_phi = phi.cos();
    let x = lambda.cos() * cos_phi;
    let y = lambda.sin() * cos_phi;
    let z = phi.sin();

    let (sin_dp, cos_dp) = d_phi.sin_cos();
    let k = z * cos_dp + x * sin_dp;
    (
        y.atan2(x * cos_dp - z * sin_dp),
        k.clamp(-1.0, 1.0).asin(),
    )
}

fn wrap_longitude(lambda: f64) -> f64 {
    let pi = std::f64::consts::PI;
    let two_pi = 2.0 * pi;
    let mut l = (lambda + pi) % two_pi;
    if l < 0.0 {
        l += two_pi;
    }
    l - pi
}

fn aitoff(lambda: f64, phi: f64) -> Vec2 {
    let half = lambda / 2.0;
    let alpha = (phi.cos() * half.cos()).clamp(-1.0, 1.0).acos();
    let sinc = if alpha == 0.0 { 1.0 } else { alpha.sin() / alpha };
    Vec2::new(2.0 * phi.cos() * half.sin() / sinc, phi.sin() / sinc)
}

fn robinson(lambda: f64, phi: f64) -> Vec2 {
    let abs_deg = (phi / DEG2RAD).abs().min(90.0);
    let slot = (abs_deg / 5.0).floor() as usize;
    let (lo, hi, t) = if slot >= ROBINSON_TABLE.len() - 1 {
        (ROBINSON_TABLE.len() - 1, ROBINSON_TABLE.len() - 1, 0.0)
    } else {
        (slot, slot + 1, (abs_deg - slot as f64 * 5.0) / 5.0)
    };

    let plen = ROBINSON_TABLE[lo][0] + (ROBINSON_TABLE[hi][0] - ROBINSON_TABLE[lo][0]) * t;
    let pdfe = ROBINSON_TABLE[lo][1] + (ROBINSON_TABLE[hi][1] - ROBINSON_TABLE[lo][1]) * t;

    Vec2::new(0.8487 * plen * lambda, 1.3523 * pdfe * phi.signum())
}
