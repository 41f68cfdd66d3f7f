use foundation::bounds::Aabb2;
use foundation::math::{RawProjection, Vec2};
use formats::settings::OffsetSettings;

/// Pixel margins around the chart graph area.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Margin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margin {
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// Inputs of one fit computation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportConfig {
    /// Container size in pixels.
    pub width: f64,
    pub height: f64,
    pub margin: Margin,
    /// Fractional paddings beyond the fitted map bounds.
    pub offset: OffsetSettings,
    /// User-facing zoom multiplier, >= 0.
    pub scale: f64,
    /// Crop (true) instead of stretching to fill (false).
    pub preserve_aspect_ratio: bool,
}

/// Scale/translate applied to raw projected coordinates.
///
/// Owned exclusively by the fit; recomputed on every call so a resize can
/// never leave a stale transform behind.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapTransform {
    pub scale: f64,
    pub translate: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// Zero-size container: the whole draw cycle must be aborted and
    /// retried on the next resize.
    EmptyContainer { width: f64, height: f64 },
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::EmptyContainer { width, height } => {
                write!(f, "container is too little or has no size: {width}x{height}")
            }
        }
    }
}

impl std::error::Error for FitError {}

/// The result of fitting a map's bounding box into a viewport: the
/// projection transform plus the skew function mapping projected pixels to
/// final container pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportFit {
    pub transform: MapTransform,
    /// Dimensions of the map itself, regardless of cropping.
    pub map_width: f64,
    pub map_height: f64,
    /// Dimensions of the rendered viewport (can be bigger or smaller than
    /// the map).
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub map_top_offset: f64,
    pub map_left_offset: f64,
    width_scale: f64,
    height_scale: f64,
    container_width: f64,
    container_height: f64,
    margin: Margin,
}

impl ViewportFit {
    /// Computes the fit. Deterministic: identical inputs produce
    /// bit-identical outputs.
    pub fn fit(bounds: Aabb2, config: &ViewportConfig) -> Result<Self, FitError> {
        let w = config.width;
        let h = config.height;
        if !(w > 0.0) || !(h > 0.0) {
            return Err(FitError::EmptyContainer {
                width: w,
                height: h,
            });
        }

        let offset = config.offset;
        let bw = bounds.width();
        let bh = bounds.height();

        // Fit the longer relative dimension to the viewport, preserving the
        // aspect ratio of the underlying projection. A degenerate bounding
        // box must not divide by zero.
        let ratio = (bw / w).max(bh / h);
        let s = config.scale / non_zero(ratio);

        let map_width = s * bw;
        let map_height = s * bh;

        let mut viewport_width = map_width * (1.0 + offset.left + offset.right);
        let mut viewport_height = map_height * (1.0 + offset.top + offset.bottom);
        let map_top_offset = map_height * offset.top;
        let map_left_offset = map_width * offset.left;

        // Translate the projection to the middle of the map.
        let translate = Vec2::new(
            (map_width - s * (bounds.max[0] + bounds.min[0])) / 2.0,
            (map_height - s * (bounds.max[1] + bounds.min[1])) / 2.0,
        );

        let (width_scale, height_scale) = if config.preserve_aspect_ratio {
            // No stretching; the viewport crops instead.
            (1.0, 1.0)
        } else {
            // The offsets were computed against the map-sized reference box;
            // the actual viewport fills the whole container.
            viewport_width = w * config.scale;
            viewport_height = h * config.scale;
            (
                viewport_width / non_zero(map_width) / (1.0 + offset.left + offset.right),
                viewport_height / non_zero(map_height) / (1.0 + offset.top + offset.bottom),
            )
        };

        Ok(Self {
            transform: MapTransform { scale: s, translate },
            map_width,
            map_height,
            viewport_width,
            viewport_height,
            map_top_offset,
            map_left_offset,
            width_scale,
            height_scale,
            container_width: w,
            container_height: h,
            margin: config.margin,
        })
    }

    /// Applies the projection transform to a raw projected point.
    pub fn apply(&self, p: Vec2) -> Vec2 {
        p.scale(self.transform.scale) + self.transform.translate
    }

    /// The skew function: pixel location after projection in, pixel
    /// location in the container out. Accounts for viewport stretch/crop
    /// and offset padding, and centers the map in the container.
    pub fn skew(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x * self.width_scale
                + (self.container_width - self.viewport_width) / 2.0
                + self.map_left_offset * self.width_scale,
            p.y * self.height_scale
                + (self.container_height - self.viewport_height) / 2.0
                + self.map_top_offset * self.height_scale,
        )
    }

    /// Full pipeline: geographic degrees to final container pixels.
    pub fn project(&self, raw: &RawProjection, lon_deg: f64, lat_deg: f64) -> Vec2 {
        self.skew(self.apply(raw.forward(lon_deg, lat_deg)))
    }

    /// Where the rendering surface should be placed inside the container.
    pub fn surface_origin(&self) -> Vec2 {
        Vec2::new(
            self.margin.left + (self.container_width - self.viewport_width) / 2.0,
            self.margin.top + (self.container_height - self.viewport_height) / 2.0,
        )
    }

    /// Where the graph group is translated to (margins only).
    pub fn graph_origin(&self) -> Vec2 {
        Vec2::new(self.margin.left, self.margin.top)
    }
}

fn non_zero(v: f64) -> f64 {
    if v.is_finite() && v != 0.0 { v } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::{Margin, ViewportConfig, ViewportFit};
    use foundation::bounds::Aabb2;
    use foundation::math::Vec2;
    use formats::settings::OffsetSettings;

    fn world_bounds() -> Aabb2 {
        Aabb2::new([-3.04, -1.49], [3.05, 1.57])
    }

    fn config(width: f64, height: f64, preserve: bool) -> ViewportConfig {
        ViewportConfig {
            width,
            height,
            margin: Margin::default(),
            offset: OffsetSettings::default(),
            scale: 1.1,
            preserve_aspect_ratio: preserve,
        }
    }

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn scenario_800x400_matches_hand_computation() {
        // bounds 6.09 x 3.06 in a 800x400 container at zoom 1.1: the
        // vertical ratio 3.06/400 dominates.
        let fit = ViewportFit::fit(world_bounds(), &config(800.0, 400.0, true)).expect("fit");

        let s = 1.1 / (3.06 / 400.0);
        assert_close(fit.transform.scale, s, 1e-9);
        assert_close(fit.transform.translate.x, s * 3.04, 1e-9);
        assert_close(fit.transform.translate.y, s * 1.49, 1e-9);
        assert_close(fit.map_height, 440.0, 1e-9);
    }

    #[test]
    fn fit_is_idempotent() {
        let a = ViewportFit::fit(world_bounds(), &config(800.0, 400.0, false)).expect("fit");
        let b = ViewportFit::fit(world_bounds(), &config(800.0, 400.0, false)).expect("fit");
        assert_eq!(a, b);
    }

    #[test]
    fn bounds_center_lands_at_viewport_center() {
        let fit = ViewportFit::fit(world_bounds(), &config(800.0, 400.0, true)).expect("fit");
        let center = fit.skew(fit.apply(world_bounds().center()));
        assert_close(center.x, 400.0, 1e-9);
        assert_close(center.y, 200.0, 1e-9);
    }

    #[test]
    fn stretch_mode_fills_the_scaled_container() {
        let fit = ViewportFit::fit(world_bounds(), &config(800.0, 400.0, false)).expect("fit");
        assert_eq!(fit.viewport_width, 800.0 * 1.1);
        assert_eq!(fit.viewport_height, 400.0 * 1.1);
    }

    #[test]
    fn zero_container_aborts_the_fit() {
        assert!(ViewportFit::fit(world_bounds(), &config(0.0, 400.0, true)).is_err());
        assert!(ViewportFit::fit(world_bounds(), &config(800.0, 0.0, true)).is_err());
    }

    #[test]
    fn degenerate_bounds_do_not_divide_by_zero() {
        let degenerate = Aabb2::new([1.0, 1.0], [1.0, 1.0]);
        let fit = ViewportFit::fit(degenerate, &config(800.0, 400.0, true)).expect("fit");
        assert!(fit.transform.scale.is_finite());
        assert!(fit.skew(fit.apply(Vec2::new(1.0, 1.0))).x.is_finite());
    }

    #[test]
    fn margins_move_the_graph_origin_only() {
        let mut cfg = config(800.0, 400.0, true);
        cfg.margin = Margin::new(20.0, 20.0, 30.0, 20.0);
        let fit = ViewportFit::fit(world_bounds(), &cfg).expect("fit");

        assert_eq!(fit.graph_origin(), Vec2::new(20.0, 20.0));
        let surface = fit.surface_origin();
        assert_eq!(
            surface,
            Vec2::new(
                20.0 + (800.0 - fit.viewport_width) / 2.0,
                20.0 + (400.0 - fit.viewport_height) / 2.0
            )
        );

        // The skew itself is margin-independent.
        let plain = ViewportFit::fit(world_bounds(), &config(800.0, 400.0, true)).expect("fit");
        let p = world_bounds().center();
        assert_eq!(fit.skew(fit.apply(p)), plain.skew(plain.apply(p)));
    }

    #[test]
    fn offsets_shift_the_projected_points() {
        let mut cfg = config(800.0, 400.0, true);
        cfg.offset = OffsetSettings {
            top: 0.05,
            right: 0.0,
            bottom: -0.2,
            left: -0.15,
        };
        let plain = ViewportFit::fit(world_bounds(), &config(800.0, 400.0, true)).expect("fit");
        let padded = ViewportFit::fit(world_bounds(), &cfg).expect("fit");

        let p = world_bounds().center();
        let a = plain.skew(plain.apply(p));
        let b = padded.skew(padded.apply(p));
        assert!(a != b);
        assert_close(padded.map_top_offset, padded.map_height * 0.05, 1e-12);
    }
}
