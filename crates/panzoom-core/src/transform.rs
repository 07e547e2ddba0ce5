//! Transform applier: translation + uniform scale for the pan/zoom target.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Current 2D transform of the target element.
///
/// Maps the element's local coordinates into its parent coordinate space:
/// `parent = local * scale + translation`. Scale is always positive and finite;
/// translation is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Current translation offset (pan).
    pub translation: Vec2,
    /// Current uniform scale.
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        translation: Vec2::ZERO,
        scale: 1.0,
    };

    /// Create a transform from a translation and a scale.
    ///
    /// A non-positive or non-finite scale falls back to `1.0`.
    pub fn new(translation: Vec2, scale: f64) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        Self { translation, scale }
    }

    /// Read a transform back from an affine matrix.
    ///
    /// Only the uniform-scale + translation part is kept; skew and rotation are
    /// dropped. The scale is taken from the length of the first basis vector.
    pub fn from_affine(affine: Affine) -> Self {
        let [a, b, _c, _d, e, f] = affine.as_coeffs();
        Self::new(Vec2::new(e, f), a.hypot(b))
    }

    /// Get the affine transform (local → parent).
    pub fn to_affine(&self) -> Affine {
        Affine::translate(self.translation) * Affine::scale(self.scale)
    }

    /// Format as an SVG `transform` attribute value.
    pub fn to_svg_matrix(&self) -> String {
        format!(
            "matrix({} 0 0 {} {} {})",
            self.scale, self.scale, self.translation.x, self.translation.y
        )
    }

    /// Map a local point into parent space.
    pub fn apply(&self, local: Point) -> Point {
        self.to_affine() * local
    }

    /// Map a parent-space point back into local coordinates.
    pub fn invert(&self, parent: Point) -> Point {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.translation) * parent
    }

    /// Pan by a delta; scale unchanged.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.translation += delta;
    }

    /// Set the absolute translation; scale unchanged.
    pub fn pan_to(&mut self, translation: Vec2) {
        self.translation = translation;
    }

    /// Rescale by `multiplier`, keeping `pivot` (in parent space) fixed.
    ///
    /// Returns `false` and leaves the transform untouched when the multiplier
    /// is not a finite positive number, or when the resulting scale would not
    /// be.
    pub fn zoom_at(&mut self, pivot: Point, multiplier: f64) -> bool {
        if !multiplier.is_finite() || multiplier <= 0.0 {
            return false;
        }
        let scale = self.scale * multiplier;
        if !scale.is_finite() || scale <= 0.0 {
            return false;
        }

        let pivot = pivot.to_vec2();
        self.translation = pivot - (pivot - self.translation) * multiplier;
        self.scale = scale;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn assert_point_eq(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < EPS, "x: {} != {}", a.x, b.x);
        assert!((a.y - b.y).abs() < EPS, "y: {} != {}", a.y, b.y);
    }

    #[test]
    fn test_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.translation, Vec2::ZERO);
        assert!((t.scale - 1.0).abs() < f64::EPSILON);
        assert_eq!(t.to_affine(), Affine::IDENTITY);
    }

    #[test]
    fn test_new_rejects_bad_scale() {
        assert!((Transform::new(Vec2::ZERO, 0.0).scale - 1.0).abs() < f64::EPSILON);
        assert!((Transform::new(Vec2::ZERO, -2.0).scale - 1.0).abs() < f64::EPSILON);
        assert!((Transform::new(Vec2::ZERO, f64::NAN).scale - 1.0).abs() < f64::EPSILON);
        assert!((Transform::new(Vec2::ZERO, 2.5).scale - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan_accumulates_vector_sum() {
        let mut t = Transform::new(Vec2::new(3.0, -4.0), 1.7);
        let deltas = [
            Vec2::new(1.0, 2.0),
            Vec2::new(-5.5, 0.25),
            Vec2::new(10.0, -7.0),
            Vec2::new(0.0, 0.0),
        ];
        for d in deltas {
            t.pan_by(d);
        }
        let sum: Vec2 = deltas.iter().fold(Vec2::ZERO, |acc, d| acc + *d);
        assert!((t.translation.x - (3.0 + sum.x)).abs() < EPS);
        assert!((t.translation.y - (-4.0 + sum.y)).abs() < EPS);
        assert!((t.scale - 1.7).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan_to_keeps_scale() {
        let mut t = Transform::new(Vec2::new(1.0, 1.0), 3.0);
        t.pan_to(Vec2::new(-20.0, 40.0));
        assert_eq!(t.translation, Vec2::new(-20.0, 40.0));
        assert!((t.scale - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_at_keeps_pivot_fixed() {
        let priors = [
            Transform::IDENTITY,
            Transform::new(Vec2::new(35.0, -12.0), 0.4),
            Transform::new(Vec2::new(-200.0, 80.0), 6.25),
        ];
        let pivots = [Point::ZERO, Point::new(150.0, 100.0), Point::new(-3.5, 999.0)];
        let multipliers = [0.935, 1.065, 2.0, 0.01];

        for prior in priors {
            for pivot in pivots {
                for m in multipliers {
                    let mut t = prior;
                    let local_before = t.invert(pivot);
                    assert!(t.zoom_at(pivot, m));
                    assert_point_eq(t.apply(local_before), pivot);
                }
            }
        }
    }

    #[test]
    fn test_zoom_compounds_multiplicatively() {
        let pivot = Point::new(40.0, 60.0);
        let mut stepwise = Transform::new(Vec2::new(5.0, 5.0), 1.2);
        let mut direct = stepwise;

        stepwise.zoom_at(pivot, 1.065);
        stepwise.zoom_at(pivot, 0.935);
        direct.zoom_at(pivot, 1.065 * 0.935);

        assert!((stepwise.scale - direct.scale).abs() < EPS);
        assert!((stepwise.translation.x - direct.translation.x).abs() < EPS);
        assert!((stepwise.translation.y - direct.translation.y).abs() < EPS);
    }

    #[test]
    fn test_zoom_rejects_non_positive_multiplier() {
        let mut t = Transform::new(Vec2::new(1.0, 2.0), 2.0);
        let before = t;
        assert!(!t.zoom_at(Point::new(10.0, 10.0), 0.0));
        assert!(!t.zoom_at(Point::new(10.0, 10.0), -1.0));
        assert!(!t.zoom_at(Point::new(10.0, 10.0), f64::INFINITY));
        assert_eq!(t, before);
    }

    #[test]
    fn test_affine_roundtrip() {
        let t = Transform::new(Vec2::new(-7.5, 12.0), 0.5);
        let back = Transform::from_affine(t.to_affine());
        assert!((back.scale - t.scale).abs() < EPS);
        assert!((back.translation.x - t.translation.x).abs() < EPS);
        assert!((back.translation.y - t.translation.y).abs() < EPS);
    }

    #[test]
    fn test_svg_matrix() {
        let t = Transform::new(Vec2::new(10.0, -4.5), 2.0);
        assert_eq!(t.to_svg_matrix(), "matrix(2 0 0 2 10 -4.5)");
    }
}
