//! Blade spine curves.
//!
//! A spine runs from the root at the origin to the tip at `(0, height, 0)` in
//! blade-local space. Local +Z is the bend side; the blade's width lies
//! along local X.

use glam::Vec3;

use super::synth::BladeType;

/// Quadratic or cubic Bézier spine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Spine {
    Quadratic([Vec3; 3]),
    Cubic([Vec3; 4]),
}

impl Spine {
    /// Build the unwound spine for a blade of the given style.
    ///
    /// Intermediate control points are pushed along +Z by `bend * height`
    /// scaled per style: an even arc, a root-heavy bend, or a tip-heavy bend.
    pub fn new(kind: BladeType, height: f32, bend: f32) -> Self {
        let root = Vec3::ZERO;
        let tip = Vec3::new(0.0, height, 0.0);
        let lean = bend * height;
        match kind {
            BladeType::Arc => Spine::Quadratic([root, Vec3::new(0.0, height * 0.5, lean), tip]),
            BladeType::LowBend => Spine::Cubic([
                root,
                Vec3::new(0.0, height * 0.25, lean * 0.9),
                Vec3::new(0.0, height * 0.6, lean * 0.5),
                tip,
            ]),
            BladeType::HighBend => Spine::Cubic([
                root,
                Vec3::new(0.0, height * 0.4, lean * 0.2),
                Vec3::new(0.0, height * 0.8, lean),
                tip,
            ]),
        }
    }

    pub fn control_points(&self) -> &[Vec3] {
        match self {
            Spine::Quadratic(p) => p,
            Spine::Cubic(p) => p,
        }
    }

    pub fn control_points_mut(&mut self) -> &mut [Vec3] {
        match self {
            Spine::Quadratic(p) => p,
            Spine::Cubic(p) => p,
        }
    }

    /// Position on the curve at `t` in [0, 1].
    pub fn point(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        match self {
            Spine::Quadratic([p0, p1, p2]) => *p0 * (u * u) + *p1 * (2.0 * u * t) + *p2 * (t * t),
            Spine::Cubic([p0, p1, p2, p3]) => {
                *p0 * (u * u * u)
                    + *p1 * (3.0 * u * u * t)
                    + *p2 * (3.0 * u * t * t)
                    + *p3 * (t * t * t)
            }
        }
    }

    /// Unnormalized derivative of the curve at `t`.
    pub fn derivative(&self, t: f32) -> Vec3 {
        let u = 1.0 - t;
        match self {
            Spine::Quadratic([p0, p1, p2]) => (*p1 - *p0) * (2.0 * u) + (*p2 - *p1) * (2.0 * t),
            Spine::Cubic([p0, p1, p2, p3]) => {
                (*p1 - *p0) * (3.0 * u * u) + (*p2 - *p1) * (6.0 * u * t) + (*p3 - *p2) * (3.0 * t * t)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [BladeType; 3] = [BladeType::Arc, BladeType::LowBend, BladeType::HighBend];

    #[test]
    fn test_endpoints() {
        for kind in KINDS {
            let spine = Spine::new(kind, 0.7, 0.3);
            assert_eq!(spine.point(0.0), Vec3::ZERO);
            assert!((spine.point(1.0) - Vec3::new(0.0, 0.7, 0.0)).length() < 1e-6);
        }
    }

    #[test]
    fn test_point_count_by_style() {
        assert_eq!(Spine::new(BladeType::Arc, 1.0, 0.2).control_points().len(), 3);
        assert_eq!(Spine::new(BladeType::LowBend, 1.0, 0.2).control_points().len(), 4);
        assert_eq!(Spine::new(BladeType::HighBend, 1.0, 0.2).control_points().len(), 4);
    }

    #[test]
    fn test_derivative_matches_finite_difference() {
        for kind in KINDS {
            let spine = Spine::new(kind, 0.9, 0.4);
            for i in 1..10 {
                let t = i as f32 / 10.0;
                let h = 1e-3;
                let fd = (spine.point(t + h) - spine.point(t - h)) / (2.0 * h);
                assert!((fd - spine.derivative(t)).length() < 1e-2, "{kind:?} t={t}");
            }
        }
    }

    #[test]
    fn test_style_moves_peak_bend() {
        let low = Spine::new(BladeType::LowBend, 1.0, 0.5);
        let high = Spine::new(BladeType::HighBend, 1.0, 0.5);
        // Root-heavy style leans further early; tip-heavy later.
        assert!(low.point(0.25).z > high.point(0.25).z);
        assert!(high.point(0.75).z > low.point(0.75).z);
    }

    #[test]
    fn test_zero_bend_is_straight() {
        for kind in KINDS {
            let spine = Spine::new(kind, 0.5, 0.0);
            for i in 0..=8 {
                let p = spine.point(i as f32 / 8.0);
                assert_eq!(p.z, 0.0);
                assert_eq!(p.x, 0.0);
            }
        }
    }
}
