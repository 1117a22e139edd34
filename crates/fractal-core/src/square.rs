//! Edge-midpoint policies for the square step.
//!
//! The diamond step is shared by every variant; only the way an edge midpoint
//! is derived from its two edge corners and the subsquare centre differs.

use crate::random::RandomSource;

/// Computes the unclamped value of one edge midpoint.
///
/// `a` and `b` are the two subsquare corners sharing the edge, `center` is
/// the value the diamond step just wrote.
pub trait SquareStep {
    /// Variant name used in log output.
    const NAME: &'static str;

    fn edge_value(a: f32, b: f32, center: f32, roughness: f32, source: &mut RandomSource) -> f32;
}

/// Diamond-square: mean of both corners and the centre, plus one
/// independent displacement draw scaled by roughness.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noisy;

impl SquareStep for Noisy {
    const NAME: &'static str = "diamond-square";

    #[inline]
    fn edge_value(a: f32, b: f32, center: f32, roughness: f32, source: &mut RandomSource) -> f32 {
        (a + center + b) / 3.0 + source.signed() * roughness
    }
}

/// Plasma: plain mean of the two corners. Consumes no draw.
#[derive(Debug, Clone, Copy, Default)]
pub struct Smooth;

impl SquareStep for Smooth {
    const NAME: &'static str = "plasma";

    #[inline]
    fn edge_value(a: f32, b: f32, _center: f32, _roughness: f32, _source: &mut RandomSource) -> f32 {
        (a + b) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn smooth_is_linear_interpolant() {
        let mut src = RandomSource::seeded(1);
        let v = Smooth::edge_value(0.2, 0.6, 0.9, 5.0, &mut src);
        assert_abs_diff_eq!(v, 0.4, epsilon = 1e-6);
    }

    #[test]
    fn smooth_consumes_no_draw() {
        let mut used = RandomSource::seeded(9);
        let mut fresh = RandomSource::seeded(9);
        Smooth::edge_value(0.1, 0.3, 0.5, 1.0, &mut used);
        assert_eq!(used.signed().to_bits(), fresh.signed().to_bits());
    }

    #[test]
    fn noisy_with_zero_roughness_is_three_point_mean() {
        let mut src = RandomSource::seeded(2);
        let v = Noisy::edge_value(0.3, 0.6, 0.9, 0.0, &mut src);
        assert_abs_diff_eq!(v, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn noisy_displacement_is_bounded_by_roughness() {
        let mut src = RandomSource::seeded(3);
        for _ in 0..1000 {
            let v = Noisy::edge_value(0.5, 0.5, 0.5, 0.25, &mut src);
            assert!((0.25..=0.75).contains(&v), "edge value {v}");
        }
    }
}
