//! Summary statistics over the requested area of a field.
//!
//! `roughness` is the mean absolute difference between 4-connected
//! neighbours; it shrinks as the persistence multiplier goes to zero because
//! fine-scale cells then differ from their neighbours only by interpolation.
use serde::Serialize;

use crate::field::ScalarField;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub std_dev: f32,
    /// Mean |Δ| between horizontal and vertical neighbours. 0 for a 1×1 area.
    pub roughness: f32,
}

pub fn compute_stats(field: &ScalarField) -> FieldStats {
    let n = field.requested_size();

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    let mut sum = 0f64;
    let mut sum_sq = 0f64;
    for (_, _, v) in field.requested_region() {
        min = min.min(v);
        max = max.max(v);
        sum += v as f64;
        sum_sq += (v as f64).powi(2);
    }
    let count = (n * n) as f64;
    let mean = sum / count;
    let var = (sum_sq / count - mean * mean).max(0.0);

    let mut diff_sum = 0f64;
    let mut pairs = 0usize;
    for x in 0..n {
        for y in 0..n {
            let v = field.get(x, y) as f64;
            if x + 1 < n {
                diff_sum += (field.get(x + 1, y) as f64 - v).abs();
                pairs += 1;
            }
            if y + 1 < n {
                diff_sum += (field.get(x, y + 1) as f64 - v).abs();
                pairs += 1;
            }
        }
    }
    let roughness = if pairs == 0 { 0.0 } else { diff_sum / pairs as f64 };

    FieldStats {
        min,
        max,
        mean: mean as f32,
        std_dev: var.sqrt() as f32,
        roughness: roughness as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn constant_field_has_zero_spread() {
        let f = ScalarField::from_parts(vec![0.25; 9], 3, 3);
        let s = compute_stats(&f);
        assert_eq!(s.min, 0.25);
        assert_eq!(s.max, 0.25);
        assert_abs_diff_eq!(s.mean, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(s.std_dev, 0.0, epsilon = 1e-6);
        assert_eq!(s.roughness, 0.0);
    }

    #[test]
    fn checkerboard_is_maximally_rough() {
        let data = (0..9).map(|i| if (i / 3 + i % 3) % 2 == 0 { 1.0 } else { 0.0 }).collect();
        let f = ScalarField::from_parts(data, 3, 3);
        let s = compute_stats(&f);
        assert_abs_diff_eq!(s.roughness, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(s.mean, 5.0 / 9.0, epsilon = 1e-6);
    }

    #[test]
    fn only_requested_area_counts() {
        let mut data = vec![0.5; 9];
        data[8] = 1.0; // (2, 2) lies outside a 2×2 request
        let f = ScalarField::from_parts(data, 2, 3);
        let s = compute_stats(&f);
        assert_eq!(s.max, 0.5);
        assert_eq!(s.roughness, 0.0);
    }
}
