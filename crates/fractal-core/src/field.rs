use std::ops::Index;

use serde::{Deserialize, Serialize};

/// A square scalar field with values in `[0, 1]`, stored as one contiguous
/// row-major buffer indexed by `x * array_size + y`.
///
/// `array_size` is the working side (always `2^k + 1`); `requested_size` is the
/// side the caller asked for. Callers that only want the requested area should
/// sample `0..requested_size` on both axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarField {
    data: Vec<f32>,
    requested_size: usize,
    array_size: usize,
}

impl ScalarField {
    /// Wrap a fully written buffer. `data.len()` must be `array_size²`.
    pub(crate) fn from_parts(data: Vec<f32>, requested_size: usize, array_size: usize) -> Self {
        debug_assert_eq!(data.len(), array_size * array_size);
        Self { data, requested_size, array_size }
    }

    #[inline]
    pub fn requested_size(&self) -> usize {
        self.requested_size
    }

    #[inline]
    pub fn array_size(&self) -> usize {
        self.array_size
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[x * self.array_size + y]
    }

    /// The `array_size` values sharing first index `x`, i.e. `field[x]`.
    #[inline]
    pub fn row(&self, x: usize) -> &[f32] {
        let start = x * self.array_size;
        &self.data[start..start + self.array_size]
    }

    /// Every value of the working grid, row-major.
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    /// `(x, y, value)` over the requested `requested_size × requested_size` area.
    pub fn requested_region(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        let n = self.requested_size;
        (0..n).flat_map(move |x| (0..n).map(move |y| (x, y, self.get(x, y))))
    }

    pub fn min_value(&self) -> f32 {
        self.data.iter().cloned().fold(f32::INFINITY, f32::min)
    }

    pub fn max_value(&self) -> f32 {
        self.data.iter().cloned().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Sample at normalised coordinates `(u, v)` in `[0, 1]²` over the
    /// requested area using bilinear interpolation.
    /// Returns None outside that square.
    pub fn sample(&self, u: f64, v: f64) -> Option<f32> {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return None;
        }
        let last = self.requested_size.saturating_sub(1);
        let fx = u * last as f64;
        let fy = v * last as f64;

        let x0 = fx.floor() as usize;
        let y0 = fy.floor() as usize;
        let x1 = (x0 + 1).min(last);
        let y1 = (y0 + 1).min(last);

        let tx = (fx - x0 as f64) as f32;
        let ty = (fy - y0 as f64) as f32;

        let v00 = self.get(x0, y0);
        let v10 = self.get(x1, y0);
        let v01 = self.get(x0, y1);
        let v11 = self.get(x1, y1);

        Some(
            v00 * (1.0 - tx) * (1.0 - ty)
                + v10 * tx * (1.0 - ty)
                + v01 * (1.0 - tx) * ty
                + v11 * tx * ty,
        )
    }
}

impl Index<usize> for ScalarField {
    type Output = [f32];

    #[inline]
    fn index(&self, x: usize) -> &[f32] {
        self.row(x)
    }
}

impl Index<(usize, usize)> for ScalarField {
    type Output = f32;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &f32 {
        &self.data[x * self.array_size + y]
    }
}
