//! Recursive midpoint-displacement generator.
//!
//! Corners are seeded from the unit range, then the full grid is subdivided
//! depth-first: each diamond step writes a subsquare centre, the square step
//! writes its four edge midpoints, and the four quadrants recurse with
//! roughness scaled by the persistence multiplier. Recursion stops when a
//! subsquare has width 1.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, trace};

use crate::error::FieldError;
use crate::field::ScalarField;
use crate::random::{RandomSource, Seed};
use crate::sizing::{array_size_for, clamp};
use crate::square::{Noisy, Smooth, SquareStep};

/// Noisy centre and noisy edges.
pub type DiamondSquare = MidpointGenerator<Noisy>;
/// Noisy centre, interpolated edges.
pub type Plasma = MidpointGenerator<Smooth>;

/// Parameters of one `generate` call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorParams {
    /// Requested side length. The working grid is rounded up to `2^k + 1`.
    pub size: usize,
    /// Displacement amplitude at the top level.
    pub initial_roughness: f32,
    /// Roughness multiplier applied at every descent into a quadrant.
    pub persistence: f32,
}

impl GeneratorParams {
    pub fn new(size: usize, initial_roughness: f32, persistence: f32) -> Self {
        Self { size, initial_roughness, persistence }
    }

    /// Check the parameters and return the working grid side.
    fn validate(&self) -> Result<usize, FieldError> {
        if !self.initial_roughness.is_finite() {
            return Err(FieldError::InvalidParameter {
                name: "initial_roughness",
                value: self.initial_roughness,
            });
        }
        if !self.persistence.is_finite() {
            return Err(FieldError::InvalidParameter {
                name: "persistence",
                value: self.persistence,
            });
        }
        array_size_for(self.size)
    }
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self { size: 256, initial_roughness: 1.0, persistence: 0.5 }
    }
}

/// Owns one random stream and at most one generated field.
///
/// The square-step policy `S` selects the variant. Not `Clone`: the random
/// stream is unique to the instance. Clone the field instead.
#[derive(Debug)]
pub struct MidpointGenerator<S: SquareStep> {
    source: RandomSource,
    field: Option<ScalarField>,
    params: Option<GeneratorParams>,
    _step: PhantomData<S>,
}

impl<S: SquareStep> MidpointGenerator<S> {
    /// Construct and immediately generate.
    pub fn new(params: GeneratorParams, seed: Seed) -> Result<Self, FieldError> {
        let mut generator = Self::empty(seed);
        generator.generate(params)?;
        Ok(generator)
    }

    /// A generator with no field yet.
    pub fn empty(seed: Seed) -> Self {
        Self::with_source(RandomSource::new(seed))
    }

    pub fn with_source(source: RandomSource) -> Self {
        Self { source, field: None, params: None, _step: PhantomData }
    }

    /// Replace the current field with a freshly generated one.
    ///
    /// On error (including `size == 0`) the previous field is left untouched.
    pub fn generate(&mut self, params: GeneratorParams) -> Result<&ScalarField, FieldError> {
        let array_size = params.validate()?;
        let _span = debug_span!(
            "generate",
            variant = S::NAME,
            requested_size = params.size,
            array_size
        )
        .entered();

        // Release the old grid before allocating the new one.
        self.field = None;
        self.params = None;

        let mut fill = Fill::<S> {
            canvas: Canvas::new(array_size),
            source: &mut self.source,
            persistence: params.persistence,
            _step: PhantomData,
        };
        fill.seed_corners();
        let last = array_size - 1;
        fill.diamond(Quad { x0: 0, x1: last, y0: 0, y1: last }, params.initial_roughness);
        let field = fill.canvas.finish(params.size);

        debug!(variant = S::NAME, requested_size = params.size, array_size, "field generated");
        self.params = Some(params);
        Ok(self.field.insert(field))
    }

    /// The current field, or None before the first successful `generate`.
    pub fn field(&self) -> Option<&ScalarField> {
        self.field.as_ref()
    }

    /// Parameters of the current field.
    pub fn params(&self) -> Option<GeneratorParams> {
        self.params
    }

    pub fn requested_size(&self) -> Option<usize> {
        self.field.as_ref().map(ScalarField::requested_size)
    }

    pub fn array_size(&self) -> Option<usize> {
        self.field.as_ref().map(ScalarField::array_size)
    }

    pub fn into_field(self) -> Option<ScalarField> {
        self.field
    }
}

// ── Fill state ───────────────────────────────────────────────────────────────

/// Inclusive index bounds of a subsquare.
#[derive(Debug, Clone, Copy)]
struct Quad {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
}

impl Quad {
    /// Integer bisection, or None once the subsquare has width or height 1.
    fn center(&self) -> Option<(usize, usize)> {
        let xc = self.x0 + (self.x1 - self.x0) / 2;
        let yc = self.y0 + (self.y1 - self.y0) / 2;
        if xc == self.x0 || yc == self.y0 {
            None
        } else {
            Some((xc, yc))
        }
    }

    /// Top-left, top-right, bottom-left, bottom-right.
    fn quadrants(&self, xc: usize, yc: usize) -> [Quad; 4] {
        [
            Quad { x0: self.x0, x1: xc, y0: self.y0, y1: yc },
            Quad { x0: xc, x1: self.x1, y0: self.y0, y1: yc },
            Quad { x0: self.x0, x1: xc, y0: yc, y1: self.y1 },
            Quad { x0: xc, x1: self.x1, y0: yc, y1: self.y1 },
        ]
    }
}

/// Grid under construction plus a mask of cells already written.
struct Canvas {
    data: Vec<f32>,
    written: Vec<bool>,
    size: usize,
    #[cfg(test)]
    writes: Vec<u32>,
}

impl Canvas {
    fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            written: vec![false; size * size],
            size,
            #[cfg(test)]
            writes: vec![0; size * size],
        }
    }

    #[inline]
    fn get(&self, x: usize, y: usize) -> f32 {
        self.data[x * self.size + y]
    }

    #[inline]
    fn is_written(&self, x: usize, y: usize) -> bool {
        self.written[x * self.size + y]
    }

    #[inline]
    fn write(&mut self, x: usize, y: usize, value: f32) {
        let idx = x * self.size + y;
        debug_assert!(!self.written[idx], "cell ({x}, {y}) written twice");
        self.data[idx] = value;
        self.written[idx] = true;
        #[cfg(test)]
        {
            self.writes[idx] += 1;
        }
        trace!(x, y, value, "cell");
    }

    fn finish(self, requested_size: usize) -> ScalarField {
        debug_assert!(self.written.iter().all(|&w| w), "unwritten cells left in field");
        ScalarField::from_parts(self.data, requested_size, self.size)
    }
}

struct Fill<'a, S> {
    canvas: Canvas,
    source: &'a mut RandomSource,
    persistence: f32,
    _step: PhantomData<S>,
}

impl<S: SquareStep> Fill<'_, S> {
    /// Top-left, top-right, bottom-left, bottom-right, one unit draw each.
    fn seed_corners(&mut self) {
        let last = self.canvas.size - 1;
        for (x, y) in [(0, 0), (0, last), (last, 0), (last, last)] {
            let value = self.source.unit();
            self.canvas.write(x, y, value);
        }
    }

    fn diamond(&mut self, q: Quad, roughness: f32) {
        let Some((xc, yc)) = q.center() else {
            return;
        };

        let c = &self.canvas;
        let avg = (c.get(q.x0, q.y0) + c.get(q.x0, q.y1) + c.get(q.x1, q.y0) + c.get(q.x1, q.y1)) / 4.0;
        let value = clamp(0.0, 1.0, avg + self.source.signed() * roughness);
        self.canvas.write(xc, yc, value);

        self.square(q, xc, yc, roughness);

        let next = roughness * self.persistence;
        for quad in q.quadrants(xc, yc) {
            self.diamond(quad, next);
        }
    }

    /// Edge midpoints in order top, bottom, left, right. A midpoint shared
    /// with an already processed neighbour keeps its value and takes no draw.
    fn square(&mut self, q: Quad, xc: usize, yc: usize, roughness: f32) {
        let center = self.canvas.get(xc, yc);
        let edges = [
            ((xc, q.y0), (q.x0, q.y0), (q.x1, q.y0)),
            ((xc, q.y1), (q.x0, q.y1), (q.x1, q.y1)),
            ((q.x0, yc), (q.x0, q.y0), (q.x0, q.y1)),
            ((q.x1, yc), (q.x1, q.y0), (q.x1, q.y1)),
        ];
        for ((x, y), (ax, ay), (bx, by)) in edges {
            if self.canvas.is_written(x, y) {
                continue;
            }
            let a = self.canvas.get(ax, ay);
            let b = self.canvas.get(bx, by);
            let value = S::edge_value(a, b, center, roughness, self.source);
            self.canvas.write(x, y, clamp(0.0, 1.0, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params(size: usize, roughness: f32, persistence: f32) -> GeneratorParams {
        GeneratorParams::new(size, roughness, persistence)
    }

    /// Run a full fill and return how often each cell was written.
    fn write_counts<S: SquareStep>(array_size: usize, seed: u64) -> Vec<u32> {
        let mut source = RandomSource::seeded(seed);
        let mut fill = Fill::<S> {
            canvas: Canvas::new(array_size),
            source: &mut source,
            persistence: 0.5,
            _step: PhantomData,
        };
        fill.seed_corners();
        let last = array_size - 1;
        fill.diamond(Quad { x0: 0, x1: last, y0: 0, y1: last }, 1.0);
        fill.canvas.writes
    }

    #[test]
    fn every_cell_written_exactly_once() {
        for n in [3, 5, 9, 17, 65] {
            for (variant, counts) in [
                (Noisy::NAME, write_counts::<Noisy>(n, 12)),
                (Smooth::NAME, write_counts::<Smooth>(n, 12)),
            ] {
                assert_eq!(counts.len(), n * n);
                if let Some(idx) = counts.iter().position(|&c| c != 1) {
                    panic!(
                        "{variant} {n}x{n}: cell ({}, {}) written {} times",
                        idx / n,
                        idx % n,
                        counts[idx]
                    );
                }
            }
        }
    }

    #[test]
    fn generate_rejects_unallocatable_size() {
        let mut ds = DiamondSquare::empty(Seed::Fixed(1));
        assert!(matches!(
            ds.generate(params(1 << 31, 1.0, 0.5)),
            Err(FieldError::TooLarge { .. })
        ));
        assert!(ds.field().is_none());
    }

    #[test]
    fn quad_center_degenerates_at_width_one() {
        assert!(Quad { x0: 3, x1: 4, y0: 3, y1: 4 }.center().is_none());
        assert_eq!(Quad { x0: 0, x1: 4, y0: 0, y1: 4 }.center(), Some((2, 2)));
    }

    #[test]
    fn corners_are_first_four_unit_draws() {
        let ds = DiamondSquare::new(params(9, 1.0, 0.5), Seed::Fixed(5)).unwrap();
        let f = ds.field().unwrap();
        let mut src = RandomSource::seeded(5);
        let expected: Vec<f32> = (0..4).map(|_| src.unit()).collect();
        let last = f.array_size() - 1;
        assert_eq!(f[0][0], expected[0]);
        assert_eq!(f[0][last], expected[1]);
        assert_eq!(f[last][0], expected[2]);
        assert_eq!(f[last][last], expected[3]);
        assert_ne!(expected[0], expected[1]);
    }

    #[test]
    fn centre_of_size_three_uses_fifth_draw() {
        let ds = DiamondSquare::new(params(3, 0.5, 0.5), Seed::Fixed(8)).unwrap();
        let f = ds.field().unwrap();
        let mut src = RandomSource::seeded(8);
        let c: Vec<f32> = (0..4).map(|_| src.unit()).collect();
        let avg = (c[0] + c[1] + c[2] + c[3]) / 4.0;
        let expected = clamp(0.0, 1.0, avg + src.signed() * 0.5);
        assert_eq!(f[1][1], expected);
    }

    #[test]
    fn zero_roughness_gives_pure_means() {
        let p = Plasma::new(params(5, 0.0, 0.5), Seed::Fixed(1)).unwrap();
        let f = p.field().unwrap();
        let centre = (f[0][0] + f[0][4] + f[4][0] + f[4][4]) / 4.0;
        assert_abs_diff_eq!(f[2][2], centre, epsilon = 1e-6);
        assert_abs_diff_eq!(f[2][0], (f[0][0] + f[4][0]) / 2.0, epsilon = 1e-6);
    }

    #[test]
    fn generate_replaces_field() {
        let mut ds = DiamondSquare::new(params(5, 1.0, 0.5), Seed::Fixed(2)).unwrap();
        assert_eq!(ds.array_size(), Some(5));
        ds.generate(params(20, 1.0, 0.5)).unwrap();
        assert_eq!(ds.requested_size(), Some(20));
        assert_eq!(ds.array_size(), Some(33));
        assert_eq!(ds.field().unwrap().values().len(), 33 * 33);
        assert_eq!(ds.params(), Some(params(20, 1.0, 0.5)));
    }

    #[test]
    fn zero_size_keeps_previous_field() {
        let mut ds = DiamondSquare::new(params(9, 1.0, 0.5), Seed::Fixed(4)).unwrap();
        let before = ds.field().unwrap().clone();
        assert_eq!(ds.generate(params(0, 1.0, 0.5)).unwrap_err(), FieldError::ZeroSize);
        assert_eq!(ds.field(), Some(&before));
    }

    #[test]
    fn zero_size_on_first_use_leaves_no_field() {
        assert_eq!(
            Plasma::new(params(0, 1.0, 0.5), Seed::Fixed(1)).unwrap_err(),
            FieldError::ZeroSize
        );
        let mut p = Plasma::empty(Seed::Fixed(1));
        assert!(p.generate(params(0, 1.0, 0.5)).is_err());
        assert!(p.field().is_none());
        assert!(p.requested_size().is_none());
    }

    #[test]
    fn non_finite_parameters_rejected() {
        let mut ds = DiamondSquare::empty(Seed::Fixed(1));
        assert!(matches!(
            ds.generate(params(9, f32::NAN, 0.5)),
            Err(FieldError::InvalidParameter { name: "initial_roughness", .. })
        ));
        assert!(matches!(
            ds.generate(params(9, 1.0, f32::INFINITY)),
            Err(FieldError::InvalidParameter { name: "persistence", .. })
        ));
        assert!(ds.field().is_none());
    }

    #[test]
    fn params_default_from_partial_json() {
        let p: GeneratorParams = serde_json::from_str(r#"{ "size": 64 }"#).unwrap();
        assert_eq!(p, GeneratorParams { size: 64, ..GeneratorParams::default() });
    }
}
