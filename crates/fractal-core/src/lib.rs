//! Midpoint-displacement synthesis of square scalar fields in [0, 1].
//!
//! Two variants share one recursive generator: [`DiamondSquare`] perturbs
//! both the centre and the edge midpoints of every subsquare, while
//! [`Plasma`] perturbs only the centre and linearly interpolates the edges.

pub mod error;
pub mod field;
pub mod generator;
pub mod random;
pub mod sizing;
pub mod square;
pub mod stats;

pub use error::FieldError;
pub use field::ScalarField;
pub use generator::{DiamondSquare, GeneratorParams, MidpointGenerator, Plasma};
pub use random::{RandomSource, Seed};
pub use square::{Noisy, Smooth, SquareStep};
pub use stats::{compute_stats, FieldStats};
