//! Working-grid sizing and the scalar clamp used by both generator variants.
//!
//! The working grid side is always `2^k + 1` with `k >= 1`, so an edge can be
//! bisected into exact integer midpoints at every depth until it reaches
//! width 1.

use crate::error::FieldError;

/// Smallest working grid side produced for any non-zero request.
pub const MIN_ARRAY_SIZE: usize = 3;

/// True iff `v` is non-zero and has exactly one set bit.
#[inline]
pub fn is_power_of_two(v: usize) -> bool {
    v != 0 && v & (v - 1) == 0
}

/// Round `v` up to the next power of two by smearing the highest set bit
/// into every lower position. Returns `None` on overflow.
///
/// `0` rounds to `0`, matching the bit-smearing identity.
pub fn round_up_to_power_of_two(v: usize) -> Option<usize> {
    if v == 0 {
        return Some(0);
    }
    let mut x = v - 1;
    let mut shift = 1;
    while shift < usize::BITS {
        x |= x >> shift;
        shift <<= 1;
    }
    x.checked_add(1)
}

/// Working grid side for a caller-requested size.
///
/// If `size - 1` is already a power of two the request is used as is,
/// otherwise `size` is rounded up to a power of two and one is added.
pub fn array_size_for(size: usize) -> Result<usize, FieldError> {
    if size == 0 {
        return Err(FieldError::ZeroSize);
    }
    let array_size = if is_power_of_two(size - 1) {
        size
    } else {
        round_up_to_power_of_two(size)
            .and_then(|p| p.checked_add(1))
            .ok_or(FieldError::TooLarge { size })?
    };
    let array_size = array_size.max(MIN_ARRAY_SIZE);
    // The flat f32 buffer must fit in a single allocation.
    let bytes = array_size
        .checked_mul(array_size)
        .and_then(|cells| cells.checked_mul(std::mem::size_of::<f32>()))
        .ok_or(FieldError::TooLarge { size })?;
    if bytes > isize::MAX as usize {
        return Err(FieldError::TooLarge { size });
    }
    Ok(array_size)
}

/// Bound `v` to `[lo, hi]`.
#[inline]
pub fn clamp(lo: f32, hi: f32, v: f32) -> f32 {
    if v > hi {
        hi
    } else if v < lo {
        lo
    } else {
        v
    }
}
