//! Value-over-lifetime keyframe normalization.
//!
//! Color, opacity, size, and angle are authored as either a single value or
//! a short list of keyframes sampled across a particle's lifetime. Before an
//! emitter touches any buffers, both the value list and its spread list are
//! normalized to exactly [`VALUE_OVER_LIFETIME_LENGTH`] entries by piecewise
//! linear interpolation, preserving the first and last authored entries
//! exactly.

use glam::{Vec2, Vec3, Vec4};

/// Fixed keyframe count for all value-over-lifetime attributes.
pub const VALUE_OVER_LIFETIME_LENGTH: usize = 4;

/// Linear interpolation between two values of the same type.
pub trait Lerp: Copy {
    fn lerp(self, end: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(self, end: Self, t: f32) -> Self {
        self + (end - self) * t
    }
}

impl Lerp for Vec2 {
    #[inline]
    fn lerp(self, end: Self, t: f32) -> Self {
        Vec2::lerp(self, end, t)
    }
}

impl Lerp for Vec3 {
    #[inline]
    fn lerp(self, end: Self, t: f32) -> Self {
        Vec3::lerp(self, end, t)
    }
}

impl Lerp for Vec4 {
    #[inline]
    fn lerp(self, end: Self, t: f32) -> Self {
        Vec4::lerp(self, end, t)
    }
}

/// Resample `src` to exactly `new_len` entries.
///
/// The first and last entries of `src` are carried over unchanged; interior
/// entries are linearly interpolated at evenly spaced positions. A
/// single-entry source is broadcast.
pub fn interpolate_array<T: Lerp>(src: &[T], new_len: usize) -> Vec<T> {
    if src.is_empty() || new_len == 0 {
        return Vec::new();
    }
    if src.len() == new_len {
        return src.to_vec();
    }
    if new_len == 1 {
        return vec![src[0]];
    }

    let mut out = Vec::with_capacity(new_len);
    out.push(src[0]);

    let factor = (src.len() - 1) as f32 / (new_len - 1) as f32;
    for i in 1..new_len - 1 {
        let f = i as f32 * factor;
        let before = f.floor() as usize;
        let after = (f.ceil() as usize).min(src.len() - 1);
        out.push(src[before].lerp(src[after], f - before as f32));
    }

    out.push(src[src.len() - 1]);
    out
}

/// Normalize a value/spread keyframe pair in place so both lists hold the
/// same number of entries, clamped to `[min_len, max_len]`.
///
/// Idempotent: lists already at the target length are left untouched.
pub fn ensure_compliance<T: Lerp>(
    value: &mut Vec<T>,
    spread: &mut Vec<T>,
    min_len: usize,
    max_len: usize,
) {
    let value_len = value.len().clamp(min_len, max_len);
    let spread_len = spread.len().clamp(min_len, max_len);
    let desired = value_len.max(spread_len);

    if value.len() != desired {
        *value = interpolate_array(value, desired);
    }
    if spread.len() != desired {
        *spread = interpolate_array(spread, desired);
    }
}

/// Whether every entry of `values` equals its neighbour.
///
/// Used as the fast path when sampling keyframed attributes: a flat curve
/// needs only one random draw, broadcast to all keyframes.
pub fn values_are_equal(values: &[f32]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}
