//! Random helpers shared by selection, sections and slot placement.
use rand::Rng;

/// Generate a random float in the range [0, 1).
///
/// Uses the top 24 bits so the result is exactly representable and never rounds up to 1.
#[inline]
pub(crate) fn rand01(rng: &mut dyn Rng) -> f32 {
    (rng.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
}

/// Returns true with probability `p` (values outside [0, 1] saturate).
#[inline]
pub(crate) fn roll(rng: &mut dyn Rng, p: f32) -> bool {
    rand01(rng) < p
}

/// Uniform index in `0..len`. `len` must be non-zero.
#[inline]
pub(crate) fn pick_index(rng: &mut dyn Rng, len: usize) -> usize {
    debug_assert!(len > 0, "pick_index needs a non-empty range");
    ((rand01(rng) * len as f32) as usize).min(len - 1)
}
