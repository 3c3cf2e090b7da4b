//! Size arithmetic for bump allocation
//!
//! Integer-only rounding helpers shared by the cursor and growth logic.

use crate::checks;

/// Round `offset` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two; this is checked when programming-error
/// checks are enabled (see [`crate::checks`]).
///
/// ```
/// use pagearena::align_forward;
///
/// assert_eq!(align_forward(0, 16), 0);
/// assert_eq!(align_forward(17, 16), 32);
/// assert_eq!(align_forward(32, 16), 32);
/// ```
#[inline(always)]
#[track_caller]
pub fn align_forward(offset: usize, alignment: usize) -> usize {
    checks::check(alignment.is_power_of_two(), "alignment must be a power of two");

    let mask = alignment.wrapping_sub(1);
    offset.wrapping_add(mask) & !mask
}

/// Round `offset` up to `alignment`, or `None` if that overflows `usize`.
#[inline(always)]
pub(crate) fn checked_align_forward(offset: usize, alignment: usize) -> Option<usize> {
    let mask = alignment - 1;
    offset.checked_add(mask).map(|end| end & !mask)
}

/// Integer ceiling of `a / b`.
///
/// Uses quotient plus remainder rather than `(a + b - 1) / b`, so values near
/// `usize::MAX` do not overflow.
///
/// ```
/// use pagearena::div_ceil;
///
/// assert_eq!(div_ceil(16000, 4096), 4);
/// assert_eq!(div_ceil(8192, 4096), 2);
/// assert_eq!(div_ceil(0, 4096), 0);
/// ```
#[inline(always)]
pub fn div_ceil(a: usize, b: usize) -> usize {
    a / b + usize::from(a % b != 0)
}
