//! Typed pushes over the byte arena
//!
//! Restricted to `Copy` types: the arena never runs destructors, and a
//! rewind simply forgets whatever lived above the cursor.

use core::mem::{self, MaybeUninit};
use core::slice;

use super::Arena;
use crate::error::{fatal, ArenaError};

impl Arena {
    #[inline]
    #[track_caller]
    fn assert_fits_alignment<T>(&self) {
        // Always on: a misaligned typed slice would be undefined behaviour.
        assert!(
            mem::align_of::<T>() <= self.alignment(),
            "type alignment {} exceeds arena alignment {}",
            mem::align_of::<T>(),
            self.alignment()
        );
    }

    /// Space for `count` values of `T`, uninitialized.
    ///
    /// # Panics
    ///
    /// Panics if `T` needs a larger alignment than the arena provides.
    #[allow(clippy::mut_from_ref)]
    #[track_caller]
    pub fn try_push_array<T: Copy>(&self, count: usize) -> Result<&mut [MaybeUninit<T>], ArenaError> {
        self.assert_fits_alignment::<T>();
        let bytes = mem::size_of::<T>()
            .checked_mul(count)
            .ok_or(ArenaError::CapacityExceeded {
                requested: usize::MAX,
                reserved: self.reserved_bytes(),
            })?;

        let ptr = self.try_push_raw(bytes)?;
        // SAFETY: `bytes` committed bytes start at `ptr`, aligned for T.
        Ok(unsafe { slice::from_raw_parts_mut(ptr.as_ptr().cast::<MaybeUninit<T>>(), count) })
    }

    /// [`Arena::try_push_array`], terminating the process on failure.
    #[allow(clippy::mut_from_ref)]
    #[track_caller]
    pub fn push_array<T: Copy>(&self, count: usize) -> &mut [MaybeUninit<T>] {
        self.try_push_array(count).unwrap_or_else(|err| fatal(&err))
    }

    /// Space for `count` values of `T` with every byte zeroed.
    ///
    /// Whether all-zero bytes form a valid `T` is up to the caller.
    #[allow(clippy::mut_from_ref)]
    #[track_caller]
    pub fn try_push_array_zero<T: Copy>(
        &self,
        count: usize,
    ) -> Result<&mut [MaybeUninit<T>], ArenaError> {
        let values = self.try_push_array::<T>(count)?;
        for value in values.iter_mut() {
            *value = MaybeUninit::zeroed();
        }
        Ok(values)
    }

    #[allow(clippy::mut_from_ref)]
    #[track_caller]
    pub fn push_array_zero<T: Copy>(&self, count: usize) -> &mut [MaybeUninit<T>] {
        self.try_push_array_zero(count).unwrap_or_else(|err| fatal(&err))
    }

    /// Space for one `T`, uninitialized.
    #[allow(clippy::mut_from_ref)]
    #[track_caller]
    pub fn push_struct<T: Copy>(&self) -> &mut MaybeUninit<T> {
        let slot = self.push_array::<T>(1);
        &mut slot[0]
    }

    /// Space for one `T` with every byte zeroed.
    #[allow(clippy::mut_from_ref)]
    #[track_caller]
    pub fn push_struct_zero<T: Copy>(&self) -> &mut MaybeUninit<T> {
        let slot = self.push_array_zero::<T>(1);
        &mut slot[0]
    }

    /// Move `value` into the arena.
    #[allow(clippy::mut_from_ref)]
    #[track_caller]
    pub fn push_copy<T: Copy>(&self, value: T) -> &mut T {
        self.push_struct::<T>().write(value)
    }

    /// Copy `values` into the arena.
    #[allow(clippy::mut_from_ref)]
    #[track_caller]
    pub fn push_slice_copy<T: Copy>(&self, values: &[T]) -> &mut [T] {
        let slots = self.push_array::<T>(values.len());
        for (slot, value) in slots.iter_mut().zip(values) {
            slot.write(*value);
        }
        // SAFETY: every slot was written above.
        unsafe { &mut *(slots as *mut [MaybeUninit<T>] as *mut [T]) }
    }
}
