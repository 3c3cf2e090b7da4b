//! Scoped temporary allocation
//!
//! A scope remembers the arena position when opened and rewinds to it when
//! dropped, discarding every push made through it in O(1).

use core::ops::{Deref, DerefMut};

use super::Arena;

/// Guard returned by [`Arena::scope`].
///
/// Derefs to the arena, so pushes (and nested scopes) go through it as
/// usual. Slices pushed inside the scope cannot outlive it.
pub struct ArenaScope<'a> {
    arena: &'a mut Arena,
    saved: usize,
}

impl<'a> ArenaScope<'a> {
    pub(super) fn new(arena: &'a mut Arena) -> Self {
        let saved = arena.position();
        Self { arena, saved }
    }

    /// Position the arena returns to when this scope ends
    #[inline]
    pub fn saved_position(&self) -> usize {
        self.saved
    }
}

impl Deref for ArenaScope<'_> {
    type Target = Arena;

    fn deref(&self) -> &Arena {
        &*self.arena
    }
}

impl DerefMut for ArenaScope<'_> {
    fn deref_mut(&mut self) -> &mut Arena {
        &mut *self.arena
    }
}

impl Drop for ArenaScope<'_> {
    fn drop(&mut self) {
        self.arena.set_position(self.saved);
    }
}
