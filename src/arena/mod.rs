//! Arena - stack-discipline bump allocation over a reserved region
//!
//! Design: two layers.
//! 1. Region: one reservation of `max_pages` pages, committed on demand
//! 2. Arena: control block in page 1, a cursor that bumps forward on push
//!    and rewinds on pop / set_position / clear
//!
//! Every push size is rounded up to the arena alignment, so the cursor is
//! always aligned and `pop(n)` undoes `push(n)` exactly.
//!
//! Slices returned by push borrow the arena. Rewinding needs `&mut Arena`
//! and release consumes it, so handed-out memory cannot outlive either:
//!
//! ```compile_fail
//! use pagearena::Arena;
//!
//! let arena = Arena::create(4);
//! let bytes = arena.push(64);
//! arena.release();
//! bytes[0] = 1; // the region is gone
//! ```
//!
//! ```compile_fail
//! use pagearena::Arena;
//!
//! let mut arena = Arena::create(4);
//! let bytes = arena.push(64);
//! arena.pop(64);
//! bytes[0] = 1; // the bytes were handed back
//! ```

mod bump;
mod header;
pub mod region;
mod scope;
mod typed;


pub use bump::{align_forward, div_ceil};
pub use header::HEADER_SIZE;
pub use region::page_size;
pub use scope::ArenaScope;

use core::fmt;
use core::ptr::NonNull;
use core::slice;

use crate::checks;
use crate::config::ArenaConfig;
use crate::error::{fatal, ArenaError};
use crate::logging::{log_arena_created, log_push, log_rewind};
use bump::checked_align_forward;
use header::ArenaHeader;
use region::Region;

/// Allocation alignment unless configured otherwise
pub const DEFAULT_ALIGNMENT: usize = 16;

/// Reservation size in pages unless configured otherwise
pub const DEFAULT_MAX_PAGES: usize = 10;

/// A page-granular stack arena.
///
/// Owns its reservation exclusively. Not `Sync`: one owner at a time, though
/// the owner may hand the arena to another thread.
pub struct Arena {
    region: Region,
    header: NonNull<ArenaHeader>,
}

// SAFETY: the arena owns its region outright and holds no thread-local state.
// Shared access from several threads is still ruled out (not Sync).
unsafe impl Send for Arena {}

impl Arena {
    /// Create an arena reserving `max_pages` pages, terminating the process
    /// if the reservation or the first commit fails.
    pub fn create(max_pages: usize) -> Self {
        Self::try_create(max_pages).unwrap_or_else(|err| fatal(&err))
    }

    /// Create an arena reserving `max_pages` pages.
    pub fn try_create(max_pages: usize) -> Result<Self, ArenaError> {
        Self::try_with_config(&ArenaConfig::new(max_pages))
    }

    /// Create an arena from `config`, terminating the process on failure.
    pub fn with_config(config: &ArenaConfig) -> Self {
        Self::try_with_config(config).unwrap_or_else(|err| fatal(&err))
    }

    /// Create an arena from `config`.
    ///
    /// Reserves the whole span, commits page 1 and writes the control block
    /// at its start.
    pub fn try_with_config(config: &ArenaConfig) -> Result<Self, ArenaError> {
        let page_size = page_size();
        config.validate(page_size)?;

        let reserve_bytes = config
            .reserve_bytes(page_size)
            .ok_or_else(|| ArenaError::invalid_config("reservation size overflows usize"))?;

        let region = Region::reserve(reserve_bytes)?;
        region.commit(0, page_size)?;

        let start = align_forward(HEADER_SIZE, config.alignment);
        let header = region.base().cast::<ArenaHeader>();
        // SAFETY: page 1 is committed, page aligned and larger than the header.
        unsafe {
            header
                .as_ptr()
                .write(ArenaHeader::new(page_size, config.max_pages, config.alignment, start));
        }

        log_arena_created(page_size, config.max_pages, start);
        Ok(Self { region, header })
    }

    #[inline]
    fn header(&self) -> &ArenaHeader {
        // SAFETY: the header was written at creation and page 1 stays
        // committed until the region is dropped together with `self`.
        let header = unsafe { self.header.as_ref() };
        checks::check(header.is_intact(), "arena control block was overwritten");
        header
    }

    /// Start of the reserved region
    #[inline]
    pub fn base(&self) -> NonNull<u8> {
        self.region.base()
    }

    /// Page granularity used for commits
    #[inline]
    pub fn page_size(&self) -> usize {
        self.header().page_size
    }

    /// Alignment of every allocation start
    #[inline]
    pub fn alignment(&self) -> usize {
        self.header().alignment
    }

    /// Reservation size in pages
    #[inline]
    pub fn max_pages(&self) -> usize {
        self.header().max_pages
    }

    /// Pages currently committed, including the control block page
    #[inline]
    pub fn committed_pages(&self) -> usize {
        self.header().committed_pages.get()
    }

    #[inline]
    pub fn committed_bytes(&self) -> usize {
        self.header().committed_bytes()
    }

    #[inline]
    pub fn reserved_bytes(&self) -> usize {
        self.region.len()
    }

    /// Offset of the first allocation: the control block size rounded up
    /// to the arena alignment.
    #[inline]
    pub fn start_position(&self) -> usize {
        self.header().start
    }

    /// Current cursor, usable as a save token for [`Arena::set_position`].
    #[inline]
    pub fn position(&self) -> usize {
        self.header().cursor.get()
    }

    /// Bytes a push of `size` moves the cursor by.
    fn footprint(&self, size: usize) -> Result<usize, ArenaError> {
        checked_align_forward(size, self.alignment()).ok_or(ArenaError::CapacityExceeded {
            requested: usize::MAX,
            reserved: self.reserved_bytes(),
        })
    }

    /// Commit enough pages for `additional` bytes past the cursor.
    ///
    /// Commits the fewest whole pages that cover the shortfall, directly
    /// after the last committed page.
    pub(crate) fn ensure_capacity(&self, additional: usize) -> Result<(), ArenaError> {
        let header = self.header();
        let committed = header.committed_bytes();
        let reserved = self.reserved_bytes();

        let end = header
            .cursor
            .get()
            .checked_add(additional)
            .ok_or(ArenaError::CapacityExceeded {
                requested: usize::MAX,
                reserved,
            })?;
        if end <= committed {
            return Ok(());
        }

        let needed_pages = div_ceil(end - committed, header.page_size);
        // Cannot fire while end > committed; guards the growth arithmetic.
        checks::check(needed_pages > 0, "zero-page growth request");

        let total_pages = header.committed_pages.get() + needed_pages;
        if total_pages > header.max_pages {
            return Err(ArenaError::CapacityExceeded {
                requested: end,
                reserved,
            });
        }

        self.region.commit(committed, needed_pages * header.page_size)?;
        header.committed_pages.set(total_pages);
        Ok(())
    }

    /// Bump the cursor past `size` bytes and return the aligned start.
    pub(crate) fn try_push_raw(&self, size: usize) -> Result<NonNull<u8>, ArenaError> {
        let header = self.header();
        let cursor = header.cursor.get();
        let start = align_forward(cursor, header.alignment);
        let advance = self.footprint(size)?.checked_add(start - cursor).ok_or(
            ArenaError::CapacityExceeded {
                requested: usize::MAX,
                reserved: self.reserved_bytes(),
            },
        )?;

        self.ensure_capacity(advance)?;
        header.cursor.set(cursor + advance);
        log_push(start, size);

        // SAFETY: start <= cursor + advance <= committed bytes <= region length.
        Ok(unsafe { NonNull::new_unchecked(self.base().as_ptr().add(start)) })
    }

    /// Allocate `size` bytes aligned to [`Arena::alignment`].
    ///
    /// Contents are not initialized by the call: reused bytes keep whatever
    /// was last written to them.
    #[allow(clippy::mut_from_ref)]
    pub fn try_push(&self, size: usize) -> Result<&mut [u8], ArenaError> {
        let ptr = self.try_push_raw(size)?;
        // SAFETY: the range is committed, inside the reservation and handed
        // out once; the borrow of `self` keeps rewinds and release away.
        Ok(unsafe { slice::from_raw_parts_mut(ptr.as_ptr(), size) })
    }

    /// [`Arena::try_push`], terminating the process on failure.
    #[allow(clippy::mut_from_ref)]
    pub fn push(&self, size: usize) -> &mut [u8] {
        self.try_push(size).unwrap_or_else(|err| fatal(&err))
    }

    /// Allocate `size` zeroed bytes.
    ///
    /// Zeroes explicitly: the bytes may have been used before a rewind.
    #[allow(clippy::mut_from_ref)]
    pub fn try_push_zero(&self, size: usize) -> Result<&mut [u8], ArenaError> {
        let bytes = self.try_push(size)?;
        bytes.fill(0);
        Ok(bytes)
    }

    /// [`Arena::try_push_zero`], terminating the process on failure.
    #[allow(clippy::mut_from_ref)]
    pub fn push_zero(&self, size: usize) -> &mut [u8] {
        self.try_push_zero(size).unwrap_or_else(|err| fatal(&err))
    }

    /// Give back the last `size` bytes pushed.
    ///
    /// `size` must match the push being undone. Popping past the start of
    /// the arena is a programming error; with checks disabled the cursor
    /// stops at [`Arena::start_position`].
    pub fn pop(&mut self, size: usize) {
        let header = self.header();
        let cursor = header.cursor.get();
        let footprint = checked_align_forward(size, header.alignment).unwrap_or(usize::MAX);
        checks::check(
            footprint <= cursor - header.start,
            "pop past the start of the arena",
        );

        let target = cursor.saturating_sub(footprint).max(header.start);
        header.cursor.set(target);
        log_rewind(cursor, target);
    }

    /// Rewind (or advance) the cursor to a position saved earlier.
    ///
    /// Everything pushed after `pos` was saved is discarded at once. A
    /// position outside `[start_position, committed_bytes]` or off the arena
    /// alignment is a programming error; with checks disabled it is clamped
    /// into range and rounded up to the alignment.
    pub fn set_position(&mut self, pos: usize) {
        let header = self.header();
        let committed = header.committed_bytes();
        checks::check(
            pos >= header.start && pos <= committed,
            "position outside the arena's used range",
        );
        checks::check(pos % header.alignment == 0, "position is not aligned");

        let cursor = header.cursor.get();
        let target = align_forward(pos.clamp(header.start, committed), header.alignment);
        header.cursor.set(target);
        log_rewind(cursor, target);
    }

    /// Discard every allocation. Committed pages stay committed for reuse.
    pub fn clear(&mut self) {
        let start = self.header().start;
        self.set_position(start);
    }

    /// Save the position now and restore it when the returned guard drops.
    pub fn scope(&mut self) -> ArenaScope<'_> {
        ArenaScope::new(self)
    }

    /// Return the whole reservation to the OS, control block included.
    pub fn release(self) {
        drop(self);
    }

    /// Snapshot of the cursor and commit state
    pub fn stats(&self) -> ArenaStats {
        let header = self.header();
        ArenaStats {
            position: header.cursor.get(),
            start: header.start,
            committed_pages: header.committed_pages.get(),
            max_pages: header.max_pages,
            page_size: header.page_size,
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::with_config(&ArenaConfig::default())
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("base", &self.base())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Arena statistics for monitoring and debugging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaStats {
    pub position: usize,
    pub start: usize,
    pub committed_pages: usize,
    pub max_pages: usize,
    pub page_size: usize,
}

impl ArenaStats {
    /// Bytes between the first allocation and the cursor
    pub fn used_bytes(&self) -> usize {
        self.position - self.start
    }

    pub fn committed_bytes(&self) -> usize {
        self.committed_pages * self.page_size
    }

    pub fn reserved_bytes(&self) -> usize {
        self.max_pages * self.page_size
    }

    /// Bytes that can be pushed before the next commit
    pub fn committed_remaining(&self) -> usize {
        self.committed_bytes() - self.position
    }
}
