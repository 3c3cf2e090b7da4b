//! Arena control block - lives in the first bytes of page 1
//!
//! Layout is fixed (`repr(C)`) and padded to 16 bytes so the first user
//! allocation starts aligned for the default arena alignment.

use core::cell::Cell;

/// "PAGEARNA", checked on access to catch writes over the control block
const MAGIC: u64 = 0x5041_4745_4152_4e41;

/// Bytes occupied by the control block at the start of every arena.
pub const HEADER_SIZE: usize = core::mem::size_of::<ArenaHeader>();

#[repr(C, align(16))]
pub(crate) struct ArenaHeader {
    magic: u64,
    pub(crate) page_size: usize,
    pub(crate) max_pages: usize,
    pub(crate) alignment: usize,
    /// First usable offset; the cursor never goes below it
    pub(crate) start: usize,
    pub(crate) committed_pages: Cell<usize>,
    pub(crate) cursor: Cell<usize>,
}

impl ArenaHeader {
    /// Control block for a fresh arena with one committed page
    pub(crate) fn new(page_size: usize, max_pages: usize, alignment: usize, start: usize) -> Self {
        Self {
            magic: MAGIC,
            page_size,
            max_pages,
            alignment,
            start,
            committed_pages: Cell::new(1),
            cursor: Cell::new(start),
        }
    }

    #[inline]
    pub(crate) fn is_intact(&self) -> bool {
        self.magic == MAGIC
    }

    #[inline]
    pub(crate) fn committed_bytes(&self) -> usize {
        self.committed_pages.get() * self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_is_multiple_of_sixteen() {
        assert_eq!(HEADER_SIZE % 16, 0);
        assert!(HEADER_SIZE >= 7 * core::mem::size_of::<usize>());
    }

    #[test]
    fn new_header_starts_at_one_page() {
        let header = ArenaHeader::new(4096, 10, 16, HEADER_SIZE);
        assert!(header.is_intact());
        assert_eq!(header.committed_pages.get(), 1);
        assert_eq!(header.committed_bytes(), 4096);
        assert_eq!(header.cursor.get(), HEADER_SIZE);
    }
}
