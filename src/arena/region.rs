//! Region management - OS address-space acquisition
//!
//! Design: reserve the whole span up front with no backing memory, then
//! commit page ranges as the arena grows. The reservation is returned to the
//! OS in one piece when the region is dropped.

use core::ptr::NonNull;

use once_cell::sync::Lazy;

use crate::checks;
use crate::error::ArenaError;
use crate::logging::{log_commit, log_release, log_reserve};

pub use sys::OUT_OF_MEMORY_CODE;

/// Native page size, queried once per process
static PAGE_SIZE: Lazy<usize> = Lazy::new(sys::page_size);

/// Page granularity of the host's virtual memory system
#[inline]
pub fn page_size() -> usize {
    *PAGE_SIZE
}

/// A span of reserved address space.
///
/// Only ranges passed to [`Region::commit`] are readable and writable.
pub struct Region {
    base: NonNull<u8>,
    len: usize,
}

impl Region {
    /// Reserve `len` bytes of address space without committing any of it.
    pub fn reserve(len: usize) -> Result<Self, ArenaError> {
        // SAFETY: reserving fresh address space has no preconditions.
        let base = unsafe { sys::reserve(len) }.ok_or_else(|| ArenaError::Reserve {
            bytes: len,
            os_code: last_os_code(),
        })?;

        log_reserve(len, base.as_ptr());
        Ok(Self { base, len })
    }

    /// Make `[offset, offset + len)` readable and writable.
    ///
    /// `offset` must be page aligned. Ranges outside the reservation are
    /// rejected as [`ArenaError::CapacityExceeded`].
    pub fn commit(&self, offset: usize, len: usize) -> Result<(), ArenaError> {
        checks::check(offset % page_size() == 0, "commit offset is not page aligned");

        let end = offset.checked_add(len).filter(|&end| end <= self.len);
        let Some(end) = end else {
            return Err(ArenaError::CapacityExceeded {
                requested: offset.saturating_add(len),
                reserved: self.len,
            });
        };

        // SAFETY: offset..end lies inside the reservation checked above.
        let committed = unsafe { sys::commit(self.base.as_ptr().add(offset), len) };
        if !committed {
            return Err(ArenaError::Commit {
                offset,
                bytes: len,
                os_code: last_os_code(),
            });
        }

        log_commit(offset, end);
        Ok(())
    }

    /// First byte of the reservation
    #[inline]
    pub fn base(&self) -> NonNull<u8> {
        self.base
    }

    /// Reserved size in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        // SAFETY: base/len describe exactly the span returned by sys::reserve.
        unsafe { sys::release(self.base.as_ptr(), self.len) };
        log_release(self.len, self.base.as_ptr());
    }
}

fn last_os_code() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

#[cfg(unix)]
mod sys {
    use core::ptr::{self, NonNull};

    pub const OUT_OF_MEMORY_CODE: i32 = libc::ENOMEM;

    #[cfg(any(target_os = "linux", target_os = "android"))]
    const NO_SWAP_RESERVE: libc::c_int = libc::MAP_NORESERVE;
    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    const NO_SWAP_RESERVE: libc::c_int = 0;

    pub unsafe fn reserve(len: usize) -> Option<NonNull<u8>> {
        let flags = libc::MAP_PRIVATE | libc::MAP_ANONYMOUS | NO_SWAP_RESERVE;
        let ptr = libc::mmap(ptr::null_mut(), len, libc::PROT_NONE, flags, -1, 0);
        if ptr == libc::MAP_FAILED {
            return None;
        }
        NonNull::new(ptr.cast())
    }

    pub unsafe fn commit(ptr: *mut u8, len: usize) -> bool {
        libc::mprotect(ptr.cast(), len, libc::PROT_READ | libc::PROT_WRITE) == 0
    }

    pub unsafe fn release(ptr: *mut u8, len: usize) {
        libc::munmap(ptr.cast(), len);
    }

    pub fn page_size() -> usize {
        // SAFETY: sysconf has no preconditions.
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size < 1 {
            4096
        } else {
            size as usize
        }
    }
}

#[cfg(windows)]
mod sys {
    use core::ptr::{self, NonNull};

    use winapi::shared::winerror::ERROR_NOT_ENOUGH_MEMORY;
    use winapi::um::memoryapi::{VirtualAlloc, VirtualFree};
    use winapi::um::sysinfoapi::{GetSystemInfo, SYSTEM_INFO};
    use winapi::um::winnt::{MEM_COMMIT, MEM_RELEASE, MEM_RESERVE, PAGE_NOACCESS, PAGE_READWRITE};

    pub const OUT_OF_MEMORY_CODE: i32 = ERROR_NOT_ENOUGH_MEMORY as i32;

    pub unsafe fn reserve(len: usize) -> Option<NonNull<u8>> {
        NonNull::new(VirtualAlloc(ptr::null_mut(), len, MEM_RESERVE, PAGE_NOACCESS).cast())
    }

    pub unsafe fn commit(ptr: *mut u8, len: usize) -> bool {
        !VirtualAlloc(ptr.cast(), len, MEM_COMMIT, PAGE_READWRITE).is_null()
    }

    pub unsafe fn release(ptr: *mut u8, _len: usize) {
        // Size must be zero with MEM_RELEASE; the whole reservation goes.
        VirtualFree(ptr.cast(), 0, MEM_RELEASE);
    }

    pub fn page_size() -> usize {
        // SAFETY: SYSTEM_INFO is plain data and GetSystemInfo fills it in.
        let mut info: SYSTEM_INFO = unsafe { core::mem::zeroed() };
        unsafe { GetSystemInfo(&mut info) };
        info.dwPageSize as usize
    }
}

#[cfg(not(any(unix, windows)))]
compile_error!("pagearena needs a unix or windows virtual memory API");
