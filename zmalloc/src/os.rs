//! OS page interface
//!
//! The allocator obtains memory from the kernel exclusively through
//! anonymous private mappings and returns it with exact-region unmaps.
//! No file descriptors are involved.

use core::ptr::NonNull;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Cached system page size (0 = not yet queried)
static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);

/// System page size in bytes
///
/// Queried once from the kernel, then served from a process-wide cache.
#[inline]
pub fn page_size() -> usize {
    let cached = PAGE_SIZE.load(Ordering::Relaxed);
    if cached != 0 {
        return cached;
    }

    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) } as usize;
    PAGE_SIZE.store(size, Ordering::Relaxed);
    size
}

/// Map `len` bytes of anonymous, readable/writable memory
///
/// Returns `None` when the kernel refuses the mapping. Page-sized
/// mappings are page aligned, which is what gives block payloads their
/// 16-byte alignment guarantee.
pub fn map_pages(len: usize) -> Option<NonNull<u8>> {
    let ptr = unsafe {
        libc::mmap(
            core::ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
            -1,
            0,
        )
    };

    if ptr == libc::MAP_FAILED {
        log::debug!("mmap of {} bytes refused by the kernel", len);
        return None;
    }

    NonNull::new(ptr as *mut u8)
}

/// Unmap the exact region previously returned by [`map_pages`]
///
/// # Safety
/// `ptr`/`len` must denote a mapping obtained from [`map_pages`] that has
/// not already been unmapped, and nothing may reference the region
/// afterwards.
pub unsafe fn unmap_pages(ptr: *mut u8, len: usize) {
    if libc::munmap(ptr as *mut libc::c_void, len) != 0 {
        log::debug!("munmap of {} bytes at {:p} failed", len, ptr);
    }
}
