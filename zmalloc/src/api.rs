//! Platform allocator surface
//!
//! The four entry points under their platform ABI names and C linkage.
//! This module keeps the symbols mangled so the rlib can sit inside
//! ordinary Rust binaries; the `zmalloc-shared` cdylib re-exports the
//! same functions `no_mangle` so the dynamic loader can bind the whole
//! process to them:
//!
//! ```text
//! LD_PRELOAD=./libzmalloc_shared.so ./program
//! ```

use core::ffi::c_void;

use crate::{dump, heap};

/// `malloc(size)`: null on zero size or OOM, 16-byte aligned otherwise
pub unsafe extern "C" fn malloc(size: usize) -> *mut c_void {
    heap::allocate(size) as *mut c_void
}

/// `free(ptr)`: null and unknown pointers are silent no-ops
///
/// # Safety
/// A recognized `ptr` must not be used after this call.
pub unsafe extern "C" fn free(ptr: *mut c_void) {
    heap::release(ptr as *mut u8);
}

/// `realloc(ptr, size)`: see [`heap::reallocate`] for the exact contract
///
/// # Safety
/// The caller must own `ptr` exclusively; on a non-null return the old
/// pointer must not be used again.
pub unsafe extern "C" fn realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
    heap::reallocate(ptr as *mut u8, size) as *mut c_void
}

/// `show_alloc_mem()`: print the busy-block report on file descriptor 1
pub unsafe extern "C" fn show_alloc_mem() {
    dump::show_alloc_mem();
}
