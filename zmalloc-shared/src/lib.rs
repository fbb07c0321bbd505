//! Preloadable shared object for the zmalloc allocator
//!
//! Exports the four entry points unmangled under their platform ABI
//! names so the dynamic loader binds every allocation in the process to
//! zmalloc:
//!
//! ```text
//! LD_PRELOAD=./libzmalloc_shared.so ./program
//! ```
//!
//! Only this crate exports the unmangled symbols. Rust binaries that
//! link the `zmalloc` rlib directly keep their own platform allocator
//! and call the library through its mangled API instead.

#![no_std]

use core::ffi::c_void;

#[no_mangle]
pub unsafe extern "C" fn malloc(size: usize) -> *mut c_void {
    zmalloc::api::malloc(size)
}

#[no_mangle]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
    zmalloc::api::free(ptr);
}

#[no_mangle]
pub unsafe extern "C" fn realloc(ptr: *mut c_void, size: usize) -> *mut c_void {
    zmalloc::api::realloc(ptr, size)
}

#[no_mangle]
pub unsafe extern "C" fn show_alloc_mem() {
    zmalloc::api::show_alloc_mem();
}

// The cdylib is a final linkage unit, so it must carry the panic
// machinery itself. Aborting matches the workspace panic strategy and
// never allocates.
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    unsafe { libc::abort() }
}
