//! Zone manager and pointer resolution
//!
//! A zone is one contiguous mapped region: a header, then a chain of
//! blocks tiling the rest of the mapping. Zones of the same class are
//! singly linked through their headers, newest first.
//!
//! The pointer resolver lives here too: `free` and `realloc` recover the
//! block behind a user pointer by walking the zone lists and comparing
//! payload bases byte-exactly. A pointer that matches no payload base
//! resolves to nothing, which the callers treat as a silent no-op.

use core::ptr;

use crate::block::{self, BlockHeader, BLOCK_HEADER_SIZE};
use crate::class::SizeClass;
use crate::os;

/// In-band zone header, at the base of the mapping
#[repr(C)]
pub struct ZoneHeader {
    /// Total mapped bytes, header included
    pub size: usize,
    /// Next zone of the same class (newest-first list)
    pub next: *mut ZoneHeader,
    /// First block header, immediately after this header
    pub blocks: *mut BlockHeader,
    /// Class this zone was created for
    ///
    /// Collapse decisions key off the creation class, never off the
    /// current size of any block inside the zone.
    pub class: SizeClass,
}

/// Zone header size; the first block starts exactly this far in
pub const ZONE_HEADER_SIZE: usize = core::mem::size_of::<ZoneHeader>();

// First-block payloads are 16-byte aligned because both headers pad to 32
// bytes and mappings are page aligned.
const _: () = assert!(ZONE_HEADER_SIZE == 32);

/// Map and initialize a zone for `class`
///
/// The fresh zone carries a single free block covering its whole payload
/// and is not yet linked into any list. Returns `None` when the kernel
/// refuses the mapping.
pub fn create(class: SizeClass, aligned: usize) -> Option<*mut ZoneHeader> {
    let zone_size = class.zone_size(aligned);
    let base = os::map_pages(zone_size)?;

    let zone = base.as_ptr() as *mut ZoneHeader;
    unsafe {
        (*zone).size = zone_size;
        (*zone).next = ptr::null_mut();
        (*zone).class = class;

        let first = base.as_ptr().add(ZONE_HEADER_SIZE) as *mut BlockHeader;
        block::init_free(first, zone_size - ZONE_HEADER_SIZE - BLOCK_HEADER_SIZE);
        (*zone).blocks = first;
    }

    log::trace!("mapped {} {} zone at {:p}", zone_size, class.label(), zone);
    Some(zone)
}

/// Unmap a zone
///
/// # Safety
/// `zone` must be a live zone already unlinked from its class list, with
/// no outstanding payload pointers into it.
pub unsafe fn release(zone: *mut ZoneHeader) {
    let size = (*zone).size;
    let class = (*zone).class;
    os::unmap_pages(zone as *mut u8, size);
    log::trace!("unmapped {} {} zone at {:p}", size, class.label(), zone);
}

/// First-fit search across a class list
///
/// Walks zones newest-first and blocks in address order; returns the
/// first free block large enough, or null when the whole list is busy.
pub fn find_free_block(head: *mut ZoneHeader, size: usize) -> *mut BlockHeader {
    let mut zone = head;
    while !zone.is_null() {
        unsafe {
            let mut block = (*zone).blocks;
            while !block.is_null() {
                if (*block).is_free() && (*block).size >= size {
                    return block;
                }
                block = (*block).next;
            }
            zone = (*zone).next;
        }
    }
    ptr::null_mut()
}

/// Resolve a user pointer against one class list
///
/// Matches on byte-exact payload-base equality; a pointer into the middle
/// of a block is not recognized. Returns the owning zone along with the
/// block so the caller can run the empty-zone collapse check.
pub fn find_block(
    head: *mut ZoneHeader,
    ptr: *mut u8,
) -> Option<(*mut ZoneHeader, *mut BlockHeader)> {
    let mut zone = head;
    while !zone.is_null() {
        unsafe {
            let mut block = (*zone).blocks;
            while !block.is_null() {
                if block::payload(block) == ptr {
                    return Some((zone, block));
                }
                block = (*block).next;
            }
            zone = (*zone).next;
        }
    }
    None
}
