//! Block headers, splitting and coalescing
//!
//! A block is a header followed immediately by its payload. Headers live
//! in-band inside the zone they manage, chained in address order through
//! `prev`/`next`, and tile the zone's payload with no gaps: a non-null
//! `next` always equals `block + BLOCK_HEADER_SIZE + block.size`.

use core::ptr;

use crate::class::MIN_SPLIT_PAYLOAD;

bitflags::bitflags! {
    /// Block state flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BlockFlags: u32 {
        /// Block is free (not handed out to a caller)
        const FREE = 0x01;
    }
}

/// In-band block header
///
/// `size` counts payload bytes only. The layout is padded to 32 bytes so
/// that payloads of 16-byte aligned headers stay 16-byte aligned.
#[repr(C)]
pub struct BlockHeader {
    /// Payload bytes, excluding this header
    pub size: usize,
    /// State flags
    pub flags: BlockFlags,
    /// Address-order predecessor within the zone (null for the first block)
    pub prev: *mut BlockHeader,
    /// Address-order successor within the zone (null for the last block)
    pub next: *mut BlockHeader,
}

/// Header size; every payload sits exactly this far past its header
pub const BLOCK_HEADER_SIZE: usize = core::mem::size_of::<BlockHeader>();

// Payload alignment depends on this exact layout.
const _: () = assert!(BLOCK_HEADER_SIZE == 32);

impl BlockHeader {
    /// Check whether the block is free
    #[inline]
    pub fn is_free(&self) -> bool {
        self.flags.contains(BlockFlags::FREE)
    }

    /// Mark the block free or busy
    #[inline]
    pub fn set_free(&mut self, free: bool) {
        self.flags.set(BlockFlags::FREE, free);
    }
}

/// Payload base of a block header
#[inline]
pub fn payload(block: *mut BlockHeader) -> *mut u8 {
    unsafe { (block as *mut u8).add(BLOCK_HEADER_SIZE) }
}

/// Split the tail off a chosen block
///
/// Given a block of size `B` and an aligned request `size`, carves a new
/// free block out of the remainder and splices it after `block`. Left
/// alone when the remainder could not host a header plus a 16-byte
/// payload, in which case the caller keeps the whole block.
///
/// # Safety
/// `block` must be a valid block header whose `size` is at least `size`.
pub unsafe fn split(block: *mut BlockHeader, size: usize) {
    if (*block).size <= size + BLOCK_HEADER_SIZE + MIN_SPLIT_PAYLOAD {
        return;
    }

    let tail = (block as *mut u8).add(BLOCK_HEADER_SIZE + size) as *mut BlockHeader;
    (*tail).size = (*block).size - size - BLOCK_HEADER_SIZE;
    (*tail).flags = BlockFlags::FREE;
    (*tail).prev = block;
    (*tail).next = (*block).next;
    if !(*tail).next.is_null() {
        (*(*tail).next).prev = tail;
    }

    (*block).next = tail;
    (*block).size = size;
}

/// Absorb the right neighbor when it is free
///
/// Merging is right-only: freeing a block never folds it into a free
/// left neighbor, so two adjacent free blocks can persist when a right
/// neighbor was freed first.
///
/// # Safety
/// `block` must be a valid block header inside a live zone.
pub unsafe fn coalesce_right(block: *mut BlockHeader) {
    let next = (*block).next;
    if next.is_null() || !(*next).is_free() {
        return;
    }

    (*block).size += BLOCK_HEADER_SIZE + (*next).size;
    (*block).next = (*next).next;
    if !(*block).next.is_null() {
        (*(*block).next).prev = block;
    }
}

/// Initialize a free block header at `at` with no neighbors
///
/// # Safety
/// `at` must be writable for at least `BLOCK_HEADER_SIZE` bytes.
pub unsafe fn init_free(at: *mut BlockHeader, size: usize) {
    (*at).size = size;
    (*at).flags = BlockFlags::FREE;
    (*at).prev = ptr::null_mut();
    (*at).next = ptr::null_mut();
}
