//! Heap core: the process-wide allocator state and the three operations
//!
//! All zone-list heads live in a single statically initialized aggregate
//! behind one global mutex. Every public operation takes the lock for its
//! whole duration, with one documented exception: `reallocate`'s
//! allocate-copy-release fallback drops the lock before recursing into
//! `allocate` and `release`, which re-acquire it. The copy phase reads
//! the old payload unlocked, which is sound because the caller owns that
//! pointer exclusively.

use core::ptr;
use core::sync::atomic::{AtomicUsize, Ordering};

use spin::{Mutex, MutexGuard};

use crate::block::{self, BlockHeader, BLOCK_HEADER_SIZE};
use crate::class::{align_size, SizeClass, MAX_ALLOC_SIZE};
use crate::zone::{self, ZoneHeader, ZONE_HEADER_SIZE};

/// The three class-list heads
///
/// Fields are only touched while [`STATE`] is held.
pub struct MallocState {
    tiny: *mut ZoneHeader,
    small: *mut ZoneHeader,
    large: *mut ZoneHeader,
}

// The raw heads are only reached through the mutex.
unsafe impl Send for MallocState {}

/// Process-wide allocator state, alive from first use until process exit
static STATE: Mutex<MallocState> = Mutex::new(MallocState {
    tiny: ptr::null_mut(),
    small: ptr::null_mut(),
    large: ptr::null_mut(),
});

impl MallocState {
    /// Head of the class list
    #[inline]
    fn head(&self, class: SizeClass) -> *mut ZoneHeader {
        match class {
            SizeClass::Tiny => self.tiny,
            SizeClass::Small => self.small,
            SizeClass::Large => self.large,
        }
    }

    /// Mutable head slot of the class list
    #[inline]
    fn head_mut(&mut self, class: SizeClass) -> &mut *mut ZoneHeader {
        match class {
            SizeClass::Tiny => &mut self.tiny,
            SizeClass::Small => &mut self.small,
            SizeClass::Large => &mut self.large,
        }
    }

    /// Resolve a user pointer across every class list
    fn resolve(&self, ptr: *mut u8) -> Option<(*mut ZoneHeader, *mut BlockHeader)> {
        zone::find_block(self.tiny, ptr)
            .or_else(|| zone::find_block(self.small, ptr))
            .or_else(|| zone::find_block(self.large, ptr))
    }
}

/// Lock the allocator state
///
/// For the introspection walk; everything else in this module locks
/// internally.
pub(crate) fn lock_state() -> MutexGuard<'static, MallocState> {
    STATE.lock()
}

/// Walk every zone of one class under an already-held guard
pub(crate) fn zones_of(state: &MallocState, class: SizeClass) -> *mut ZoneHeader {
    state.head(class)
}

// ============================================================================
// Statistics
// ============================================================================

static ALLOC_COUNT: AtomicUsize = AtomicUsize::new(0);
static FREE_COUNT: AtomicUsize = AtomicUsize::new(0);
static REALLOC_COUNT: AtomicUsize = AtomicUsize::new(0);
static FAILED_COUNT: AtomicUsize = AtomicUsize::new(0);
static ZONES_MAPPED: AtomicUsize = AtomicUsize::new(0);
static ZONES_UNMAPPED: AtomicUsize = AtomicUsize::new(0);

/// Allocator operation counters
#[derive(Debug, Clone, Copy)]
pub struct HeapStats {
    /// Successful allocations
    pub alloc_count: usize,
    /// Releases that resolved to a block
    pub free_count: usize,
    /// Reallocations served, in place or by copy
    pub realloc_count: usize,
    /// Allocations refused (zero size never counts; OOM does)
    pub failed_count: usize,
    /// Zones mapped since process start
    pub zones_mapped: usize,
    /// Zones returned to the OS
    pub zones_unmapped: usize,
}

/// Snapshot of the operation counters
pub fn stats() -> HeapStats {
    HeapStats {
        alloc_count: ALLOC_COUNT.load(Ordering::Relaxed),
        free_count: FREE_COUNT.load(Ordering::Relaxed),
        realloc_count: REALLOC_COUNT.load(Ordering::Relaxed),
        failed_count: FAILED_COUNT.load(Ordering::Relaxed),
        zones_mapped: ZONES_MAPPED.load(Ordering::Relaxed),
        zones_unmapped: ZONES_UNMAPPED.load(Ordering::Relaxed),
    }
}

// ============================================================================
// Operations
// ============================================================================

/// Allocate `size` bytes
///
/// Returns a 16-byte aligned payload pointer, or null for a zero-size
/// request or when the OS refuses a mapping. First-fit over the class's
/// zone list; a miss maps a new zone and carves its first block.
pub fn allocate(size: usize) -> *mut u8 {
    if size == 0 {
        return ptr::null_mut();
    }
    if size > MAX_ALLOC_SIZE {
        FAILED_COUNT.fetch_add(1, Ordering::Relaxed);
        return ptr::null_mut();
    }

    let aligned = align_size(size);
    let class = SizeClass::of(aligned);
    let mut state = STATE.lock();

    let mut chosen = zone::find_free_block(state.head(class), aligned);
    if chosen.is_null() {
        let fresh = match zone::create(class, aligned) {
            Some(z) => z,
            None => {
                FAILED_COUNT.fetch_add(1, Ordering::Relaxed);
                return ptr::null_mut();
            }
        };
        ZONES_MAPPED.fetch_add(1, Ordering::Relaxed);

        unsafe { (*fresh).next = state.head(class) };
        *state.head_mut(class) = fresh;
        chosen = unsafe { (*fresh).blocks };
    }

    unsafe {
        block::split(chosen, aligned);
        (*chosen).set_free(false);
    }
    ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);

    block::payload(chosen)
}

/// Release a payload pointer obtained from [`allocate`]
///
/// Null and unknown pointers are silent no-ops. The freed block absorbs a
/// free right neighbor, then the owning zone is unmapped if it has
/// collapsed to a single free block while sitting at the head of its
/// class list. Zones deeper in the list are left mapped even when empty.
///
/// # Safety
/// A non-null `ptr` must either be unknown to the allocator or be a
/// payload pointer that no other live reference still reads or writes.
pub unsafe fn release(ptr: *mut u8) {
    if ptr.is_null() {
        return;
    }

    let mut state = STATE.lock();
    let (owner, found) = match state.resolve(ptr) {
        Some(hit) => hit,
        None => return,
    };

    (*found).set_free(true);
    block::coalesce_right(found);
    FREE_COUNT.fetch_add(1, Ordering::Relaxed);

    let first = (*owner).blocks;
    if (*first).is_free() && (*first).next.is_null() {
        let class = (*owner).class;
        if state.head(class) == owner {
            *state.head_mut(class) = (*owner).next;
            zone::release(owner);
            ZONES_UNMAPPED.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Resize an allocation
///
/// Null `ptr` behaves as [`allocate`]; zero `size` behaves as
/// [`release`] and returns null; an unknown `ptr` returns null. A block
/// already big enough is returned unchanged without shrinking in place.
/// Growing first tries to absorb a free right neighbor; otherwise the
/// payload moves to a fresh allocation and the old block is released.
/// When the fresh allocation fails the original block is left untouched.
///
/// # Safety
/// Same contract as [`release`]: the caller must own `ptr` exclusively.
pub unsafe fn reallocate(ptr: *mut u8, size: usize) -> *mut u8 {
    if ptr.is_null() {
        return allocate(size);
    }
    if size == 0 {
        release(ptr);
        return ptr::null_mut();
    }
    if size > MAX_ALLOC_SIZE {
        FAILED_COUNT.fetch_add(1, Ordering::Relaxed);
        return ptr::null_mut();
    }

    let aligned = align_size(size);
    let old_size;
    {
        let state = STATE.lock();
        let (_owner, found) = match state.resolve(ptr) {
            Some(hit) => hit,
            None => return ptr::null_mut(),
        };

        if (*found).size >= aligned {
            REALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
            return ptr;
        }

        let next = (*found).next;
        if !next.is_null()
            && (*next).is_free()
            && (*found).size + BLOCK_HEADER_SIZE + (*next).size >= aligned
        {
            block::coalesce_right(found);
            REALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
            return ptr;
        }

        old_size = (*found).size;
        // The lock drops here: allocate and release below re-acquire it.
        // The old payload stays stable meanwhile because the caller owns
        // `ptr` exclusively.
    }

    let fresh = allocate(size);
    if fresh.is_null() {
        return ptr::null_mut();
    }
    ptr::copy_nonoverlapping(ptr, fresh, old_size.min(aligned));
    release(ptr);
    REALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
    fresh
}

// ============================================================================
// Integrity checking
// ============================================================================

/// Validate every zone reachable from the class roots
///
/// Checks the structural invariants: the first block sits immediately
/// after the zone header, blocks tile the zone with no gaps, the chain is
/// consistent in both directions, the last block ends at the zone end,
/// and each zone sits on the list of its creation class.
pub fn validate() -> bool {
    let state = STATE.lock();

    for class in [SizeClass::Tiny, SizeClass::Small, SizeClass::Large] {
        let mut zone = state.head(class);
        while !zone.is_null() {
            unsafe {
                if (*zone).class != class {
                    return false;
                }

                let zone_end = (zone as *mut u8).add((*zone).size);
                let mut block = (*zone).blocks;
                if block as usize != zone as usize + ZONE_HEADER_SIZE {
                    return false;
                }

                let mut prev: *mut BlockHeader = ptr::null_mut();
                while !block.is_null() {
                    if (*block).prev != prev {
                        return false;
                    }

                    let end = (block as *mut u8).add(BLOCK_HEADER_SIZE + (*block).size);
                    let next = (*block).next;
                    if next.is_null() {
                        if end != zone_end {
                            return false;
                        }
                    } else if next as *mut u8 != end {
                        return false;
                    }

                    prev = block;
                    block = next;
                }

                zone = (*zone).next;
            }
        }
    }

    true
}
