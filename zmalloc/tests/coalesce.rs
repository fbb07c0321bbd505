//! Coalescing behavior: right-merge on free, and its deliberate
//! one-sidedness.
//!
//! Runs alone in its own process; the scenario steps leave the heap in a
//! known state for the next phase.

use zmalloc::{allocate, release, validate, BLOCK_HEADER_SIZE};

#[test]
fn test_right_coalesce_and_no_left_merge() {
    // Phase 1: freeing a block whose right neighbor is already free
    // merges them, and the merged region satisfies a larger request.
    let a = allocate(64);
    let b = allocate(64);
    let c = allocate(64);
    assert!(!a.is_null() && !b.is_null() && !c.is_null());

    unsafe {
        release(b);
        release(a); // absorbs b: the region at a now spans 64 + 32 + 64

        let d = allocate(128);
        assert_eq!(d, a, "merged region at a should serve the 128-byte request");

        // Unwind phase 1; the final release collapses the zone.
        release(c);
        release(d);
    }
    assert!(validate());

    // Phase 2: freeing left-to-right never merges, because coalescing
    // only looks right at the moment of free. Two adjacent free 64-byte
    // blocks cannot serve a 128-byte request.
    let a = allocate(64);
    let b = allocate(64);
    let c = allocate(64);
    assert!(!a.is_null() && !b.is_null() && !c.is_null());

    unsafe {
        release(a); // right neighbor b is busy: no merge
        release(b); // right neighbor c is busy: no merge, and no look left

        let e = allocate(128);
        assert_ne!(e, a);
        assert_ne!(e, b);
        // First fit walks past both 64-byte holes and splits the tail
        // after c.
        assert_eq!(e as usize, c as usize + 64 + BLOCK_HEADER_SIZE);

        release(c);
        release(e);
    }
    assert!(validate());
}
