//! Reallocation semantics: grow in place, copy-and-move, shrink policy
//! and the null/zero aliases.
//!
//! Runs alone in its own process; the phases run in sequence so each one
//! starts from a heap state the previous phase pinned down.

use zmalloc::{allocate, dump_report, reallocate, release, validate};

fn dump_string() -> String {
    let mut out = String::new();
    dump_report(&mut out).unwrap();
    out
}

#[test]
fn test_reallocate_scenarios() {
    // Grow in place through the free right neighbor. Freeing b merged it
    // with the zone tail, so a's neighbor is one big free block.
    let a = allocate(64);
    let b = allocate(64);
    assert!(!a.is_null() && !b.is_null());

    unsafe {
        std::ptr::write_bytes(a, 0x5A, 64);
        release(b);

        let a2 = reallocate(a, 200);
        assert_eq!(a2, a, "grow should absorb the free right neighbor");
        assert_eq!(std::slice::from_raw_parts(a, 64), &[0x5A; 64][..]);

        // a now owns the whole zone payload; releasing it collapses the
        // zone and leaves the next phase a fresh heap.
        release(a);
    }
    assert!(validate());

    // Copy path: a busy right neighbor forces a move to a fresh block.
    let a = allocate(64);
    let b = allocate(64);
    assert!(!a.is_null() && !b.is_null());

    unsafe {
        std::ptr::write_bytes(a, 0x42, 64);

        let a2 = reallocate(a, 4096);
        assert!(!a2.is_null());
        assert_ne!(a2, a, "blocked grow must move the allocation");
        assert_eq!(std::slice::from_raw_parts(a2, 64), &[0x42; 64][..]);

        // The whole new payload is writable.
        std::ptr::write_bytes(a2, 0x43, 4096);

        release(b);
        release(a2);
    }
    assert!(validate());

    // Null pointer behaves as allocate.
    let p = unsafe { reallocate(std::ptr::null_mut(), 32) };
    assert!(!p.is_null());

    // Zero size behaves as release and yields null.
    assert!(unsafe { reallocate(p, 0) }.is_null());

    // Unknown pointers yield null without touching anything.
    let mut local = [0u8; 32];
    assert!(unsafe { reallocate(local.as_mut_ptr(), 64) }.is_null());

    // Shrinking returns the same pointer and keeps the block size: the
    // tail is not split off, which the dump makes visible.
    let p = allocate(512);
    assert!(!p.is_null());
    unsafe {
        let p2 = reallocate(p, 64);
        assert_eq!(p2, p, "shrink must stay in place");

        let report = dump_string();
        let line = format!("{:#x} - {:#x} : 512 bytes", p as usize, p as usize + 512);
        assert!(
            report.contains(&line),
            "shrunk block should still span 512 bytes:\n{report}"
        );

        release(p);
    }
    assert!(validate());

    // Round-trip law: the surviving prefix is byte-identical after a
    // grow, whether it moved or not.
    let p = allocate(100);
    assert!(!p.is_null());
    unsafe {
        for i in 0..100 {
            *p.add(i) = i as u8;
        }
        let p2 = reallocate(p, 300);
        assert!(!p2.is_null());
        for i in 0..100 {
            assert_eq!(*p2.add(i), i as u8);
        }
        release(p2);
    }
    assert!(validate());
}
