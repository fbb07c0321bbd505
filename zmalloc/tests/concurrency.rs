//! Multi-threaded allocate/release interleaving through the global lock.
//!
//! Four threads each run 100 allocate/release pairs of pseudo-random
//! sizes, scribbling a per-allocation pattern and verifying it before
//! release. After everything joins and frees, the heap must report zero
//! busy bytes.

use std::thread;

use zmalloc::{allocate, dump_report, release, validate, ALIGNMENT};

const THREADS: usize = 4;
const PAIRS_PER_THREAD: usize = 100;
const MAX_HELD: usize = 8;

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

fn worker(tid: usize) {
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15 ^ (tid as u64 + 1));
    let mut held: Vec<(usize, usize, u8)> = Vec::new();

    for i in 0..PAIRS_PER_THREAD {
        let size = 16 + (rng.next() as usize % (1024 - 16 + 1));
        let p = allocate(size);
        assert!(!p.is_null(), "thread {} allocation {} failed", tid, i);
        assert_eq!(p as usize % ALIGNMENT, 0);

        let pattern = (tid as u8).wrapping_mul(0x1F).wrapping_add(i as u8);
        unsafe { std::ptr::write_bytes(p, pattern, size) };
        held.push((p as usize, size, pattern));

        if held.len() >= MAX_HELD {
            let (addr, size, pattern) = held.remove(rng.next() as usize % held.len());
            verify_and_release(addr as *mut u8, size, pattern);
        }
    }

    for (addr, size, pattern) in held {
        verify_and_release(addr as *mut u8, size, pattern);
    }
}

fn verify_and_release(p: *mut u8, size: usize, pattern: u8) {
    unsafe {
        let bytes = std::slice::from_raw_parts(p, size);
        assert!(
            bytes.iter().all(|&b| b == pattern),
            "payload at {:p} corrupted while held",
            p
        );
        release(p);
    }
}

#[test]
fn test_concurrent_allocate_release() {
    let handles: Vec<_> = (0..THREADS).map(|tid| thread::spawn(move || worker(tid))).collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // Every pointer was released: zones may linger, busy bytes may not.
    let mut report = String::new();
    dump_report(&mut report).unwrap();
    assert!(
        report.ends_with("Total : 0 bytes\n"),
        "busy bytes remain after all threads released:\n{report}"
    );
    assert!(!report.contains(" - "), "no busy block lines expected:\n{report}");
    assert!(validate());
}
