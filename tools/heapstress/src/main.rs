//! heapstress - exercise the zmalloc allocator the way a hostile
//! program would
//!
//! Runs three suites against the C entry points: basic functionality,
//! edge cases, and a multi-threaded stress round. Finishes with the
//! operation counters and the allocator's own introspection dump.

use std::ffi::c_void;
use std::thread;
use std::time::Instant;

use zmalloc::{free, malloc, realloc, show_alloc_mem, stats, validate, ALIGNMENT};

const THREADS: usize = 4;
const PAIRS_PER_THREAD: usize = 100;
const MIN_SIZE: usize = 16;
const MAX_SIZE: usize = 1024;

struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

fn check(label: &str, ok: bool, failures: &mut usize) {
    if ok {
        println!("  ok   {label}");
    } else {
        println!("  FAIL {label}");
        *failures += 1;
    }
}

fn basic_suite(failures: &mut usize) {
    println!("=== basic functionality ===");

    unsafe {
        check("malloc(0) returns null", malloc(0).is_null(), failures);

        let big = malloc(1 << 20);
        check("malloc(1 MiB) succeeds", !big.is_null(), failures);
        if !big.is_null() {
            std::ptr::write_bytes(big as *mut u8, 0x7E, 1 << 20);
            check(
                "1 MiB payload holds a pattern",
                *(big as *mut u8) == 0x7E && *(big as *mut u8).add((1 << 20) - 1) == 0x7E,
                failures,
            );
            free(big);
        }

        let one = malloc(1);
        check(
            "malloc(1) is 16-byte aligned",
            !one.is_null() && one as usize % ALIGNMENT == 0,
            failures,
        );
        free(one);

        let mut burst = [std::ptr::null_mut::<c_void>(); 100];
        for (i, slot) in burst.iter_mut().enumerate() {
            *slot = malloc(MIN_SIZE + i);
            if !slot.is_null() {
                std::ptr::write_bytes(*slot as *mut u8, i as u8, MIN_SIZE + i);
            }
        }
        check(
            "burst of 100 small allocations succeeds",
            burst.iter().all(|p| !p.is_null()),
            failures,
        );
        let intact = burst.iter().enumerate().all(|(i, &p)| {
            !p.is_null() && {
                let bytes = std::slice::from_raw_parts(p as *const u8, MIN_SIZE + i);
                bytes.iter().all(|&b| b == i as u8)
            }
        });
        check("burst payloads stay intact", intact, failures);
        for p in burst {
            free(p);
        }
    }

    check("heap validates", validate(), failures);
}

fn edge_suite(failures: &mut usize) {
    println!("=== edge cases ===");

    unsafe {
        free(std::ptr::null_mut());
        let mut local = [0u8; 32];
        free(local.as_mut_ptr() as *mut c_void);
        check("free(NULL) and unknown free are no-ops", true, failures);

        let p = realloc(std::ptr::null_mut(), 64);
        check("realloc(NULL, n) allocates", !p.is_null(), failures);

        check("realloc(p, 0) frees and returns null", realloc(p, 0).is_null(), failures);

        let p = malloc(64);
        std::ptr::write_bytes(p as *mut u8, 0x42, 64);
        let grown = realloc(p, 4096);
        let intact = !grown.is_null()
            && std::slice::from_raw_parts(grown as *const u8, 64)
                .iter()
                .all(|&b| b == 0x42);
        check("realloc grow preserves contents", intact, failures);
        free(grown);

        check(
            "malloc(huge) fails cleanly",
            malloc(usize::MAX / 2).is_null(),
            failures,
        );
    }

    check("heap validates", validate(), failures);
}

fn stress_worker(tid: usize) {
    let mut rng = XorShift(0xD1B5_4A32_D192_ED03 ^ (tid as u64 + 1));
    let mut held: Vec<(usize, usize)> = Vec::new();

    for _ in 0..PAIRS_PER_THREAD {
        let size = MIN_SIZE + (rng.next() as usize % (MAX_SIZE - MIN_SIZE + 1));
        let p = unsafe { malloc(size) };
        assert!(!p.is_null());
        unsafe { std::ptr::write_bytes(p as *mut u8, tid as u8, size) };
        held.push((p as usize, size));

        if held.len() >= 8 {
            let (addr, size) = held.remove(rng.next() as usize % held.len());
            unsafe {
                let bytes = std::slice::from_raw_parts(addr as *const u8, size);
                assert!(bytes.iter().all(|&b| b == tid as u8));
                free(addr as *mut c_void);
            }
        }
    }

    for (addr, _) in held {
        unsafe { free(addr as *mut c_void) };
    }
}

fn stress_suite(failures: &mut usize) {
    println!("=== stress: {THREADS} threads x {PAIRS_PER_THREAD} pairs ===");

    let started = Instant::now();
    let handles: Vec<_> = (0..THREADS)
        .map(|tid| thread::spawn(move || stress_worker(tid)))
        .collect();
    let panicked = handles.into_iter().any(|h| h.join().is_err());
    let elapsed = started.elapsed();

    check("all stress threads completed", !panicked, failures);
    check("heap validates after stress", validate(), failures);
    println!("  {} pairs in {:.3?}", THREADS * PAIRS_PER_THREAD, elapsed);
}

fn main() {
    let mut failures = 0;

    basic_suite(&mut failures);
    edge_suite(&mut failures);
    stress_suite(&mut failures);

    let s = stats();
    println!("=== counters ===");
    println!("  allocations : {}", s.alloc_count);
    println!("  frees       : {}", s.free_count);
    println!("  reallocs    : {}", s.realloc_count);
    println!("  failed      : {}", s.failed_count);
    println!("  zones mapped/unmapped : {}/{}", s.zones_mapped, s.zones_unmapped);

    println!("=== show_alloc_mem ===");
    unsafe { show_alloc_mem() };

    if failures > 0 {
        println!("{failures} check(s) FAILED");
        std::process::exit(1);
    }
    println!("all checks passed");
}
