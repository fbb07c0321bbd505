//! zmalloc - a zone-based replacement for the platform allocator
//!
//! Memory comes from the OS in large anonymous mappings ("zones"), is
//! subdivided into variable-sized blocks on demand, and goes back to the
//! OS when a zone collapses to a single free block at the head of its
//! list. One process-wide mutex serializes everything.
//!
//! # Layout
//!
//! - Requests round up to 16 bytes and route to a class: TINY (<= 128 B),
//!   SMALL (<= 1024 B) or LARGE. Each class keeps a newest-first list of
//!   zones; TINY and SMALL zones have fixed page-multiple sizes, a LARGE
//!   zone holds exactly its one request.
//! - Inside a zone, block headers form an address-ordered doubly-linked
//!   chain that tiles the mapping. Allocation is first-fit with tail
//!   splitting; freeing coalesces with the right neighbor only.
//!
//! # Entry points
//!
//! [`malloc`], [`free`], [`realloc`] and [`show_alloc_mem`] carry the
//! platform ABI names; the `zmalloc-shared` crate re-exports them
//! unmangled as a preloadable shared object for `LD_PRELOAD`. The
//! Rust-facing equivalents are [`allocate`], [`release`], [`reallocate`]
//! and [`dump_report`].
//!
//! The crate is `no_std` outside its own tests: nothing in the allocator
//! allocates through the language runtime, so the entry points stay
//! usable from the first instruction of a process that preloads the
//! shared object.

#![cfg_attr(not(test), no_std)]

pub mod api;
pub mod block;
pub mod class;
pub mod dump;
pub mod heap;
pub mod os;
pub mod zone;

pub use api::{free, malloc, realloc, show_alloc_mem};
pub use block::{BlockFlags, BlockHeader, BLOCK_HEADER_SIZE};
pub use class::{
    align_size, SizeClass, ALIGNMENT, MAX_ALLOC_SIZE, MIN_SPLIT_PAYLOAD, SMALL_MAX_SIZE,
    SMALL_ZONE_PAGES, TINY_MAX_SIZE, TINY_ZONE_PAGES,
};
pub use dump::dump_report;
pub use heap::{allocate, reallocate, release, stats, validate, HeapStats};
pub use zone::{ZoneHeader, ZONE_HEADER_SIZE};
