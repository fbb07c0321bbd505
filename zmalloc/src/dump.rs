//! Introspection dump
//!
//! Renders the busy blocks of every live zone, class by class, in the
//! fixed text format:
//!
//! ```text
//! TINY : 0x1065ec000
//! 0x1065ec040 - 0x1065ec050 : 16 bytes
//! Total : 16 bytes
//! ```
//!
//! Addresses are lowercase hex, sizes decimal, free blocks are skipped.
//! The whole walk runs under the allocator lock so the report is a
//! consistent snapshot.

use core::fmt::{self, Write};

use crate::block::{self, BlockHeader};
use crate::class::SizeClass;
use crate::heap;

/// Write the dump for one class list, returning its busy-byte total
fn write_class(
    w: &mut dyn Write,
    state: &heap::MallocState,
    class: SizeClass,
) -> Result<usize, fmt::Error> {
    let mut total = 0;
    let mut zone = heap::zones_of(state, class);

    while !zone.is_null() {
        unsafe {
            writeln!(w, "{} : {:#x}", class.label(), zone as usize)?;

            let mut cursor: *mut BlockHeader = (*zone).blocks;
            while !cursor.is_null() {
                if !(*cursor).is_free() {
                    let start = block::payload(cursor) as usize;
                    writeln!(
                        w,
                        "{:#x} - {:#x} : {} bytes",
                        start,
                        start + (*cursor).size,
                        (*cursor).size
                    )?;
                    total += (*cursor).size;
                }
                cursor = (*cursor).next;
            }

            zone = (*zone).next;
        }
    }

    Ok(total)
}

/// Write the full report into any formatter
///
/// TINY, then SMALL, then LARGE, then the grand total of busy bytes.
pub fn dump_report(w: &mut dyn Write) -> fmt::Result {
    let state = heap::lock_state();

    let mut total = 0;
    total += write_class(w, &state, SizeClass::Tiny)?;
    total += write_class(w, &state, SizeClass::Small)?;
    total += write_class(w, &state, SizeClass::Large)?;

    writeln!(w, "Total : {} bytes", total)
}

/// Unbuffered writer onto file descriptor 1
struct StdoutWriter;

impl Write for StdoutWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut bytes = s.as_bytes();
        while !bytes.is_empty() {
            let written = unsafe {
                libc::write(1, bytes.as_ptr() as *const libc::c_void, bytes.len())
            };
            if written <= 0 {
                return Err(fmt::Error);
            }
            bytes = &bytes[written as usize..];
        }
        Ok(())
    }
}

/// Print the report on standard output
///
/// Formatting goes straight to the file descriptor without heap
/// allocation, so this is safe to call while interposed as the process
/// allocator.
pub fn show_alloc_mem() {
    let _ = dump_report(&mut StdoutWriter);
}
