//! Flattened device tree codec.
//!
//! This is the layer the region engine stands on. It knows the byte layout
//! of a blob and nothing about inclusion policies:
//!
//! ```text
//! +----------------+  0
//! | header (40 B)  |
//! +----------------+  off_mem_rsvmap
//! | reservations   |  (address, size) u64 pairs, zero-terminated
//! +----------------+  off_dt_struct
//! | structure      |  BEGIN_NODE / PROP / END_NODE / NOP ... END
//! +----------------+  off_dt_strings
//! | strings        |  NUL-terminated property names
//! +----------------+  totalsize (may include free space)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `header.rs`: parse and bounds-check the header, expose block bounds.
//! - `token.rs`: the token cursor (`Fdt::next_token`) and string lookup.
//! - `strings.rs`: string interning for the builder.
//! - `writer.rs`: `FdtBuilder`, a sequential writer, and `open_into`.
//!
//! All multi-byte values are big-endian. Token offsets handed to and returned
//! by the cursor are relative to the start of the structure block; `Region`s
//! are relative to the start of the blob.

#[path = "fdt/header.rs"]
mod header;
#[path = "fdt/strings.rs"]
mod strings;
#[path = "fdt/token.rs"]
mod token;
#[path = "fdt/writer.rs"]
mod writer;

pub use header::{FDT_MAGIC, FDT_VERSION, HEADER_SIZE, Header, LAST_COMP_VERSION};
pub use token::{Fdt, Reservation, Token};
pub use writer::{FdtBuilder, open_into};

pub(crate) const TAG_SIZE: usize = 4;

pub(crate) const FDT_BEGIN_NODE: u32 = 0x1;
pub(crate) const FDT_END_NODE: u32 = 0x2;
pub(crate) const FDT_PROP: u32 = 0x3;
pub(crate) const FDT_NOP: u32 = 0x4;
pub(crate) const FDT_END: u32 = 0x9;

/// Round `n` up to the next token boundary.
pub(crate) fn tag_align(n: usize) -> usize {
    (n + TAG_SIZE - 1) & !(TAG_SIZE - 1)
}

pub(crate) fn read_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let raw = bytes.get(at..at.checked_add(4)?)?;
    Some(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

pub(crate) fn read_u64(bytes: &[u8], at: usize) -> Option<u64> {
    let raw = bytes.get(at..at.checked_add(8)?)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(raw);
    Some(u64::from_be_bytes(buf))
}
