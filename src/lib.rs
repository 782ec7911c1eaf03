//! Byte-region selection for flattened device trees.
//!
//! Given a device tree blob and an inclusion policy, `fdtregion` computes the
//! ordered, non-overlapping byte ranges of the blob that hold the selected
//! nodes and properties. Feeding exactly those bytes to a hash is how FIT
//! image signatures cover an image description while leaving out the image
//! payloads and anything rewritten after signing.
//!
//! ```
//! use fdtregion::{Fdt, FdtBuilder, Item, RegionFlags, Verdict, find_regions};
//!
//! let mut b = FdtBuilder::new();
//! b.finish_reservations().unwrap();
//! b.begin_node("").unwrap();
//! b.property_string("description", "demo").unwrap();
//! b.property_string("data", "payload").unwrap();
//! b.end_node().unwrap();
//! let blob = b.finish().unwrap();
//!
//! let fdt = Fdt::new(&blob).unwrap();
//! let mut policy = |item: Item<'_>| match item {
//!     Item::Node { path } if path == "/" => Verdict::Include,
//!     Item::Property { name: "data", .. } => Verdict::Exclude,
//!     Item::Property { .. } => Verdict::Inherit,
//!     _ => Verdict::Exclude,
//! };
//! let regions = find_regions(&fdt, &mut policy, RegionFlags::empty()).unwrap();
//! // reservation table, root up to `data`, root end + END token
//! assert_eq!(regions.len(), 3);
//! ```

extern crate self as fdtregion;

#[macro_use]
mod macros;
mod api;
mod engine;
mod error;
mod fdt;
mod select;

pub use api::{RegionReport, digest_found, digest_regions, find_regions, find_regions_verbose};
pub use engine::{Fallible, Include, Item, RegionFlags, RegionState, Regions, ScanPhase, ScanStats, Verdict};
pub use error::{BoxError, FdtError, RegionError};
pub use fdt::{
    FDT_MAGIC, FDT_VERSION, Fdt, FdtBuilder, HEADER_SIZE, Header, LAST_COMP_VERSION, Reservation, Token, open_into,
};
pub use select::{Selector, is_node_path};

use std::ops::Range;

/// A contiguous byte range of a blob, relative to the start of the blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Region {
    pub offset: usize,
    pub size: usize,
}

impl Region {
    pub fn new(offset: usize, size: usize) -> Self {
        Region { offset, size }
    }

    /// One past the last byte.
    pub fn end(&self) -> usize {
        self.offset + self.size
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// A region produced by the cursor together with the path of the node that
/// was active when the region was opened.
///
/// The path is empty for the reservation-table and string-table regions, and
/// for a region opened on the `END` token after the root has closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundRegion {
    pub region: Region,
    pub path: String,
}
