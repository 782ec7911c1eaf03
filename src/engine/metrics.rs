//! Scan counters.
//!
//! `RegionState` updates a `ScanStats` as it goes, so the numbers are exact for
//! whatever prefix of the scan has run. `find_regions_verbose` returns them with
//! the regions, and the CLI prints them after the region list.

use crate::Region;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    /// Structure tokens decoded, `END` included.
    pub tokens: usize,
    pub nodes: usize,
    pub properties: usize,
    /// Calls made to the inclusion predicate.
    pub predicate_calls: usize,
    /// Ancestor BEGIN tags added retroactively under `SUPERNODES`.
    pub supernodes: usize,
    /// Regions handed to the caller.
    pub regions: usize,
    /// Sum of the sizes of those regions.
    pub included_bytes: usize,
}

impl ScanStats {
    pub(crate) fn record_region(&mut self, region: &Region) {
        self.regions += 1;
        self.included_bytes += region.size;
    }
}
