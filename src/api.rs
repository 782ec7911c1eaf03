use crate::{Fdt, FdtError, FoundRegion, Include, RegionError, RegionFlags, RegionState, Regions, ScanStats};
use sha2::Digest;
use sha2::digest::Output;
use std::time::{Duration, Instant};

/// Result from [`find_regions_verbose`].
#[derive(Debug, Clone)]
pub struct RegionReport {
    pub regions: Vec<FoundRegion>,
    /// Counters for the whole scan.
    pub stats: ScanStats,
    /// `totalsize` from the header, for coverage ratios.
    pub total_size: usize,
    pub elapsed: Duration,
}

impl RegionReport {
    /// Bytes covered by all regions.
    pub fn included_bytes(&self) -> usize {
        self.regions.iter().map(|f| f.region.size).sum()
    }
}

/// Collect every region of `fdt` selected by `include` under `flags`.
///
/// # Example
/// ```
/// use fdtregion::{Fdt, FdtBuilder, RegionFlags, find_regions, selector};
///
/// let mut b = FdtBuilder::new();
/// b.finish_reservations().unwrap();
/// b.begin_node("").unwrap();
/// b.begin_node("chosen").unwrap();
/// b.property_string("bootargs", "console=ttyS0").unwrap();
/// b.end_node().unwrap();
/// b.end_node().unwrap();
/// let blob = b.finish().unwrap();
///
/// let fdt = Fdt::new(&blob).unwrap();
/// let mut chosen = selector! { nodes: ["/chosen"] };
/// let regions = find_regions(&fdt, &mut chosen, RegionFlags::SUPERNODES).unwrap();
/// assert_eq!(regions[1].path, "/");
/// assert_eq!(regions[1].region.end(), fdt.structure_block().end());
/// ```
pub fn find_regions<P>(fdt: &Fdt<'_>, include: &mut P, flags: RegionFlags) -> Result<Vec<FoundRegion>, RegionError>
where
    P: Include + ?Sized,
{
    Regions::new(*fdt, include, flags).collect()
}

/// Like [`find_regions`], with scan counters and timing.
pub fn find_regions_verbose<P>(fdt: &Fdt<'_>, include: &mut P, flags: RegionFlags) -> Result<RegionReport, RegionError>
where
    P: Include + ?Sized,
{
    let started = Instant::now();
    let mut state = RegionState::new();
    let mut regions = Vec::new();

    let mut found = state.first(fdt, include, flags)?;
    while let Some(region) = found {
        regions.push(region);
        found = state.next(fdt, include, flags)?;
    }

    Ok(RegionReport { regions, stats: *state.stats(), total_size: fdt.total_size(), elapsed: started.elapsed() })
}

/// Hash the selected bytes, region by region, without collecting them first.
///
/// ```
/// use fdtregion::{Fdt, FdtBuilder, RegionFlags, digest_regions, selector};
/// use sha2::Sha256;
///
/// let mut b = FdtBuilder::new();
/// b.finish_reservations().unwrap();
/// b.begin_node("").unwrap();
/// b.property_u32("value", 1).unwrap();
/// b.end_node().unwrap();
/// let blob = b.finish().unwrap();
///
/// let fdt = Fdt::new(&blob).unwrap();
/// let mut root = selector! { nodes: ["/"] };
/// let digest = digest_regions::<Sha256, _>(&fdt, &mut root, RegionFlags::empty()).unwrap();
/// assert_eq!(digest.len(), 32);
/// ```
pub fn digest_regions<D, P>(fdt: &Fdt<'_>, include: &mut P, flags: RegionFlags) -> Result<Output<D>, RegionError>
where
    D: Digest,
    P: Include + ?Sized,
{
    let mut hasher = D::new();
    for found in Regions::new(*fdt, include, flags) {
        hash_region(&mut hasher, fdt, &found?)?;
    }
    Ok(hasher.finalize())
}

/// Hash regions that were already collected, e.g. [`RegionReport::regions`].
///
/// Fails with [`FdtError::OutOfBounds`] if a region does not lie inside `fdt`.
pub fn digest_found<D: Digest>(fdt: &Fdt<'_>, regions: &[FoundRegion]) -> Result<Output<D>, RegionError> {
    let mut hasher = D::new();
    for found in regions {
        hash_region(&mut hasher, fdt, found)?;
    }
    Ok(hasher.finalize())
}

fn hash_region<D: Digest>(hasher: &mut D, fdt: &Fdt<'_>, found: &FoundRegion) -> Result<(), RegionError> {
    let bytes = fdt.region_bytes(found.region).ok_or(FdtError::OutOfBounds(found.region.end()))?;
    hasher.update(bytes);
    Ok(())
}
