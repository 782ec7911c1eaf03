//! The resumable region cursor.
//!
//! `RegionState` holds everything needed to continue a scan: the structure
//! offset of the next token, the inclusion level of the current node, the
//! ancestor stack and the accumulator. `first` resets it, `next` returns the
//! next finished region. Between calls nothing is borrowed, so a caller can
//! keep the state anywhere, clone it, or drop it half way.

use tracing::{debug, trace, warn};

use super::accumulator::Accumulator;
use super::include::{Include, Item, Verdict};
use super::metrics::ScanStats;
use super::policy::{RegionFlags, Want};
use super::stack::AncestorStack;
use crate::{Fdt, FdtError, FoundRegion, Region, RegionError, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Progress {
    #[default]
    NotStarted,
    Structure,
    /// `END` seen; the strings block and the final flush remain.
    Trailer,
    Done,
}

/// Coarse view of where a cursor is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    NotStarted,
    Scanning,
    Exhausted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionState {
    progress: Progress,
    next_offset: usize,
    want: Want,
    stack: AncestorStack,
    acc: Accumulator,
    stats: ScanStats,
}

impl RegionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ScanPhase {
        match self.progress {
            Progress::NotStarted => ScanPhase::NotStarted,
            Progress::Structure | Progress::Trailer => ScanPhase::Scanning,
            Progress::Done if self.acc.has_ready() => ScanPhase::Scanning,
            Progress::Done => ScanPhase::Exhausted,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.phase() == ScanPhase::Exhausted
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Restart the scan from the top of `fdt` and return the first region.
    ///
    /// The reservation table always comes first, as a region of its own.
    pub fn first<P>(&mut self, fdt: &Fdt<'_>, include: &mut P, flags: RegionFlags) -> Result<Option<FoundRegion>, RegionError>
    where
        P: Include + ?Sized,
    {
        *self = RegionState::new();
        self.next(fdt, include, flags)
    }

    /// Return the next region, or `Ok(None)` once the tree is exhausted.
    ///
    /// `fdt`, `include` and `flags` must be the ones the scan started with.
    /// An error halts the cursor: every later call returns `Ok(None)`.
    pub fn next<P>(&mut self, fdt: &Fdt<'_>, include: &mut P, flags: RegionFlags) -> Result<Option<FoundRegion>, RegionError>
    where
        P: Include + ?Sized,
    {
        self.advance(fdt, include, flags).inspect_err(|err| {
            warn!(offset = self.next_offset, %err, "region scan halted");
            self.halt();
        })
    }

    fn advance<P>(&mut self, fdt: &Fdt<'_>, include: &mut P, flags: RegionFlags) -> Result<Option<FoundRegion>, RegionError>
    where
        P: Include + ?Sized,
    {
        loop {
            if let Some(found) = self.acc.pop_ready() {
                self.stats.record_region(&found.region);
                debug!(offset = found.region.offset, size = found.region.size, path = %found.path, "region");
                return Ok(Some(found));
            }
            match self.progress {
                Progress::NotStarted => self.start(fdt),
                Progress::Structure => self.step(fdt, include, flags)?,
                Progress::Trailer => self.finish_structure(fdt, flags)?,
                Progress::Done => return Ok(None),
            }
        }
    }

    fn start(&mut self, fdt: &Fdt<'_>) {
        self.acc.push(fdt.reservation_block(), String::new());
        self.acc.seal();
        self.next_offset = 0;
        self.progress = Progress::Structure;
    }

    /// Classify one token and feed the result to the accumulator.
    fn step<P>(&mut self, fdt: &Fdt<'_>, include: &mut P, flags: RegionFlags) -> Result<(), RegionError>
    where
        P: Include + ?Sized,
    {
        let base = fdt.structure_block().offset;
        let offset = self.next_offset;
        let (token, next) = fdt.next_token(offset)?;
        self.stats.tokens += 1;

        // where an open region ends if this token is excluded
        let mut stop_at = next;
        let included = match token {
            Token::BeginNode { name } => {
                self.stats.nodes += 1;
                self.stack.push(name, offset, self.want);
                if self.want == Want::NodesOnly
                    || !flags.intersects(RegionFlags::DIRECT_SUBNODES | RegionFlags::ALL_SUBNODES)
                {
                    stop_at = offset;
                    self.want = Want::Nothing;
                }
                let verdict = ask(include, &mut self.stats, Item::Node { path: self.stack.path() })?;
                if verdict == Verdict::Include {
                    self.want = Want::included(flags);
                } else if self.want != Want::Nothing {
                    self.want = self.want.decay();
                } else {
                    stop_at = offset;
                }
                let included = self.want.includes_tags();
                self.stack.set_emitted(included);
                included
            }
            Token::Property { name, value } => {
                self.stats.properties += 1;
                stop_at = offset;
                match ask(include, &mut self.stats, Item::Property { name, len: value.len() })? {
                    Verdict::Inherit => self.want.includes_props(),
                    Verdict::Exclude => false,
                    Verdict::Include => {
                        if flags.contains(RegionFlags::SUPERNODES) && self.want == Want::Nothing {
                            self.want = Want::NodesOnly;
                        }
                        true
                    }
                }
            }
            Token::Nop => {
                stop_at = offset;
                self.want.includes_props()
            }
            Token::EndNode => {
                let included = self.want.includes_tags();
                if !included && !flags.contains(RegionFlags::DIRECT_SUBNODES) {
                    stop_at = offset;
                }
                let frame = self.stack.pop().ok_or(FdtError::Unbalanced(offset))?;
                self.want = frame.outer;
                included
            }
            Token::End => {
                if !self.stack.is_empty() {
                    return Err(FdtError::Unbalanced(offset).into());
                }
                self.progress = Progress::Trailer;
                true
            }
        };
        trace!(offset, ?token, included, want = ?self.want, depth = self.stack.depth(), "token");

        if included && !self.acc.is_open() {
            if flags.contains(RegionFlags::SUPERNODES) {
                self.include_supernodes(fdt)?;
            }
            self.acc.open(base + offset, self.stack.path());
        } else if !included && self.acc.is_open() {
            self.acc.close(base + stop_at);
        }
        self.next_offset = next;
        Ok(())
    }

    /// Cover the BEGIN tag of every ancestor that has not been emitted yet.
    fn include_supernodes(&mut self, fdt: &Fdt<'_>) -> Result<(), FdtError> {
        let base = fdt.structure_block().offset;
        let acc = &mut self.acc;
        let stats = &mut self.stats;
        self.stack.emit_deferred(|enter, path| {
            let (_, next) = fdt.next_token(enter)?;
            debug!(offset = enter, path, "supernode");
            stats.supernodes += 1;
            acc.push(Region::new(base + enter, next - enter), path.to_owned());
            Ok(())
        })
    }

    fn finish_structure(&mut self, fdt: &Fdt<'_>, flags: RegionFlags) -> Result<(), RegionError> {
        let structure = fdt.structure_block();
        if self.next_offset != structure.size {
            return Err(FdtError::StructSize { declared: structure.size, actual: self.next_offset }.into());
        }
        self.acc.close(structure.end());

        let strings = fdt.strings_block();
        if flags.contains(RegionFlags::ADD_STRING_TABLE) && strings.size > 0 {
            if strings.offset < structure.end() {
                return Err(FdtError::StringsOverlap { strings: strings.offset, structure_end: structure.end() }.into());
            }
            self.acc.seal();
            self.acc.push(strings, String::new());
        }
        self.acc.flush();
        self.progress = Progress::Done;
        Ok(())
    }

    fn halt(&mut self) {
        self.acc.clear();
        self.progress = Progress::Done;
    }
}

fn ask<P>(include: &mut P, stats: &mut ScanStats, item: Item<'_>) -> Result<Verdict, RegionError>
where
    P: Include + ?Sized,
{
    stats.predicate_calls += 1;
    include.include(item).map_err(RegionError::PredicateFailure)
}

/// Iterator over the regions of one scan.
///
/// Yields `Err` at most once; iteration ends after it.
pub struct Regions<'p, 'a, P: ?Sized> {
    fdt: Fdt<'a>,
    include: &'p mut P,
    flags: RegionFlags,
    state: RegionState,
}

impl<'p, 'a, P> Regions<'p, 'a, P>
where
    P: Include + ?Sized,
{
    pub fn new(fdt: Fdt<'a>, include: &'p mut P, flags: RegionFlags) -> Self {
        Regions { fdt, include, flags, state: RegionState::new() }
    }

    pub fn state(&self) -> &RegionState {
        &self.state
    }
}

impl<P> Iterator for Regions<'_, '_, P>
where
    P: Include + ?Sized,
{
    type Item = Result<FoundRegion, RegionError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.state.next(&self.fdt, &mut *self.include, self.flags).transpose()
    }
}

impl<P> std::iter::FusedIterator for Regions<'_, '_, P> where P: Include + ?Sized {}
