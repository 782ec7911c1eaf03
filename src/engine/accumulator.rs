use std::collections::VecDeque;

use crate::{FoundRegion, Region};

/// Turns open/close transitions into finished regions.
///
/// The most recent region is held back as `pending` so that a region starting
/// at or before its end can be folded into it. `seal` forbids folding the next
/// region in, which keeps the reservation and strings blocks separate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Accumulator {
    open: Option<(usize, String)>,
    pending: Option<FoundRegion>,
    sealed: bool,
    ready: VecDeque<FoundRegion>,
}

impl Accumulator {
    pub(crate) fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub(crate) fn open(&mut self, at: usize, path: &str) {
        if self.open.is_none() {
            self.open = Some((at, path.to_owned()));
        }
    }

    pub(crate) fn close(&mut self, end: usize) {
        if let Some((start, path)) = self.open.take() {
            self.push(Region::new(start, end.saturating_sub(start)), path);
        }
    }

    pub(crate) fn push(&mut self, region: Region, path: String) {
        if region.size == 0 {
            return;
        }
        if let Some(prev) = self.pending.as_mut().filter(|_| !self.sealed) {
            if region.offset <= prev.region.end() {
                let end = prev.region.end().max(region.end());
                prev.region.size = end - prev.region.offset;
                return;
            }
        }
        if let Some(prev) = self.pending.replace(FoundRegion { region, path }) {
            self.ready.push_back(prev);
        }
        self.sealed = false;
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    pub(crate) fn flush(&mut self) {
        if let Some(last) = self.pending.take() {
            self.ready.push_back(last);
        }
    }

    pub(crate) fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    pub(crate) fn pop_ready(&mut self) -> Option<FoundRegion> {
        self.ready.pop_front()
    }

    pub(crate) fn clear(&mut self) {
        *self = Accumulator::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(acc: &mut Accumulator) -> Vec<Region> {
        acc.flush();
        std::iter::from_fn(|| acc.pop_ready()).map(|f| f.region).collect()
    }

    #[test]
    fn merges_touching_regions_until_sealed() {
        let mut acc = Accumulator::default();
        acc.push(Region::new(40, 16), String::new());
        acc.seal();
        acc.push(Region::new(56, 8), "/".into());
        acc.push(Region::new(64, 4), "/a".into());
        acc.push(Region::new(72, 4), "/b".into());
        acc.seal();
        acc.push(Region::new(76, 10), String::new());

        assert_eq!(
            drain(&mut acc),
            vec![Region::new(40, 16), Region::new(56, 12), Region::new(72, 4), Region::new(76, 10)]
        );
    }

    #[test]
    fn merged_region_keeps_first_path() {
        let mut acc = Accumulator::default();
        acc.open(0, "/");
        acc.close(8);
        acc.open(8, "/x");
        acc.close(12);
        acc.flush();
        let found = acc.pop_ready().unwrap();
        assert_eq!(found.region, Region::new(0, 12));
        assert_eq!(found.path, "/");
    }

    #[test]
    fn drops_empty_regions_and_ignores_double_open() {
        let mut acc = Accumulator::default();
        acc.open(4, "/");
        acc.open(100, "/late");
        acc.close(4);
        acc.close(50);
        assert!(!acc.is_open());
        assert!(drain(&mut acc).is_empty());
    }
}
