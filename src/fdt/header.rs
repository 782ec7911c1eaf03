//! Blob header.
//!
//! The header is ten big-endian `u32` words. Only version 17 layouts are
//! produced; anything claiming compatibility with 17 or earlier (and at least
//! 17 itself, since older headers lack `size_dt_struct`) is accepted.

use super::read_u32;
use crate::{FdtError, Region};

pub const FDT_MAGIC: u32 = 0xd00d_feed;
pub const FDT_VERSION: u32 = 17;
pub const LAST_COMP_VERSION: u32 = 16;
pub const HEADER_SIZE: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub totalsize: u32,
    pub off_dt_struct: u32,
    pub off_dt_strings: u32,
    pub off_mem_rsvmap: u32,
    pub version: u32,
    pub last_comp_version: u32,
    pub boot_cpuid_phys: u32,
    pub size_dt_strings: u32,
    pub size_dt_struct: u32,
}

impl Header {
    /// Parse the header at the start of `blob` and check that every block it
    /// declares lies inside both `totalsize` and `blob`.
    pub fn parse(blob: &[u8]) -> Result<Self, FdtError> {
        if blob.len() < HEADER_SIZE {
            return Err(FdtError::Truncated { len: blob.len(), need: HEADER_SIZE });
        }
        let word = |i: usize| read_u32(blob, i * 4).unwrap_or_default();
        let header = Header {
            magic: word(0),
            totalsize: word(1),
            off_dt_struct: word(2),
            off_dt_strings: word(3),
            off_mem_rsvmap: word(4),
            version: word(5),
            last_comp_version: word(6),
            boot_cpuid_phys: word(7),
            size_dt_strings: word(8),
            size_dt_struct: word(9),
        };
        header.check(blob.len())?;
        Ok(header)
    }

    fn check(&self, available: usize) -> Result<(), FdtError> {
        if self.magic != FDT_MAGIC {
            return Err(FdtError::BadMagic(self.magic));
        }
        if self.version < FDT_VERSION || self.last_comp_version > FDT_VERSION {
            return Err(FdtError::BadVersion { version: self.version, last_compatible: self.last_comp_version });
        }

        let total = self.totalsize as usize;
        if total > available || total < HEADER_SIZE {
            return Err(FdtError::Truncated { len: available, need: total.max(HEADER_SIZE) });
        }

        if self.off_mem_rsvmap > self.off_dt_struct {
            let rsvmap = self.off_mem_rsvmap as usize;
            return Err(FdtError::BadLayout { block: "reservation", offset: rsvmap, size: 0, total });
        }
        for (block, region) in [
            ("reservation", self.reservation_block()),
            ("structure", self.structure_block()),
            ("strings", self.strings_block()),
        ] {
            let fits =
                region.offset >= HEADER_SIZE && region.offset.checked_add(region.size).is_some_and(|end| end <= total);
            if !fits {
                return Err(FdtError::BadLayout { block, offset: region.offset, size: region.size, total });
            }
        }
        if self.off_dt_struct % 4 != 0 {
            return Err(FdtError::Misaligned(self.off_dt_struct as usize));
        }
        Ok(())
    }

    /// The memory reservation table, up to the start of the structure block.
    pub fn reservation_block(&self) -> Region {
        let offset = self.off_mem_rsvmap as usize;
        Region { offset, size: (self.off_dt_struct as usize).saturating_sub(offset) }
    }

    pub fn structure_block(&self) -> Region {
        Region { offset: self.off_dt_struct as usize, size: self.size_dt_struct as usize }
    }

    pub fn strings_block(&self) -> Region {
        Region { offset: self.off_dt_strings as usize, size: self.size_dt_strings as usize }
    }

    /// Serialise into the first `HEADER_SIZE` bytes of `out`.
    pub(crate) fn write(&self, out: &mut [u8]) {
        let words = [
            self.magic,
            self.totalsize,
            self.off_dt_struct,
            self.off_dt_strings,
            self.off_mem_rsvmap,
            self.version,
            self.last_comp_version,
            self.boot_cpuid_phys,
            self.size_dt_strings,
            self.size_dt_struct,
        ];
        for (chunk, word) in out[..HEADER_SIZE].chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FdtBuilder;

    fn small_blob() -> Vec<u8> {
        let mut b = FdtBuilder::new();
        b.add_reservation(0x1000, 0x200).unwrap();
        b.finish_reservations().unwrap();
        b.begin_node("").unwrap();
        b.property_u32("#address-cells", 1).unwrap();
        b.end_node().unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn parses_builder_output() {
        let blob = small_blob();
        let h = Header::parse(&blob).unwrap();

        assert_eq!(h.magic, FDT_MAGIC);
        assert_eq!(h.totalsize as usize, blob.len());
        assert_eq!(h.off_mem_rsvmap as usize, HEADER_SIZE);
        // one entry plus the terminator
        assert_eq!(h.reservation_block().size, 32);
        assert_eq!(h.structure_block().offset, HEADER_SIZE + 32);
        assert_eq!(h.strings_block().offset, h.structure_block().end());
        assert_eq!(h.version, FDT_VERSION);
    }

    #[test]
    fn rejects_bad_magic_and_short_input() {
        let mut blob = small_blob();
        assert!(matches!(Header::parse(&blob[..12]), Err(FdtError::Truncated { .. })));

        blob[0] = 0;
        assert!(matches!(Header::parse(&blob), Err(FdtError::BadMagic(_))));
    }

    #[test]
    fn rejects_blocks_past_totalsize() {
        let blob = small_blob();
        let mut h = Header::parse(&blob).unwrap();
        h.size_dt_strings += 64;
        let mut broken = blob.clone();
        h.write(&mut broken);

        let err = Header::parse(&broken).unwrap_err();
        assert!(matches!(err, FdtError::BadLayout { block: "strings", .. }), "{err:?}");
    }

    #[test]
    fn write_then_parse_is_stable() {
        let blob = small_blob();
        let h = Header::parse(&blob).unwrap();
        let mut copy = blob.clone();
        h.write(&mut copy);
        assert_eq!(copy, blob);
    }
}
