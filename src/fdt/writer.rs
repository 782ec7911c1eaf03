//! Sequential-write builder.
//!
//! Blobs are produced the way a bootloader image tool writes them: all
//! reservation entries first, then the node/property stream in depth-first
//! order, then `finish`, which appends the `END` token and lays out
//!
//! ```text
//! header | reservations + terminator | structure | strings
//! ```
//!
//! The builder keeps each block in its own buffer, so the structure offsets it
//! reports while building (`structure_len`) are exactly the offsets the token
//! cursor will later decode.

use super::header::{FDT_MAGIC, FDT_VERSION, HEADER_SIZE, Header, LAST_COMP_VERSION};
use super::strings::StringTable;
use super::{FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_NOP, FDT_PROP, tag_align};
use crate::FdtError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Reservations,
    Structure,
}

#[derive(Debug, Clone)]
pub struct FdtBuilder {
    phase: Phase,
    rsvmap: Vec<u8>,
    structure: Vec<u8>,
    strings: StringTable,
    depth: usize,
    boot_cpuid_phys: u32,
}

impl Default for FdtBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FdtBuilder {
    pub fn new() -> Self {
        FdtBuilder {
            phase: Phase::Reservations,
            rsvmap: Vec::new(),
            structure: Vec::new(),
            strings: StringTable::new(),
            depth: 0,
            boot_cpuid_phys: 0,
        }
    }

    pub fn boot_cpuid_phys(&mut self, cpu: u32) -> &mut Self {
        self.boot_cpuid_phys = cpu;
        self
    }

    pub fn add_reservation(&mut self, address: u64, size: u64) -> Result<&mut Self, FdtError> {
        if self.phase != Phase::Reservations {
            return Err(FdtError::Sequence("reservation added after the reservation table was finished"));
        }
        self.rsvmap.extend_from_slice(&address.to_be_bytes());
        self.rsvmap.extend_from_slice(&size.to_be_bytes());
        Ok(self)
    }

    /// Terminate the reservation table; nodes may be added afterwards.
    pub fn finish_reservations(&mut self) -> Result<&mut Self, FdtError> {
        if self.phase != Phase::Reservations {
            return Err(FdtError::Sequence("reservation table finished twice"));
        }
        self.rsvmap.extend_from_slice(&[0u8; 16]);
        self.phase = Phase::Structure;
        Ok(self)
    }

    /// Blob offset the structure block will have once finished.
    pub fn structure_offset(&self) -> usize {
        let terminator = if self.phase == Phase::Reservations { 16 } else { 0 };
        HEADER_SIZE + self.rsvmap.len() + terminator
    }

    /// Bytes written to the structure block so far; the offset of the next token.
    pub fn structure_len(&self) -> usize {
        self.structure.len()
    }

    pub fn begin_node(&mut self, name: &str) -> Result<&mut Self, FdtError> {
        self.structure_phase()?;
        if name.as_bytes().contains(&0) {
            return Err(FdtError::Sequence("node name contains NUL"));
        }
        self.push_tag(FDT_BEGIN_NODE);
        self.structure.extend_from_slice(name.as_bytes());
        self.structure.push(0);
        self.pad();
        self.depth += 1;
        Ok(self)
    }

    pub fn end_node(&mut self) -> Result<&mut Self, FdtError> {
        self.structure_phase()?;
        if self.depth == 0 {
            return Err(FdtError::Sequence("end_node without a matching begin_node"));
        }
        self.push_tag(FDT_END_NODE);
        self.depth -= 1;
        Ok(self)
    }

    pub fn property(&mut self, name: &str, value: &[u8]) -> Result<&mut Self, FdtError> {
        self.structure_phase()?;
        if self.depth == 0 {
            return Err(FdtError::Sequence("property outside of a node"));
        }
        let len = u32::try_from(value.len()).map_err(|_| FdtError::Sequence("property value exceeds 4 GiB"))?;
        let nameoff = self.strings.intern(name)?;
        self.push_tag(FDT_PROP);
        self.structure.extend_from_slice(&len.to_be_bytes());
        self.structure.extend_from_slice(&nameoff.to_be_bytes());
        self.structure.extend_from_slice(value);
        self.pad();
        Ok(self)
    }

    pub fn property_u32(&mut self, name: &str, value: u32) -> Result<&mut Self, FdtError> {
        self.property(name, &value.to_be_bytes())
    }

    pub fn property_u64(&mut self, name: &str, value: u64) -> Result<&mut Self, FdtError> {
        self.property(name, &value.to_be_bytes())
    }

    /// A NUL-terminated string property.
    pub fn property_string(&mut self, name: &str, value: &str) -> Result<&mut Self, FdtError> {
        let mut bytes = Vec::with_capacity(value.len() + 1);
        bytes.extend_from_slice(value.as_bytes());
        bytes.push(0);
        self.property(name, &bytes)
    }

    pub fn nop(&mut self) -> Result<&mut Self, FdtError> {
        self.structure_phase()?;
        self.push_tag(FDT_NOP);
        Ok(self)
    }

    /// Append the `END` token and assemble the blob.
    pub fn finish(&self) -> Result<Vec<u8>, FdtError> {
        self.structure_phase()?;
        if self.depth != 0 {
            return Err(FdtError::Sequence("finish with open nodes"));
        }

        let mut structure = self.structure.clone();
        structure.extend_from_slice(&FDT_END.to_be_bytes());

        let off_mem_rsvmap = HEADER_SIZE;
        let off_dt_struct = off_mem_rsvmap + self.rsvmap.len();
        let off_dt_strings = off_dt_struct + structure.len();
        let totalsize = off_dt_strings + self.strings.len();
        let word = |n: usize| u32::try_from(n).map_err(|_| FdtError::Sequence("blob exceeds 4 GiB"));

        let header = Header {
            magic: FDT_MAGIC,
            totalsize: word(totalsize)?,
            off_dt_struct: word(off_dt_struct)?,
            off_dt_strings: word(off_dt_strings)?,
            off_mem_rsvmap: word(off_mem_rsvmap)?,
            version: FDT_VERSION,
            last_comp_version: LAST_COMP_VERSION,
            boot_cpuid_phys: self.boot_cpuid_phys,
            size_dt_strings: word(self.strings.len())?,
            size_dt_struct: word(structure.len())?,
        };

        let mut blob = vec![0u8; HEADER_SIZE];
        header.write(&mut blob);
        blob.extend_from_slice(&self.rsvmap);
        blob.extend_from_slice(&structure);
        blob.extend_from_slice(self.strings.as_bytes());
        Ok(blob)
    }

    fn structure_phase(&self) -> Result<(), FdtError> {
        match self.phase {
            Phase::Structure => Ok(()),
            Phase::Reservations => Err(FdtError::Sequence("reservation table not finished")),
        }
    }

    fn push_tag(&mut self, tag: u32) {
        self.structure.extend_from_slice(&tag.to_be_bytes());
    }

    fn pad(&mut self) {
        let aligned = tag_align(self.structure.len());
        self.structure.resize(aligned, 0);
    }
}

/// Copy `blob` into a buffer of `size` bytes, leaving the tail as free space.
///
/// Blocks stay where they are; only `totalsize` changes.
pub fn open_into(blob: &[u8], size: usize) -> Result<Vec<u8>, FdtError> {
    let mut header = Header::parse(blob)?;
    let used = [header.reservation_block(), header.structure_block(), header.strings_block()]
        .iter()
        .map(|r| r.end())
        .max()
        .unwrap_or(HEADER_SIZE);
    if size < used {
        return Err(FdtError::Truncated { len: size, need: used });
    }
    header.totalsize = u32::try_from(size).map_err(|_| FdtError::Sequence("blob exceeds 4 GiB"))?;

    let mut out = vec![0u8; size];
    out[..used].copy_from_slice(&blob[..used]);
    header.write(&mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Fdt;

    #[test]
    fn nodes_require_finished_reservations() {
        let mut b = FdtBuilder::new();
        assert_eq!(b.begin_node("").unwrap_err(), FdtError::Sequence("reservation table not finished"));

        b.finish_reservations().unwrap();
        assert!(b.add_reservation(0, 1).is_err());
        assert!(b.finish_reservations().is_err());
    }

    #[test]
    fn rejects_unbalanced_nodes() {
        let mut b = FdtBuilder::new();
        b.finish_reservations().unwrap();
        assert!(b.end_node().is_err());
        assert!(b.property_u32("x", 1).is_err());

        b.begin_node("").unwrap();
        assert!(b.finish().is_err());
        b.end_node().unwrap();
        assert!(b.finish().is_ok());
    }

    #[test]
    fn structure_len_tracks_token_offsets() {
        let mut b = FdtBuilder::new();
        b.finish_reservations().unwrap();
        assert_eq!(b.structure_offset(), HEADER_SIZE + 16);

        b.begin_node("").unwrap();
        let prop_at = b.structure_len();
        b.property_string("model", "abc").unwrap();
        let child_at = b.structure_len();
        b.begin_node("cpus").unwrap();
        b.end_node().unwrap();
        b.end_node().unwrap();
        let blob = b.finish().unwrap();

        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.structure_block().offset, b.structure_offset());
        let offsets: Vec<usize> = fdt.tokens().unwrap().into_iter().map(|(off, _)| off).collect();
        assert_eq!(offsets[1], prop_at);
        assert_eq!(offsets[2], child_at);
        // prop: tag + len + nameoff + "abc\0"
        assert_eq!(child_at - prop_at, 16);
    }

    #[test]
    fn open_into_adds_free_space_only() {
        let mut b = FdtBuilder::new();
        b.finish_reservations().unwrap();
        b.begin_node("").unwrap();
        b.property_u32("a", 7).unwrap();
        b.end_node().unwrap();
        let blob = b.finish().unwrap();

        let grown = open_into(&blob, blob.len() + 256).unwrap();
        let fdt = Fdt::new(&grown).unwrap();
        assert_eq!(fdt.total_size(), blob.len() + 256);
        assert_eq!(&grown[HEADER_SIZE..blob.len()], &blob[HEADER_SIZE..]);
        assert!(grown[blob.len()..].iter().all(|&b| b == 0));

        assert!(open_into(&blob, blob.len() - 1).is_err());
    }
}
