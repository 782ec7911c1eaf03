//! The token cursor.
//!
//! `Fdt::next_token` decodes one structure-block token at a time and reports
//! where the following token starts. It keeps no state between calls, so any
//! caller that remembers an offset can resume from it:
//!
//! ```text
//! offset ─▶ next_token ─▶ (Token, next_offset) ─▶ next_token ─▶ ...
//! ```

use super::header::Header;
use super::{FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_NOP, FDT_PROP, TAG_SIZE, read_u32, read_u64, strings, tag_align};
use crate::{FdtError, Region};

/// One structure-block token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Start of a node. The root node's name is empty.
    BeginNode { name: &'a str },
    /// A property of the enclosing node; `name` is resolved from the strings block.
    Property { name: &'a str, value: &'a [u8] },
    EndNode,
    Nop,
    /// Terminates the structure block.
    End,
}

/// A memory reservation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub address: u64,
    pub size: u64,
}

/// A validated, borrowed view over a blob.
///
/// The bytes are borrowed immutably for the lifetime of the view, so the blob
/// cannot change under a region scan that holds it.
#[derive(Debug, Clone, Copy)]
pub struct Fdt<'a> {
    blob: &'a [u8],
    header: Header,
}

impl<'a> Fdt<'a> {
    /// Wrap `blob` after checking its header and block bounds.
    pub fn new(blob: &'a [u8]) -> Result<Self, FdtError> {
        let header = Header::parse(blob)?;
        Ok(Fdt { blob, header })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The whole blob as passed to [`Fdt::new`], including any free space.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.blob
    }

    pub fn total_size(&self) -> usize {
        self.header.totalsize as usize
    }

    pub fn reservation_block(&self) -> Region {
        self.header.reservation_block()
    }

    pub fn structure_block(&self) -> Region {
        self.header.structure_block()
    }

    pub fn strings_block(&self) -> Region {
        self.header.strings_block()
    }

    /// Bytes covered by `region`, or `None` if it falls outside the blob.
    pub fn region_bytes(&self, region: Region) -> Option<&'a [u8]> {
        self.blob.get(region.offset..region.end())
    }

    fn structure(&self) -> &'a [u8] {
        let block = self.structure_block();
        &self.blob[block.offset..block.end()]
    }

    /// Property name at `offset` in the strings block.
    pub fn string_at(&self, offset: usize) -> Result<&'a str, FdtError> {
        let block = self.strings_block();
        strings::lookup(&self.blob[block.offset..block.end()], offset)
    }

    /// Reservation entries, stopping at the all-zero terminator.
    pub fn reservations(&self) -> Vec<Reservation> {
        let block = self.reservation_block();
        let table = &self.blob[block.offset..block.end()];
        (0..table.len() / 16)
            .map_while(|i| {
                let address = read_u64(table, i * 16)?;
                let size = read_u64(table, i * 16 + 8)?;
                (address != 0 || size != 0).then_some(Reservation { address, size })
            })
            .collect()
    }

    /// Decode the token at `offset` (relative to the structure block) and
    /// return it with the offset of the token after it.
    pub fn next_token(&self, offset: usize) -> Result<(Token<'a>, usize), FdtError> {
        if offset % TAG_SIZE != 0 {
            return Err(FdtError::Misaligned(offset));
        }
        let structure = self.structure();
        let tag = read_u32(structure, offset).ok_or(FdtError::OutOfBounds(offset))?;
        let body = offset + TAG_SIZE;

        let (token, next) = match tag {
            FDT_BEGIN_NODE => {
                let rest = structure.get(body..).ok_or(FdtError::OutOfBounds(body))?;
                let len = rest.iter().position(|&b| b == 0).ok_or(FdtError::BadName(offset))?;
                let name = std::str::from_utf8(&rest[..len]).map_err(|_| FdtError::BadName(offset))?;
                (Token::BeginNode { name }, tag_align(body + len + 1))
            }
            FDT_PROP => {
                let len = read_u32(structure, body).ok_or(FdtError::OutOfBounds(body))? as usize;
                let nameoff = read_u32(structure, body + 4).ok_or(FdtError::OutOfBounds(body + 4))? as usize;
                let start = body + 8;
                let end = start.checked_add(len).ok_or(FdtError::OutOfBounds(start))?;
                let value = structure.get(start..end).ok_or(FdtError::OutOfBounds(end))?;
                let name = self.string_at(nameoff)?;
                (Token::Property { name, value }, tag_align(end))
            }
            FDT_END_NODE => (Token::EndNode, body),
            FDT_NOP => (Token::Nop, body),
            FDT_END => (Token::End, body),
            other => return Err(FdtError::BadToken { offset, tag: other }),
        };

        if next > structure.len() {
            return Err(FdtError::OutOfBounds(next));
        }
        Ok((token, next))
    }

    /// Every token up to and including `End`, with its offset.
    pub fn tokens(&self) -> Result<Vec<(usize, Token<'a>)>, FdtError> {
        let mut out = Vec::new();
        let mut offset = 0;
        loop {
            let (token, next) = self.next_token(offset)?;
            out.push((offset, token));
            if token == Token::End {
                return Ok(out);
            }
            offset = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FdtBuilder;

    fn sample() -> Vec<u8> {
        let mut b = FdtBuilder::new();
        b.add_reservation(0xdead_0000, 0x1000).unwrap();
        b.add_reservation(0xbeef_0000, 0x2000).unwrap();
        b.finish_reservations().unwrap();
        b.begin_node("").unwrap();
        b.property_string("compatible", "vendor,board").unwrap();
        b.begin_node("chosen").unwrap();
        b.nop().unwrap();
        b.property("empty", &[]).unwrap();
        b.end_node().unwrap();
        b.end_node().unwrap();
        b.finish().unwrap()
    }

    #[test]
    fn walks_tokens_in_order() {
        let blob = sample();
        let fdt = Fdt::new(&blob).unwrap();
        let tokens: Vec<Token> = fdt.tokens().unwrap().into_iter().map(|(_, t)| t).collect();

        assert_eq!(
            tokens,
            vec![
                Token::BeginNode { name: "" },
                Token::Property { name: "compatible", value: b"vendor,board\0" },
                Token::BeginNode { name: "chosen" },
                Token::Nop,
                Token::Property { name: "empty", value: &[] },
                Token::EndNode,
                Token::EndNode,
                Token::End,
            ]
        );
    }

    #[test]
    fn offsets_are_aligned_and_end_at_block_size() {
        let blob = sample();
        let fdt = Fdt::new(&blob).unwrap();
        let tokens = fdt.tokens().unwrap();

        // root: tag + "\0" padded to 4
        assert_eq!(tokens[1].0, 8);
        assert!(tokens.iter().all(|(off, _)| off % 4 == 0));
        let (last, _) = tokens.last().unwrap();
        assert_eq!(last + 4, fdt.structure_block().size);
    }

    #[test]
    fn reports_unknown_tags_and_misaligned_offsets() {
        let mut blob = sample();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.next_token(2), Err(FdtError::Misaligned(2)));

        let base = fdt.structure_block().offset;
        blob[base..base + 4].copy_from_slice(&0x77u32.to_be_bytes());
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(fdt.next_token(0), Err(FdtError::BadToken { offset: 0, tag: 0x77 }));
    }

    #[test]
    fn reads_reservations_until_terminator() {
        let blob = sample();
        let fdt = Fdt::new(&blob).unwrap();
        assert_eq!(
            fdt.reservations(),
            vec![
                Reservation { address: 0xdead_0000, size: 0x1000 },
                Reservation { address: 0xbeef_0000, size: 0x2000 },
            ]
        );
        assert_eq!(fdt.reservation_block().size, 48);
    }

    #[test]
    fn region_bytes_is_bounds_checked() {
        let blob = sample();
        let fdt = Fdt::new(&blob).unwrap();
        let strings = fdt.strings_block();
        assert_eq!(fdt.region_bytes(strings).unwrap(), b"compatible\0empty\0");
        assert_eq!(fdt.region_bytes(Region { offset: blob.len(), size: 1 }), None);
    }
}
