//! Property-name string table.

use crate::FdtError;

/// Interned, NUL-terminated property names in insertion order.
///
/// A name is stored once; a later name that is a suffix of an existing entry
/// (`"cells"` after `"#address-cells"`) reuses the tail of that entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct StringTable {
    bytes: Vec<u8>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of `name` in the table, adding it if it is not present yet.
    pub fn intern(&mut self, name: &str) -> Result<u32, FdtError> {
        if name.as_bytes().contains(&0) {
            return Err(FdtError::Sequence("property name contains NUL"));
        }
        if let Some(off) = self.find(name) {
            return Ok(off as u32);
        }
        let off = self.bytes.len();
        self.bytes.extend_from_slice(name.as_bytes());
        self.bytes.push(0);
        u32::try_from(off).map_err(|_| FdtError::Sequence("string table exceeds 4 GiB"))
    }

    fn find(&self, name: &str) -> Option<usize> {
        let needle = name.as_bytes();
        let want = needle.len() + 1;
        self.bytes
            .windows(want)
            .position(|w| w[..needle.len()] == *needle && w[needle.len()] == 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

/// Read the NUL-terminated string at `offset` within a strings block.
pub(crate) fn lookup(block: &[u8], offset: usize) -> Result<&str, FdtError> {
    let tail = block.get(offset..).ok_or(FdtError::BadString(offset))?;
    let len = tail.iter().position(|&b| b == 0).ok_or(FdtError::BadString(offset))?;
    std::str::from_utf8(&tail[..len]).map_err(|_| FdtError::BadString(offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates_and_shares_suffixes() {
        let mut t = StringTable::new();
        let a = t.intern("#address-cells").unwrap();
        let b = t.intern("description").unwrap();
        assert_eq!(t.intern("#address-cells").unwrap(), a);
        assert_eq!(t.intern("cells").unwrap(), a + 9);
        assert_eq!(t.len(), "#address-cells\0description\0".len());

        assert_eq!(lookup(t.as_bytes(), b as usize).unwrap(), "description");
        assert_eq!(lookup(t.as_bytes(), a as usize + 9).unwrap(), "cells");
    }

    #[test]
    fn lookup_rejects_unterminated_and_out_of_range() {
        let block = b"abc\0de";
        assert_eq!(lookup(block, 0).unwrap(), "abc");
        assert_eq!(lookup(block, 4), Err(FdtError::BadString(4)));
        assert_eq!(lookup(block, 99), Err(FdtError::BadString(99)));
    }

    #[test]
    fn rejects_embedded_nul() {
        let mut t = StringTable::new();
        assert!(t.intern("a\0b").is_err());
    }
}
