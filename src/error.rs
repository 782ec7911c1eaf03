//! Error types for the codec layer and the region engine.

use thiserror::Error;

/// Boxed error returned by a failing inclusion predicate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while reading or building a flattened tree.
///
/// Offsets in `*Token`/`OutOfBounds`/`Unbalanced` variants are relative to the
/// start of the structure block, the same coordinates the token cursor uses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FdtError {
    #[error("blob is {len} bytes, need at least {need}")]
    Truncated { len: usize, need: usize },
    #[error("bad magic 0x{0:08x}")]
    BadMagic(u32),
    #[error("unsupported version {version} (last compatible {last_compatible})")]
    BadVersion { version: u32, last_compatible: u32 },
    #[error("{block} block at {offset}+{size} does not fit in {total} bytes")]
    BadLayout { block: &'static str, offset: usize, size: usize, total: usize },
    #[error("token offset {0} is not 4-byte aligned")]
    Misaligned(usize),
    #[error("structure offset {0} is out of bounds")]
    OutOfBounds(usize),
    #[error("unknown token 0x{tag:x} at structure offset {offset}")]
    BadToken { offset: usize, tag: u32 },
    #[error("node name at structure offset {0} is unterminated or not UTF-8")]
    BadName(usize),
    #[error("string table offset {0} is unterminated or not UTF-8")]
    BadString(usize),
    #[error("unbalanced node nesting at structure offset {0}")]
    Unbalanced(usize),
    #[error("structure ends at {actual} but header declares {declared} bytes")]
    StructSize { declared: usize, actual: usize },
    #[error("strings block at {strings} overlaps structure ending at {structure_end}")]
    StringsOverlap { strings: usize, structure_end: usize },
    #[error("builder: {0}")]
    Sequence(&'static str),
}

/// Errors surfaced by the region cursor. Both variants halt iteration.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("corrupt tree: {0}")]
    CorruptTree(#[from] FdtError),
    #[error("include predicate failed: {0}")]
    PredicateFailure(#[source] BoxError),
}
