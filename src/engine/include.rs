use crate::BoxError;

/// What the predicate is asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Item<'a> {
    /// A node, by absolute path (`"/"` for the root).
    Node { path: &'a str },
    /// A property of the current node, with the length of its value.
    Property { name: &'a str, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Include,
    Exclude,
    /// Follow the enclosing node. For a node this is the same as `Exclude`.
    Inherit,
}

/// Caller-supplied inclusion policy.
///
/// Any `FnMut(Item<'_>) -> Verdict` closure is a policy. Use [`Fallible`] for a
/// closure that can fail; its error aborts the scan.
pub trait Include {
    fn include(&mut self, item: Item<'_>) -> Result<Verdict, BoxError>;
}

impl<F> Include for F
where
    F: FnMut(Item<'_>) -> Verdict,
{
    fn include(&mut self, item: Item<'_>) -> Result<Verdict, BoxError> {
        Ok(self(item))
    }
}

/// Adapter for a predicate closure returning `Result`.
#[derive(Debug, Clone)]
pub struct Fallible<F>(pub F);

impl<F, E> Include for Fallible<F>
where
    F: FnMut(Item<'_>) -> Result<Verdict, E>,
    E: Into<BoxError>,
{
    fn include(&mut self, item: Item<'_>) -> Result<Verdict, BoxError> {
        (self.0)(item).map_err(Into::into)
    }
}
