/// A lazily compiled, process-wide `Regex` for a literal pattern.
#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a [`Selector`](crate::Selector) from exact node paths and property
/// name lists.
///
/// ```
/// let selector = fdtregion::selector! {
///     nodes: ["/", "/images/kernel@1"],
///     exclude_props: ["data"],
/// };
/// assert!(selector.selects_node("/images/kernel@1"));
/// ```
#[macro_export]
macro_rules! selector {
    (
        nodes: [ $($node:expr),* $(,)? ]
        $(, include_props: [ $($inc:expr),* $(,)? ])?
        $(, exclude_props: [ $($exc:expr),* $(,)? ])?
        $(,)?
    ) => {{
        let selector = $crate::Selector::new();
        $(let selector = selector.node($node);)*
        $($(let selector = selector.include_property($inc);)*)?
        $($(let selector = selector.exclude_property($exc);)*)?
        selector
    }};
}
