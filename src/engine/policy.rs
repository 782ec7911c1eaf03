use bitflags::bitflags;

bitflags! {
    /// Options that shape how node verdicts propagate through the tree.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RegionFlags: u32 {
        /// An included node also includes its immediate children as
        /// structural skeletons (tags only, no properties).
        const DIRECT_SUBNODES = 1 << 0;
        /// An included node includes its entire subtree.
        const ALL_SUBNODES = 1 << 1;
        /// Every ancestor of included content gets its BEGIN tag, and from
        /// then on its END tag, included.
        const SUPERNODES = 1 << 2;
        /// Append the whole strings block as the final region.
        const ADD_STRING_TABLE = 1 << 3;
    }
}

/// How much of the current node the scan is including.
///
/// Ordered: each level includes everything the previous one does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub(crate) enum Want {
    #[default]
    Nothing,
    /// BEGIN/END tags only.
    NodesOnly,
    NodesAndProps,
    /// Like `NodesAndProps`, and stays there for every descendant.
    AllNodesAndProps,
}

impl Want {
    /// Level for a node the predicate included.
    pub(crate) fn included(flags: RegionFlags) -> Want {
        if flags.contains(RegionFlags::ALL_SUBNODES) { Want::AllNodesAndProps } else { Want::NodesAndProps }
    }

    /// Level a child inherits when the predicate did not include it.
    pub(crate) fn decay(self) -> Want {
        match self {
            Want::AllNodesAndProps => Want::AllNodesAndProps,
            Want::NodesAndProps => Want::NodesOnly,
            Want::NodesOnly | Want::Nothing => Want::Nothing,
        }
    }

    pub(crate) fn includes_tags(self) -> bool {
        self != Want::Nothing
    }

    pub(crate) fn includes_props(self) -> bool {
        self >= Want::NodesAndProps
    }
}
