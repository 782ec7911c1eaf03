use super::policy::Want;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Emission {
    /// BEGIN tag not yet part of any region.
    Deferred,
    Emitted,
}

/// One open node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Frame {
    /// Structure offset of the BEGIN tag.
    pub(crate) enter: usize,
    /// Inclusion level of the parent, restored at END.
    pub(crate) outer: Want,
    pub(crate) emission: Emission,
    path_end: usize,
    parent_len: usize,
}

/// Open nodes from the root down to the current one, plus the current path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AncestorStack {
    frames: Vec<Frame>,
    path: String,
}

impl AncestorStack {
    pub(crate) fn push(&mut self, name: &str, enter: usize, outer: Want) {
        let parent_len = self.path.len();
        // the root contributes the leading '/'
        if parent_len != 1 {
            self.path.push('/');
        }
        self.path.push_str(name);
        let path_end = self.path.len();
        self.frames.push(Frame { enter, outer, emission: Emission::Deferred, path_end, parent_len });
    }

    pub(crate) fn pop(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        self.path.truncate(frame.parent_len);
        Some(frame)
    }

    pub(crate) fn set_emitted(&mut self, emitted: bool) {
        if let Some(top) = self.frames.last_mut() {
            top.emission = if emitted { Emission::Emitted } else { Emission::Deferred };
        }
    }

    /// Path of the current node; empty outside the root.
    pub(crate) fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Walk root first, handing every deferred BEGIN tag to `emit` and marking
    /// it emitted. Ancestors whose parent level was `Nothing` are raised to
    /// `NodesOnly` so their END tags are included as well.
    pub(crate) fn emit_deferred<E>(&mut self, mut emit: impl FnMut(usize, &str) -> Result<(), E>) -> Result<(), E> {
        for frame in &mut self.frames {
            if frame.emission == Emission::Deferred {
                emit(frame.enter, &self.path[..frame.path_end])?;
                frame.emission = Emission::Emitted;
            }
            if frame.outer == Want::Nothing {
                frame.outer = Want::NodesOnly;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_absolute_paths() {
        let mut stack = AncestorStack::default();
        stack.push("", 0, Want::Nothing);
        assert_eq!(stack.path(), "/");
        stack.push("images", 8, Want::Nothing);
        assert_eq!(stack.path(), "/images");
        stack.push("kernel@1", 24, Want::Nothing);
        assert_eq!(stack.path(), "/images/kernel@1");
        assert_eq!(stack.depth(), 3);

        assert_eq!(stack.pop().map(|f| f.enter), Some(24));
        assert_eq!(stack.path(), "/images");
        stack.pop();
        assert_eq!(stack.path(), "/");
        stack.pop();
        assert_eq!(stack.path(), "");
        assert!(stack.pop().is_none());
    }

    #[test]
    fn emits_each_deferred_frame_once() {
        let mut stack = AncestorStack::default();
        stack.push("", 0, Want::Nothing);
        stack.push("a", 8, Want::Nothing);
        stack.set_emitted(true);
        stack.push("b", 16, Want::NodesAndProps);

        let mut seen = Vec::new();
        stack
            .emit_deferred(|enter, path| {
                seen.push((enter, path.to_owned()));
                Ok::<_, ()>(())
            })
            .unwrap();
        assert_eq!(seen, vec![(0, "/".to_owned()), (16, "/a/b".to_owned())]);

        seen.clear();
        stack
            .emit_deferred(|enter, path| {
                seen.push((enter, path.to_owned()));
                Ok::<_, ()>(())
            })
            .unwrap();
        assert!(seen.is_empty());

        // raised so the END tags of /a/b's ancestors are kept
        assert_eq!(stack.pop().map(|f| f.outer), Some(Want::NodesAndProps));
        assert_eq!(stack.pop().map(|f| f.outer), Some(Want::NodesOnly));
        assert_eq!(stack.pop().map(|f| f.outer), Some(Want::NodesOnly));
    }
}
