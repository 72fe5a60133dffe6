//! Per-render state: page data and stack-scoped resolution cursors
//!
//! Each block execution pushes a [`CursorFrame`] recording which definition
//! of which slot is running. Frames live on the Rust call stack and link to
//! their parent frame, so a derived context never mutates the one it came
//! from and concurrent renders cannot observe each other's cursors.

use std::fmt;

use crate::data::PageData;
use crate::template::BlockSlot;

/// One executing block: `slot` at chain position `next - 1`
#[derive(Debug, Clone, Copy)]
pub struct CursorFrame<'a> {
    slot: &'a BlockSlot,
    next: usize,
    parent: Option<&'a CursorFrame<'a>>,
}

impl<'a> CursorFrame<'a> {
    pub fn name(&self) -> &'a str {
        &self.slot.name
    }

    pub fn slot(&self) -> &'a BlockSlot {
        self.slot
    }

    /// Chain position of the executing definition
    pub fn index(&self) -> usize {
        self.next - 1
    }

    /// Chain position the next resolution of this name starts from
    pub fn next(&self) -> usize {
        self.next
    }
}

/// Read-only render state passed by value down the call chain
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    data: &'a dyn PageData,
    frames: Option<&'a CursorFrame<'a>>,
    depth: usize,
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = Vec::new();
        let mut frame = self.frames;
        while let Some(current) = frame {
            stack.push((current.slot.to_string(), current.next));
            frame = current.parent;
        }
        f.debug_struct("RenderContext")
            .field("frames", &stack)
            .field("depth", &self.depth)
            .finish()
    }
}

impl<'a> RenderContext<'a> {
    /// Fresh context: every cursor at 0
    pub fn new(data: &'a dyn PageData) -> Self {
        Self {
            data,
            frames: None,
            depth: 0,
        }
    }

    pub fn data(&self) -> &'a dyn PageData {
        self.data
    }

    /// Number of block executions on the stack
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Innermost executing frame for a block called `name`
    pub fn frame(&self, name: &str) -> Option<&'a CursorFrame<'a>> {
        let mut frame = self.frames;
        while let Some(current) = frame {
            if current.slot.name == name {
                return Some(current);
            }
            frame = current.parent;
        }
        None
    }

    /// Position to resolve `name` from: just past the innermost executing
    /// definition of `name`, or 0.
    pub fn cursor(&self, name: &str) -> usize {
        self.frame(name).map_or(0, |frame| frame.next)
    }

    /// Innermost executing block
    pub fn current(&self) -> Option<&'a CursorFrame<'a>> {
        self.frames
    }

    /// Frame for executing the definition of `slot` at chain position `index`
    pub fn enter<'b>(&self, slot: &'b BlockSlot, index: usize) -> CursorFrame<'b>
    where
        'a: 'b,
    {
        CursorFrame {
            slot,
            next: index + 1,
            parent: self.frames,
        }
    }

    /// Derived context with `frame` on top of the cursor stack
    pub fn with_scope<'b>(&self, frame: &'b CursorFrame<'b>) -> RenderContext<'b>
    where
        'a: 'b,
    {
        RenderContext {
            data: self.data,
            frames: Some(frame),
            depth: self.depth + 1,
        }
    }
}
