//! Undo/redo of the stroke list
//!
//! States are whole stroke lists. Strokes are shared handles, so a state costs
//! one pointer per stroke.

use crate::stroke::StrokeRef;

/// States kept on the undo stack before the oldest is dropped
pub const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct StrokeHistory {
    undo_stack: Vec<Vec<StrokeRef>>,
    redo_stack: Vec<Vec<StrokeRef>>,
}

impl StrokeHistory {
    /// Record the state before an edit; any redo branch is discarded.
    pub fn commit(&mut self, previous: Vec<StrokeRef>) {
        self.undo_stack.push(previous);
        if self.undo_stack.len() > MAX_HISTORY {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// State to return to; `current` becomes redoable.
    pub fn undo(&mut self, current: Vec<StrokeRef>) -> Option<Vec<StrokeRef>> {
        let previous = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Vec<StrokeRef>) -> Option<Vec<StrokeRef>> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
