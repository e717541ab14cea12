//! Structural validator: a pushdown automaton over `< { (` and `> } )`.
//!
//! The first fault poisons the rest of the pass. After that the validator
//! ignores further characters, while the signature scanner keeps running.

use crate::audit::{Delimiter, StructuralAction, StructuralEntry};
use tracing::trace;

/// Per-inspection validator state.
#[derive(Debug, Clone)]
pub struct StructuralValidator {
    stack: Vec<Delimiter>,
    valid: bool,
    log: Vec<StructuralEntry>,
}

impl StructuralValidator {
    /// Create a validator in its initial state: empty stack, valid.
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            valid: true,
            log: Vec::new(),
        }
    }

    /// Consume one raw character at `position`.
    pub fn feed(&mut self, position: usize, c: char) {
        if !self.valid {
            return;
        }

        let action = if let Some(open) = Delimiter::from_opener(c) {
            self.stack.push(open);
            StructuralAction::Push { open }
        } else if let Some(close) = Delimiter::from_closer(c) {
            match self.stack.last().copied() {
                None => {
                    self.valid = false;
                    StructuralAction::UnexpectedClosing { close }
                }
                Some(open) if open == close => {
                    self.stack.pop();
                    StructuralAction::Pop { open }
                }
                Some(open) => {
                    self.valid = false;
                    StructuralAction::Mismatch { open, close }
                }
            }
        } else {
            return;
        };

        trace!(position, character = %c, valid = self.valid, "{}", action.description());
        self.log.push(StructuralEntry::new(
            position,
            Some(c),
            action,
            &self.stack,
            self.valid,
        ));
    }

    /// Apply the end-of-input check. `length` is the payload length in
    /// characters.
    pub fn finish(&mut self, length: usize) {
        if !self.valid {
            return;
        }
        if let Some(&open) = self.stack.last() {
            self.valid = false;
            let action = StructuralAction::Truncated { open };
            trace!(position = length, "{}", action.description());
            self.log
                .push(StructuralEntry::new(length, None, action, &self.stack, false));
        }
    }

    /// Whether no fault has been seen so far.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Current stack, bottom first.
    pub fn stack(&self) -> &[Delimiter] {
        &self.stack
    }

    /// Entries recorded so far.
    pub fn log(&self) -> &[StructuralEntry] {
        &self.log
    }

    /// Consume the validator, returning (valid, final stack, log).
    pub fn into_parts(self) -> (bool, Vec<Delimiter>, Vec<StructuralEntry>) {
        (self.valid, self.stack, self.log)
    }
}

impl Default for StructuralValidator {
    fn default() -> Self {
        Self::new()
    }
}
