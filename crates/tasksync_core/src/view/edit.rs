//! Per-item edit state and transition outcomes.
//!
//! # Invariants
//! - `Viewing` is the initial state of every item.
//! - The pre-edit title exists exactly while an item is `Editing`.

/// Edit state of one task item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditState {
    Viewing,
    Editing { previous_title: String },
}

/// Result of one edit transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// `viewing -> editing`; a snapshot of the title was taken.
    Entered,
    /// Item was already editing; the original snapshot is kept.
    AlreadyEditing,
    /// Commit with a title that needed no normalization.
    Kept,
    /// Commit rewrote the title to its trimmed form.
    Trimmed,
    /// Commit found an empty title; the item is deleted.
    Emptied,
    /// Cancel restored the pre-edit title.
    Reverted,
    /// Commit or cancel on an item that was not editing.
    NotEditing,
}
