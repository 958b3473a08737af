//! Entity wrapper over one task record.
//!
//! # Responsibility
//! - Expose `title` and `completed` as observables bound to the record.
//! - Hold local-only edit state and run the edit transitions.
//!
//! # Invariants
//! - `key` never changes for the wrapper lifetime.
//! - `previous_title` is `Some` iff `editing` is true.
//! - Edit state is never written to the record.

use crate::model::record::{Field, FieldValue, RecordKey};
use crate::reactive::{Observable, Subscription};
use crate::store::RecordHandle;
use crate::view::bound_field::{apply_remote, BoundField};
use crate::view::edit::{EditOutcome, EditState};
use crate::view::view_list::ListEntity;
use std::cell::RefCell;
use std::rc::Rc;

/// One listed task item.
pub struct TodoItem {
    key: RecordKey,
    record: Rc<dyn RecordHandle>,
    title: BoundField<String>,
    completed: BoundField<bool>,
    editing: Observable<bool>,
    previous_title: RefCell<Option<String>>,
    _remote: Subscription,
}

impl TodoItem {
    /// Wraps a record handle, seeding fields from its latest known values.
    pub fn attach(record: Rc<dyn RecordHandle>) -> Rc<Self> {
        let fields = record.get();
        let title = BoundField::new(Rc::clone(&record), Field::Title, fields.title);
        let completed = BoundField::new(Rc::clone(&record), Field::Completed, fields.completed);

        let remote_title = title.observable().clone();
        let remote_completed = completed.observable().clone();
        let remote = record.subscribe(Rc::new(move |field: Field, value: &FieldValue| {
            match field {
                Field::Title => apply_remote(&remote_title, value),
                Field::Completed => apply_remote(&remote_completed, value),
            };
        }));

        Rc::new(Self {
            key: record.key().clone(),
            record,
            title,
            completed,
            editing: Observable::new(false),
            previous_title: RefCell::new(None),
            _remote: remote,
        })
    }

    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    pub fn record(&self) -> &Rc<dyn RecordHandle> {
        &self.record
    }

    pub fn title(&self) -> &BoundField<String> {
        &self.title
    }

    pub fn completed(&self) -> &BoundField<bool> {
        &self.completed
    }

    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.get()
    }

    /// Observes the local editing flag.
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn on_editing_change(&self, callback: impl Fn(&bool) + 'static) -> Subscription {
        self.editing.subscribe(callback)
    }

    pub fn previous_title(&self) -> Option<String> {
        self.previous_title.borrow().clone()
    }

    pub fn edit_state(&self) -> EditState {
        match self.previous_title() {
            Some(previous_title) if self.is_editing() => EditState::Editing { previous_title },
            _ => EditState::Viewing,
        }
    }

    /// `viewing -> editing`: snapshots the current title.
    pub(crate) fn begin_edit(&self) -> EditOutcome {
        if self.is_editing() {
            return EditOutcome::AlreadyEditing;
        }
        *self.previous_title.borrow_mut() = Some(self.title.get());
        self.editing.set(true);
        EditOutcome::Entered
    }

    /// `editing -> viewing` by commit. The caller deletes on `Emptied`.
    pub(crate) fn commit_edit(&self) -> EditOutcome {
        if !self.is_editing() {
            return EditOutcome::NotEditing;
        }
        self.previous_title.borrow_mut().take();
        self.editing.set(false);

        let title = self.title.get();
        let trimmed = title.trim();
        let changed = title.len() != trimmed.len();
        if changed {
            // Written even when trimming yields "", so observers see the empty state.
            self.title.set(trimmed.to_string());
        }

        if trimmed.is_empty() {
            EditOutcome::Emptied
        } else if changed {
            EditOutcome::Trimmed
        } else {
            EditOutcome::Kept
        }
    }

    /// `editing -> viewing` by cancel: restores the snapshot.
    pub(crate) fn cancel_edit(&self) -> EditOutcome {
        if !self.is_editing() {
            return EditOutcome::NotEditing;
        }
        let previous = self.previous_title.borrow_mut().take();
        self.editing.set(false);
        if let Some(previous) = previous {
            self.title.set(previous);
        }
        EditOutcome::Reverted
    }
}

impl ListEntity for TodoItem {
    fn key(&self) -> &RecordKey {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::TodoItem;
    use crate::model::record::{RecordFields, RecordKey};
    use crate::store::{MemoryServer, RecordStore};
    use crate::view::edit::{EditOutcome, EditState};

    #[test]
    fn attach_seeds_fields_from_record() {
        let server = MemoryServer::new();
        let conn = server.connect();
        let record = conn.get_record(&RecordKey::from("todo/1"));
        record.set(RecordFields {
            title: "seeded".to_string(),
            completed: true,
        });

        let item = TodoItem::attach(record);
        assert_eq!(item.title().get(), "seeded");
        assert!(item.is_completed());
        assert!(!item.is_editing());
        assert_eq!(item.edit_state(), EditState::Viewing);
    }

    #[test]
    fn local_writes_reach_record_cache() {
        let server = MemoryServer::new();
        let conn = server.connect();
        let key = RecordKey::from("todo/1");
        let item = TodoItem::attach(conn.get_record(&key));

        item.completed().set(true);
        item.title().set("renamed".to_string());

        let fields = conn.get_record(&key).get();
        assert!(fields.completed);
        assert_eq!(fields.title, "renamed");
    }

    #[test]
    fn begin_edit_twice_keeps_first_snapshot() {
        let server = MemoryServer::new();
        let conn = server.connect();
        let record = conn.get_record(&RecordKey::from("todo/1"));
        record.set(RecordFields::new("first"));
        let item = TodoItem::attach(record);

        assert_eq!(item.begin_edit(), EditOutcome::Entered);
        item.title().set("second".to_string());
        assert_eq!(item.begin_edit(), EditOutcome::AlreadyEditing);
        assert_eq!(item.previous_title().as_deref(), Some("first"));
    }

    #[test]
    fn commit_and_cancel_without_edit_are_noops() {
        let server = MemoryServer::new();
        let conn = server.connect();
        let record = conn.get_record(&RecordKey::from("todo/1"));
        record.set(RecordFields::new("  padded  "));
        let item = TodoItem::attach(record);

        assert_eq!(item.commit_edit(), EditOutcome::NotEditing);
        assert_eq!(item.cancel_edit(), EditOutcome::NotEditing);
        assert_eq!(item.title().get(), "  padded  ");
    }
}
