//! Record store contracts consumed by the view layer.
//!
//! # Responsibility
//! - Define record, list, uid, and notification-channel boundaries.
//! - Keep transport and persistence details outside the view layer.
//!
//! # Invariants
//! - Handle writes update the handle's local view immediately; persistence is
//!   asynchronous and best-effort.
//! - A handle never echoes its own writes back to its own subscribers.
//! - Deleting a missing record or removing a missing list entry is a no-op.
//!
//! # See also
//! - `memory` for the in-process implementation.

use crate::model::record::{Field, FieldValue, RecordFields, RecordKey};
use crate::reactive::Subscription;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

pub mod memory;

pub use memory::{EmittedEvent, FlushReport, MemoryConnection, MemoryServer};

pub type StoreResult<T> = Result<T, StoreError>;

/// Callback for remote field changes: `(field, new_value)`.
pub type RecordCallback = Rc<dyn Fn(Field, &FieldValue)>;

/// Callback for remote list changes, carrying the full ordered key sequence.
pub type ListCallback = Rc<dyn Fn(&[RecordKey])>;

/// Failures reported by store implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached when a queued write was applied.
    Unavailable { operation: &'static str, target: String },
    /// The notification channel rejected an event.
    ChannelClosed(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { operation, target } => {
                write!(f, "store unavailable during {operation} on `{target}`")
            }
            Self::ChannelClosed(channel) => write!(f, "notification channel closed: {channel}"),
        }
    }
}

impl Error for StoreError {}

/// Entry point to a shared record store.
pub trait RecordStore {
    /// Returns the handle for `key`, creating the record lazily when absent.
    ///
    /// Repeated calls for one key return the same handle.
    fn get_record(&self, key: &RecordKey) -> Rc<dyn RecordHandle>;

    /// Returns the handle for one named list of record keys.
    fn get_list(&self, name: &str) -> Rc<dyn ListHandle>;

    /// Returns a fresh unique id.
    fn get_uid(&self) -> String;
}

/// Live handle to one record.
pub trait RecordHandle {
    fn key(&self) -> &RecordKey;

    /// Latest known fields, including unpersisted local writes.
    fn get(&self) -> RecordFields;

    /// Replaces every field.
    fn set(&self, fields: RecordFields);

    /// Writes one field.
    fn set_field(&self, field: Field, value: FieldValue);

    fn delete(&self);

    /// Subscribes to field changes made by other clients.
    fn subscribe(&self, callback: RecordCallback) -> Subscription;
}

/// Live handle to one ordered list of record keys.
pub trait ListHandle {
    fn name(&self) -> &str;

    /// Latest known key sequence, including unpersisted local writes.
    fn entries(&self) -> Vec<RecordKey>;

    /// Appends `key` unless already present.
    fn add_entry(&self, key: &RecordKey);

    fn remove_entry(&self, key: &RecordKey);

    /// Subscribes to list changes made by other clients.
    fn subscribe(&self, callback: ListCallback) -> Subscription;
}

/// Fire-and-forget event channel.
pub trait EventChannel {
    fn emit(&self, channel: &str, payload: &str) -> StoreResult<()>;
}
