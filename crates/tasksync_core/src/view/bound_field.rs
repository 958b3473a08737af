//! Two-way binding between one record field and a local observable.

use crate::model::record::{Field, FieldType, FieldValue};
use crate::reactive::{Observable, Subscription};
use crate::store::RecordHandle;
use std::rc::Rc;

/// Observable scalar bound to one field of a remote record.
///
/// Reads return the latest known value. Local writes are visible at once and
/// schedule a field write on the record; remote changes are applied with
/// `apply_remote` and never written back.
pub struct BoundField<T> {
    value: Observable<T>,
    record: Rc<dyn RecordHandle>,
    field: Field,
}

impl<T: FieldType> BoundField<T> {
    pub fn new(record: Rc<dyn RecordHandle>, field: Field, initial: T) -> Self {
        Self {
            value: Observable::new(initial),
            record,
            field,
        }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn get(&self) -> T {
        self.value.get()
    }

    /// Writes locally and schedules the remote write. Always notifies.
    pub fn set(&self, value: T) {
        self.record
            .set_field(self.field, value.clone().into_field_value());
        self.value.set(value);
    }

    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.value.subscribe(callback)
    }

    /// Shared handle to the local value, used to route remote changes.
    pub fn observable(&self) -> &Observable<T> {
        &self.value
    }
}

/// Applies a remote field value to `target` when the value kind matches.
pub(crate) fn apply_remote<T: FieldType>(target: &Observable<T>, value: &FieldValue) -> bool {
    match T::from_field_value(value) {
        Some(value) => {
            target.set(value);
            true
        }
        None => false,
    }
}
