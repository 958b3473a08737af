//! Record domain model.
//!
//! # Responsibility
//! - Define the key and field shapes shared by the store and the view layer.
//!
//! # Invariants
//! - A `RecordKey` is stable and never reused for another record.
//! - Only `title` and `completed` are persisted; edit state never reaches a
//!   record.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque unique key of one remote record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds a key from a configured prefix and a store-issued uid.
    pub fn with_prefix(prefix: &str, uid: &str) -> Self {
        Self(format!("{prefix}{uid}"))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Persisted fields of one task record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub title: String,
    pub completed: bool,
}

impl RecordFields {
    /// Fields for a freshly created, not yet completed task.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
        }
    }

    /// Returns the current value of one field.
    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::Title => FieldValue::Text(self.title.clone()),
            Field::Completed => FieldValue::Flag(self.completed),
        }
    }

    /// Applies one field write. Mismatched value kinds are ignored.
    ///
    /// Returns whether the write matched the field kind.
    pub fn apply(&mut self, field: Field, value: &FieldValue) -> bool {
        match (field, value) {
            (Field::Title, FieldValue::Text(title)) => {
                self.title = title.clone();
                true
            }
            (Field::Completed, FieldValue::Flag(completed)) => {
                self.completed = *completed;
                true
            }
            _ => false,
        }
    }
}

/// Addressable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Completed,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Title, Field::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Completed => "completed",
        }
    }
}

/// Value carried by a field write or a field-change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

/// Scalar types that can be bound to a record field.
pub trait FieldType: Clone + 'static {
    fn into_field_value(self) -> FieldValue;
    fn from_field_value(value: &FieldValue) -> Option<Self>;
}

impl FieldType for String {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Text(self)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::Flag(_) => None,
        }
    }
}

impl FieldType for bool {
    fn into_field_value(self) -> FieldValue {
        FieldValue::Flag(self)
    }

    fn from_field_value(value: &FieldValue) -> Option<Self> {
        match value {
            FieldValue::Flag(flag) => Some(*flag),
            FieldValue::Text(_) => None,
        }
    }
}
