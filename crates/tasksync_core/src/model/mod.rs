//! Domain model for synchronized task records.
//!
//! # Responsibility
//! - Define record keys, persisted fields, and field-level write values.
//! - Define the filter mode used by derived views.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordKey`.
//! - Model types carry no store or view behavior.

pub mod filter;
pub mod record;
