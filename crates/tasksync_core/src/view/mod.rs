//! Reactive view layer over the synchronized task list.
//!
//! # Responsibility
//! - Adapt remote records into observable entity wrappers.
//! - Derive filtered lists, counts, and bulk-toggle state.
//! - Run the per-item edit state machine.
//!
//! # Invariants
//! - View state lives on one thread; store callbacks are applied
//!   synchronously inside the callback.
//! - Local mutations are visible before the mutating call returns;
//!   persistence follows asynchronously through the store.

pub mod bound_field;
pub mod edit;
pub mod todo_item;
pub mod todo_list;
pub mod view_list;
