//! Single-threaded reactive primitives.
//!
//! # Responsibility
//! - Provide shared observable cells and RAII subscriptions.
//!
//! # Invariants
//! - All types are `!Send`; they live on the thread that owns the event loop.
//! - Notification happens on assignment, not on detected inequality.

pub mod observable;

pub use observable::{Observable, Subscription};
