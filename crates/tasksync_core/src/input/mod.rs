//! Presentation-facing input helpers.
//!
//! # Responsibility
//! - Gate gesture handlers on trigger tokens (confirm/cancel keys).
//! - Defer focus requests past the current synchronous update.

pub mod focus;
pub mod trigger;
