//! Reactive core for a task list synchronized through a shared record store.
//! This crate owns the derived-state and edit-state invariants.

pub mod config;
pub mod input;
pub mod logging;
pub mod model;
pub mod reactive;
pub mod routing;
pub mod store;
pub mod view;

pub use config::{ConfigError, TrackerConfig};
pub use input::focus::DeferredQueue;
pub use input::trigger::{
    cancel_key, confirm_key, KeyCode, KeyEvent, TriggerEvent, TriggerFilter,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::filter::{FilterMode, UnknownFilterMode};
pub use model::record::{Field, FieldType, FieldValue, RecordFields, RecordKey};
pub use reactive::{Observable, Subscription};
pub use routing::{parse_filter_route, route_for_mode};
pub use store::{
    EmittedEvent, EventChannel, FlushReport, ListHandle, MemoryConnection, MemoryServer,
    RecordHandle, RecordStore, StoreError, StoreResult,
};
pub use view::bound_field::BoundField;
pub use view::edit::{EditOutcome, EditState};
pub use view::todo_item::TodoItem;
pub use view::todo_list::{label_for, TodoList};
pub use view::view_list::{ListEntity, ViewList};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
