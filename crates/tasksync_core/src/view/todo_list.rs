//! Task list view model: derived views, collection mutations, edit commands.
//!
//! # Responsibility
//! - Keep `filtered_todos`, counts, and `all_completed` consistent with the
//!   synchronized collection and the current filter mode.
//! - Provide add/remove/remove-completed and the per-item edit commands.
//!
//! # Invariants
//! - Derived reads are computed from the current collection and mode on every
//!   call, so they are never stale, even inside item observers.
//! - `revision` is bumped by every membership change, every item `completed`
//!   assignment, and every filter mode assignment; it only drives `on_change`.
//! - `completed_count() + remaining_count() == todos().len()`.
//! - Titles and other user text are never logged.

use crate::config::TrackerConfig;
use crate::input::focus::DeferredQueue;
use crate::model::filter::FilterMode;
use crate::model::record::{RecordFields, RecordKey};
use crate::reactive::{Observable, Subscription};
use crate::routing::parse_filter_route;
use crate::store::{EventChannel, RecordStore};
use crate::view::edit::EditOutcome;
use crate::view::todo_item::TodoItem;
use crate::view::view_list::ViewList;
use log::{debug, info, warn};
use std::cell::RefCell;
use std::rc::Rc;

const LABEL_SINGULAR: &str = "item";
const LABEL_PLURAL: &str = "items";

/// Pluralization tag for an item count.
pub fn label_for(count: usize) -> &'static str {
    if count == 1 {
        LABEL_SINGULAR
    } else {
        LABEL_PLURAL
    }
}

/// Revision counter plus the per-item watchers that feed it.
struct DependencyTracker {
    revision: Observable<u64>,
    item_watchers: RefCell<Vec<Subscription>>,
}

impl DependencyTracker {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            revision: Observable::new(0),
            item_watchers: RefCell::new(Vec::new()),
        })
    }

    fn bump(&self) {
        self.revision.update(|revision| *revision += 1);
    }

    /// Re-targets the `completed` watchers at the current members.
    fn watch_items(self: &Rc<Self>, items: &[Rc<TodoItem>]) {
        let watchers: Vec<Subscription> = items
            .iter()
            .map(|item| {
                let tracker = Rc::downgrade(self);
                item.completed().subscribe(move |_| {
                    if let Some(tracker) = tracker.upgrade() {
                        tracker.bump();
                    }
                })
            })
            .collect();
        let stale = self.item_watchers.replace(watchers);
        drop(stale);
    }
}

/// View model over one synchronized task list.
pub struct TodoList {
    config: TrackerConfig,
    store: Rc<dyn RecordStore>,
    events: Rc<dyn EventChannel>,
    todos: ViewList<TodoItem>,
    current: Observable<String>,
    mode: Observable<FilterMode>,
    tracker: Rc<DependencyTracker>,
    focus: DeferredQueue<RecordKey>,
    _watchers: Vec<Subscription>,
}

impl TodoList {
    /// Binds a view model to the configured list of `store`.
    pub fn new(
        config: TrackerConfig,
        store: Rc<dyn RecordStore>,
        events: Rc<dyn EventChannel>,
    ) -> Self {
        let list = store.get_list(&config.list_name);
        let todos = ViewList::new(Rc::clone(&store), list, TodoItem::attach);
        let tracker = DependencyTracker::new();
        tracker.watch_items(&todos.snapshot());

        let membership_tracker = Rc::downgrade(&tracker);
        let membership = todos.entries().subscribe(move |items: &Vec<Rc<TodoItem>>| {
            if let Some(tracker) = membership_tracker.upgrade() {
                tracker.watch_items(items);
                tracker.bump();
            }
        });

        let mode = Observable::new(FilterMode::All);
        let mode_tracker = Rc::downgrade(&tracker);
        let mode_watch = mode.subscribe(move |_| {
            if let Some(tracker) = mode_tracker.upgrade() {
                tracker.bump();
            }
        });

        info!(
            "event=todo_list_bound module=view status=ok list={} items={}",
            config.list_name,
            todos.len()
        );

        Self {
            config,
            store,
            events,
            todos,
            current: Observable::new(String::new()),
            mode,
            tracker,
            focus: DeferredQueue::new(),
            _watchers: vec![membership, mode_watch],
        }
    }

    /// Binds a view model to a client that is both store and event channel.
    pub fn with_client<C>(config: TrackerConfig, client: Rc<C>) -> Self
    where
        C: RecordStore + EventChannel + 'static,
    {
        let store: Rc<dyn RecordStore> = client.clone();
        let events: Rc<dyn EventChannel> = client;
        Self::new(config, store, events)
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Counter bumped whenever derived values may have changed.
    pub fn revision(&self) -> u64 {
        self.tracker.revision.get()
    }

    /// Notifies `callback` whenever derived values may have changed.
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn on_change(&self, callback: impl Fn(&u64) + 'static) -> Subscription {
        self.tracker.revision.subscribe(callback)
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.mode.get()
    }

    pub fn set_filter_mode(&self, mode: FilterMode) {
        debug!("event=filter_mode_set module=view status=ok mode={mode}");
        self.mode.set(mode);
    }

    /// Sets the filter mode from a route fragment such as `#/active`.
    pub fn apply_route(&self, path: &str) -> FilterMode {
        let mode = parse_filter_route(path);
        self.set_filter_mode(mode);
        mode
    }

    /// Full collection in list order.
    pub fn todos(&self) -> Vec<Rc<TodoItem>> {
        self.todos.snapshot()
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn find(&self, key: &RecordKey) -> Option<Rc<TodoItem>> {
        self.todos.find(key)
    }

    /// Items matching the current filter mode, in collection order.
    pub fn filtered_todos(&self) -> Vec<Rc<TodoItem>> {
        let mode = self.mode.get();
        self.todos.entries().with(|items| {
            items
                .iter()
                .filter(|item| mode.matches(item.is_completed()))
                .cloned()
                .collect()
        })
    }

    pub fn completed_count(&self) -> usize {
        self.todos
            .entries()
            .with(|items| items.iter().filter(|item| item.is_completed()).count())
    }

    pub fn remaining_count(&self) -> usize {
        self.todos.len() - self.completed_count()
    }

    /// True when nothing remains; vacuously true for an empty list.
    pub fn all_completed(&self) -> bool {
        self.remaining_count() == 0
    }

    /// Assigns `completed` on every item, including items already at `value`.
    pub fn set_all_completed(&self, value: bool) {
        let items = self.todos.snapshot();
        for item in &items {
            item.completed().set(value);
        }
        info!(
            "event=todos_mark_all module=view status=ok completed={} count={}",
            value,
            items.len()
        );
    }

    /// Input buffer for the next title.
    pub fn current(&self) -> String {
        self.current.get()
    }

    pub fn set_current(&self, text: impl Into<String>) {
        self.current.set(text.into());
    }

    /// Adds the input buffer as a new item.
    pub fn add(&self) -> Option<RecordKey> {
        let raw = self.current.get();
        self.add_title(&raw)
    }

    /// Adds a new item titled `raw_title.trim()`.
    ///
    /// Blank input is a no-op that leaves the input buffer untouched. On
    /// success the buffer is cleared and the new key is returned.
    pub fn add_title(&self, raw_title: &str) -> Option<RecordKey> {
        let title = raw_title.trim();
        if title.is_empty() {
            debug!("event=todo_add_skipped module=view status=noop reason=blank_title");
            return None;
        }

        let key = RecordKey::with_prefix(&self.config.key_prefix, &self.store.get_uid());
        self.store.get_record(&key).set(RecordFields::new(title));

        if let Some(channel) = self.config.notification_channel.as_deref() {
            if let Err(err) = self.events.emit(channel, title) {
                warn!(
                    "event=todo_notify_failed module=view status=error key={} error={}",
                    key, err
                );
            }
        }

        self.todos.push(&key);
        self.current.set(String::new());
        info!("event=todo_added module=view status=ok key={key}");
        Some(key)
    }

    /// Deletes the item's record and unlists it. Returns false when the item
    /// was no longer listed.
    pub fn remove(&self, item: &TodoItem) -> bool {
        if !self.todos.contains(item.key()) {
            debug!(
                "event=todo_remove_skipped module=view status=noop key={}",
                item.key()
            );
            return false;
        }
        item.record().delete();
        self.todos.remove(item.key());
        info!("event=todo_removed module=view status=ok key={}", item.key());
        true
    }

    /// Removes every item that is completed at call time.
    pub fn remove_completed(&self) -> usize {
        let completed: Vec<Rc<TodoItem>> = self
            .todos
            .snapshot()
            .into_iter()
            .filter(|item| item.is_completed())
            .collect();
        let mut removed = 0;
        for item in &completed {
            if self.remove(item) {
                removed += 1;
            }
        }
        info!("event=todos_clear_completed module=view status=ok removed={removed}");
        removed
    }

    /// Enters edit mode and queues a focus request for the item.
    pub fn edit_item(&self, item: &TodoItem) -> EditOutcome {
        let outcome = item.begin_edit();
        if outcome == EditOutcome::Entered {
            self.focus.push(item.key().clone());
        }
        outcome
    }

    /// Commits an edit; an empty trimmed title deletes the item.
    pub fn save_editing(&self, item: &TodoItem) -> EditOutcome {
        let outcome = item.commit_edit();
        if outcome == EditOutcome::Emptied {
            self.remove(item);
        }
        debug!(
            "event=todo_edit_saved module=view status=ok key={} outcome={:?}",
            item.key(),
            outcome
        );
        outcome
    }

    /// Cancels an edit and restores the pre-edit title.
    pub fn cancel_editing(&self, item: &TodoItem) -> EditOutcome {
        item.cancel_edit()
    }

    /// Drains deferred focus requests for items that are still listed and
    /// still editing. Call on the next turn of the event loop.
    pub fn take_focus_requests(&self) -> Vec<RecordKey> {
        let mut keys: Vec<RecordKey> = Vec::new();
        for key in self.focus.drain() {
            let editing = self.find(&key).is_some_and(|item| item.is_editing());
            if editing && !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::label_for;

    #[test]
    fn label_is_singular_only_for_one() {
        assert_eq!(label_for(1), "item");
        assert_eq!(label_for(0), "items");
        assert_eq!(label_for(2), "items");
    }
}
