//! In-process record store with queued persistence.
//!
//! # Responsibility
//! - Provide a shared "server" with records, lists, and an event log.
//! - Hand out per-client connections implementing `RecordStore`.
//! - Model asynchronous persistence: writes queue until `flush`.
//!
//! # Invariants
//! - Queued writes apply in arrival order (last writer wins per field).
//! - Subscribers of the writing connection are never notified of its own
//!   writes.
//! - A write rejected while offline is dropped and logged; local caches are
//!   not rolled back.
//! - A field write on a missing record is a no-op; it never revives a
//!   deleted record.
//! - A connection forgets a record handle once it deletes that record; the
//!   handle's watchers go away with its last user.

use crate::model::record::{Field, FieldValue, RecordFields, RecordKey};
use crate::reactive::Subscription;
use crate::store::{
    EventChannel, ListCallback, ListHandle, RecordCallback, RecordHandle, RecordStore, StoreError,
    StoreResult,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::rc::{Rc, Weak};
use uuid::Uuid;

type ConnectionId = u64;
type HandleCache = RefCell<HashMap<RecordKey, Rc<MemoryRecordHandle>>>;

/// One event accepted by the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
    pub channel: String,
    pub payload: String,
}

/// Outcome counters of one `MemoryServer::flush` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub applied: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
enum WriteOp {
    SetRecord { key: RecordKey, fields: RecordFields },
    SetField { key: RecordKey, field: Field, value: FieldValue },
    DeleteRecord { key: RecordKey },
    AddEntry { list: String, key: RecordKey },
    RemoveEntry { list: String, key: RecordKey },
}

impl WriteOp {
    fn name(&self) -> &'static str {
        match self {
            Self::SetRecord { .. } => "set_record",
            Self::SetField { .. } => "set_field",
            Self::DeleteRecord { .. } => "delete_record",
            Self::AddEntry { .. } => "add_entry",
            Self::RemoveEntry { .. } => "remove_entry",
        }
    }

    fn target(&self) -> String {
        match self {
            Self::SetRecord { key, .. }
            | Self::SetField { key, .. }
            | Self::DeleteRecord { key } => key.to_string(),
            Self::AddEntry { list, .. } | Self::RemoveEntry { list, .. } => list.clone(),
        }
    }
}

struct PendingWrite {
    origin: ConnectionId,
    op: WriteOp,
}

struct RecordWatcher {
    id: u64,
    connection: ConnectionId,
    key: RecordKey,
    callback: RecordCallback,
}

struct ListWatcher {
    id: u64,
    connection: ConnectionId,
    list: String,
    callback: ListCallback,
}

enum Delivery {
    Field(RecordCallback, Field, FieldValue),
    List(ListCallback, Vec<RecordKey>),
}

impl Delivery {
    fn run(self) {
        match self {
            Self::Field(callback, field, value) => callback(field, &value),
            Self::List(callback, keys) => callback(&keys),
        }
    }
}

#[derive(Default)]
struct ServerState {
    records: BTreeMap<RecordKey, RecordFields>,
    lists: BTreeMap<String, Vec<RecordKey>>,
    pending: VecDeque<PendingWrite>,
    record_watchers: Vec<RecordWatcher>,
    list_watchers: Vec<ListWatcher>,
    events: Vec<EmittedEvent>,
    errors: Vec<StoreError>,
    offline: bool,
    events_failing: bool,
    next_connection_id: ConnectionId,
    next_watcher_id: u64,
}

impl ServerState {
    fn next_watcher_id(&mut self) -> u64 {
        let id = self.next_watcher_id;
        self.next_watcher_id += 1;
        id
    }

    fn apply(&mut self, write: PendingWrite) -> Vec<Delivery> {
        let origin = write.origin;
        match write.op {
            WriteOp::SetRecord { key, fields } => {
                let deliveries: Vec<Delivery> = Field::ALL
                    .iter()
                    .flat_map(|field| self.field_deliveries(origin, &key, *field, fields.value(*field)))
                    .collect();
                self.records.insert(key, fields);
                deliveries
            }
            WriteOp::SetField { key, field, value } => {
                let Some(record) = self.records.get_mut(&key) else {
                    return Vec::new();
                };
                if !record.apply(field, &value) {
                    return Vec::new();
                }
                self.field_deliveries(origin, &key, field, value)
            }
            WriteOp::DeleteRecord { key } => {
                self.records.remove(&key);
                Vec::new()
            }
            WriteOp::AddEntry { list, key } => {
                let entries = self.lists.entry(list.clone()).or_default();
                if entries.contains(&key) {
                    return Vec::new();
                }
                entries.push(key);
                self.list_deliveries(origin, &list)
            }
            WriteOp::RemoveEntry { list, key } => {
                let Some(entries) = self.lists.get_mut(&list) else {
                    return Vec::new();
                };
                let before = entries.len();
                entries.retain(|entry| entry != &key);
                if entries.len() == before {
                    return Vec::new();
                }
                self.list_deliveries(origin, &list)
            }
        }
    }

    fn field_deliveries(
        &self,
        origin: ConnectionId,
        key: &RecordKey,
        field: Field,
        value: FieldValue,
    ) -> Vec<Delivery> {
        self.record_watchers
            .iter()
            .filter(|watcher| watcher.connection != origin && &watcher.key == key)
            .filter(|watcher| !self.has_queued_write(watcher.connection, key, field))
            .map(|watcher| Delivery::Field(Rc::clone(&watcher.callback), field, value.clone()))
            .collect()
    }

    /// Whether `connection` still has a queued write that will supersede
    /// `field` of `key`; its local value is already ahead of this delivery.
    fn has_queued_write(&self, connection: ConnectionId, key: &RecordKey, field: Field) -> bool {
        self.pending.iter().any(|write| {
            write.origin == connection
                && match &write.op {
                    WriteOp::SetRecord { key: pending, .. } => pending == key,
                    WriteOp::SetField {
                        key: pending,
                        field: pending_field,
                        ..
                    } => pending == key && *pending_field == field,
                    _ => false,
                }
        })
    }

    fn list_deliveries(&self, origin: ConnectionId, list: &str) -> Vec<Delivery> {
        let keys = self.lists.get(list).cloned().unwrap_or_default();
        self.list_watchers
            .iter()
            .filter(|watcher| watcher.connection != origin && watcher.list == list)
            .map(|watcher| Delivery::List(Rc::clone(&watcher.callback), keys.clone()))
            .collect()
    }
}

/// Shared in-process store that every connection writes through.
#[derive(Clone, Default)]
pub struct MemoryServer {
    state: Rc<RefCell<ServerState>>,
}

impl MemoryServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new client connection.
    pub fn connect(&self) -> Rc<MemoryConnection> {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_connection_id;
            state.next_connection_id += 1;
            id
        };
        debug!("event=store_connect module=store status=ok connection={id}");
        Rc::new(MemoryConnection {
            id,
            server: self.clone(),
            records: Rc::new(RefCell::new(HashMap::new())),
            lists: RefCell::new(HashMap::new()),
        })
    }

    /// Applies every queued write in arrival order and notifies other clients.
    pub fn flush(&self) -> FlushReport {
        let mut report = FlushReport::default();
        loop {
            let next = self.state.borrow_mut().pending.pop_front();
            let Some(write) = next else {
                break;
            };

            let deliveries = {
                let mut state = self.state.borrow_mut();
                if state.offline {
                    let error = StoreError::Unavailable {
                        operation: write.op.name(),
                        target: write.op.target(),
                    };
                    warn!(
                        "event=store_write_failed module=store status=error op={} error={}",
                        write.op.name(),
                        error
                    );
                    state.errors.push(error);
                    report.failed += 1;
                    continue;
                }
                report.applied += 1;
                state.apply(write)
            };

            for delivery in deliveries {
                delivery.run();
            }
        }

        debug!(
            "event=store_flush module=store status=ok applied={} failed={}",
            report.applied, report.failed
        );
        report
    }

    /// Number of writes waiting for `flush`.
    pub fn pending_writes(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Toggles simulated connectivity loss for subsequent flushes.
    pub fn set_offline(&self, offline: bool) {
        self.state.borrow_mut().offline = offline;
    }

    /// Makes `emit` fail on every connection while enabled.
    pub fn set_events_failing(&self, failing: bool) {
        self.state.borrow_mut().events_failing = failing;
    }

    /// Drains the persistence error log.
    pub fn take_errors(&self) -> Vec<StoreError> {
        std::mem::take(&mut self.state.borrow_mut().errors)
    }

    pub fn emitted_events(&self) -> Vec<EmittedEvent> {
        self.state.borrow().events.clone()
    }

    /// Number of live record subscriptions across all connections.
    pub fn record_watcher_count(&self) -> usize {
        self.state.borrow().record_watchers.len()
    }

    /// Persisted fields of one record, if it exists.
    pub fn record(&self, key: &RecordKey) -> Option<RecordFields> {
        self.state.borrow().records.get(key).cloned()
    }

    /// Persisted key sequence of one list.
    pub fn list(&self, name: &str) -> Vec<RecordKey> {
        self.state
            .borrow()
            .lists
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn enqueue(&self, origin: ConnectionId, op: WriteOp) {
        self.state
            .borrow_mut()
            .pending
            .push_back(PendingWrite { origin, op });
    }

    fn watch_record(
        &self,
        connection: ConnectionId,
        key: &RecordKey,
        callback: RecordCallback,
    ) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_watcher_id();
            state.record_watchers.push(RecordWatcher {
                id,
                connection,
                key: key.clone(),
                callback,
            });
            id
        };

        let weak = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state
                    .borrow_mut()
                    .record_watchers
                    .retain(|watcher| watcher.id != id);
            }
        })
    }

    fn watch_list(
        &self,
        connection: ConnectionId,
        list: &str,
        callback: ListCallback,
    ) -> Subscription {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = state.next_watcher_id();
            state.list_watchers.push(ListWatcher {
                id,
                connection,
                list: list.to_string(),
                callback,
            });
            id
        };

        let weak: Weak<RefCell<ServerState>> = Rc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = weak.upgrade() {
                state
                    .borrow_mut()
                    .list_watchers
                    .retain(|watcher| watcher.id != id);
            }
        })
    }
}

/// One client's view of a `MemoryServer`.
pub struct MemoryConnection {
    id: ConnectionId,
    server: MemoryServer,
    records: Rc<HandleCache>,
    lists: RefCell<HashMap<String, Rc<MemoryListHandle>>>,
}

impl MemoryConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn server(&self) -> &MemoryServer {
        &self.server
    }
}

impl RecordStore for MemoryConnection {
    fn get_record(&self, key: &RecordKey) -> Rc<dyn RecordHandle> {
        if let Some(handle) = self.records.borrow().get(key) {
            return Rc::clone(handle) as Rc<dyn RecordHandle>;
        }

        let initial = self.server.record(key).unwrap_or_default();
        let local = Rc::new(RefCell::new(initial));
        let cache = Rc::clone(&local);
        let cache_sync = self.server.watch_record(
            self.id,
            key,
            Rc::new(move |field: Field, value: &FieldValue| {
                cache.borrow_mut().apply(field, value);
            }),
        );

        let handle = Rc::new(MemoryRecordHandle {
            key: key.clone(),
            connection: self.id,
            server: self.server.clone(),
            cache: Rc::downgrade(&self.records),
            local,
            _cache_sync: cache_sync,
        });
        self.records
            .borrow_mut()
            .insert(key.clone(), Rc::clone(&handle));
        handle
    }

    fn get_list(&self, name: &str) -> Rc<dyn ListHandle> {
        if let Some(handle) = self.lists.borrow().get(name) {
            return Rc::clone(handle) as Rc<dyn ListHandle>;
        }

        let local = Rc::new(RefCell::new(self.server.list(name)));
        let cache = Rc::clone(&local);
        let cache_sync = self.server.watch_list(
            self.id,
            name,
            Rc::new(move |keys: &[RecordKey]| {
                *cache.borrow_mut() = keys.to_vec();
            }),
        );

        let handle = Rc::new(MemoryListHandle {
            name: name.to_string(),
            connection: self.id,
            server: self.server.clone(),
            local,
            _cache_sync: cache_sync,
        });
        self.lists
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&handle));
        handle
    }

    fn get_uid(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

impl EventChannel for MemoryConnection {
    fn emit(&self, channel: &str, payload: &str) -> StoreResult<()> {
        let mut state = self.server.state.borrow_mut();
        if state.events_failing {
            return Err(StoreError::ChannelClosed(channel.to_string()));
        }
        state.events.push(EmittedEvent {
            channel: channel.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }
}

struct MemoryRecordHandle {
    key: RecordKey,
    connection: ConnectionId,
    server: MemoryServer,
    cache: Weak<HandleCache>,
    local: Rc<RefCell<RecordFields>>,
    _cache_sync: Subscription,
}

impl RecordHandle for MemoryRecordHandle {
    fn key(&self) -> &RecordKey {
        &self.key
    }

    fn get(&self) -> RecordFields {
        self.local.borrow().clone()
    }

    fn set(&self, fields: RecordFields) {
        *self.local.borrow_mut() = fields.clone();
        self.server.enqueue(
            self.connection,
            WriteOp::SetRecord {
                key: self.key.clone(),
                fields,
            },
        );
    }

    fn set_field(&self, field: Field, value: FieldValue) {
        self.local.borrow_mut().apply(field, &value);
        self.server.enqueue(
            self.connection,
            WriteOp::SetField {
                key: self.key.clone(),
                field,
                value,
            },
        );
    }

    fn delete(&self) {
        if let Some(cache) = self.cache.upgrade() {
            let evicted = cache.borrow_mut().remove(&self.key);
            drop(evicted);
        }
        self.server.enqueue(
            self.connection,
            WriteOp::DeleteRecord {
                key: self.key.clone(),
            },
        );
    }

    fn subscribe(&self, callback: RecordCallback) -> Subscription {
        self.server.watch_record(self.connection, &self.key, callback)
    }
}

struct MemoryListHandle {
    name: String,
    connection: ConnectionId,
    server: MemoryServer,
    local: Rc<RefCell<Vec<RecordKey>>>,
    _cache_sync: Subscription,
}

impl ListHandle for MemoryListHandle {
    fn name(&self) -> &str {
        &self.name
    }

    fn entries(&self) -> Vec<RecordKey> {
        self.local.borrow().clone()
    }

    fn add_entry(&self, key: &RecordKey) {
        {
            let mut local = self.local.borrow_mut();
            if local.contains(key) {
                return;
            }
            local.push(key.clone());
        }
        self.server.enqueue(
            self.connection,
            WriteOp::AddEntry {
                list: self.name.clone(),
                key: key.clone(),
            },
        );
    }

    fn remove_entry(&self, key: &RecordKey) {
        {
            let mut local = self.local.borrow_mut();
            let before = local.len();
            local.retain(|entry| entry != key);
            if local.len() == before {
                return;
            }
        }
        self.server.enqueue(
            self.connection,
            WriteOp::RemoveEntry {
                list: self.name.clone(),
                key: key.clone(),
            },
        );
    }

    fn subscribe(&self, callback: ListCallback) -> Subscription {
        self.server.watch_list(self.connection, &self.name, callback)
    }
}
