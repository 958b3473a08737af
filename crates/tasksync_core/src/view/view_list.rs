//! Observable entity sequence kept in sync with a remote key list.
//!
//! # Responsibility
//! - Construct one entity per listed key and drop entities whose key left.
//! - Apply local list edits immediately and remote list changes on delivery.
//!
//! # Invariants
//! - Entity order equals list order.
//! - At most one entity exists per key; entities for keys that stay are
//!   reused, never rebuilt.
//! - `entries` is only reassigned when the key sequence actually changed.

use crate::model::record::RecordKey;
use crate::reactive::{Observable, Subscription};
use crate::store::{ListHandle, RecordHandle, RecordStore};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Entity that can be placed in a `ViewList`.
pub trait ListEntity {
    fn key(&self) -> &RecordKey;
}

type EntityFactory<E> = Box<dyn Fn(Rc<dyn RecordHandle>) -> Rc<E>>;

struct ViewListInner<E> {
    store: Rc<dyn RecordStore>,
    list: Rc<dyn ListHandle>,
    factory: EntityFactory<E>,
    entries: Observable<Vec<Rc<E>>>,
}

impl<E: ListEntity + 'static> ViewListInner<E> {
    fn reconcile(&self, keys: &[RecordKey]) {
        let current = self.entries.get();
        let unchanged = current.len() == keys.len()
            && current
                .iter()
                .zip(keys)
                .all(|(entity, key)| entity.key() == key);
        if unchanged {
            return;
        }

        let mut existing: HashMap<RecordKey, Rc<E>> = current
            .into_iter()
            .map(|entity| (entity.key().clone(), entity))
            .collect();
        let mut seen = HashSet::new();
        let mut next = Vec::with_capacity(keys.len());
        let mut created = 0_usize;
        for key in keys {
            if !seen.insert(key) {
                continue;
            }
            let entity = match existing.remove(key) {
                Some(entity) => entity,
                None => {
                    created += 1;
                    (self.factory)(self.store.get_record(key))
                }
            };
            next.push(entity);
        }

        debug!(
            "event=view_list_sync module=view status=ok list={} len={} created={} dropped={}",
            self.list.name(),
            next.len(),
            created,
            existing.len()
        );
        self.entries.set(next);
    }
}

/// Entities built from the keys of one remote list.
pub struct ViewList<E> {
    inner: Rc<ViewListInner<E>>,
    _sync: Subscription,
}

impl<E: ListEntity + 'static> ViewList<E> {
    /// Builds entities for the current keys and follows remote list changes.
    pub fn new(
        store: Rc<dyn RecordStore>,
        list: Rc<dyn ListHandle>,
        factory: impl Fn(Rc<dyn RecordHandle>) -> Rc<E> + 'static,
    ) -> Self {
        let inner = Rc::new(ViewListInner {
            store,
            list,
            factory: Box::new(factory),
            entries: Observable::new(Vec::new()),
        });
        inner.reconcile(&inner.list.entries());

        let weak = Rc::downgrade(&inner);
        let sync = inner.list.subscribe(Rc::new(move |keys: &[RecordKey]| {
            if let Some(inner) = weak.upgrade() {
                inner.reconcile(keys);
            }
        }));

        Self { inner, _sync: sync }
    }

    /// Observable entity sequence; reassigned on every membership change.
    pub fn entries(&self) -> &Observable<Vec<Rc<E>>> {
        &self.inner.entries
    }

    pub fn snapshot(&self) -> Vec<Rc<E>> {
        self.inner.entries.get()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, key: &RecordKey) -> Option<Rc<E>> {
        self.inner
            .entries
            .with(|entries| entries.iter().find(|entity| entity.key() == key).cloned())
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.find(key).is_some()
    }

    /// Appends `key` to the list and builds its entity.
    pub fn push(&self, key: &RecordKey) {
        self.inner.list.add_entry(key);
        self.inner.reconcile(&self.inner.list.entries());
    }

    /// Removes `key` from the list. Returns whether it was listed.
    pub fn remove(&self, key: &RecordKey) -> bool {
        if !self.contains(key) {
            return false;
        }
        self.inner.list.remove_entry(key);
        self.inner.reconcile(&self.inner.list.entries());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{ListEntity, ViewList};
    use crate::model::record::RecordKey;
    use crate::store::{MemoryServer, RecordHandle, RecordStore};
    use std::rc::Rc;

    struct Probe {
        key: RecordKey,
    }

    impl ListEntity for Probe {
        fn key(&self) -> &RecordKey {
            &self.key
        }
    }

    fn probe(record: Rc<dyn RecordHandle>) -> Rc<Probe> {
        Rc::new(Probe {
            key: record.key().clone(),
        })
    }

    #[test]
    fn reuses_entities_for_surviving_keys() {
        let server = MemoryServer::new();
        let conn = server.connect();
        let list = ViewList::new(conn.clone(), conn.get_list("todos"), probe);

        list.push(&RecordKey::from("a"));
        list.push(&RecordKey::from("b"));
        let first_a = list.find(&RecordKey::from("a")).expect("a should be listed");

        assert!(list.remove(&RecordKey::from("b")));
        assert!(!list.remove(&RecordKey::from("b")));
        let second_a = list.find(&RecordKey::from("a")).expect("a should stay listed");
        assert!(Rc::ptr_eq(&first_a, &second_a));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn follows_remote_list_changes() {
        let server = MemoryServer::new();
        let local = server.connect();
        let remote = server.connect();
        let list = ViewList::new(local.clone(), local.get_list("todos"), probe);

        let remote_list = remote.get_list("todos");
        remote_list.add_entry(&RecordKey::from("x"));
        remote_list.add_entry(&RecordKey::from("y"));
        server.flush();

        let keys: Vec<String> = list
            .snapshot()
            .iter()
            .map(|entity| entity.key().to_string())
            .collect();
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);

        remote_list.remove_entry(&RecordKey::from("x"));
        server.flush();
        assert_eq!(list.len(), 1);
    }
}
