//! Shared observable cell with assignment-notify semantics.
//!
//! # Invariants
//! - Every `set` bumps `version` and notifies all subscribers, even when the
//!   new value equals the old one.
//! - Subscribers run after the internal borrow is released, so callbacks may
//!   read or write any observable (including this one).
//! - Subscribers are notified in registration order.

use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::{Rc, Weak};

type Callback<T> = Rc<dyn Fn(&T)>;

struct ObservableInner<T> {
    value: T,
    version: u64,
    next_subscriber_id: u64,
    subscribers: Vec<(u64, Callback<T>)>,
}

/// Cloneable handle to one shared observable value.
///
/// Clones share the same value and subscriber list.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Debug> Debug for Observable<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Default + Clone + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + 'static> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                next_subscriber_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Returns a clone of the latest value.
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Reads the latest value without cloning it.
    pub fn with<R>(&self, read: impl FnOnce(&T) -> R) -> R {
        read(&self.inner.borrow().value)
    }

    /// Number of assignments since creation.
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Assigns `value` and notifies every subscriber.
    pub fn set(&self, value: T) {
        let (snapshot, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value;
            inner.version += 1;
            let callbacks: Vec<Callback<T>> = inner
                .subscribers
                .iter()
                .map(|(_, callback)| Rc::clone(callback))
                .collect();
            (inner.value.clone(), callbacks)
        };

        for callback in callbacks {
            callback(&snapshot);
        }
    }

    /// Mutates the value in place, then notifies like `set`.
    pub fn update(&self, mutate: impl FnOnce(&mut T)) {
        let mut value = self.get();
        mutate(&mut value);
        self.set(value);
    }

    /// Registers a change callback. Dropping the returned guard unregisters it.
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_subscriber_id;
            inner.next_subscriber_id += 1;
            inner.subscribers.push((id, Rc::new(callback)));
            id
        };

        let weak: Weak<RefCell<ObservableInner<T>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .borrow_mut()
                    .subscribers
                    .retain(|(subscriber_id, _)| *subscriber_id != id);
            }
        })
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }
}

/// RAII guard for one registered callback.
///
/// Shared by observables and store handles; the release action runs once,
/// on drop or on explicit `cancel`.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Unregisters immediately.
    pub fn cancel(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Observable;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn set_notifies_even_when_value_is_unchanged() {
        let flag = Observable::new(true);
        let hits = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&hits);
        let _sub = flag.subscribe(move |_| *counter.borrow_mut() += 1);

        flag.set(true);
        flag.set(true);

        assert_eq!(*hits.borrow(), 2);
        assert_eq!(flag.version(), 2);
    }

    #[test]
    fn dropping_subscription_stops_notifications() {
        let title = Observable::new(String::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = title.subscribe(move |value: &String| sink.borrow_mut().push(value.clone()));

        title.set("a".to_string());
        drop(sub);
        title.set("b".to_string());

        assert_eq!(*seen.borrow(), vec!["a".to_string()]);
        assert_eq!(title.subscriber_count(), 0);
    }

    #[test]
    fn callbacks_may_write_other_observables() {
        let source = Observable::new(1);
        let mirror = Observable::new(0);
        let target = mirror.clone();
        let _sub = source.subscribe(move |value| target.set(value * 10));

        source.set(4);
        assert_eq!(mirror.get(), 40);
    }

    #[test]
    fn subscription_outliving_observable_is_harmless() {
        let sub = {
            let value = Observable::new(0_u8);
            value.subscribe(|_| {})
        };
        sub.cancel();
    }
}
