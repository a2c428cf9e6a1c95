#![forbid(unsafe_code)]

//! Ordered change-listener registry.
//!
//! # Invariants
//!
//! 1. Callbacks run in registration order.
//! 2. `notify()` calls each registered callback exactly once, synchronously.
//! 3. A callback removed during a notify cycle still runs in that cycle
//!    (the cycle works on a snapshot); it does not run in later cycles.
//! 4. Dropping a [`Subscription`] removes its callback.
//!
//! Closures have no identity, so registering the same logic twice yields two
//! independent entries.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback = Rc<dyn Fn()>;

struct Entry {
    id: u64,
    callback: Callback,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    entries: Vec<Entry>,
}

impl RegistryInner {
    fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }
}

/// Insertion-ordered set of callbacks.
///
/// Cloning creates a new handle to the same registry.
#[derive(Clone, Default)]
pub struct SubscriberRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl SubscriberRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. It stays registered while the returned guard is
    /// alive.
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(Entry {
            id,
            callback: Rc::new(callback),
        });
        Subscription {
            id,
            registry: Rc::downgrade(&self.inner),
            armed: true,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every registered callback once. Returns how many ran.
    pub fn notify(&self) -> usize {
        let snapshot: Vec<Callback> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|entry| Rc::clone(&entry.callback))
            .collect();
        for callback in &snapshot {
            callback();
        }
        snapshot.len()
    }
}

/// Guard for a registered callback.
///
/// Dropping the guard unsubscribes. Use [`detach`](Self::detach) to keep the
/// callback for the lifetime of the registry.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<RegistryInner>>,
    armed: bool,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Subscription {
    /// Remove the callback. Returns `false` if it was already gone.
    pub fn unsubscribe(mut self) -> bool {
        self.armed = false;
        self.remove()
    }

    /// Keep the callback registered after the guard is dropped.
    pub fn detach(mut self) {
        self.armed = false;
    }

    /// Whether the callback is still registered.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry.upgrade().is_some_and(|inner| {
            inner
                .borrow()
                .entries
                .iter()
                .any(|entry| entry.id == self.id)
        })
    }

    fn remove(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|inner| inner.borrow_mut().remove(self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.armed {
            self.remove();
        }
    }
}
