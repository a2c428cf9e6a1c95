#![forbid(unsafe_code)]

//! Shared single-threaded handle to a [`DataProvider`].
//!
//! The asynchronous source and the windowed consumer usually live in
//! different parts of an application but on the same thread. A
//! `SharedProvider` gives both a cheap cloneable handle.
//!
//! Updates apply state under a mutable borrow, release it, and only then
//! notify. Subscribers may therefore read through the handle from inside
//! their callback. Issuing updates from a callback is outside the contract.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use ahash::AHashSet;

use crate::dependency::Dependency;
use crate::error::ProviderError;
use crate::item::{Item, WindowItem};
use crate::options::ProviderOptions;
use crate::provider::{DataProvider, ProviderState, SourceSnapshot, notify_subscribers};
use crate::selector::Selector;
use crate::subscribers::Subscription;

/// Cloneable handle; clones share one provider.
pub struct SharedProvider<R, D = R> {
    inner: Rc<RefCell<DataProvider<R, D>>>,
}

impl<R, D> Clone for SharedProvider<R, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R, D> fmt::Debug for SharedProvider<R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedProvider")
            .field(&*self.inner.borrow())
            .finish()
    }
}

impl<T> Default for SharedProvider<T, T> {
    fn default() -> Self {
        Self::from(DataProvider::default())
    }
}

impl<R, D> From<DataProvider<R, D>> for SharedProvider<R, D> {
    fn from(provider: DataProvider<R, D>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(provider)),
        }
    }
}

impl<T> SharedProvider<T, T> {
    #[must_use]
    pub fn new(options: ProviderOptions) -> Self {
        Self::from(DataProvider::with_options(options))
    }
}

impl<R, D> SharedProvider<R, D> {
    /// Shared [`DataProvider::converting`].
    #[must_use]
    pub fn converting(options: ProviderOptions) -> Self {
        Self::from(DataProvider::converting(options))
    }

    pub fn update_raw_data<I>(
        &self,
        items: impl IntoIterator<Item = I>,
        is_loading: bool,
        error: Option<ProviderError>,
    ) -> bool
    where
        I: Into<Rc<Item<R>>>,
    {
        self.mutate(|provider| provider.apply_raw_data(items, is_loading, error))
    }

    pub fn apply(&self, snapshot: SourceSnapshot<R>) -> bool {
        self.update_raw_data(snapshot.items, snapshot.is_loading, snapshot.error)
    }

    pub fn update_selector(
        &self,
        selector: Option<Selector<R, D>>,
        dependencies: Vec<Dependency>,
    ) -> bool {
        self.mutate(|provider| provider.apply_selector(selector, dependencies))
    }

    pub fn refresh(&self) {
        self.mutate(|provider| {
            provider.apply_refresh();
            true
        });
    }

    pub fn set_options(&self, options: ProviderOptions) -> bool {
        self.mutate(|provider| provider.apply_options(options))
    }

    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        self.inner.borrow().subscribe(callback)
    }

    #[must_use]
    pub fn get_data(&self, start: i64, end: i64) -> Vec<WindowItem<D>> {
        self.inner.borrow().get_data(start, end)
    }

    #[must_use]
    pub fn get_total_count(&self) -> usize {
        self.inner.borrow().get_total_count()
    }

    #[must_use]
    pub fn get_item_by_id(&self, id: &str) -> Option<Rc<Item<D>>> {
        self.inner.borrow().get_item_by_id(id)
    }

    #[must_use]
    pub fn get_current_item_ids(&self) -> AHashSet<String> {
        self.inner.borrow().get_current_item_ids()
    }

    #[must_use]
    pub fn get_state(&self) -> ProviderState {
        self.inner.borrow().get_state()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version()
    }

    /// Borrow the provider for reads that return references.
    ///
    /// # Panics
    ///
    /// Panics if an update is in progress on this handle (re-entrant borrow).
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, DataProvider<R, D>> {
        self.inner.borrow()
    }

    fn mutate(&self, apply: impl FnOnce(&mut DataProvider<R, D>) -> bool) -> bool {
        let (changed, registry) = {
            let mut provider = self.inner.borrow_mut();
            let changed = apply(&mut provider);
            (changed, provider.registry())
        };
        if changed {
            notify_subscribers(&registry);
        }
        changed
    }
}
