#![forbid(unsafe_code)]

//! Selectors and the memoized derived view.
//!
//! # Design
//!
//! A [`Selector`] is a shared handle around a pure function from the raw
//! sequence (`Item<R>`) and a dependency list to a derived sequence
//! (`Item<D>`). Handle identity (`Rc::ptr_eq`) stands in for "the same
//! selector". Most selectors filter or reorder and keep `D = R`; a
//! projection converts raw records into view rows.
//!
//! [`SelectorPipeline`] stores the active selector, its dependencies and the
//! resulting [`DerivedView`]. It recomputes only when told to; the provider
//! decides when via [`SelectorPipeline::needs_update`] and its own change
//! detection.
//!
//! Showing raw items as derived items without a selector is only possible
//! when both sides share a type. The pipeline holds an [`Identity`] witness
//! for that case, which can only be built for `Identity<T, T>`. Without one,
//! a pipeline with no selector reports [`DerivedView::Pending`].
//!
//! # Invariants
//!
//! 1. The derived view is always the full output of one selector call (or
//!    the raw sequence, or empty). It is never patched.
//! 2. With no selector, or an empty raw sequence, the view is
//!    [`DerivedView::PassThrough`] and reads borrow the raw sequence, if an
//!    [`Identity`] is held. Otherwise it is empty.
//! 3. A failing or panicking selector leaves the view [`DerivedView::Failed`].

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::dependency::{Dependency, dependencies_changed};
use crate::error::SelectorFailure;
use crate::item::Item;

pub type SelectorResult<D> = Result<Vec<Rc<Item<D>>>, SelectorFailure>;

type SelectorFn<R, D> = dyn Fn(&[Rc<Item<R>>], &[Dependency]) -> SelectorResult<D>;

/// Shared handle to a derived-view function from `Item<R>` to `Item<D>`.
///
/// Cloning keeps identity; building a new `Selector` from the same closure
/// logic does not.
pub struct Selector<R, D = R> {
    func: Rc<SelectorFn<R, D>>,
    name: Option<Rc<str>>,
}

impl<R, D> Clone for Selector<R, D> {
    fn clone(&self) -> Self {
        Self {
            func: Rc::clone(&self.func),
            name: self.name.clone(),
        }
    }
}

impl<R, D> fmt::Debug for Selector<R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("name", &self.name())
            .field("ptr", &Rc::as_ptr(&self.func).cast::<()>())
            .finish()
    }
}

impl<R: 'static, D: 'static> Selector<R, D> {
    /// Build a selector that may fail.
    pub fn new(
        func: impl Fn(&[Rc<Item<R>>], &[Dependency]) -> SelectorResult<D> + 'static,
    ) -> Self {
        Self {
            func: Rc::new(func),
            name: None,
        }
    }

    /// Build a selector that cannot fail.
    pub fn infallible(
        func: impl Fn(&[Rc<Item<R>>], &[Dependency]) -> Vec<Rc<Item<D>>> + 'static,
    ) -> Self {
        Self::new(move |raw, deps| Ok(func(raw, deps)))
    }

    /// Build a selector that converts every raw item into one derived item.
    pub fn projection(func: impl Fn(&Item<R>) -> Item<D> + 'static) -> Self {
        Self::infallible(move |raw, _| raw.iter().map(|item| Rc::new(func(&**item))).collect())
    }
}

impl<R, D> Selector<R, D> {
    /// Attach a label used in log events. Identity is unchanged.
    #[must_use]
    pub fn named(mut self, name: impl Into<Rc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.func, &other.func)
    }

    /// Run the selector, converting a panic into a [`SelectorFailure`].
    ///
    /// The unwind is stopped here, but the process panic hook still runs
    /// first, so the default hook prints the panic message (and a backtrace
    /// when `RUST_BACKTRACE` is set) to stderr for every caught panic.
    /// Install a custom hook with [`std::panic::set_hook`] to silence it.
    pub fn apply(&self, raw: &[Rc<Item<R>>], deps: &[Dependency]) -> SelectorResult<D> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.func)(raw, deps))) {
            Ok(result) => result,
            Err(payload) => Err(SelectorFailure::from_panic(payload)),
        }
    }
}

/// Proof that raw and derived content are the same type.
///
/// Only [`Identity::new`] constructs one, and only for `Identity<T, T>`,
/// so pass-through reads reborrow the raw slice instead of converting it.
pub struct Identity<R, D> {
    reborrow: for<'a> fn(&'a [Rc<Item<R>>]) -> &'a [Rc<Item<D>>],
}

fn same_slice<T>(raw: &[Rc<Item<T>>]) -> &[Rc<Item<T>>] {
    raw
}

impl<T> Identity<T, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reborrow: same_slice::<T>,
        }
    }
}

impl<T> Default for Identity<T, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, D> Identity<R, D> {
    /// View the raw slice as the derived slice.
    #[must_use]
    pub fn view<'a>(&self, raw: &'a [Rc<Item<R>>]) -> &'a [Rc<Item<D>>] {
        (self.reborrow)(raw)
    }
}

impl<R, D> Clone for Identity<R, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, D> Copy for Identity<R, D> {}

impl<R, D> fmt::Debug for Identity<R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Identity")
    }
}

/// Tagged derived state.
///
/// Replaces any cast between raw and derived: `PassThrough` means "read the
/// raw sequence" and exists only alongside an [`Identity`].
#[derive(Debug)]
pub enum DerivedView<D> {
    PassThrough,
    /// No selector yet and the content types differ: nothing to show.
    Pending,
    Selected(Vec<Rc<Item<D>>>),
    Failed,
}

impl<D> DerivedView<D> {
    #[must_use]
    pub fn is_pass_through(&self) -> bool {
        matches!(self, Self::PassThrough)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Active selector, its dependencies and the view they produced.
#[derive(Debug)]
pub struct SelectorPipeline<R, D = R> {
    selector: Option<Selector<R, D>>,
    dependencies: Vec<Dependency>,
    identity: Option<Identity<R, D>>,
    view: DerivedView<D>,
}

impl<T> Default for SelectorPipeline<T, T> {
    fn default() -> Self {
        Self {
            selector: None,
            dependencies: Vec::new(),
            identity: Some(Identity::new()),
            view: DerivedView::PassThrough,
        }
    }
}

impl<T> SelectorPipeline<T, T> {
    /// Pipeline that passes raw items through while no selector is set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R, D> SelectorPipeline<R, D> {
    /// Pipeline whose selector converts content. Empty until one is set.
    #[must_use]
    pub fn converting() -> Self {
        Self {
            selector: None,
            dependencies: Vec::new(),
            identity: None,
            view: DerivedView::Pending,
        }
    }

    /// Whether installing `(selector, dependencies)` would change anything.
    #[must_use]
    pub fn needs_update(
        &self,
        selector: Option<&Selector<R, D>>,
        dependencies: &[Dependency],
    ) -> bool {
        let selector_changed = match (&self.selector, selector) {
            (None, None) => false,
            (Some(current), Some(next)) => !current.ptr_eq(next),
            _ => true,
        };
        selector_changed || dependencies_changed(&self.dependencies, dependencies)
    }

    /// Store a new selector and dependency list. Does not recompute.
    pub fn install(&mut self, selector: Option<Selector<R, D>>, dependencies: Vec<Dependency>) {
        self.selector = selector;
        self.dependencies = dependencies;
    }

    /// Rebuild the view from `raw`. Returns the derived length.
    pub fn recompute(&mut self, raw: &[Rc<Item<R>>]) -> Result<usize, SelectorFailure> {
        match &self.selector {
            Some(selector) if !raw.is_empty() => match selector.apply(raw, &self.dependencies) {
                Ok(derived) => {
                    let len = derived.len();
                    self.view = DerivedView::Selected(derived);
                    Ok(len)
                }
                Err(failure) => {
                    self.view = DerivedView::Failed;
                    Err(failure)
                }
            },
            selector => {
                let (view, len) = match (self.identity.is_some(), selector.is_some()) {
                    (true, _) => (DerivedView::PassThrough, raw.len()),
                    (false, false) => (DerivedView::Pending, 0),
                    (false, true) => (DerivedView::Selected(Vec::new()), 0),
                };
                self.view = view;
                Ok(len)
            }
        }
    }

    /// Resolve the view against the raw sequence it was computed from.
    #[must_use]
    pub fn view<'a>(&'a self, raw: &'a [Rc<Item<R>>]) -> &'a [Rc<Item<D>>] {
        match (&self.view, &self.identity) {
            (DerivedView::PassThrough, Some(identity)) => identity.view(raw),
            (DerivedView::Selected(derived), _) => derived,
            _ => &[],
        }
    }

    #[must_use]
    pub fn derived_view(&self) -> &DerivedView<D> {
        &self.view
    }

    #[must_use]
    pub fn selector(&self) -> Option<&Selector<R, D>> {
        self.selector.as_ref()
    }

    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }
}
