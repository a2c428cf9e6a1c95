#![forbid(unsafe_code)]

//! The windowed selector data provider.
//!
//! # Design
//!
//! [`DataProvider`] owns the raw sequence, the selector pipeline, the
//! loading/error flags and a [`SubscriberRegistry`]. Two inputs drive it:
//!
//! - [`update_raw_data`](DataProvider::update_raw_data) from the source,
//!   gated by [`ChangeDetector`] and a flag comparison;
//! - [`update_selector`](DataProvider::update_selector), gated by selector
//!   identity and dependency equality.
//!
//! Reads go through the windowed-read contract ([`get_data`](DataProvider::get_data),
//! [`get_total_count`](DataProvider::get_total_count),
//! [`get_item_by_id`](DataProvider::get_item_by_id)), which substitutes
//! sentinel rows while the derived view is empty.
//!
//! # Invariants
//!
//! 1. Every call that changes state ends with exactly one notification and
//!    one version bump. No-op calls do neither.
//! 2. The derived view is a pure function of (raw, selector, dependencies)
//!    at the last recomputation.
//! 3. No method panics or returns an error for source or selector failures;
//!    those become `error` state.
//!
//! # Failure Modes
//!
//! - **Selector failure**: the derived view is cleared and the selector
//!   error is set to [`ProviderError::Selector`]. It takes precedence over a
//!   source error in [`error`](DataProvider::error) and clears on the next
//!   successful recomputation, which exposes the source error again. Raw
//!   data is kept, so `raw_data()` and `selected_data()` diverge until then.
//! - **Re-entrant updates** from a selector or subscriber are outside the
//!   contract. Use [`SharedProvider`](crate::SharedProvider) when callbacks
//!   need to read the provider.

use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use ahash::AHashSet;
use serde::Serialize;

use crate::change_detection::{ChangeDetector, ChangeVerdict};
use crate::dependency::Dependency;
use crate::error::{ErrorKind, ProviderError};
use crate::item::{Item, WindowItem};
use crate::options::ProviderOptions;
use crate::selector::{DerivedView, Selector, SelectorPipeline};
use crate::sentinel::{self, ErrorItem, Fallback};
use crate::subscribers::{SubscriberRegistry, Subscription};

/// One observable state of the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSnapshot<T> {
    pub items: Vec<Item<T>>,
    pub is_loading: bool,
    pub error: Option<ProviderError>,
}

impl<T> SourceSnapshot<T> {
    #[must_use]
    pub fn loading() -> Self {
        Self {
            items: Vec::new(),
            is_loading: true,
            error: None,
        }
    }

    #[must_use]
    pub fn ready(items: Vec<Item<T>>) -> Self {
        Self {
            items,
            is_loading: false,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: ProviderError) -> Self {
        Self {
            items: Vec::new(),
            is_loading: false,
            error: Some(error),
        }
    }
}

/// Read-only diagnostic snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderState {
    pub is_loading: bool,
    /// Effective error, as shown by the error row.
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub source_error: Option<String>,
    pub raw_count: usize,
    pub derived_count: usize,
    pub has_selector: bool,
    pub dependency_count: usize,
    pub subscriber_count: usize,
    pub version: u64,
}

impl ProviderState {
    /// Single-line JSON for logs.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Clamp an inclusive `[start, end]` window to a sequence of length `len`.
///
/// Returns `None` when nothing is visible: an empty sequence, a start past
/// the end of the data, or an end before the clamped start.
#[must_use]
pub fn clamp_window(len: usize, start: i64, end: i64) -> Option<Range<usize>> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    if len == 0 || start >= len_i {
        return None;
    }
    let last = len_i - 1;
    let start = start.clamp(0, last);
    let end = end.clamp(-1, last);
    if start > end {
        return None;
    }
    let start = usize::try_from(start).ok()?;
    let end = usize::try_from(end).ok()?;
    Some(start..end + 1)
}

/// Windowed data provider over a raw item sequence.
///
/// `R` is the raw content pushed by the source and `D` the content served
/// to the consumer. They are the same type unless a converting selector is
/// used (see [`DataProvider::converting`]).
pub struct DataProvider<R, D = R> {
    raw: Vec<Rc<Item<R>>>,
    pipeline: SelectorPipeline<R, D>,
    is_loading: bool,
    source_error: Option<ProviderError>,
    selector_error: Option<ProviderError>,
    options: ProviderOptions,
    subscribers: SubscriberRegistry,
    version: u64,
}

impl<R, D> fmt::Debug for DataProvider<R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataProvider")
            .field("raw_len", &self.raw.len())
            .field("derived_len", &self.selected_data().len())
            .field("is_loading", &self.is_loading)
            .field("source_error", &self.source_error)
            .field("selector_error", &self.selector_error)
            .field("options", &self.options)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl<T> Default for DataProvider<T, T> {
    fn default() -> Self {
        Self::with_options(ProviderOptions::default())
    }
}

impl<T> DataProvider<T, T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that serves raw items directly while no selector is set.
    #[must_use]
    pub fn with_options(options: ProviderOptions) -> Self {
        Self::from_pipeline(SelectorPipeline::new(), options)
    }
}

impl<R, D> DataProvider<R, D> {
    /// Provider whose selector converts `Item<R>` into `Item<D>`.
    ///
    /// Until a selector is installed the derived view is
    /// [`DerivedView::Pending`] and reads see an empty sequence, so the
    /// placeholder and error rows still apply.
    #[must_use]
    pub fn converting(options: ProviderOptions) -> Self {
        Self::from_pipeline(SelectorPipeline::converting(), options)
    }

    fn from_pipeline(pipeline: SelectorPipeline<R, D>, options: ProviderOptions) -> Self {
        Self {
            raw: Vec::new(),
            pipeline,
            is_loading: false,
            source_error: None,
            selector_error: None,
            options,
            subscribers: SubscriberRegistry::new(),
            version: 0,
        }
    }

    // ── Source input ────────────────────────────────────────────────────

    /// Replace the source state.
    ///
    /// Applied when the loading flag or source error differ from the current
    /// ones or the change detector reports a change; otherwise a no-op.
    /// Returns whether subscribers were notified.
    pub fn update_raw_data<I>(
        &mut self,
        items: impl IntoIterator<Item = I>,
        is_loading: bool,
        error: Option<ProviderError>,
    ) -> bool
    where
        I: Into<Rc<Item<R>>>,
    {
        let changed = self.apply_raw_data(items, is_loading, error);
        if changed {
            notify_subscribers(&self.subscribers);
        }
        changed
    }

    /// [`update_raw_data`](Self::update_raw_data) from a snapshot.
    pub fn apply(&mut self, snapshot: SourceSnapshot<R>) -> bool {
        self.update_raw_data(snapshot.items, snapshot.is_loading, snapshot.error)
    }

    /// Install a selector (or clear it with `None`) and its dependencies.
    ///
    /// Recomputes and notifies only if the selector handle or any dependency
    /// differs from the current ones.
    pub fn update_selector(
        &mut self,
        selector: Option<Selector<R, D>>,
        dependencies: Vec<Dependency>,
    ) -> bool {
        let changed = self.apply_selector(selector, dependencies);
        if changed {
            notify_subscribers(&self.subscribers);
        }
        changed
    }

    /// Recompute the derived view with the current selector, bypassing
    /// memoization. Always notifies.
    pub fn refresh(&mut self) {
        self.apply_refresh();
        notify_subscribers(&self.subscribers);
    }

    /// Replace the options. Equal options are a no-op.
    pub fn set_options(&mut self, options: ProviderOptions) -> bool {
        let changed = self.apply_options(options);
        if changed {
            notify_subscribers(&self.subscribers);
        }
        changed
    }

    pub(crate) fn apply_raw_data<I>(
        &mut self,
        items: impl IntoIterator<Item = I>,
        is_loading: bool,
        error: Option<ProviderError>,
    ) -> bool
    where
        I: Into<Rc<Item<R>>>,
    {
        let items: Vec<Rc<Item<R>>> = items.into_iter().map(Into::into).collect();
        let span = tracing::debug_span!(
            "provider.update_raw",
            raw_len = items.len(),
            is_loading,
            has_error = error.is_some()
        );
        let _guard = span.enter();

        let flags_changed = self.is_loading != is_loading || self.source_error != error;
        let verdict = ChangeDetector::new(self.options.enable_change_detection).detect(&self.raw, &items);
        if !flags_changed && verdict == ChangeVerdict::Unchanged {
            tracing::debug!(message = "provider.skip", reason = "unchanged");
            return false;
        }

        self.is_loading = is_loading;
        self.source_error = error;
        self.raw = items;
        self.recompute();
        self.version += 1;
        true
    }

    pub(crate) fn apply_selector(
        &mut self,
        selector: Option<Selector<R, D>>,
        dependencies: Vec<Dependency>,
    ) -> bool {
        if !self.pipeline.needs_update(selector.as_ref(), &dependencies) {
            tracing::debug!(message = "provider.skip", reason = "selector_unchanged");
            return false;
        }
        self.pipeline.install(selector, dependencies);
        self.recompute();
        self.version += 1;
        true
    }

    pub(crate) fn apply_refresh(&mut self) {
        self.recompute();
        self.version += 1;
    }

    pub(crate) fn apply_options(&mut self, options: ProviderOptions) -> bool {
        if self.options == options {
            return false;
        }
        self.options = options;
        self.version += 1;
        true
    }

    /// Rebuild the derived view. The selector error always reflects the
    /// latest run; the source error is left alone.
    fn recompute(&mut self) {
        match self.pipeline.recompute(&self.raw) {
            Ok(derived_len) => {
                tracing::debug!(
                    message = "provider.recompute",
                    raw_len = self.raw.len(),
                    derived_len,
                    selector = self.pipeline.selector().map_or("none", Selector::name)
                );
                self.selector_error = None;
            }
            Err(failure) => {
                tracing::warn!(
                    message = "provider.selector_failed",
                    selector = self.pipeline.selector().map_or("none", Selector::name),
                    error = %failure
                );
                self.selector_error = Some(failure.into());
            }
        }
    }

    // ── Windowed-read contract ──────────────────────────────────────────

    /// Register a change listener.
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        self.subscribers.subscribe(callback)
    }

    /// Rows for the inclusive window `[start, end]`.
    ///
    /// While the derived view is empty this returns placeholders (loading)
    /// or a single error row (error), depending on options.
    #[must_use]
    pub fn get_data(&self, start: i64, end: i64) -> Vec<WindowItem<D>> {
        match self.fallback() {
            Fallback::Placeholders => {
                sentinel::placeholders(start, end, self.options.placeholder_count)
                    .into_iter()
                    .map(WindowItem::Placeholder)
                    .collect()
            }
            Fallback::Error(error) => vec![WindowItem::Error(ErrorItem::new(error))],
            Fallback::None => self
                .window(start, end)
                .iter()
                .cloned()
                .map(WindowItem::Data)
                .collect(),
        }
    }

    /// Borrowed slice of the derived view for `[start, end]`, without
    /// sentinel substitution.
    #[must_use]
    pub fn window(&self, start: i64, end: i64) -> &[Rc<Item<D>>] {
        let derived = self.selected_data();
        match clamp_window(derived.len(), start, end) {
            Some(range) => &derived[range],
            None => &[],
        }
    }

    #[must_use]
    pub fn get_total_count(&self) -> usize {
        match self.fallback() {
            Fallback::Placeholders => self.options.placeholder_count,
            Fallback::Error(_) => 1,
            Fallback::None => self.selected_data().len(),
        }
    }

    /// Look up a real item by id. Sentinel ids always return `None`.
    #[must_use]
    pub fn get_item_by_id(&self, id: &str) -> Option<Rc<Item<D>>> {
        if sentinel::is_sentinel_id(id) {
            return None;
        }
        self.selected_data().iter().find(|item| item.id == id).cloned()
    }

    /// Ids of every item in the derived view.
    #[must_use]
    pub fn get_current_item_ids(&self) -> AHashSet<String> {
        self.selected_data()
            .iter()
            .map(|item| item.id.clone())
            .collect()
    }

    #[must_use]
    pub fn get_state(&self) -> ProviderState {
        let error = self.error();
        ProviderState {
            is_loading: self.is_loading,
            error: error.map(ToString::to_string),
            error_kind: error.map(ProviderError::kind),
            source_error: self.source_error.as_ref().map(ToString::to_string),
            raw_count: self.raw.len(),
            derived_count: self.selected_data().len(),
            has_selector: self.pipeline.selector().is_some(),
            dependency_count: self.pipeline.dependencies().len(),
            subscriber_count: self.subscribers.len(),
            version: self.version,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    #[must_use]
    pub fn raw_data(&self) -> &[Rc<Item<R>>] {
        &self.raw
    }

    #[must_use]
    pub fn selected_data(&self) -> &[Rc<Item<D>>] {
        self.pipeline.view(&self.raw)
    }

    #[must_use]
    pub fn derived_view(&self) -> &DerivedView<D> {
        self.pipeline.derived_view()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The error shown to the consumer: the last selector failure if the
    /// latest recomputation failed, otherwise the source error.
    #[must_use]
    pub fn error(&self) -> Option<&ProviderError> {
        self.selector_error.as_ref().or(self.source_error.as_ref())
    }

    /// Error last reported by the source, regardless of selector state.
    #[must_use]
    pub fn source_error(&self) -> Option<&ProviderError> {
        self.source_error.as_ref()
    }

    /// Failure of the latest recomputation, if it failed.
    #[must_use]
    pub fn selector_error(&self) -> Option<&ProviderError> {
        self.selector_error.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> &ProviderOptions {
        &self.options
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Bumped once per applied change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn registry(&self) -> SubscriberRegistry {
        self.subscribers.clone()
    }

    fn fallback(&self) -> Fallback<'_> {
        sentinel::select_fallback(
            &self.options,
            self.is_loading,
            self.error(),
            self.selected_data().len(),
        )
    }
}

pub(crate) fn notify_subscribers(registry: &SubscriberRegistry) {
    tracing::trace!(message = "provider.notify", subscribers = registry.len());
    registry.notify();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn items(ids: &[&str]) -> Vec<Item<u32>> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Item::new(*id, i as u32))
            .collect()
    }

    fn ids(rows: &[WindowItem<u32>]) -> Vec<String> {
        rows.iter().map(|row| row.id().to_string()).collect()
    }

    fn counter(provider: &DataProvider<u32>) -> (Rc<Cell<u32>>, Subscription) {
        let count = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&count);
        let sub = provider.subscribe(move || c.set(c.get() + 1));
        (count, sub)
    }

    fn keep_even() -> Selector<u32> {
        Selector::infallible(|raw: &[Rc<Item<u32>>], _| {
            raw.iter().filter(|item| item.content % 2 == 0).cloned().collect()
        })
    }

    #[test]
    fn basic_window_and_count() {
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a", "b", "c"]), false, None);
        assert_eq!(ids(&provider.get_data(0, 1)), vec!["a", "b"]);
        assert_eq!(provider.get_total_count(), 3);
    }

    #[test]
    fn range_clamping() {
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a", "b", "c"]), false, None);
        assert_eq!(provider.get_data(-5, 1000).len(), 3);
        assert!(provider.get_data(10, 20).is_empty());
        assert!(provider.get_data(2, 1).is_empty());
        assert!(provider.get_data(-10, -1).is_empty());
        assert_eq!(ids(&provider.get_data(2, 2)), vec!["c"]);
    }

    #[test]
    fn clamp_window_edges() {
        assert_eq!(clamp_window(0, 0, 10), None);
        assert_eq!(clamp_window(3, -5, 1000), Some(0..3));
        assert_eq!(clamp_window(3, 3, 3), None);
        assert_eq!(clamp_window(3, 1, 1), Some(1..2));
        assert_eq!(clamp_window(3, i64::MIN, i64::MAX), Some(0..3));
    }

    #[test]
    fn placeholders_while_loading() {
        let mut provider =
            DataProvider::<u32>::with_options(ProviderOptions::default().with_placeholder_count(5));
        provider.update_raw_data(Vec::<Item<u32>>::new(), true, None);
        let rows = provider.get_data(0, 2);
        assert_eq!(
            ids(&rows),
            vec!["__placeholder-0", "__placeholder-1", "__placeholder-2"]
        );
        assert!(rows.iter().all(WindowItem::is_placeholder));
        assert_eq!(provider.get_total_count(), 5);
        assert_eq!(provider.get_data(10, 100).len(), 5);
    }

    #[test]
    fn loading_with_data_serves_data() {
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a"]), true, None);
        assert_eq!(ids(&provider.get_data(0, 5)), vec!["a"]);
        assert_eq!(provider.get_total_count(), 1);
    }

    #[test]
    fn error_item_when_empty() {
        let mut provider = DataProvider::<u32>::new();
        provider.update_raw_data(
            Vec::<Item<u32>>::new(),
            false,
            Some(ProviderError::from_source("offline")),
        );
        let rows = provider.get_data(0, 50);
        assert_eq!(rows.len(), 1);
        match &rows[0] {
            WindowItem::Error(item) => {
                assert_eq!(item.message(), "offline");
                assert_eq!(item.original_error().kind(), ErrorKind::Source);
            }
            other => panic!("expected error row, got {other:?}"),
        }
        assert_eq!(provider.get_total_count(), 1);
    }

    #[test]
    fn hidden_sentinels_fall_back_to_empty() {
        let opts = ProviderOptions::default()
            .with_error_item(false)
            .with_placeholders_while_loading(false);
        let mut provider = DataProvider::<u32>::with_options(opts);
        provider.update_raw_data(
            Vec::<Item<u32>>::new(),
            true,
            Some(ProviderError::from_source("offline")),
        );
        assert!(provider.get_data(0, 10).is_empty());
        assert_eq!(provider.get_total_count(), 0);
    }

    #[test]
    fn sentinel_priority_placeholders_over_error() {
        let mut provider = DataProvider::<u32>::new();
        provider.update_raw_data(
            Vec::<Item<u32>>::new(),
            true,
            Some(ProviderError::from_source("offline")),
        );
        let rows = provider.get_data(0, 3);
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(WindowItem::is_placeholder));
    }

    #[test]
    fn identical_update_is_a_noop() {
        let mut provider = DataProvider::new();
        let (count, _sub) = counter(&provider);
        assert!(provider.update_raw_data(items(&["a", "b", "c"]), false, None));
        let version = provider.version();
        assert!(!provider.update_raw_data(items(&["a", "x", "c"]), false, None));
        assert_eq!(count.get(), 1);
        assert_eq!(provider.version(), version);
        // Interior edit is not picked up.
        assert_eq!(provider.raw_data()[1].id, "b");
    }

    #[test]
    fn flag_change_applies_even_with_same_items() {
        let mut provider = DataProvider::new();
        let (count, _sub) = counter(&provider);
        provider.update_raw_data(items(&["a", "b"]), true, None);
        assert!(provider.update_raw_data(items(&["a", "b"]), false, None));
        assert_eq!(count.get(), 2);
        assert!(!provider.is_loading());
    }

    #[test]
    fn disabled_detection_always_applies() {
        let mut provider =
            DataProvider::with_options(ProviderOptions::default().with_change_detection(false));
        let (count, _sub) = counter(&provider);
        provider.update_raw_data(items(&["a", "b", "c"]), false, None);
        provider.update_raw_data(items(&["a", "x", "c"]), false, None);
        assert_eq!(count.get(), 2);
        assert_eq!(provider.raw_data()[1].id, "x");
    }

    #[test]
    fn pass_through_shares_elements() {
        let mut provider = DataProvider::<u32>::new();
        provider.update_raw_data(items(&["a", "b"]), false, None);
        assert!(provider.derived_view().is_pass_through());
        for (raw, derived) in provider.raw_data().iter().zip(provider.selected_data()) {
            assert!(Rc::ptr_eq(raw, derived));
        }
        let row = provider.get_data(0, 0);
        assert!(Rc::ptr_eq(
            row[0].as_data().expect("data row"),
            &provider.raw_data()[0]
        ));
    }

    #[test]
    fn selector_applies_and_memoizes() {
        let calls = Rc::new(Cell::new(0u32));
        let c = Rc::clone(&calls);
        let selector = Selector::infallible(move |raw: &[Rc<Item<u32>>], _| {
            c.set(c.get() + 1);
            raw.iter().rev().cloned().collect()
        });

        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a", "b", "c"]), false, None);
        let (count, _sub) = counter(&provider);

        assert!(provider.update_selector(Some(selector.clone()), vec![Dependency::from("x")]));
        assert_eq!(ids(&provider.get_data(0, 2)), vec!["c", "b", "a"]);
        assert_eq!(calls.get(), 1);

        assert!(!provider.update_selector(Some(selector.clone()), vec![Dependency::from("x")]));
        assert_eq!(calls.get(), 1);
        assert_eq!(count.get(), 1);

        assert!(provider.update_selector(Some(selector), vec![Dependency::from("y")]));
        assert_eq!(calls.get(), 2);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn raw_update_reruns_selector() {
        let mut provider = DataProvider::new();
        provider.update_selector(Some(keep_even()), vec![]);
        provider.update_raw_data(items(&["a", "b", "c", "d"]), false, None);
        assert_eq!(ids(&provider.get_data(0, 10)), vec!["a", "c"]);
        assert_eq!(provider.get_total_count(), 2);
        assert!(provider.get_item_by_id("b").is_none());
        assert!(provider.get_item_by_id("c").is_some());
    }

    #[test]
    fn clearing_selector_restores_pass_through() {
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a", "b"]), false, None);
        provider.update_selector(Some(keep_even()), vec![]);
        assert_eq!(provider.get_total_count(), 1);
        assert!(provider.update_selector(None, vec![]));
        assert!(provider.derived_view().is_pass_through());
        assert_eq!(provider.get_total_count(), 2);
    }

    #[test]
    fn selector_failure_becomes_error_state() {
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a", "b"]), false, None);
        let (count, _sub) = counter(&provider);

        let failing = Selector::new(|_: &[Rc<Item<u32>>], _| Err("bad pattern".into()));
        assert!(provider.update_selector(Some(failing), vec![]));
        assert_eq!(count.get(), 1);
        assert_eq!(provider.get_total_count(), 1);
        assert!(provider.get_item_by_id("a").is_none());
        assert_eq!(
            provider.error().map(ToString::to_string).as_deref(),
            Some("selector failed: bad pattern")
        );
        // Raw data is retained while the derived view is cleared.
        assert_eq!(provider.raw_data().len(), 2);
        assert!(provider.selected_data().is_empty());
    }

    #[test]
    fn panicking_selector_is_contained() {
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a"]), false, None);
        let panicking = Selector::infallible(|_: &[Rc<Item<u32>>], _| panic!("index out of range"));
        provider.update_selector(Some(panicking), vec![]);
        assert_eq!(
            provider.error().map(ProviderError::message),
            Some("index out of range")
        );
        assert!(provider.get_data(0, 0)[0].is_error());
    }

    #[test]
    fn successful_selector_clears_stale_selector_error() {
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a", "b"]), false, None);
        let failing = Selector::new(|_: &[Rc<Item<u32>>], _| Err("nope".into()));
        provider.update_selector(Some(failing), vec![]);
        assert!(provider.error().is_some());

        provider.update_selector(Some(keep_even()), vec![]);
        assert!(provider.error().is_none());
        assert_eq!(provider.get_total_count(), 1);
    }

    #[test]
    fn successful_selector_keeps_source_error() {
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a"]), false, Some(ProviderError::from_source("stale")));
        provider.update_selector(Some(keep_even()), vec![]);
        assert_eq!(provider.error().map(ProviderError::kind), Some(ErrorKind::Source));
    }

    #[test]
    fn selector_recovery_restores_source_error() {
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a"]), false, Some(ProviderError::from_source("offline")));

        let failing = Selector::new(|_: &[Rc<Item<u32>>], _| Err("bad".into()));
        provider.update_selector(Some(failing), vec![]);
        assert_eq!(provider.error().map(ProviderError::kind), Some(ErrorKind::Selector));
        assert_eq!(provider.source_error().map(ProviderError::message), Some("offline"));

        let identity = Selector::infallible(|raw: &[Rc<Item<u32>>], _| raw.to_vec());
        provider.update_selector(Some(identity), vec![]);
        assert!(provider.selector_error().is_none());
        assert_eq!(provider.error(), Some(&ProviderError::from_source("offline")));
        let state = provider.get_state();
        assert_eq!(state.error_kind, Some(ErrorKind::Source));
        assert_eq!(state.source_error.as_deref(), Some("offline"));
    }

    #[test]
    fn resent_source_state_ignores_selector_error() {
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a"]), false, None);
        let failing = Selector::new(|_: &[Rc<Item<u32>>], _| Err("bad".into()));
        provider.update_selector(Some(failing), vec![]);
        let version = provider.version();

        assert!(!provider.update_raw_data(items(&["a"]), false, None));
        assert_eq!(provider.version(), version);
        assert_eq!(provider.error().map(ProviderError::kind), Some(ErrorKind::Selector));
    }

    #[test]
    fn raw_update_with_working_selector_clears_selector_error() {
        let attempts = Rc::new(Cell::new(0u32));
        let a = Rc::clone(&attempts);
        let first_fails = Selector::new(move |raw: &[Rc<Item<u32>>], _| {
            a.set(a.get() + 1);
            if a.get() == 1 {
                Err("cold cache".into())
            } else {
                Ok(raw.to_vec())
            }
        });
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a"]), false, Some(ProviderError::from_source("slow")));
        provider.update_selector(Some(first_fails), vec![]);
        assert!(provider.selector_error().is_some());

        provider.update_raw_data(items(&["a", "b"]), false, None);
        assert!(provider.error().is_none());
        assert_eq!(provider.get_total_count(), 2);
    }

    #[test]
    fn converting_provider_serves_projected_rows() {
        let mut provider: DataProvider<u32, String> =
            DataProvider::converting(ProviderOptions::default());
        provider.update_raw_data(items(&["a", "b"]), false, None);
        assert!(provider.derived_view().is_pending());
        assert_eq!(provider.get_total_count(), 0);
        assert_eq!(provider.raw_data().len(), 2);

        let label =
            Selector::projection(|item: &Item<u32>| item.map_content(|n| format!("row {n}")));
        assert!(provider.update_selector(Some(label), vec![]));
        let rows = provider.get_data(0, 1);
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1].as_data().map(|item| item.content.as_str()),
            Some("row 1")
        );
        assert_eq!(
            provider.get_item_by_id("a").map(|item| item.content.clone()),
            Some("row 0".to_string())
        );

        assert!(provider.update_selector(None, vec![]));
        assert!(provider.derived_view().is_pending());
        assert_eq!(provider.get_total_count(), 0);
    }

    #[test]
    fn converting_provider_shows_placeholders_while_pending() {
        let mut provider: DataProvider<u32, String> =
            DataProvider::converting(ProviderOptions::default().with_placeholder_count(3));
        provider.update_raw_data(Vec::<Item<u32>>::new(), true, None);
        assert_eq!(provider.get_total_count(), 3);
        assert!(provider.get_data(0, 9).iter().all(WindowItem::is_placeholder));
    }

    #[test]
    fn refresh_retries_and_notifies() {
        let attempts = Rc::new(Cell::new(0u32));
        let a = Rc::clone(&attempts);
        let flaky = Selector::new(move |raw: &[Rc<Item<u32>>], _| {
            a.set(a.get() + 1);
            if a.get() == 1 {
                Err("transient".into())
            } else {
                Ok(raw.to_vec())
            }
        });
        let mut provider = DataProvider::new();
        provider.update_raw_data(items(&["a"]), false, None);
        provider.update_selector(Some(flaky), vec![]);
        assert!(provider.error().is_some());

        let (count, _sub) = counter(&provider);
        provider.refresh();
        assert_eq!(count.get(), 1);
        assert!(provider.error().is_none());
        assert_eq!(provider.get_total_count(), 1);
    }

    #[test]
    fn sentinel_ids_are_not_addressable() {
        let mut provider = DataProvider::<u32>::new();
        provider.update_raw_data(
            vec![Item::new("__error-item", 0u32), Item::new("__placeholder-1", 1)],
            false,
            None,
        );
        assert!(provider.get_item_by_id("__error-item").is_none());
        assert!(provider.get_item_by_id("__placeholder-1").is_none());
    }

    #[test]
    fn current_ids_and_state() {
        let mut provider = DataProvider::new();
        let _sub = provider.subscribe(|| {});
        provider.update_raw_data(items(&["a", "b"]), false, None);
        provider.update_selector(Some(keep_even()), vec![Dependency::from(1), Dependency::Null]);

        let ids = provider.get_current_item_ids();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("a"));

        let state = provider.get_state();
        assert_eq!(state.raw_count, 2);
        assert_eq!(state.derived_count, 1);
        assert!(state.has_selector);
        assert_eq!(state.dependency_count, 2);
        assert_eq!(state.subscriber_count, 1);
        assert_eq!(state.version, 2);
        assert!(state.to_jsonl().contains("\"derived_count\":1"));
    }

    #[test]
    fn set_options_notifies_only_on_change() {
        let mut provider = DataProvider::<u32>::new();
        let (count, _sub) = counter(&provider);
        assert!(!provider.set_options(ProviderOptions::default()));
        assert!(provider.set_options(ProviderOptions::default().with_placeholder_count(2)));
        assert_eq!(count.get(), 1);
        provider.update_raw_data(Vec::<Item<u32>>::new(), true, None);
        assert_eq!(provider.get_total_count(), 2);
    }

    #[test]
    fn apply_snapshot() {
        let mut provider = DataProvider::new();
        assert!(provider.apply(SourceSnapshot::loading()));
        assert_eq!(provider.get_total_count(), 10);
        assert!(provider.apply(SourceSnapshot::ready(items(&["a"]))));
        assert_eq!(provider.get_total_count(), 1);
        assert!(provider.apply(SourceSnapshot::failed(ProviderError::from_source("x"))));
        assert_eq!(provider.get_total_count(), 1);
        assert!(provider.get_data(0, 0)[0].is_error());
    }

    #[test]
    fn accepts_shared_items() {
        let shared = Rc::new(Item::new("a", 1u32));
        let mut provider = DataProvider::<u32>::new();
        provider.update_raw_data(vec![Rc::clone(&shared)], false, None);
        assert!(Rc::ptr_eq(&provider.raw_data()[0], &shared));
    }
}
