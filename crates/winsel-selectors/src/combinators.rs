#![forbid(unsafe_code)]

//! Stateless selector combinators.
//!
//! Each function returns a fresh [`Selector`]. Build them once and keep the
//! handle: the provider memoizes on handle identity, so rebuilding a
//! combinator on every render defeats memoization.

use std::cmp::Ordering;
use std::rc::Rc;

use winsel_core::{Dependency, Item, Selector};

/// Keep items whose type tag equals `item_type`.
pub fn filter_by_type<T: 'static>(item_type: impl Into<String>) -> Selector<T> {
    let item_type = item_type.into();
    Selector::infallible(move |raw: &[Rc<Item<T>>], _| {
        raw.iter()
            .filter(|item| item.item_type() == Some(item_type.as_str()))
            .cloned()
            .collect()
    })
    .named("filter_by_type")
}

/// Keep items whose type tag equals the string dependency at `index`.
///
/// A missing or non-string dependency keeps everything.
pub fn filter_by_type_dep<T: 'static>(index: usize) -> Selector<T> {
    Selector::infallible(move |raw: &[Rc<Item<T>>], deps: &[Dependency]| {
        match deps.get(index).and_then(Dependency::as_str) {
            Some(wanted) => raw
                .iter()
                .filter(|item| item.item_type() == Some(wanted))
                .cloned()
                .collect(),
            None => raw.to_vec(),
        }
    })
    .named("filter_by_type_dep")
}

/// Case-insensitive substring search over `extract(item)`.
///
/// The query is dependency 0. An absent or empty query keeps everything.
pub fn text_search<T: 'static>(extract: impl Fn(&Item<T>) -> String + 'static) -> Selector<T> {
    Selector::infallible(move |raw: &[Rc<Item<T>>], deps: &[Dependency]| {
        let query = deps
            .first()
            .and_then(Dependency::as_str)
            .map(str::to_lowercase)
            .unwrap_or_default();
        if query.is_empty() {
            return raw.to_vec();
        }
        raw.iter()
            .filter(|item| extract(item).to_lowercase().contains(&query))
            .cloned()
            .collect()
    })
    .named("text_search")
}

/// Stable sort by a key.
pub fn sort_by_key<T: 'static, K: Ord>(key: impl Fn(&Item<T>) -> K + 'static) -> Selector<T> {
    Selector::infallible(move |raw: &[Rc<Item<T>>], _| {
        let mut sorted = raw.to_vec();
        sorted.sort_by_key(|item| key(item));
        sorted
    })
    .named("sort_by_key")
}

/// Stable sort by a comparator.
pub fn sort_by<T: 'static>(
    compare: impl Fn(&Item<T>, &Item<T>) -> Ordering + 'static,
) -> Selector<T> {
    Selector::infallible(move |raw: &[Rc<Item<T>>], _| {
        let mut sorted = raw.to_vec();
        sorted.sort_by(|a, b| compare(a, b));
        sorted
    })
    .named("sort_by")
}

/// The first `n` items.
pub fn take<T: 'static>(n: usize) -> Selector<T> {
    Selector::infallible(move |raw: &[Rc<Item<T>>], _| raw.iter().take(n).cloned().collect())
        .named("take")
}

/// Apply `stages` left to right, each seeing the previous output and the
/// same dependency list. The first failing stage ends the chain.
pub fn compose<T: 'static>(stages: impl IntoIterator<Item = Selector<T>>) -> Selector<T> {
    let stages: Vec<Selector<T>> = stages.into_iter().collect();
    Selector::new(move |raw: &[Rc<Item<T>>], deps: &[Dependency]| {
        let mut current = raw.to_vec();
        for stage in &stages {
            current = stage.apply(&current, deps).inspect_err(|failure| {
                tracing::debug!(
                    message = "selectors.compose_failed",
                    stage = stage.name(),
                    error = %failure
                );
            })?;
        }
        Ok(current)
    })
    .named("compose")
}

/// Run `first`, then feed its output to `second`, which may change the
/// content type. Either failure ends the chain.
pub fn chain<R: 'static, M: 'static, D: 'static>(
    first: Selector<R, M>,
    second: Selector<M, D>,
) -> Selector<R, D> {
    Selector::new(move |raw: &[Rc<Item<R>>], deps: &[Dependency]| {
        let middle = first.apply(raw, deps)?;
        second.apply(&middle, deps)
    })
    .named("chain")
}
