#![forbid(unsafe_code)]

//! Placeholder and error stand-ins for an empty derived view.
//!
//! Everything here is a pure function of the request and the provider flags.
//! Placeholder ids are derived from the absolute index, so the same window
//! requested twice yields identical ids.

use crate::error::ProviderError;
use crate::options::ProviderOptions;

pub const PLACEHOLDER_ID_PREFIX: &str = "__placeholder-";
pub const ERROR_ITEM_ID: &str = "__error-item";

/// Stand-in row shown while loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlaceholderItem {
    id: String,
    index: i64,
}

impl PlaceholderItem {
    #[must_use]
    pub fn new(index: i64) -> Self {
        Self {
            id: format!("{PLACEHOLDER_ID_PREFIX}{index}"),
            index,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute index in the requested window.
    #[must_use]
    pub fn index(&self) -> i64 {
        self.index
    }
}

/// Single row shown when an error is set and nothing else is visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorItem {
    message: String,
    original_error: ProviderError,
}

impl ErrorItem {
    #[must_use]
    pub fn new(error: &ProviderError) -> Self {
        Self {
            message: error.to_string(),
            original_error: error.clone(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        ERROR_ITEM_ID
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn original_error(&self) -> &ProviderError {
        &self.original_error
    }
}

/// Whether `id` names a synthetic row. Sentinels are never addressable.
#[must_use]
pub fn is_sentinel_id(id: &str) -> bool {
    id == ERROR_ITEM_ID || id.starts_with(PLACEHOLDER_ID_PREFIX)
}

/// Which branch a read takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback<'a> {
    Placeholders,
    Error(&'a ProviderError),
    /// Serve the derived view.
    None,
}

/// Pick the read branch. Placeholders win over the error item when both
/// apply.
#[must_use]
pub fn select_fallback<'a>(
    options: &ProviderOptions,
    is_loading: bool,
    error: Option<&'a ProviderError>,
    derived_len: usize,
) -> Fallback<'a> {
    if derived_len != 0 {
        return Fallback::None;
    }
    if is_loading && options.show_placeholders_while_loading {
        return Fallback::Placeholders;
    }
    match error {
        Some(error) if options.show_error_item => Fallback::Error(error),
        _ => Fallback::None,
    }
}

/// Placeholders for the inclusive window `[start, end]`, capped at `limit`.
#[must_use]
pub fn placeholders(start: i64, end: i64, limit: usize) -> Vec<PlaceholderItem> {
    let requested = end.saturating_sub(start).saturating_add(1);
    let count = usize::try_from(requested).unwrap_or(0).min(limit);
    (0..count)
        .map(|offset| PlaceholderItem::new(start.saturating_add(offset as i64)))
        .collect()
}
