#![forbid(unsafe_code)]

//! Provider configuration.

use serde::{Deserialize, Serialize};

/// Configuration for a [`DataProvider`](crate::DataProvider).
///
/// Deserializes from camelCase JSON; missing keys take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderOptions {
    /// Maximum placeholder rows synthesized while loading.
    /// Default: 10.
    pub placeholder_count: usize,

    /// Show placeholder rows while loading with no derived data.
    /// Default: true.
    pub show_placeholders_while_loading: bool,

    /// Show a single error row when an error is set and there is no
    /// derived data.
    /// Default: true.
    pub show_error_item: bool,

    /// Skip recomputation when a raw update has the same length and the
    /// same first and last ids as the previous one. When disabled every
    /// raw update recomputes.
    /// Default: true.
    pub enable_change_detection: bool,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            placeholder_count: 10,
            show_placeholders_while_loading: true,
            show_error_item: true,
            enable_change_detection: true,
        }
    }
}

impl ProviderOptions {
    /// Parse options from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with_placeholder_count(mut self, count: usize) -> Self {
        self.placeholder_count = count;
        self
    }

    #[must_use]
    pub fn with_placeholders_while_loading(mut self, show: bool) -> Self {
        self.show_placeholders_while_loading = show;
        self
    }

    #[must_use]
    pub fn with_error_item(mut self, show: bool) -> Self {
        self.show_error_item = show;
        self
    }

    #[must_use]
    pub fn with_change_detection(mut self, enabled: bool) -> Self {
        self.enable_change_detection = enabled;
        self
    }
}
