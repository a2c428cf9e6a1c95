#![forbid(unsafe_code)]

//! Cheap change detection for wholesale raw-sequence replacement.
//!
//! A sequence counts as changed when its length differs, or when it is
//! non-empty and its first or last id differs from the previous one.
//!
//! # Failure Modes
//!
//! - **Interior edits**: reordering or replacing interior items while keeping
//!   the length and both endpoint ids is reported as unchanged. This false
//!   negative is accepted; sources that mutate interiors should disable
//!   detection via `ProviderOptions::enable_change_detection`.

use crate::item::Keyed;

/// Why an update was considered a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    /// Detection is turned off; every update is a change.
    Disabled,
    Length,
    FirstId,
    LastId,
}

impl ChangeReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Length => "length",
            Self::FirstId => "first_id",
            Self::LastId => "last_id",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeVerdict {
    Changed(ChangeReason),
    Unchanged,
}

impl ChangeVerdict {
    #[must_use]
    pub const fn is_changed(self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// Length-and-endpoints comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeDetector {
    enabled: bool,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ChangeDetector {
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        self.enabled
    }

    /// Compare `next` against `previous`.
    #[must_use]
    pub fn detect<P: Keyed, N: Keyed>(self, previous: &[P], next: &[N]) -> ChangeVerdict {
        if !self.enabled {
            return ChangeVerdict::Changed(ChangeReason::Disabled);
        }
        if previous.len() != next.len() {
            return ChangeVerdict::Changed(ChangeReason::Length);
        }
        match (previous.first(), next.first()) {
            (Some(a), Some(b)) if a.key() != b.key() => {
                return ChangeVerdict::Changed(ChangeReason::FirstId);
            }
            _ => {}
        }
        match (previous.last(), next.last()) {
            (Some(a), Some(b)) if a.key() != b.key() => ChangeVerdict::Changed(ChangeReason::LastId),
            _ => ChangeVerdict::Unchanged,
        }
    }
}
