#![forbid(unsafe_code)]

//! Error values carried in provider state.
//!
//! Nothing on the read or update path returns these as `Err`. Source and
//! selector failures are stored in the provider and surfaced to consumers as
//! the sentinel error item.

use serde::Serialize;
use thiserror::Error;

/// Where a [`ProviderError`] originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Reported by the asynchronous data source.
    Source,
    /// Raised by the active selector during recomputation.
    Selector,
    /// Raised while converting external payloads into items.
    Transform,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Selector => "selector",
            Self::Transform => "transform",
        }
    }
}

/// An error held in provider state.
///
/// Equality is by value so that re-emitting the same source error is not
/// mistaken for a state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Source error, displayed verbatim.
    #[error("{message}")]
    Source { message: String },

    #[error("selector failed: {message}")]
    Selector { message: String },

    #[error("transform failed: {message}")]
    Transform { message: String },
}

impl ProviderError {
    #[must_use]
    pub fn from_source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn selector(message: impl Into<String>) -> Self {
        Self::Selector {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn transform(message: impl Into<String>) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Source { .. } => ErrorKind::Source,
            Self::Selector { .. } => ErrorKind::Selector,
            Self::Transform { .. } => ErrorKind::Transform,
        }
    }

    /// The underlying message without the contextual prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Source { message } | Self::Selector { message } | Self::Transform { message } => {
                message
            }
        }
    }
}

/// Failure returned by a selector function.
///
/// Panics inside a selector are converted into this type as well, so a
/// misbehaving selector never unwinds through the provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SelectorFailure {
    message: String,
}

impl SelectorFailure {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "selector panicked".to_string()
        };
        Self { message }
    }
}

impl From<String> for SelectorFailure {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for SelectorFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<SelectorFailure> for ProviderError {
    fn from(failure: SelectorFailure) -> Self {
        Self::Selector {
            message: failure.message,
        }
    }
}
