#![forbid(unsafe_code)]

//! Windowed selector data provider.
//!
//! Bridges an asynchronous, possibly caching data source to a virtualized
//! consumer that reads by index range. The source pushes whole raw sequences
//! and loading/error flags; the consumer reads windows, totals and items by
//! id, and subscribes to be told when the derived view changes.
//!
//! - [`SubscriberRegistry`]: ordered change listeners with RAII
//!   [`Subscription`] guards.
//! - [`ChangeDetector`]: length-and-endpoints check that skips redundant
//!   recomputation.
//! - [`SelectorPipeline`]: memoized selector application keyed on selector
//!   identity and dependency equality.
//! - [`sentinel`]: placeholder and error rows for transient states.
//! - [`DataProvider`]: owns the state and exposes the windowed-read contract;
//!   [`SharedProvider`] wraps it for shared single-threaded use.
//!
//! Everything is synchronous. Notifications are delivered in registration
//! order before the update call returns.

pub mod change_detection;
pub mod dependency;
pub mod error;
pub mod item;
pub mod options;
pub mod provider;
pub mod selector;
pub mod sentinel;
pub mod shared;
pub mod subscribers;

pub use change_detection::{ChangeDetector, ChangeReason, ChangeVerdict};
pub use dependency::{Dependency, dependencies_changed};
pub use error::{ErrorKind, ProviderError, SelectorFailure};
pub use item::{Item, Keyed, WindowItem};
pub use options::ProviderOptions;
pub use provider::{DataProvider, ProviderState, SourceSnapshot, clamp_window};
pub use selector::{DerivedView, Identity, Selector, SelectorPipeline, SelectorResult};
pub use sentinel::{ERROR_ITEM_ID, ErrorItem, PLACEHOLDER_ID_PREFIX, PlaceholderItem};
pub use shared::SharedProvider;
pub use subscribers::{SubscriberRegistry, Subscription};
