#![forbid(unsafe_code)]

//! Windowed selector data provider public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub use winsel_core::*;

#[cfg(feature = "selectors")]
pub use winsel_selectors as selectors;

pub mod prelude {
    pub use winsel_core as core;
    pub use winsel_core::{
        DataProvider, Dependency, Item, ProviderError, ProviderOptions, Selector, SharedProvider,
        SourceSnapshot, Subscription, WindowItem,
    };
    #[cfg(feature = "selectors")]
    pub use winsel_selectors as selectors;
}
