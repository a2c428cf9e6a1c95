#![forbid(unsafe_code)]

//! Ready-made selectors and item transforms for `winsel-core`.
//!
//! [`combinators`] holds generic filter, search, sort and composition
//! selectors. [`transform`] turns loosely shaped JSON records into
//! [`Item`](winsel_core::Item)s and provides a search over JSON content.

pub mod combinators;
pub mod transform;

pub use combinators::{
    chain, compose, filter_by_type, filter_by_type_dep, sort_by, sort_by_key, take, text_search,
};
pub use transform::{
    default_transform, json_text_search, transform_all, transform_json, try_transform,
};
