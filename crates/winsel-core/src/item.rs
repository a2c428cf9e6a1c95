#![forbid(unsafe_code)]

//! Items and the rows returned by windowed reads.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::sentinel::{ErrorItem, PlaceholderItem};

/// A unit of data with a stable id.
///
/// Ids must be unique among real items. This is an upstream contract and is
/// not checked here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item<T> {
    pub id: String,
    pub content: T,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
}

impl<T> Item<T> {
    #[must_use]
    pub fn new(id: impl Into<String>, content: T) -> Self {
        Self {
            id: id.into(),
            content,
            item_type: None,
        }
    }

    #[must_use]
    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    #[must_use]
    pub fn item_type(&self) -> Option<&str> {
        self.item_type.as_deref()
    }

    /// Same id and type tag around new content.
    #[must_use]
    pub fn map_content<U>(&self, f: impl FnOnce(&T) -> U) -> Item<U> {
        Item {
            id: self.id.clone(),
            content: f(&self.content),
            item_type: self.item_type.clone(),
        }
    }
}

/// Anything with a string id.
pub trait Keyed {
    fn key(&self) -> &str;
}

impl<T> Keyed for Item<T> {
    fn key(&self) -> &str {
        &self.id
    }
}

impl<K: Keyed + ?Sized> Keyed for Rc<K> {
    fn key(&self) -> &str {
        (**self).key()
    }
}

/// One row of a windowed read: a real item or a sentinel stand-in.
#[derive(Debug, PartialEq)]
pub enum WindowItem<T> {
    Data(Rc<Item<T>>),
    Placeholder(PlaceholderItem),
    Error(ErrorItem),
}

impl<T> Clone for WindowItem<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Data(item) => Self::Data(Rc::clone(item)),
            Self::Placeholder(p) => Self::Placeholder(p.clone()),
            Self::Error(e) => Self::Error(e.clone()),
        }
    }
}

impl<T> WindowItem<T> {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Data(item) => &item.id,
            Self::Placeholder(p) => p.id(),
            Self::Error(e) => e.id(),
        }
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Self::Data(_))
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    #[must_use]
    pub fn as_data(&self) -> Option<&Rc<Item<T>>> {
        match self {
            Self::Data(item) => Some(item),
            _ => None,
        }
    }
}

impl<T> Keyed for WindowItem<T> {
    fn key(&self) -> &str {
        self.id()
    }
}
