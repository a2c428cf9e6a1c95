#![forbid(unsafe_code)]

//! Dependency values that parameterize a selector.
//!
//! A dependency list is compared positionally. Primitives compare by value,
//! strings by content, and [`Dependency::Ref`] by pointer identity, so two
//! separately allocated but equal objects count as a change.
//!
//! Numbers compare by numeric value across [`Dependency::Int`] and
//! [`Dependency::Float`]: `Int(1)` equals `Float(1.0)`. The integer is
//! widened to `f64` for the comparison, so integers beyond 2^53 may compare
//! equal to a nearby float.

use std::any::Any;
use std::fmt;
use std::num::TryFromIntError;
use std::rc::Rc;

/// An opaque selector dependency.
#[derive(Clone)]
pub enum Dependency {
    Null,
    Bool(bool),
    /// Equal to a `Float` with the same numeric value.
    Int(i64),
    /// Compared with IEEE `==`; `NaN` never equals itself.
    Float(f64),
    Str(Rc<str>),
    /// Compared by identity.
    Ref(Rc<dyn Any>),
}

impl Dependency {
    /// Wrap a shared value compared by identity.
    #[must_use]
    pub fn reference<V: Any>(value: Rc<V>) -> Self {
        Self::Ref(value)
    }

    /// Positional equality used by the recomputation gate.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(i), Self::Float(f)) | (Self::Float(f), Self::Int(i)) => *i as f64 == *f,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Ref(a), Self::Ref(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        match self {
            Self::Ref(value) => value.downcast_ref::<V>(),
            _ => None,
        }
    }
}

impl PartialEq for Dependency {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Str(v) => f.debug_tuple("Str").field(v).finish(),
            Self::Ref(v) => f.debug_tuple("Ref").field(&Rc::as_ptr(v)).finish(),
        }
    }
}

impl From<bool> for Dependency {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Dependency {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Dependency {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for Dependency {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

/// Fails for values above `i64::MAX` rather than folding them together.
impl TryFrom<usize> for Dependency {
    type Error = TryFromIntError;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        i64::try_from(v).map(Self::Int)
    }
}

/// Fails for values above `i64::MAX` rather than folding them together.
impl TryFrom<u64> for Dependency {
    type Error = TryFromIntError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        i64::try_from(v).map(Self::Int)
    }
}

impl From<f64> for Dependency {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Dependency {
    fn from(v: &str) -> Self {
        Self::Str(Rc::from(v))
    }
}

impl From<String> for Dependency {
    fn from(v: String) -> Self {
        Self::Str(Rc::from(v))
    }
}

impl From<Rc<str>> for Dependency {
    fn from(v: Rc<str>) -> Self {
        Self::Str(v)
    }
}

impl<V: Into<Dependency>> From<Option<V>> for Dependency {
    fn from(v: Option<V>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Shallow inequality of two dependency lists.
///
/// A length mismatch counts as changed.
#[must_use]
pub fn dependencies_changed(previous: &[Dependency], next: &[Dependency]) -> bool {
    previous.len() != next.len() || previous.iter().zip(next).any(|(a, b)| !a.same(b))
}
