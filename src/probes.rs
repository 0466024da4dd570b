//! Capability probes: the closed set of "how to compare me" traits.
//!
//! An element type opts into a probe by implementing the capability trait
//! and exposing it through the matching `Probes` accessor. Accessors return
//! `None` by default, so `impl Probes for T {}` means "no probes, compare
//! structurally". The `probes!` macro writes the accessors:
//!
//! ```
//! use mutex_kit::probes::Equal;
//!
//! #[derive(serde::Serialize)]
//! struct Version { major: u32, build: String }
//!
//! impl Equal for Version {
//!     fn equal(&self, other: &Self) -> bool {
//!         self.major == other.major
//!     }
//! }
//!
//! mutex_kit::probes!(Version: Equal);
//! ```
//!
//! Accessors are evaluated per value, so an enum may expose a probe for some
//! variants only. Probes that need both operands (`Hash64` and the marshal
//! group) are only used when both values expose them.

use core::cmp::Ordering;
use core::fmt;
use serde::Serialize;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

/// `Equal(b) -> bool`.
pub trait Equal<Rhs: ?Sized = Self> {
    fn equal(&self, other: &Rhs) -> bool;
}

/// `Equals(b) -> bool`.
pub trait Equals<Rhs: ?Sized = Self> {
    fn equals(&self, other: &Rhs) -> bool;
}

/// `Compare(b) -> ordering`; equal iff `Ordering::Equal`.
pub trait Compare<Rhs: ?Sized = Self> {
    fn compare(&self, other: &Rhs) -> Ordering;
}

/// `Cmp(b) -> integer`; equal iff zero.
pub trait Cmp<Rhs: ?Sized = Self> {
    fn cmp_to(&self, other: &Rhs) -> i64;
}

/// `Is(b) -> bool`.
pub trait Is<Rhs: ?Sized = Self> {
    fn is(&self, other: &Rhs) -> bool;
}

/// `IsSame(b) -> bool`.
pub trait IsSame<Rhs: ?Sized = Self> {
    fn is_same(&self, other: &Rhs) -> bool;
}

/// `Hash() -> u64`; equal iff both sides expose it and the hashes match.
pub trait Hash64 {
    fn hash64(&self) -> u64;
}

/// `MarshalBinary() -> (bytes, error)`.
pub trait MarshalBinary {
    fn marshal_binary(&self) -> Result<Vec<u8>, MarshalError>;
}

/// `MarshalJSON() -> (bytes, error)`.
pub trait MarshalJson {
    fn marshal_json(&self) -> Result<Vec<u8>, MarshalError>;
}

/// Failure reported by a marshal probe. The engine treats it as "probe not
/// supported" and moves on; it never reaches container callers.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    #[error("{0}")]
    Message(String),
    #[error("json encoding failed")]
    Json(#[from] serde_json::Error),
}

impl MarshalError {
    pub fn msg(message: impl Into<String>) -> Self {
        MarshalError::Message(message.into())
    }
}

/// Encode `value` with `serde_json`; a ready-made `MarshalJson` body.
pub fn json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, MarshalError> {
    Ok(serde_json::to_vec(value)?)
}

/// Per-value access to the capability probes a type supports.
///
/// The resolution engine queries these in a fixed order; see
/// `equals::resolve`.
pub trait Probes {
    fn as_equal(&self) -> Option<&dyn Equal<Self>> {
        None
    }
    fn as_equals(&self) -> Option<&dyn Equals<Self>> {
        None
    }
    fn as_compare(&self) -> Option<&dyn Compare<Self>> {
        None
    }
    fn as_cmp(&self) -> Option<&dyn Cmp<Self>> {
        None
    }
    fn as_is(&self) -> Option<&dyn Is<Self>> {
        None
    }
    fn as_is_same(&self) -> Option<&dyn IsSame<Self>> {
        None
    }
    fn as_hash64(&self) -> Option<&dyn Hash64> {
        None
    }
    /// The string-form probe, backed by `Display`.
    fn as_string_probe(&self) -> Option<&dyn fmt::Display> {
        None
    }
    fn as_marshal_binary(&self) -> Option<&dyn MarshalBinary> {
        None
    }
    fn as_marshal_json(&self) -> Option<&dyn MarshalJson> {
        None
    }
}

/// Implement `Probes` for a type, exposing the listed capabilities.
///
/// `probes!(T: Equal, Hash64)` wires the named accessors to `self`; the type
/// must implement each named trait. `probes!(A, B)` opts types in with no
/// probes. Capability names: `Equal`, `Equals`, `Compare`, `Cmp`, `Is`,
/// `IsSame`, `Hash64`, `Display`, `MarshalBinary`, `MarshalJson`.
#[macro_export]
macro_rules! probes {
    ($ty:ty : $($cap:ident),+ $(,)?) => {
        impl $crate::Probes for $ty {
            $( $crate::__probe_accessor!($cap); )+
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $( impl $crate::Probes for $ty {} )+
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __probe_accessor {
    (Equal) => {
        fn as_equal(&self) -> ::core::option::Option<&dyn $crate::probes::Equal<Self>> {
            ::core::option::Option::Some(self)
        }
    };
    (Equals) => {
        fn as_equals(&self) -> ::core::option::Option<&dyn $crate::probes::Equals<Self>> {
            ::core::option::Option::Some(self)
        }
    };
    (Compare) => {
        fn as_compare(&self) -> ::core::option::Option<&dyn $crate::probes::Compare<Self>> {
            ::core::option::Option::Some(self)
        }
    };
    (Cmp) => {
        fn as_cmp(&self) -> ::core::option::Option<&dyn $crate::probes::Cmp<Self>> {
            ::core::option::Option::Some(self)
        }
    };
    (Is) => {
        fn as_is(&self) -> ::core::option::Option<&dyn $crate::probes::Is<Self>> {
            ::core::option::Option::Some(self)
        }
    };
    (IsSame) => {
        fn as_is_same(&self) -> ::core::option::Option<&dyn $crate::probes::IsSame<Self>> {
            ::core::option::Option::Some(self)
        }
    };
    (Hash64) => {
        fn as_hash64(&self) -> ::core::option::Option<&dyn $crate::probes::Hash64> {
            ::core::option::Option::Some(self)
        }
    };
    (Display) => {
        fn as_string_probe(&self) -> ::core::option::Option<&dyn ::core::fmt::Display> {
            ::core::option::Option::Some(self)
        }
    };
    (MarshalBinary) => {
        fn as_marshal_binary(&self) -> ::core::option::Option<&dyn $crate::probes::MarshalBinary> {
            ::core::option::Option::Some(self)
        }
    };
    (MarshalJson) => {
        fn as_marshal_json(&self) -> ::core::option::Option<&dyn $crate::probes::MarshalJson> {
            ::core::option::Option::Some(self)
        }
    };
}

// Scalars answer through `Equal` backed by `PartialEq`, which is what a
// structural comparison of them would conclude anyway.
macro_rules! native_equal {
    ($($ty:ty),* $(,)?) => {$(
        impl Equal for $ty {
            #[inline]
            fn equal(&self, other: &Self) -> bool {
                self == other
            }
        }
        impl Probes for $ty {
            fn as_equal(&self) -> Option<&dyn Equal<Self>> {
                Some(self)
            }
        }
    )*};
}

native_equal!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String,
);

impl<'a> Equal for &'a str {
    #[inline]
    fn equal(&self, other: &Self) -> bool {
        self == other
    }
}

impl<'a> Probes for &'a str {
    fn as_equal(&self) -> Option<&dyn Equal<Self>> {
        Some(self)
    }
}

// Containers and smart pointers carry no probes of their own: they compare
// structurally, which recurses into their elements' serde rendering.
impl<T> Probes for Vec<T> {}
impl<T> Probes for VecDeque<T> {}
impl<T> Probes for Option<T> {}
impl<T: ?Sized> Probes for Box<T> {}
impl<T: ?Sized> Probes for Rc<T> {}
impl<T: ?Sized> Probes for Arc<T> {}
impl<'a, B: ?Sized + ToOwned> Probes for Cow<'a, B> {}
impl<T> Probes for [T] {}
impl<T, const N: usize> Probes for [T; N] {}
impl<K, V, S> Probes for std::collections::HashMap<K, V, S> {}
impl<T, S> Probes for std::collections::HashSet<T, S> {}
impl<K, V> Probes for BTreeMap<K, V> {}
impl<T> Probes for BTreeSet<T> {}
impl<K, V, S> Probes for hashbrown::HashMap<K, V, S> {}
impl<T, S> Probes for hashbrown::HashSet<T, S> {}

macro_rules! tuple_probes {
    ($(($($name:ident),+))+) => {$(
        impl<$($name),+> Probes for ($($name,)+) {}
    )+};
}

tuple_probes! {
    (A)
    (A, B)
    (A, B, C)
    (A, B, C, D)
    (A, B, C, D, E)
    (A, B, C, D, E, F)
    (A, B, C, D, E, F, G)
    (A, B, C, D, E, F, G, H)
    (A, B, C, D, E, F, G, H, I)
    (A, B, C, D, E, F, G, H, I, J)
    (A, B, C, D, E, F, G, H, I, J, K)
    (A, B, C, D, E, F, G, H, I, J, K, L)
}
