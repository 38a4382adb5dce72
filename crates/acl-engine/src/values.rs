//! Argument normalization.
//!
//! Every operation that works on a set of identifiers (roles, resources,
//! permissions, user ids) also accepts a single identifier. [`IntoValues`]
//! turns both forms into a [`ValueSet`]; numeric ids become their decimal
//! string form.

use crate::error::{AclError, AclResult};
use acl_store::ValueSet;
use std::collections::{BTreeSet, HashSet};

/// Permission value meaning "every permission" on a resource.
pub const WILDCARD: &str = "*";

/// Names backends use for their own bookkeeping (primary lookup fields).
/// They can never be stored as roles, resources, permissions or user ids.
pub const RESERVED_NAMES: &[&str] = &["key", "_id", "_bucketname"];

/// Conversion of a scalar identifier or a collection of identifiers into a
/// set of strings.
///
/// # Example
///
/// ```
/// use acl_engine::IntoValues;
///
/// assert_eq!("admin".into_values().len(), 1);
/// assert_eq!(vec!["view", "edit", "view"].into_values().len(), 2);
/// assert!(42u64.into_values().contains("42"));
/// ```
pub trait IntoValues {
    /// Normalize into a set.
    fn into_values(self) -> ValueSet;
}

impl IntoValues for &str {
    fn into_values(self) -> ValueSet {
        ValueSet::from([self.to_string()])
    }
}

impl IntoValues for String {
    fn into_values(self) -> ValueSet {
        ValueSet::from([self])
    }
}

impl IntoValues for &String {
    fn into_values(self) -> ValueSet {
        ValueSet::from([self.clone()])
    }
}

macro_rules! numeric_ids {
    ($($t:ty),*) => {
        $(
            impl IntoValues for $t {
                fn into_values(self) -> ValueSet {
                    ValueSet::from([self.to_string()])
                }
            }
        )*
    };
}

numeric_ids!(u32, u64, i32, i64, usize);

impl<T: ToString> IntoValues for Vec<T> {
    fn into_values(self) -> ValueSet {
        self.iter().map(ToString::to_string).collect()
    }
}

impl<T: ToString> IntoValues for &Vec<T> {
    fn into_values(self) -> ValueSet {
        self.iter().map(ToString::to_string).collect()
    }
}

impl<T: ToString> IntoValues for &[T] {
    fn into_values(self) -> ValueSet {
        self.iter().map(ToString::to_string).collect()
    }
}

impl<T: ToString, const N: usize> IntoValues for [T; N] {
    fn into_values(self) -> ValueSet {
        self.iter().map(ToString::to_string).collect()
    }
}

impl<T: ToString, const N: usize> IntoValues for &[T; N] {
    fn into_values(self) -> ValueSet {
        self.iter().map(ToString::to_string).collect()
    }
}

impl IntoValues for HashSet<String> {
    fn into_values(self) -> ValueSet {
        self
    }
}

impl IntoValues for &HashSet<String> {
    fn into_values(self) -> ValueSet {
        self.clone()
    }
}

impl IntoValues for BTreeSet<String> {
    fn into_values(self) -> ValueSet {
        self.into_iter().collect()
    }
}

/// Reject identifiers that collide with reserved backend names.
pub(crate) fn ensure_not_reserved(kind: &'static str, values: &ValueSet) -> AclResult<()> {
    match values.iter().find(|v| RESERVED_NAMES.contains(&v.as_str())) {
        Some(value) => Err(AclError::InvalidArgument {
            kind,
            value: value.clone(),
        }),
        None => Ok(()),
    }
}

/// Single identifier as a one-element set.
pub(crate) fn single(value: impl Into<String>) -> ValueSet {
    ValueSet::from([value.into()])
}
