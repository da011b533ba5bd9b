//! The dynamic value model.
//!
//! [`Value`] is a closed variant over null, bool, four integer widths, double,
//! string, array, and object. It is built to fail gracefully rather than
//! panic: read accessors on a missing member or mis-typed value return a null
//! sentinel or a caller-supplied default, so tree-walking code needs no error
//! handling to probe possibly-absent fields.
//!
//! Three ownership strategies coexist, deliberately:
//!
//! - scalars are stored inline: cloning copies the bits;
//! - string and array payloads are shared behind [`Arc`]: cloning bumps a
//!   reference count, and payloads are fixed-size once created. Array element
//!   mutation is copy-on-write — [`Value::elt_mut`] detaches a shared payload
//!   first, so writes through one handle are never visible through another;
//! - object payloads are exclusively owned: cloning deep-copies the map,
//!   because objects are mutated in place and aliasing would be unsafe.
//!
//! # Examples
//!
//! ```rust
//! use valon::Value;
//!
//! let mut v = Value::Null;
//! *v.update_member("name").unwrap() = Value::from("zoe");
//! *v.update_member("score").unwrap() = Value::from(42);
//!
//! assert_eq!(v.member("name").as_str("?"), "zoe");
//! assert_eq!(v.member("score").as_i32(0), 42);
//! assert_eq!(v.member("missing").as_i32(-1), -1);   // degrades, never fails
//! ```

use crate::error::{Error, Result};
use crate::map::ValueMap;
use serde::de::{self, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// The type tag of a [`Value`].
///
/// The declaration order is significant: [`Value::compare`] orders values of
/// different kinds by this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Null,
    Bool,
    Int,
    UInt,
    Int64,
    UInt64,
    Double,
    String,
    Array,
    Object,
}

impl Kind {
    /// Short lowercase name for diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::UInt => "uint",
            Kind::Int64 => "int64",
            Kind::UInt64 => "uint64",
            Kind::Double => "double",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A generically typed document value.
///
/// Exactly one representation is active at a time; the kind reported by
/// [`Value::kind`] always matches the stored representation.
///
/// Null is the only value implicitly convertible to another type on a write:
/// the write accessors promote a null value in place to an object (or array)
/// rather than failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    UInt(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(Arc<str>),
    Array(Arc<[Value]>),
    Object(Box<ValueMap>),
}

/// Shared null sentinel returned by read accessors on a miss.
static NULL: Value = Value::Null;

static EMPTY_ELTS: [Value; 0] = [];

impl Value {
    /// The active type tag.
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::UInt(_) => Kind::UInt,
            Value::Int64(_) => Kind::Int64,
            Value::UInt64(_) => Kind::UInt64,
            Value::Double(_) => Kind::Double,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    /// A fresh default value of the given kind.
    #[must_use]
    pub fn of_kind(kind: Kind) -> Value {
        match kind {
            Kind::Null => Value::Null,
            Kind::Bool => Value::Bool(false),
            Kind::Int => Value::Int(0),
            Kind::UInt => Value::UInt(0),
            Kind::Int64 => Value::Int64(0),
            Kind::UInt64 => Value::UInt64(0),
            Kind::Double => Value::Double(0.0),
            Kind::String => Value::String(Arc::from("")),
            Kind::Array => Value::Array(Arc::from([])),
            Kind::Object => Value::Object(Box::default()),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// `true` for either signed integer width.
    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Int64(_))
    }

    /// `true` for either unsigned integer width.
    #[must_use]
    pub const fn is_uint(&self) -> bool {
        matches!(self, Value::UInt(_) | Value::UInt64(_))
    }

    /// `true` for bool or any integer width.
    #[must_use]
    pub const fn is_integral(&self) -> bool {
        matches!(
            self,
            Value::Bool(_)
                | Value::Int(_)
                | Value::UInt(_)
                | Value::Int64(_)
                | Value::UInt64(_)
        )
    }

    #[must_use]
    pub const fn is_double(&self) -> bool {
        matches!(self, Value::Double(_))
    }

    /// `true` for anything integral or double.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.is_integral() || self.is_double()
    }

    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    // --- Conversions ------------------------------------------------------

    /// Coerces to bool. Numbers are true when non-zero, strings when equal
    /// to `"true"` ignoring ASCII case, arrays and objects when non-empty.
    /// Null yields the default.
    #[must_use]
    pub fn as_bool(&self, default: bool) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(v) => *v != 0,
            Value::UInt(v) => *v != 0,
            Value::Int64(v) => *v != 0,
            Value::UInt64(v) => *v != 0,
            Value::Double(v) => *v != 0.0,
            Value::String(s) => s.eq_ignore_ascii_case("true"),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Null => default,
        }
    }

    /// Coerces to `i32`, saturating at the type's bounds. Non-numeric kinds
    /// yield the default.
    #[must_use]
    pub fn as_i32(&self, default: i32) -> i32 {
        match self {
            Value::Bool(b) => i32::from(*b),
            Value::Int(v) => *v,
            Value::UInt(v) => (*v).min(i32::MAX as u32) as i32,
            Value::Int64(v) => (*v).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
            Value::UInt64(v) => (*v).min(i32::MAX as u64) as i32,
            Value::Double(v) => *v as i32, // saturating cast
            _ => default,
        }
    }

    /// Coerces to `u32`. Negative values yield zero; values above the bound
    /// saturate. Non-numeric kinds yield the default.
    #[must_use]
    pub fn as_u32(&self, default: u32) -> u32 {
        match self {
            Value::Bool(b) => u32::from(*b),
            Value::Int(v) => (*v).max(0) as u32,
            Value::UInt(v) => *v,
            Value::Int64(v) => (*v).clamp(0, i64::from(u32::MAX)) as u32,
            Value::UInt64(v) => (*v).min(u64::from(u32::MAX)) as u32,
            Value::Double(v) => *v as u32,
            _ => default,
        }
    }

    /// Coerces to `i64`, saturating at the type's bounds.
    #[must_use]
    pub fn as_i64(&self, default: i64) -> i64 {
        match self {
            Value::Bool(b) => i64::from(*b),
            Value::Int(v) => i64::from(*v),
            Value::UInt(v) => i64::from(*v),
            Value::Int64(v) => *v,
            Value::UInt64(v) => (*v).min(i64::MAX as u64) as i64,
            Value::Double(v) => *v as i64,
            _ => default,
        }
    }

    /// Coerces to `u64`. Negative values yield zero.
    #[must_use]
    pub fn as_u64(&self, default: u64) -> u64 {
        match self {
            Value::Bool(b) => u64::from(*b),
            Value::Int(v) => (*v).max(0) as u64,
            Value::UInt(v) => u64::from(*v),
            Value::Int64(v) => (*v).max(0) as u64,
            Value::UInt64(v) => *v,
            Value::Double(v) => *v as u64,
            _ => default,
        }
    }

    /// Coerces to `f32`.
    #[must_use]
    pub fn as_f32(&self, default: f32) -> f32 {
        match self {
            Value::Bool(b) => f32::from(u8::from(*b)),
            Value::Int(v) => *v as f32,
            Value::UInt(v) => *v as f32,
            Value::Int64(v) => *v as f32,
            Value::UInt64(v) => *v as f32,
            Value::Double(v) => *v as f32,
            _ => default,
        }
    }

    /// Coerces to `f64`.
    #[must_use]
    pub fn as_f64(&self, default: f64) -> f64 {
        match self {
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(v) => f64::from(*v),
            Value::UInt(v) => f64::from(*v),
            Value::Int64(v) => *v as f64,
            Value::UInt64(v) => *v as f64,
            Value::Double(v) => *v,
            _ => default,
        }
    }

    /// Coerces to a string slice. Bools render as `"true"`/`"false"`; other
    /// non-string kinds yield the default.
    #[must_use]
    pub fn as_str<'a>(&'a self, default: &'a str) -> &'a str {
        match self {
            Value::String(s) => s,
            Value::Bool(true) => "true",
            Value::Bool(false) => "false",
            _ => default,
        }
    }

    /// The string payload, or `None` if this is not a string.
    #[must_use]
    pub fn str_value(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Reports whether this value converts *losslessly* to the given kind —
    /// distinct from "the `as_*` call will return something", which is
    /// always true.
    #[must_use]
    pub fn is_convertible_to(&self, other: Kind) -> bool {
        use Kind::*;
        match self {
            Value::Null => true,
            Value::Bool(_) => {
                matches!(other, Bool | Int | UInt | Int64 | UInt64 | Double)
            }
            Value::Int(v) => match other {
                Bool | Int | Int64 | Double => true,
                UInt | UInt64 => *v >= 0,
                _ => false,
            },
            Value::UInt(v) => match other {
                Bool | UInt | Int64 | UInt64 | Double => true,
                Int => *v <= i32::MAX as u32,
                _ => false,
            },
            Value::Int64(v) => match other {
                Bool | Int64 | Double => true,
                Int => *v >= i64::from(i32::MIN) && *v <= i64::from(i32::MAX),
                UInt => *v >= 0 && *v <= i64::from(u32::MAX),
                UInt64 => *v >= 0,
                _ => false,
            },
            Value::UInt64(v) => match other {
                Bool | UInt64 | Double => true,
                Int => *v <= i32::MAX as u64,
                UInt => *v <= u64::from(u32::MAX),
                Int64 => *v <= i64::MAX as u64,
                _ => false,
            },
            Value::Double(v) => match other {
                Bool | Double => true,
                Int => *v >= f64::from(i32::MIN) && *v <= f64::from(i32::MAX),
                UInt => *v >= 0.0 && *v <= f64::from(u32::MAX),
                Int64 => *v >= i64::MIN as f64 && *v <= i64::MAX as f64,
                UInt64 => *v >= 0.0 && *v <= u64::MAX as f64,
                _ => false,
            },
            Value::String(_) => matches!(other, Bool | String),
            Value::Array(_) => matches!(other, Bool | Array),
            Value::Object(_) => matches!(other, Bool | Object),
        }
    }

    // --- Comparison -------------------------------------------------------

    /// Three-way comparison: by kind first, then by value. Arrays compare by
    /// length then element-wise; objects by member count then (key, value)
    /// pairs in key order. Doubles containing NaN compare as equal to
    /// anything they are not ordered against.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Ordering {
        let kinds = self.kind().cmp(&other.kind());
        if kinds != Ordering::Equal {
            return kinds;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::UInt(a), Value::UInt(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::UInt64(a), Value::UInt64(b)) => a.cmp(b),
            (Value::Double(a), Value::Double(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (Value::String(a), Value::String(b)) => a.as_ref().cmp(b.as_ref()),
            (Value::Array(a), Value::Array(b)) => {
                let lens = a.len().cmp(&b.len());
                if lens != Ordering::Equal {
                    return lens;
                }
                for (x, y) in a.iter().zip(b.iter()) {
                    let elts = x.compare(y);
                    if elts != Ordering::Equal {
                        return elts;
                    }
                }
                Ordering::Equal
            }
            (Value::Object(a), Value::Object(b)) => {
                let lens = a.len().cmp(&b.len());
                if lens != Ordering::Equal {
                    return lens;
                }
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    let keys = ka.cmp(kb);
                    if keys != Ordering::Equal {
                        return keys;
                    }
                    let values = va.compare(vb);
                    if values != Ordering::Equal {
                        return values;
                    }
                }
                Ordering::Equal
            }
            _ => unreachable!("kinds already compared equal"),
        }
    }

    // --- Array access -----------------------------------------------------

    /// Number of elements, or 0 if this is not an array.
    #[must_use]
    pub fn num_elts(&self) -> usize {
        match self {
            Value::Array(a) => a.len(),
            _ => 0,
        }
    }

    /// The `i`'th element, or the null sentinel if this is not an array or
    /// the index is out of range.
    #[must_use]
    pub fn elt(&self, index: usize) -> &Value {
        match self {
            Value::Array(a) => a.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// The elements as a slice, empty if this is not an array.
    #[must_use]
    pub fn elts(&self) -> &[Value] {
        match self {
            Value::Array(a) => a,
            _ => &EMPTY_ELTS,
        }
    }

    /// The `i`'th element for writing.
    ///
    /// Detaches the payload first if it is shared (copy-on-write), so the
    /// write is never visible through other values holding the same array.
    pub fn elt_mut(&mut self, index: usize) -> Result<&mut Value> {
        match self {
            Value::Array(a) => {
                if index >= a.len() {
                    return Err(Error::IndexOutOfRange {
                        index,
                        len: a.len(),
                    });
                }
                if Arc::get_mut(a).is_none() {
                    *a = a.iter().cloned().collect();
                }
                // Unique now, by construction above.
                Ok(&mut Arc::get_mut(a).expect("detached payload is unique")[index])
            }
            other => Err(Error::invalid_access(Kind::Array, other.kind())),
        }
    }

    /// Replaces this value with an array of `n` nulls and returns the
    /// elements for initialization.
    pub fn make_array(&mut self, n: usize) -> &mut [Value] {
        *self = Value::Array((0..n).map(|_| Value::Null).collect());
        match self {
            Value::Array(a) => Arc::get_mut(a).expect("fresh payload is unique"),
            _ => unreachable!(),
        }
    }

    /// If null, converts to an empty array. Returns `true` if this is an
    /// array afterwards.
    pub fn to_array(&mut self) -> bool {
        if self.is_null() {
            *self = Value::Array(Arc::from([]));
        }
        self.is_array()
    }

    // --- Object access ----------------------------------------------------

    /// The member for `key`, or the null sentinel if absent or this is not
    /// an object.
    #[must_use]
    pub fn member(&self, key: &str) -> &Value {
        match self {
            Value::Object(o) => o.get(key).unwrap_or(&NULL),
            _ => &NULL,
        }
    }

    /// The member for `key`, or `None` if absent or this is not an object.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(o) => o.get(key),
            _ => None,
        }
    }

    /// The member for `key` for writing, inserting a null member if absent.
    ///
    /// A null value is promoted to an object in place; any other non-object
    /// kind is an [`Error::InvalidAccess`].
    pub fn update_member(&mut self, key: &str) -> Result<&mut Value> {
        if !self.to_object() {
            return Err(Error::invalid_access(Kind::Object, self.kind()));
        }
        match self {
            Value::Object(o) => Ok(o.update(key)),
            _ => unreachable!(),
        }
    }

    /// Sets the member for `key`. Promotes a null value to an object.
    pub fn set_member(&mut self, key: &str, value: Value) -> Result<()> {
        *self.update_member(key)? = value;
        Ok(())
    }

    /// Removes the member for `key`. Returns `false` if it doesn't exist or
    /// this is not an object.
    pub fn remove_member(&mut self, key: &str) -> bool {
        match self {
            Value::Object(o) => o.remove(key),
            _ => false,
        }
    }

    /// Returns `true` if this is an object with a member named `key`.
    #[must_use]
    pub fn has_member(&self, key: &str) -> bool {
        match self {
            Value::Object(o) => o.contains_key(key),
            _ => false,
        }
    }

    /// Number of members, or 0 if this is not an object.
    #[must_use]
    pub fn num_members(&self) -> usize {
        match self {
            Value::Object(o) => o.len(),
            _ => 0,
        }
    }

    /// Name of the `i`'th member in key order.
    #[must_use]
    pub fn member_name(&self, i: usize) -> Option<&str> {
        match self {
            Value::Object(o) if i < o.len() => Some(o.name(i)),
            _ => None,
        }
    }

    /// Value of the `i`'th member in key order, or the null sentinel.
    #[must_use]
    pub fn member_value(&self, i: usize) -> &Value {
        match self {
            Value::Object(o) if i < o.len() => o.value(i),
            _ => &NULL,
        }
    }

    /// Iterates object members in key order; empty for non-objects.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.as_object().into_iter().flat_map(ValueMap::iter)
    }

    /// The member map, or `None` if this is not an object.
    #[must_use]
    pub fn as_object(&self) -> Option<&ValueMap> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The member map for writing, or `None` if this is not an object.
    pub fn as_object_mut(&mut self) -> Option<&mut ValueMap> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Replaces this value with an empty object and returns its map.
    pub fn make_object(&mut self) -> &mut ValueMap {
        *self = Value::Object(Box::default());
        match self {
            Value::Object(o) => o,
            _ => unreachable!(),
        }
    }

    /// If null, converts to an empty object. Returns `true` if this is an
    /// object afterwards.
    pub fn to_object(&mut self) -> bool {
        if self.is_null() {
            *self = Value::Object(Box::default());
        }
        self.is_object()
    }

    // --- Shared container queries -----------------------------------------

    /// String length, element count, or member count; 0 otherwise.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Value::String(s) => s.len(),
            Value::Array(a) => a.len(),
            Value::Object(o) => o.len(),
            _ => 0,
        }
    }

    /// `true` for null, an empty string, an empty array, or an empty object.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }

    /// Empties the contents while keeping the kind: strings and arrays
    /// become zero-length, objects lose all members. Scalars are unchanged.
    pub fn clear(&mut self) {
        match self {
            Value::String(s) => *s = Arc::from(""),
            Value::Array(a) => *a = Arc::from([]),
            Value::Object(o) => o.clear(),
            _ => {}
        }
    }

    /// Replaces this value with null and returns the previous contents.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    /// Exchanges two values. When both are objects the underlying maps are
    /// swapped so their modification counters advance rather than travel.
    pub fn swap(&mut self, other: &mut Value) {
        if let (Value::Object(a), Value::Object(b)) = (&mut *self, &mut *other) {
            a.swap(b);
        } else {
            std::mem::swap(self, other);
        }
    }

    // --- Merge ------------------------------------------------------------

    /// Merges `overrides` into this value.
    ///
    /// When both sides are objects, each override key is applied
    /// recursively: a null override removes the key, anything else merges
    /// into (or creates) it. Otherwise `overrides` replaces this value
    /// wholesale — unless it is null, in which case nothing changes.
    pub fn merge(&mut self, overrides: &Value) {
        if overrides.is_null() {
            return;
        }

        match (&mut *self, overrides) {
            (Value::Object(target), Value::Object(over)) => target.merge(over),
            _ => *self = overrides.clone(),
        }
    }
}

// Read-only index sugar. Returns the null sentinel on any miss, so chained
// lookups like `v["a"][2]["b"]` are always safe.

impl std::ops::Index<&str> for Value {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        self.member(key)
    }
}

impl std::ops::Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.elt(index)
    }
}

impl fmt::Display for Value {
    /// Single-line JSON rendering with the default lenient profile.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = crate::write::WriteOptions {
            indent: crate::write::Indent::SingleLine,
            ..crate::write::WriteOptions::default()
        };
        f.write_str(&crate::write::to_string_with_options(self, &options))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt64(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Double(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value.as_str()))
    }
}

impl From<Arc<str>> for Value {
    fn from(value: Arc<str>) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value.into())
    }
}

impl From<&[Value]> for Value {
    fn from(value: &[Value]) -> Self {
        Value::Array(value.iter().cloned().collect())
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Object(Box::new(value))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

// --- serde interop --------------------------------------------------------

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(v) => serializer.serialize_i32(*v),
            Value::UInt(v) => serializer.serialize_u32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::UInt64(v) => serializer.serialize_u64(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.len()))?;
                for elt in a.iter() {
                    seq.serialize_element(elt)?;
                }
                seq.end()
            }
            Value::Object(o) => {
                let mut map = serializer.serialize_map(Some(o.len()))?;
                for (k, v) in o.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid document value")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Value, E> {
                Ok(Value::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Value, E> {
                // Narrowest signed representation, mirroring the reader.
                Ok(match i32::try_from(value) {
                    Ok(v) => Value::Int(v),
                    Err(_) => Value::Int64(value),
                })
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Value, E> {
                Ok(if value <= i32::MAX as u64 {
                    Value::Int(value as i32)
                } else if value <= u64::from(u32::MAX) {
                    Value::UInt(value as u32)
                } else if value <= i64::MAX as u64 {
                    Value::Int64(value as i64)
                } else {
                    Value::UInt64(value)
                })
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Value, E> {
                Ok(Value::Double(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Value, E> {
                Ok(Value::from(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> std::result::Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut elts = Vec::new();
                while let Some(elt) = seq.next_element()? {
                    elts.push(elt);
                }
                Ok(Value::from(elts))
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut map = ValueMap::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    map.insert(&key, value);
                }
                Ok(Value::from(map))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_conversions_saturate() {
        assert_eq!(Value::Int64(1 << 40).as_i32(0), i32::MAX);
        assert_eq!(Value::Int64(-(1 << 40)).as_i32(0), i32::MIN);
        assert_eq!(Value::Int(-5).as_u32(7), 0);
        assert_eq!(Value::Double(1e300).as_i64(0), i64::MAX);
        assert_eq!(Value::Double(-3.0).as_u64(9), 0);
        assert_eq!(Value::UInt64(u64::MAX).as_i64(0), i64::MAX);
    }

    #[test]
    fn defaults_on_undefined_conversions() {
        assert_eq!(Value::Null.as_i32(17), 17);
        assert_eq!(Value::from("x").as_f64(0.5), 0.5);
        assert_eq!(Value::Null.as_str("fallback"), "fallback");
        assert_eq!(Value::Bool(true).as_str(""), "true");
    }

    #[test]
    fn bool_coercions() {
        assert!(Value::Int(3).as_bool(false));
        assert!(!Value::Int(0).as_bool(true));
        assert!(Value::from("TRUE").as_bool(false));
        assert!(!Value::from("yes").as_bool(false));
        assert!(Value::from(vec![Value::Null]).as_bool(false));
    }

    #[test]
    fn convertibility_is_value_aware() {
        assert!(Value::Int(1).is_convertible_to(Kind::UInt));
        assert!(!Value::Int(-1).is_convertible_to(Kind::UInt));
        assert!(Value::Int64(i64::from(i32::MAX)).is_convertible_to(Kind::Int));
        assert!(!Value::Int64(i64::from(i32::MAX) + 1).is_convertible_to(Kind::Int));
        assert!(Value::UInt64(u64::MAX).is_convertible_to(Kind::Double));
        assert!(!Value::UInt64(u64::MAX).is_convertible_to(Kind::Int64));
        assert!(Value::Null.is_convertible_to(Kind::Object));
        assert!(Value::from("s").is_convertible_to(Kind::Bool));
    }

    #[test]
    fn equality_is_kind_exact() {
        assert_ne!(Value::Int(0), Value::Double(0.0));
        assert_ne!(Value::Int(1), Value::Int64(1));
        assert_eq!(Value::from("a"), Value::from("a"));
    }

    #[test]
    fn compare_orders_by_kind_then_value() {
        assert_eq!(Value::Null.compare(&Value::Bool(false)), Ordering::Less);
        assert_eq!(Value::Int(2).compare(&Value::Int(1)), Ordering::Greater);
        assert_eq!(
            Value::from("a").compare(&Value::from("b")),
            Ordering::Less
        );

        let a = Value::from(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::from(vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(a.compare(&b), Ordering::Less);
        let shorter = Value::from(vec![Value::Int(9)]);
        assert_eq!(shorter.compare(&a), Ordering::Less);
    }

    #[test]
    fn member_read_misses_yield_null() {
        let v = Value::Null;
        assert!(v.member("nope").is_null());
        assert!(v["nope"][3].is_null());
        assert_eq!(v.get("nope"), None);
    }

    #[test]
    fn update_member_promotes_null() {
        let mut v = Value::Null;
        *v.update_member("a").unwrap() = Value::from(1);
        assert!(v.is_object());
        assert_eq!(v["a"].as_i32(0), 1);

        // Auto-vivified member starts as null.
        let slot = v.update_member("b").unwrap();
        assert!(slot.is_null());
    }

    #[test]
    fn update_member_rejects_scalars() {
        let mut v = Value::Int(3);
        assert_eq!(
            v.update_member("a"),
            Err(Error::invalid_access(Kind::Object, Kind::Int))
        );
    }

    #[test]
    fn shared_arrays_detach_on_write() {
        let mut a = Value::from(vec![Value::Int(1), Value::Int(2)]);
        let b = a.clone();

        *a.elt_mut(0).unwrap() = Value::Int(99);

        assert_eq!(a.elt(0).as_i32(0), 99);
        assert_eq!(b.elt(0).as_i32(0), 1); // untouched through the other handle
    }

    #[test]
    fn elt_mut_bounds() {
        let mut a = Value::from(vec![Value::Int(1)]);
        assert_eq!(
            a.elt_mut(4),
            Err(Error::IndexOutOfRange { index: 4, len: 1 })
        );
        let mut s = Value::from("str");
        assert!(s.elt_mut(0).is_err());
    }

    #[test]
    fn object_clone_is_deep() {
        let mut a = Value::Null;
        *a.update_member("k").unwrap() = Value::from(1);
        let b = a.clone();

        *a.update_member("k").unwrap() = Value::from(2);
        assert_eq!(b["k"].as_i32(0), 1);
    }

    #[test]
    fn merge_semantics() {
        let mut target = Value::Null;
        target.set_member("a", Value::from(1)).unwrap();
        target.set_member("b", Value::from(1)).unwrap();
        target.set_member("c", Value::from(1)).unwrap();

        let mut overrides = Value::Null;
        overrides.set_member("a", Value::Null).unwrap();
        overrides.set_member("b", Value::from(5)).unwrap();

        target.merge(&overrides);

        assert!(!target.has_member("a"));
        assert_eq!(target["b"].as_i32(0), 5);
        assert_eq!(target["c"].as_i32(0), 1);
    }

    #[test]
    fn merge_replaces_non_objects() {
        let mut target = Value::from(1);
        target.merge(&Value::from("s"));
        assert_eq!(target, Value::from("s"));

        let mut unchanged = Value::from(2);
        unchanged.merge(&Value::Null);
        assert_eq!(unchanged, Value::from(2));
    }

    #[test]
    fn clear_keeps_kind() {
        let mut s = Value::from("abc");
        s.clear();
        assert!(s.is_string() && s.is_empty());

        let mut o = Value::Null;
        o.set_member("a", Value::from(1)).unwrap();
        o.clear();
        assert!(o.is_object() && o.is_empty());
    }

    #[test]
    fn serde_round_trip_through_json() {
        let mut v = Value::Null;
        v.set_member("n", Value::Int(3)).unwrap();
        v.set_member("s", Value::from("hi")).unwrap();
        v.set_member("a", Value::from(vec![Value::Int(1), Value::Bool(true)]))
            .unwrap();

        let text = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v, back);
    }
}
