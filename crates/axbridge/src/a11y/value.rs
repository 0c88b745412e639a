/*!
Host-side dynamic values.

`HostValue` is what the bridge produces when reading a foreign attribute and
what it accepts when writing one. A host runtime marshals it into its own
object model (see [`crate::host::HostRuntime::to_object`]).

Shape by foreign type:
- string → `Str`, boolean → `Bool`
- number → `Int` when it converts exactly, otherwise `Float`
- point / size → `Tuple` of two `Float`s, range → `Tuple` of two `Int`s
- element → `Element` (a freshly owned handle)
- array → `List` of the string and element entries
*/

#![allow(missing_docs)]
#![allow(clippy::cast_precision_loss)]

use std::fmt;

use serde::{Serialize, Serializer};

use crate::element::ElementHandle;
use crate::platform::Platform;
use crate::types::Geometry;

/// Dynamic value exchanged with the host runtime.
pub enum HostValue<P: Platform> {
  /// "No value": a foreign attribute that exists but is empty.
  None,
  Bool(bool),
  Int(i64),
  Float(f64),
  Str(String),
  Tuple(Vec<HostValue<P>>),
  List(Vec<HostValue<P>>),
  Element(ElementHandle<P>),
}

impl<P: Platform> HostValue<P> {
  /// Truthiness with the usual dynamic-language rules: empty, zero and
  /// `None` are false, everything else is true.
  pub fn is_truthy(&self) -> bool {
    match self {
      Self::None => false,
      Self::Bool(b) => *b,
      Self::Int(n) => *n != 0,
      Self::Float(n) => *n != 0.0,
      Self::Str(s) => !s.is_empty(),
      Self::Tuple(items) | Self::List(items) => !items.is_empty(),
      Self::Element(_) => true,
    }
  }

  pub const fn is_none(&self) -> bool {
    matches!(self, Self::None)
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Str(s) => Some(s),
      _ => None,
    }
  }

  pub const fn as_bool(&self) -> Option<bool> {
    match self {
      Self::Bool(b) => Some(*b),
      _ => None,
    }
  }

  pub const fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Int(n) => Some(*n),
      _ => None,
    }
  }

  /// Numeric value as a double. Integers widen; booleans are not numbers here.
  pub const fn as_f64(&self) -> Option<f64> {
    match self {
      Self::Int(n) => Some(*n as f64),
      Self::Float(n) => Some(*n),
      _ => None,
    }
  }

  /// Items of a tuple or list.
  pub fn as_sequence(&self) -> Option<&[HostValue<P>]> {
    match self {
      Self::Tuple(items) | Self::List(items) => Some(items),
      _ => None,
    }
  }

  pub const fn as_element(&self) -> Option<&ElementHandle<P>> {
    match self {
      Self::Element(handle) => Some(handle),
      _ => None,
    }
  }

  pub fn into_element(self) -> Option<ElementHandle<P>> {
    match self {
      Self::Element(handle) => Some(handle),
      _ => None,
    }
  }

  /// Owned strings of a sequence, skipping anything that is not a string.
  pub fn into_strings(self) -> Vec<String> {
    match self {
      Self::Tuple(items) | Self::List(items) => items
        .into_iter()
        .filter_map(|item| match item {
          Self::Str(s) => Some(s),
          _ => None,
        })
        .collect(),
      Self::Str(s) => vec![s],
      _ => Vec::new(),
    }
  }

  /// Short name of the variant, for error messages.
  pub const fn type_name(&self) -> &'static str {
    match self {
      Self::None => "none",
      Self::Bool(_) => "bool",
      Self::Int(_) => "int",
      Self::Float(_) => "float",
      Self::Str(_) => "str",
      Self::Tuple(_) => "tuple",
      Self::List(_) => "list",
      Self::Element(_) => "element",
    }
  }
}

impl<P: Platform> Clone for HostValue<P> {
  fn clone(&self) -> Self {
    match self {
      Self::None => Self::None,
      Self::Bool(b) => Self::Bool(*b),
      Self::Int(n) => Self::Int(*n),
      Self::Float(n) => Self::Float(*n),
      Self::Str(s) => Self::Str(s.clone()),
      Self::Tuple(items) => Self::Tuple(items.clone()),
      Self::List(items) => Self::List(items.clone()),
      Self::Element(handle) => Self::Element(handle.clone()),
    }
  }
}

impl<P: Platform> PartialEq for HostValue<P> {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Self::None, Self::None) => true,
      (Self::Bool(a), Self::Bool(b)) => a == b,
      (Self::Int(a), Self::Int(b)) => a == b,
      (Self::Float(a), Self::Float(b)) => a == b,
      (Self::Str(a), Self::Str(b)) => a == b,
      (Self::Tuple(a), Self::Tuple(b)) | (Self::List(a), Self::List(b)) => a == b,
      (Self::Element(a), Self::Element(b)) => a == b,
      _ => false,
    }
  }
}

impl<P: Platform> fmt::Debug for HostValue<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::None => f.write_str("None"),
      Self::Bool(b) => write!(f, "Bool({b})"),
      Self::Int(n) => write!(f, "Int({n})"),
      Self::Float(n) => write!(f, "Float({n})"),
      Self::Str(s) => write!(f, "Str({s:?})"),
      Self::Tuple(items) => f.debug_tuple("Tuple").field(items).finish(),
      Self::List(items) => f.debug_tuple("List").field(items).finish(),
      Self::Element(handle) => f.debug_tuple("Element").field(handle).finish(),
    }
  }
}

/// Plain JSON-like shape: `None` is null, tuples and lists are sequences,
/// elements are `{"pid": ...}`.
impl<P: Platform> Serialize for HostValue<P> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::None => serializer.serialize_none(),
      Self::Bool(b) => serializer.serialize_bool(*b),
      Self::Int(n) => serializer.serialize_i64(*n),
      Self::Float(n) => serializer.serialize_f64(*n),
      Self::Str(s) => serializer.serialize_str(s),
      Self::Tuple(items) | Self::List(items) => serializer.collect_seq(items),
      Self::Element(handle) => handle.serialize(serializer),
    }
  }
}

impl<P: Platform> From<bool> for HostValue<P> {
  fn from(b: bool) -> Self {
    Self::Bool(b)
  }
}

impl<P: Platform> From<i64> for HostValue<P> {
  fn from(n: i64) -> Self {
    Self::Int(n)
  }
}

impl<P: Platform> From<i32> for HostValue<P> {
  fn from(n: i32) -> Self {
    Self::Int(i64::from(n))
  }
}

impl<P: Platform> From<f64> for HostValue<P> {
  fn from(n: f64) -> Self {
    Self::Float(n)
  }
}

impl<P: Platform> From<&str> for HostValue<P> {
  fn from(s: &str) -> Self {
    Self::Str(s.to_owned())
  }
}

impl<P: Platform> From<String> for HostValue<P> {
  fn from(s: String) -> Self {
    Self::Str(s)
  }
}

impl<P: Platform> From<ElementHandle<P>> for HostValue<P> {
  fn from(handle: ElementHandle<P>) -> Self {
    Self::Element(handle)
  }
}

impl<P: Platform> From<(f64, f64)> for HostValue<P> {
  fn from((a, b): (f64, f64)) -> Self {
    Self::Tuple(vec![Self::Float(a), Self::Float(b)])
  }
}

impl<P: Platform> From<(i64, i64)> for HostValue<P> {
  fn from((a, b): (i64, i64)) -> Self {
    Self::Tuple(vec![Self::Int(a), Self::Int(b)])
  }
}

impl<P: Platform> From<Geometry> for HostValue<P> {
  fn from(geometry: Geometry) -> Self {
    match geometry {
      Geometry::Point { x, y } => (x, y).into(),
      Geometry::Size { width, height } => (width, height).into(),
      Geometry::Range { location, length } => (location, length).into(),
    }
  }
}
