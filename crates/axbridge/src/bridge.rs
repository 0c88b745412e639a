/*!
Value conversion between foreign accessibility values and [`HostValue`]s.

Reading dispatches on the foreign value's runtime type tag. Writing never
guesses from the host value: the slot's current foreign value is inspected
once into a [`TargetShape`] and the host value is validated strictly
against it. A mismatch fails before any foreign value is allocated.
*/

use crate::a11y::{ForeignKind, HostValue};
use crate::element::ElementHandle;
use crate::platform::Platform;
use crate::types::{BridgeError, BridgeResult, Geometry, GeometryKind};

/// Required shape of a write, learned from the slot's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetShape {
  Boolean,
  String,
  Point,
  Size,
  Range,
  /// Float-typed number. Integer-typed number slots are not writable.
  FloatNumber,
}

impl TargetShape {
  /// Shape of a slot whose current foreign value has type `kind`, or `None`
  /// when writing that type is unsupported.
  pub const fn from_kind(kind: ForeignKind) -> Option<Self> {
    match kind {
      ForeignKind::Boolean => Some(Self::Boolean),
      ForeignKind::String => Some(Self::String),
      ForeignKind::Geometry(GeometryKind::Point) => Some(Self::Point),
      ForeignKind::Geometry(GeometryKind::Size) => Some(Self::Size),
      ForeignKind::Geometry(GeometryKind::Range) => Some(Self::Range),
      ForeignKind::Number { float: true } => Some(Self::FloatNumber),
      ForeignKind::Number { float: false }
      | ForeignKind::Element
      | ForeignKind::Array
      | ForeignKind::Other => None,
    }
  }

  pub fn of_existing<P: Platform>(platform: &P, existing: &P::Value) -> Option<Self> {
    Self::from_kind(platform.kind_of(existing))
  }
}

/// Convert a foreign value into a host value.
///
/// Element payloads come back retained, so the returned handle owns its
/// reference.
pub fn to_host<P: Platform>(platform: &P, value: &P::Value) -> BridgeResult<HostValue<P>> {
  match platform.kind_of(value) {
    ForeignKind::String => platform
      .string_value(value)
      .map(HostValue::Str)
      .ok_or_else(|| BridgeError::unsupported("Error converting string attribute")),
    ForeignKind::Boolean => platform
      .bool_value(value)
      .map(HostValue::Bool)
      .ok_or_else(|| BridgeError::unsupported("Error converting boolean attribute")),
    ForeignKind::Geometry(_) => platform
      .geometry_value(value)
      .map(HostValue::from)
      .ok_or_else(|| BridgeError::unsupported("Error converting geometry attribute")),
    ForeignKind::Number { .. } => {
      if let Some(n) = platform.int_value(value) {
        Ok(HostValue::Int(n))
      } else if let Some(n) = platform.float_value(value) {
        Ok(HostValue::Float(n))
      } else {
        Err(BridgeError::unsupported("Error converting numeric attribute"))
      }
    }
    ForeignKind::Element => platform
      .element_value(value)
      .map(|element| HostValue::Element(ElementHandle::from_retained(platform.clone(), element)))
      .ok_or_else(|| BridgeError::unsupported("Error converting element attribute")),
    ForeignKind::Array => {
      let items = platform
        .array_items(value)
        .ok_or_else(|| BridgeError::unsupported("Error converting array attribute"))?;
      let mut out = Vec::with_capacity(items.len());
      for item in &items {
        match platform.kind_of(item) {
          ForeignKind::String | ForeignKind::Element => match to_host(platform, item) {
            Ok(converted) => out.push(converted),
            Err(e) => log::debug!("skipping array item that failed to convert: {e}"),
          },
          kind => log::trace!("skipping array item of kind {kind:?}"),
        }
      }
      Ok(HostValue::List(out))
    }
    ForeignKind::Other => Err(BridgeError::unsupported("Return value not supported yet.")),
  }
}

/// Convert `value` for writing into a slot whose current value is `existing`.
pub fn to_foreign<P: Platform>(
  platform: &P,
  value: &HostValue<P>,
  existing: &P::Value,
) -> BridgeResult<P::Value> {
  let shape = TargetShape::of_existing(platform, existing)
    .ok_or_else(|| BridgeError::unsupported("Setting this attribute is not supported yet."))?;
  encode(platform, shape, value)
}

/// Build a foreign value of exactly `shape` from `value`.
pub fn encode<P: Platform>(
  platform: &P,
  shape: TargetShape,
  value: &HostValue<P>,
) -> BridgeResult<P::Value> {
  match shape {
    TargetShape::Boolean => value
      .as_bool()
      .map(|b| platform.new_bool(b))
      .ok_or_else(|| mismatch("a bool", value)),
    TargetShape::String => value
      .as_str()
      .map(|s| platform.new_string(s))
      .ok_or_else(|| mismatch("a string", value)),
    TargetShape::Point => {
      let (x, y) = float_pair(value).ok_or_else(|| mismatch("a pair of numbers", value))?;
      new_geometry(platform, Geometry::Point { x, y })
    }
    TargetShape::Size => {
      let (width, height) = float_pair(value).ok_or_else(|| mismatch("a pair of numbers", value))?;
      new_geometry(platform, Geometry::Size { width, height })
    }
    TargetShape::Range => {
      let (location, length) =
        int_pair(value).ok_or_else(|| mismatch("a pair of integers", value))?;
      new_geometry(platform, Geometry::Range { location, length })
    }
    TargetShape::FloatNumber => value
      .as_f64()
      .map(|n| platform.new_float(n))
      .ok_or_else(|| BridgeError::unsupported("Error writing supplied value to number type")),
  }
}

fn new_geometry<P: Platform>(platform: &P, geometry: Geometry) -> BridgeResult<P::Value> {
  platform
    .new_geometry(geometry)
    .ok_or_else(|| BridgeError::unsupported("Error creating geometry value"))
}

fn mismatch<P: Platform>(expected: &str, value: &HostValue<P>) -> BridgeError {
  BridgeError::Unsupported(format!(
    "Error converting values: expected {expected}, got {}",
    value.type_name()
  ))
}

fn pair<P: Platform>(value: &HostValue<P>) -> Option<(&HostValue<P>, &HostValue<P>)> {
  match value.as_sequence()? {
    [a, b] => Some((a, b)),
    _ => None,
  }
}

fn float_pair<P: Platform>(value: &HostValue<P>) -> Option<(f64, f64)> {
  let (a, b) = pair(value)?;
  Some((a.as_f64()?, b.as_f64()?))
}

fn int_pair<P: Platform>(value: &HostValue<P>) -> Option<(i64, i64)> {
  let (a, b) = pair(value)?;
  Some((a.as_i64()?, b.as_i64()?))
}
