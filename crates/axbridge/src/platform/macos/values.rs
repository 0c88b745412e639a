/*!
Decoding and encoding of CF values.
*/

#![allow(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]

use objc2_application_services::{AXUIElement, AXValue as AXValueRef, AXValueType};
use objc2_core_foundation::{
  CFArray, CFBoolean, CFIndex, CFNumber, CFRange, CFRetained, CFString, CFType, CGPoint, CGSize,
};
use std::ffi::c_void;
use std::ptr::NonNull;

use super::handles::{MacElement, MacValue};
use crate::a11y::ForeignKind;
use crate::types::{Geometry, GeometryKind};

fn geometry_kind(value: &AXValueRef) -> Option<GeometryKind> {
  let value_type = unsafe { value.r#type() };
  if value_type == AXValueType::CGPoint {
    Some(GeometryKind::Point)
  } else if value_type == AXValueType::CGSize {
    Some(GeometryKind::Size)
  } else if value_type == AXValueType::CFRange {
    Some(GeometryKind::Range)
  } else {
    None
  }
}

pub(super) fn kind_of(value: &CFType) -> ForeignKind {
  if value.downcast_ref::<CFString>().is_some() {
    ForeignKind::String
  } else if value.downcast_ref::<CFBoolean>().is_some() {
    ForeignKind::Boolean
  } else if let Some(number) = value.downcast_ref::<CFNumber>() {
    ForeignKind::Number {
      float: unsafe { number.is_float_type() },
    }
  } else if let Some(boxed) = value.downcast_ref::<AXValueRef>() {
    geometry_kind(boxed).map_or(ForeignKind::Other, ForeignKind::Geometry)
  } else if value.downcast_ref::<AXUIElement>().is_some() {
    ForeignKind::Element
  } else if value.downcast_ref::<CFArray>().is_some() {
    ForeignKind::Array
  } else {
    ForeignKind::Other
  }
}

pub(super) fn string(value: &CFType) -> Option<String> {
  value.downcast_ref::<CFString>().map(ToString::to_string)
}

pub(super) fn boolean(value: &CFType) -> Option<bool> {
  value.downcast_ref::<CFBoolean>().map(CFBoolean::as_bool)
}

pub(super) fn int(value: &CFType) -> Option<i64> {
  value.downcast_ref::<CFNumber>()?.as_i64()
}

pub(super) fn float(value: &CFType) -> Option<f64> {
  value.downcast_ref::<CFNumber>()?.as_f64()
}

pub(super) fn geometry(value: &CFType) -> Option<Geometry> {
  let boxed = value.downcast_ref::<AXValueRef>()?;
  unsafe {
    match geometry_kind(boxed)? {
      GeometryKind::Point => {
        let mut point = CGPoint { x: 0.0, y: 0.0 };
        boxed
          .value(AXValueType::CGPoint, NonNull::from(&mut point).cast::<c_void>())
          .then_some(Geometry::Point {
            x: point.x,
            y: point.y,
          })
      }
      GeometryKind::Size => {
        let mut size = CGSize {
          width: 0.0,
          height: 0.0,
        };
        boxed
          .value(AXValueType::CGSize, NonNull::from(&mut size).cast::<c_void>())
          .then_some(Geometry::Size {
            width: size.width,
            height: size.height,
          })
      }
      GeometryKind::Range => {
        let mut range = CFRange {
          location: 0,
          length: 0,
        };
        boxed
          .value(AXValueType::CFRange, NonNull::from(&mut range).cast::<c_void>())
          .then_some(Geometry::Range {
            location: range.location as i64,
            length: range.length as i64,
          })
      }
    }
  }
}

pub(super) fn element(value: &MacValue) -> Option<MacElement> {
  value.0.clone().downcast::<AXUIElement>().ok().map(MacElement)
}

pub(super) fn array_items(value: &MacValue) -> Option<Vec<MacValue>> {
  let array = value.0.clone().downcast::<CFArray>().ok()?;
  // SAFETY: every CFArray element is a CFType.
  let typed: CFRetained<CFArray<CFType>> = unsafe { CFRetained::cast_unchecked(array) };
  Some((0..typed.len()).filter_map(|i| typed.get(i)).map(MacValue).collect())
}

pub(super) fn new_bool(b: bool) -> MacValue {
  let value: &CFBoolean = CFBoolean::new(b);
  MacValue::new(unsafe { CFRetained::retain(NonNull::from(value)) })
}

pub(super) fn new_geometry(geometry: Geometry) -> Option<MacValue> {
  let boxed = unsafe {
    match geometry {
      Geometry::Point { x, y } => {
        let point = CGPoint { x, y };
        AXValueRef::new(AXValueType::CGPoint, NonNull::from(&point).cast::<c_void>())
      }
      Geometry::Size { width, height } => {
        let size = CGSize { width, height };
        AXValueRef::new(AXValueType::CGSize, NonNull::from(&size).cast::<c_void>())
      }
      Geometry::Range { location, length } => {
        let range = CFRange {
          location: location as CFIndex,
          length: length as CFIndex,
        };
        AXValueRef::new(AXValueType::CFRange, NonNull::from(&range).cast::<c_void>())
      }
    }
  };
  boxed.map(MacValue::new)
}
