/*! Runtime type tag of a foreign value. */

use crate::types::GeometryKind;

/// What a foreign value holds, as reported by the foreign runtime.
///
/// Reading dispatches purely on this tag; writing inspects the tag of the
/// slot's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKind {
  String,
  Boolean,
  /// Numeric value. `float` is the foreign side's own float-type flag.
  Number { float: bool },
  /// Boxed point / size / range.
  Geometry(GeometryKind),
  Element,
  Array,
  /// Anything the bridge does not convert (dates, URLs, attributed strings...).
  Other,
}
