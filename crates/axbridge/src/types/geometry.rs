/*! Payloads of boxed-geometry values (point, size, range). */

/// Sub-tag of a boxed-geometry foreign value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
  Point,
  Size,
  Range,
}

/// Decoded contents of a boxed-geometry value.
///
/// Points and sizes carry doubles; ranges carry an integer offset and length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
  Point { x: f64, y: f64 },
  Size { width: f64, height: f64 },
  Range { location: i64, length: i64 },
}

impl Geometry {
  pub const fn kind(&self) -> GeometryKind {
    match self {
      Self::Point { .. } => GeometryKind::Point,
      Self::Size { .. } => GeometryKind::Size,
      Self::Range { .. } => GeometryKind::Range,
    }
  }
}
