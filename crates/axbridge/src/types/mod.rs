/*! Core types shared by the bridge, element handles and observer sessions. */

#![allow(missing_docs)]

mod error;
mod geometry;
mod ids;

pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use geometry::{Geometry, GeometryKind};
pub use ids::ProcessId;
