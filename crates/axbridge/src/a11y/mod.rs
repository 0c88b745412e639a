//! Accessibility value model shared by the bridge and the host boundary.

mod kind;
mod value;

pub use kind::ForeignKind;
pub use value::HostValue;
