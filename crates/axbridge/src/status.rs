/*!
Foreign status codes and their mapping to [`ErrorKind`].

Mapping is a pure function of the raw code. Every foreign failure is mapped
once, at the call site that observed it, and handed straight to the caller.
*/

use derive_more::Display;
use serde::Serialize;

use crate::types::{BridgeError, ErrorKind};

/// Raw accessibility status code (`AXError` on macOS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub struct AxStatus(pub i32);

#[allow(missing_docs)]
impl AxStatus {
  pub const SUCCESS: Self = Self(0);
  pub const FAILURE: Self = Self(-25200);
  pub const ILLEGAL_ARGUMENT: Self = Self(-25201);
  pub const INVALID_UI_ELEMENT: Self = Self(-25202);
  pub const INVALID_UI_ELEMENT_OBSERVER: Self = Self(-25203);
  pub const CANNOT_COMPLETE: Self = Self(-25204);
  pub const ATTRIBUTE_UNSUPPORTED: Self = Self(-25205);
  pub const ACTION_UNSUPPORTED: Self = Self(-25206);
  pub const NOTIFICATION_UNSUPPORTED: Self = Self(-25207);
  pub const NOT_IMPLEMENTED: Self = Self(-25208);
  pub const NOTIFICATION_ALREADY_REGISTERED: Self = Self(-25209);
  pub const NOTIFICATION_NOT_REGISTERED: Self = Self(-25210);
  pub const API_DISABLED: Self = Self(-25211);
  pub const NO_VALUE: Self = Self(-25212);
  pub const PARAMETERIZED_ATTRIBUTE_UNSUPPORTED: Self = Self(-25213);
  pub const NOT_ENOUGH_PRECISION: Self = Self(-25214);

  pub const fn is_success(self) -> bool {
    self.0 == Self::SUCCESS.0
  }
}

/// Map a foreign status code to its error category.
pub const fn map_status(status: AxStatus) -> ErrorKind {
  match status {
    AxStatus::ATTRIBUTE_UNSUPPORTED
    | AxStatus::ACTION_UNSUPPORTED
    | AxStatus::NOTIFICATION_UNSUPPORTED => ErrorKind::Unsupported,
    AxStatus::API_DISABLED => ErrorKind::ApiDisabled,
    AxStatus::INVALID_UI_ELEMENT => ErrorKind::InvalidReference,
    AxStatus::CANNOT_COMPLETE => ErrorKind::CannotComplete,
    AxStatus::NOT_IMPLEMENTED => ErrorKind::NotImplemented,
    _ => ErrorKind::Generic,
  }
}

/// Build the error for a failed foreign call, tagging it with `context`.
pub fn foreign_error(status: AxStatus, context: &str) -> BridgeError {
  BridgeError::Ax {
    kind: map_status(status),
    message: context.to_owned(),
    status,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unsupported_family() {
    for status in [
      AxStatus::ATTRIBUTE_UNSUPPORTED,
      AxStatus::ACTION_UNSUPPORTED,
      AxStatus::NOTIFICATION_UNSUPPORTED,
    ] {
      assert_eq!(map_status(status), ErrorKind::Unsupported, "{status}");
    }
  }

  #[test]
  fn one_to_one_codes() {
    assert_eq!(map_status(AxStatus::API_DISABLED), ErrorKind::ApiDisabled);
    assert_eq!(
      map_status(AxStatus::INVALID_UI_ELEMENT),
      ErrorKind::InvalidReference
    );
    assert_eq!(
      map_status(AxStatus::CANNOT_COMPLETE),
      ErrorKind::CannotComplete
    );
    assert_eq!(
      map_status(AxStatus::NOT_IMPLEMENTED),
      ErrorKind::NotImplemented
    );
  }

  #[test]
  fn everything_else_is_generic() {
    for status in [
      AxStatus::FAILURE,
      AxStatus::ILLEGAL_ARGUMENT,
      AxStatus::NO_VALUE,
      AxStatus::NOTIFICATION_NOT_REGISTERED,
      AxStatus::PARAMETERIZED_ATTRIBUTE_UNSUPPORTED,
      AxStatus(42),
    ] {
      assert_eq!(map_status(status), ErrorKind::Generic, "{status}");
    }
  }

  #[test]
  fn foreign_error_keeps_context_and_code() {
    let err = foreign_error(AxStatus::CANNOT_COMPLETE, "Error performing requested action");
    assert_eq!(
      err.to_string(),
      "Error performing requested action (AXError -25204)"
    );
    assert_eq!(err.kind(), Some(ErrorKind::CannotComplete));
  }
}
