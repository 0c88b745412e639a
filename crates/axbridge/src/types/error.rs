/*! Error types for bridge operations. */

use crate::status::AxStatus;

/// Error category derived from a foreign accessibility status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
  /// Attribute, action or notification not implemented by the target.
  Unsupported,
  /// Accessibility permission not granted at the OS level.
  ApiDisabled,
  /// The foreign object no longer exists.
  InvalidReference,
  /// Transient foreign-side failure. Callers decide whether to retry.
  CannotComplete,
  /// The target does not implement the accessibility API at all.
  NotImplemented,
  /// Anything not specifically mapped.
  Generic,
}

/// Errors that can occur while talking to the accessibility API.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
  /// A foreign call failed with a status code.
  #[error("{message} (AXError {status})")]
  Ax {
    kind: ErrorKind,
    message: String,
    status: AxStatus,
  },

  /// A value could not be converted in either direction, or the target
  /// refuses the operation outright.
  #[error("{0}")]
  Unsupported(String),

  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  /// Operation on a handle that wraps no foreign reference.
  #[error("Not a valid accessibility object")]
  Unbound,

  /// The blocking wait was interrupted.
  #[error("Keyboard interrupted run loop")]
  Cancelled,

  /// The host callback raised or returned something that is not a boolean.
  #[error("Callback failed: {0}")]
  CallbackFailure(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("Platform error: {0}")]
  Platform(String),
}

impl BridgeError {
  /// Foreign-status category, when the error has one.
  pub const fn kind(&self) -> Option<ErrorKind> {
    match self {
      Self::Ax { kind, .. } => Some(*kind),
      Self::Unsupported(_) => Some(ErrorKind::Unsupported),
      Self::Unbound => Some(ErrorKind::InvalidReference),
      Self::InvalidArgument(_) | Self::Cancelled | Self::CallbackFailure(_) | Self::Platform(_) => {
        None
      }
    }
  }

  /// Raw status code, when the error came from a foreign call.
  pub const fn status(&self) -> Option<AxStatus> {
    match self {
      Self::Ax { status, .. } => Some(*status),
      Self::Unsupported(_)
      | Self::InvalidArgument(_)
      | Self::Unbound
      | Self::Cancelled
      | Self::CallbackFailure(_)
      | Self::Platform(_) => None,
    }
  }

  pub const fn is_cancelled(&self) -> bool {
    matches!(self, Self::Cancelled)
  }

  pub(crate) fn unsupported(message: impl Into<String>) -> Self {
    Self::Unsupported(message.into())
  }

  pub(crate) fn callback<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::CallbackFailure(Box::new(err))
  }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ax_error_message_embeds_status() {
    let err = BridgeError::Ax {
      kind: ErrorKind::Generic,
      message: "Error retrieving attribute".into(),
      status: AxStatus(-25200),
    };
    assert_eq!(err.to_string(), "Error retrieving attribute (AXError -25200)");
    assert_eq!(err.kind(), Some(ErrorKind::Generic));
    assert_eq!(err.status(), Some(AxStatus(-25200)));
  }

  #[test]
  fn host_side_errors_have_no_kind() {
    assert_eq!(BridgeError::Cancelled.kind(), None);
    assert_eq!(BridgeError::InvalidArgument("x".into()).kind(), None);
    assert_eq!(BridgeError::Unbound.kind(), Some(ErrorKind::InvalidReference));
    assert_eq!(
      BridgeError::unsupported("nope").kind(),
      Some(ErrorKind::Unsupported)
    );
  }
}
