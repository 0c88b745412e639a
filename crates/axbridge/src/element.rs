/*!
Owned handle to a foreign UI element.

An [`ElementHandle`] owns exactly one retained foreign reference, or none
(an unbound handle). Dropping it releases the reference once. Handles are
only built by functions that receive an already-retained reference.
*/

use std::fmt;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::a11y::HostValue;
use crate::bridge;
use crate::config::WaitConfig;
use crate::host::HostRuntime;
use crate::observation::{self, WaitOutcome, WaitRequest};
use crate::platform::Platform;
use crate::status::{foreign_error, AxStatus};
use crate::types::{BridgeError, BridgeResult, ProcessId};

/// Whether the accessibility API is enabled for this process.
pub fn api_enabled<P: Platform>(platform: &P) -> bool {
  platform.api_enabled()
}

/// PID of the frontmost application.
pub fn frontmost_pid<P: Platform>(platform: &P) -> BridgeResult<ProcessId> {
  platform
    .frontmost_pid()
    .ok_or_else(|| BridgeError::unsupported("No frontmost application"))
}

/// Owned reference to a foreign UI element.
pub struct ElementHandle<P: Platform> {
  platform: P,
  inner: Option<P::Element>,
}

impl<P: Platform> ElementHandle<P> {
  /// Handle to the system-wide element.
  pub fn system_wide(platform: &P) -> BridgeResult<Self> {
    let element = platform
      .system_wide_element()
      .ok_or_else(|| BridgeError::unsupported("Error getting a11y object"))?;
    Ok(Self::from_retained(platform.clone(), element))
  }

  /// Handle to the application element of `pid`.
  pub fn application(platform: &P, pid: ProcessId) -> BridgeResult<Self> {
    let element = platform
      .application_element(pid)
      .ok_or_else(|| BridgeError::unsupported("Error getting app ref"))?;
    Ok(Self::from_retained(platform.clone(), element))
  }

  /// Handle that wraps no foreign reference.
  pub fn unbound(platform: &P) -> Self {
    Self {
      platform: platform.clone(),
      inner: None,
    }
  }

  /// Take ownership of an already-retained reference.
  pub(crate) fn from_retained(platform: P, element: P::Element) -> Self {
    Self {
      platform,
      inner: Some(element),
    }
  }

  pub const fn is_bound(&self) -> bool {
    self.inner.is_some()
  }

  pub const fn platform(&self) -> &P {
    &self.platform
  }

  fn raw(&self) -> BridgeResult<&P::Element> {
    self.inner.as_ref().ok_or(BridgeError::Unbound)
  }

  pub fn pid(&self) -> BridgeResult<ProcessId> {
    self
      .platform
      .element_pid(self.raw()?)
      .map_err(|status| foreign_error(status, "Error retrieving PID"))
  }

  pub fn attribute_names(&self) -> BridgeResult<Vec<String>> {
    let names = self
      .platform
      .copy_attribute_names(self.raw()?)
      .map_err(|status| foreign_error(status, "Error retrieving attribute list"))?;
    Ok(self.strings(&names))
  }

  pub fn action_names(&self) -> BridgeResult<Vec<String>> {
    let names = self
      .platform
      .copy_action_names(self.raw()?)
      .map_err(|status| foreign_error(status, "Error retrieving action names"))?;
    Ok(self.strings(&names))
  }

  pub fn perform_action(&self, action: &str) -> BridgeResult<()> {
    self
      .platform
      .perform_action(self.raw()?, action)
      .map_err(|status| foreign_error(status, "Error performing requested action"))
  }

  /// Read an attribute. An attribute with no value reads as
  /// [`HostValue::None`].
  pub fn attribute(&self, name: &str) -> BridgeResult<HostValue<P>> {
    match self.platform.copy_attribute_value(self.raw()?, name) {
      Ok(value) => bridge::to_host(&self.platform, &value),
      Err(AxStatus::NO_VALUE) => Ok(HostValue::None),
      Err(status @ AxStatus::NOT_IMPLEMENTED) => {
        Err(foreign_error(status, "Attribute not implemented"))
      }
      Err(status) => Err(foreign_error(status, "Error retrieving attribute")),
    }
  }

  /// Write an attribute, converting `value` to the type the attribute
  /// currently holds.
  ///
  /// Checked in order: the attribute exists, it is settable, the value
  /// converts, the foreign write succeeds.
  pub fn set_attribute(&self, name: &str, value: &HostValue<P>) -> BridgeResult<()> {
    let element = self.raw()?;
    let existing = self
      .platform
      .copy_attribute_value(element, name)
      .map_err(|status| foreign_error(status, "Error retrieving attribute to set"))?;

    let settable = self
      .platform
      .is_attribute_settable(element, name)
      .map_err(|status| foreign_error(status, "Error querying attribute"))?;
    if !settable {
      return Err(BridgeError::unsupported("Attribute is not settable"));
    }

    let foreign = bridge::to_foreign(&self.platform, value, &existing)?;
    self
      .platform
      .set_attribute_value(element, name, &foreign)
      .map_err(|status| match status {
        AxStatus::ILLEGAL_ARGUMENT => foreign_error(status, "Invalid value for element attribute"),
        _ => foreign_error(status, "Error setting attribute value"),
      })
  }

  /// Write `text` as a string value without probing the attribute's type or
  /// settability. For write-only fields such as secure text entry.
  pub fn set_attribute_as_string(&self, name: &str, text: &str) -> BridgeResult<()> {
    let element = self.raw()?;
    let value = self.platform.new_string(text);
    self
      .platform
      .set_attribute_value(element, name, &value)
      .map_err(|status| foreign_error(status, "Error setting attribute to string"))
  }

  /// Timeout for messages sent to this element. Zero restores the global
  /// default.
  pub fn set_messaging_timeout(&self, seconds: f32) -> BridgeResult<()> {
    let element = self.inner.as_ref().ok_or_else(|| {
      BridgeError::unsupported("Operation not supported on null element references")
    })?;
    self
      .platform
      .set_messaging_timeout(element, seconds)
      .map_err(|status| match status {
        AxStatus::ILLEGAL_ARGUMENT => BridgeError::InvalidArgument(
          "Accessibility timeout values must be non-negative".into(),
        ),
        AxStatus::INVALID_UI_ELEMENT => foreign_error(status, "The element reference is invalid"),
        _ => foreign_error(status, "Error setting messaging timeout"),
      })
  }

  /// Block until `request.notification` fires on this element and is
  /// accepted, or the timeout elapses.
  ///
  /// Borrowing the handle mutably keeps one wait per handle at a time.
  pub fn wait_for<H>(
    &mut self,
    host: &mut H,
    request: WaitRequest<H::Object, H::Callable>,
    config: &WaitConfig,
  ) -> BridgeResult<WaitOutcome<H::Object>>
  where
    H: HostRuntime<P>,
  {
    let element = self.raw()?;
    observation::run(&self.platform, element, host, request, config)
  }

  fn strings(&self, array: &P::Value) -> Vec<String> {
    self
      .platform
      .array_items(array)
      .unwrap_or_default()
      .iter()
      .filter_map(|item| self.platform.string_value(item))
      .collect()
  }
}

impl<P: Platform> Clone for ElementHandle<P> {
  fn clone(&self) -> Self {
    Self {
      platform: self.platform.clone(),
      inner: self.inner.clone(),
    }
  }
}

impl<P: Platform> PartialEq for ElementHandle<P> {
  fn eq(&self, other: &Self) -> bool {
    match (&self.inner, &other.inner) {
      (None, None) => true,
      (Some(a), Some(b)) => self.platform.elements_equal(a, b),
      _ => false,
    }
  }
}

/// Serialized as `{"pid": ...}`; `pid` is null for unbound or dead elements.
impl<P: Platform> Serialize for ElementHandle<P> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut state = serializer.serialize_struct("ElementHandle", 1)?;
    state.serialize_field("pid", &self.pid().ok())?;
    state.end()
  }
}

impl<P: Platform> fmt::Debug for ElementHandle<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.inner.is_none() {
      return f.write_str("ElementHandle(null)");
    }
    match self.pid() {
      Ok(pid) => write!(f, "ElementHandle(pid {pid})"),
      Err(_) => f.write_str("ElementHandle(?)"),
    }
  }
}
