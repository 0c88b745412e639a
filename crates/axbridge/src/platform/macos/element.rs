/*!
Element-level calls on `AXUIElement`.

Every function returns the raw status on failure and a retained value on
success. A successful call that hands back a null pointer is reported as
`NO_VALUE`.
*/

#![allow(unsafe_code)]

use objc2_application_services::AXUIElement;
use objc2_core_foundation::{CFArray, CFRetained, CFString, CFType};
use std::ptr::NonNull;

use super::handles::{MacElement, MacValue};
use super::status;
use crate::status::AxStatus;
use crate::types::ProcessId;

pub(super) fn pid(element: &MacElement) -> Result<ProcessId, AxStatus> {
  let mut pid: i32 = 0;
  let result = unsafe {
    element
      .inner()
      .pid(NonNull::from(&mut pid))
  };
  status(result)?;
  Ok(ProcessId(pid))
}

fn take_array(array_ref: *const CFArray) -> Result<MacValue, AxStatus> {
  let array = NonNull::new(array_ref.cast_mut()).ok_or(AxStatus::NO_VALUE)?;
  Ok(MacValue::new(unsafe { CFRetained::from_raw(array) }))
}

pub(super) fn attribute_names(element: &MacElement) -> Result<MacValue, AxStatus> {
  let mut names: *const CFArray = std::ptr::null();
  let result = unsafe {
    element
      .inner()
      .copy_attribute_names(NonNull::from(&mut names))
  };
  status(result)?;
  take_array(names)
}

pub(super) fn action_names(element: &MacElement) -> Result<MacValue, AxStatus> {
  let mut names: *const CFArray = std::ptr::null();
  let result = unsafe {
    element
      .inner()
      .copy_action_names(NonNull::from(&mut names))
  };
  status(result)?;
  take_array(names)
}

pub(super) fn perform_action(element: &MacElement, action: &str) -> Result<(), AxStatus> {
  let action_name = CFString::from_str(action);
  status(unsafe { element.inner().perform_action(&action_name) })
}

pub(super) fn attribute_value(element: &MacElement, attribute: &str) -> Result<MacValue, AxStatus> {
  let attr = CFString::from_str(attribute);
  let mut value: *const CFType = std::ptr::null();
  let result = unsafe {
    element
      .inner()
      .copy_attribute_value(&attr, NonNull::from(&mut value))
  };
  status(result)?;
  let value = NonNull::new(value.cast_mut()).ok_or(AxStatus::NO_VALUE)?;
  Ok(MacValue(unsafe { CFRetained::from_raw(value) }))
}

pub(super) fn is_settable(element: &MacElement, attribute: &str) -> Result<bool, AxStatus> {
  let attr = CFString::from_str(attribute);
  let mut settable: u8 = 0;
  let result = unsafe {
    element
      .inner()
      .is_attribute_settable(&attr, NonNull::from(&mut settable))
  };
  status(result)?;
  Ok(settable != 0)
}

pub(super) fn set_value(
  element: &MacElement,
  attribute: &str,
  value: &MacValue,
) -> Result<(), AxStatus> {
  let attr = CFString::from_str(attribute);
  status(unsafe { element.inner().set_attribute_value(&attr, value.inner()) })
}

pub(super) fn set_timeout(element: &AXUIElement, seconds: f32) -> Result<(), AxStatus> {
  status(unsafe { element.set_messaging_timeout(seconds) })
}
