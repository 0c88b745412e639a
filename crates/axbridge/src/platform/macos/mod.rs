/*!
macOS platform implementation.

Implements [`Platform`] on top of `AXUIElement`, `AXValue` and
`AXObserver`. All CoreFoundation code stays within this module.
*/

mod element;
mod handles;
mod observer;
mod util;
mod values;

pub use handles::{MacElement, MacObserver, MacValue};

use objc2_application_services::AXError;
use objc2_core_foundation::{CFNumber, CFString};
use std::sync::Arc;
use std::time::Duration;

use crate::a11y::ForeignKind;
use crate::observation::EventSlot;
use crate::platform::traits::{Platform, RunLoopExit};
use crate::status::AxStatus;
use crate::types::{Geometry, ProcessId};

/// Turn an `AXError` into a result.
pub(super) fn status(result: AXError) -> Result<(), AxStatus> {
  if result == AXError::Success {
    Ok(())
  } else {
    Err(AxStatus(result.0))
  }
}

/// macOS accessibility API.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacPlatform;

impl Platform for MacPlatform {
  type Element = MacElement;
  type Value = MacValue;
  type Observer = MacObserver;

  fn api_enabled(&self) -> bool {
    util::has_permissions()
  }

  fn frontmost_pid(&self) -> Option<ProcessId> {
    util::frontmost_pid()
  }

  fn system_wide_element(&self) -> Option<MacElement> {
    Some(MacElement(util::system_wide_element()))
  }

  fn application_element(&self, pid: ProcessId) -> Option<MacElement> {
    Some(MacElement(util::app_element(pid)))
  }

  fn elements_equal(&self, a: &MacElement, b: &MacElement) -> bool {
    a.cf_equal(b)
  }

  fn element_pid(&self, el: &MacElement) -> Result<ProcessId, AxStatus> {
    element::pid(el)
  }

  fn copy_attribute_names(&self, el: &MacElement) -> Result<MacValue, AxStatus> {
    element::attribute_names(el)
  }

  fn copy_action_names(&self, el: &MacElement) -> Result<MacValue, AxStatus> {
    element::action_names(el)
  }

  fn perform_action(&self, el: &MacElement, action: &str) -> Result<(), AxStatus> {
    element::perform_action(el, action)
  }

  fn copy_attribute_value(&self, el: &MacElement, attribute: &str) -> Result<MacValue, AxStatus> {
    element::attribute_value(el, attribute)
  }

  fn is_attribute_settable(&self, el: &MacElement, attribute: &str) -> Result<bool, AxStatus> {
    element::is_settable(el, attribute)
  }

  fn set_attribute_value(
    &self,
    el: &MacElement,
    attribute: &str,
    value: &MacValue,
  ) -> Result<(), AxStatus> {
    element::set_value(el, attribute, value)
  }

  fn set_messaging_timeout(&self, el: &MacElement, seconds: f32) -> Result<(), AxStatus> {
    element::set_timeout(el.inner(), seconds)
  }

  fn kind_of(&self, value: &MacValue) -> ForeignKind {
    values::kind_of(value.inner())
  }

  fn string_value(&self, value: &MacValue) -> Option<String> {
    values::string(value.inner())
  }

  fn bool_value(&self, value: &MacValue) -> Option<bool> {
    values::boolean(value.inner())
  }

  fn int_value(&self, value: &MacValue) -> Option<i64> {
    values::int(value.inner())
  }

  fn float_value(&self, value: &MacValue) -> Option<f64> {
    values::float(value.inner())
  }

  fn geometry_value(&self, value: &MacValue) -> Option<Geometry> {
    values::geometry(value.inner())
  }

  fn element_value(&self, value: &MacValue) -> Option<MacElement> {
    values::element(value)
  }

  fn array_items(&self, value: &MacValue) -> Option<Vec<MacValue>> {
    values::array_items(value)
  }

  fn new_string(&self, s: &str) -> MacValue {
    MacValue::new(CFString::from_str(s))
  }

  fn new_bool(&self, b: bool) -> MacValue {
    values::new_bool(b)
  }

  fn new_float(&self, n: f64) -> MacValue {
    MacValue::new(CFNumber::new_f64(n))
  }

  fn new_geometry(&self, geometry: Geometry) -> Option<MacValue> {
    values::new_geometry(geometry)
  }

  fn create_observer(&self, pid: ProcessId) -> Result<MacObserver, AxStatus> {
    observer::create_observer(pid)
  }

  fn add_notification(
    &self,
    obs: &mut MacObserver,
    el: &MacElement,
    notification: &MacValue,
    sink: Arc<EventSlot<MacElement>>,
  ) -> Result<(), AxStatus> {
    observer::add_notification(obs, el, notification, sink)
  }

  fn remove_notification(
    &self,
    obs: &mut MacObserver,
    el: &MacElement,
    notification: &MacValue,
  ) -> Result<(), AxStatus> {
    observer::remove_notification(obs, el, notification)
  }

  fn attach_observer(&self, obs: &MacObserver) {
    observer::attach(obs);
  }

  fn observer_attached(&self, obs: &MacObserver) -> bool {
    observer::is_attached(obs)
  }

  fn detach_observer(&self, obs: &MacObserver) {
    observer::detach(obs);
  }

  fn run_loop(&self, timeout: Duration) -> RunLoopExit {
    observer::run_loop(timeout)
  }
}
