/*!
Platform abstraction traits.

These traits define the contract between the bridge and the foreign
accessibility API. Core code only uses these traits, never platform-specific
types directly.

Ownership rules:
- `Element`, `Value` and `Observer` are owned references. `Clone` retains,
  `Drop` releases. No operation hands out a borrowed foreign pointer.
- Failing calls return the raw [`AxStatus`]; callers map it exactly once.
*/

use std::sync::Arc;
use std::time::Duration;

use crate::a11y::ForeignKind;
use crate::observation::EventSlot;
use crate::status::AxStatus;
use crate::types::{Geometry, ProcessId};

/// Why a bounded run of the native event loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLoopExit {
  /// The loop had no sources left to wait on.
  Finished,
  /// Something called stop on the loop (normally the observer callback).
  Stopped,
  TimedOut,
  HandledSource,
}

/// Foreign accessibility API consumed by the bridge and observer sessions.
pub trait Platform: Clone + 'static {
  /// Retained element reference.
  type Element: Clone;
  /// Retained foreign value of any type.
  type Value;
  /// Retained observer bound to one process.
  type Observer;

  // Process level

  /// Whether the accessibility API is enabled for this process.
  fn api_enabled(&self) -> bool;

  /// PID of the frontmost application, if there is one.
  fn frontmost_pid(&self) -> Option<ProcessId>;

  fn system_wide_element(&self) -> Option<Self::Element>;

  fn application_element(&self, pid: ProcessId) -> Option<Self::Element>;

  // Element

  /// Foreign-side equality of two element references.
  fn elements_equal(&self, a: &Self::Element, b: &Self::Element) -> bool;

  fn element_pid(&self, element: &Self::Element) -> Result<ProcessId, AxStatus>;

  fn copy_attribute_names(&self, element: &Self::Element) -> Result<Self::Value, AxStatus>;

  fn copy_action_names(&self, element: &Self::Element) -> Result<Self::Value, AxStatus>;

  fn perform_action(&self, element: &Self::Element, action: &str) -> Result<(), AxStatus>;

  fn copy_attribute_value(
    &self,
    element: &Self::Element,
    attribute: &str,
  ) -> Result<Self::Value, AxStatus>;

  fn is_attribute_settable(
    &self,
    element: &Self::Element,
    attribute: &str,
  ) -> Result<bool, AxStatus>;

  fn set_attribute_value(
    &self,
    element: &Self::Element,
    attribute: &str,
    value: &Self::Value,
  ) -> Result<(), AxStatus>;

  /// Messaging timeout for calls on `element`. Zero restores the default.
  fn set_messaging_timeout(&self, element: &Self::Element, seconds: f32) -> Result<(), AxStatus>;

  // Values

  fn kind_of(&self, value: &Self::Value) -> ForeignKind;

  fn string_value(&self, value: &Self::Value) -> Option<String>;

  fn bool_value(&self, value: &Self::Value) -> Option<bool>;

  /// Integer payload, only when it converts exactly.
  fn int_value(&self, value: &Self::Value) -> Option<i64>;

  fn float_value(&self, value: &Self::Value) -> Option<f64>;

  fn geometry_value(&self, value: &Self::Value) -> Option<Geometry>;

  /// Element payload, retained for the caller.
  fn element_value(&self, value: &Self::Value) -> Option<Self::Element>;

  fn array_items(&self, value: &Self::Value) -> Option<Vec<Self::Value>>;

  fn new_string(&self, s: &str) -> Self::Value;

  fn new_bool(&self, b: bool) -> Self::Value;

  fn new_float(&self, n: f64) -> Self::Value;

  fn new_geometry(&self, geometry: Geometry) -> Option<Self::Value>;

  // Observation

  fn create_observer(&self, pid: ProcessId) -> Result<Self::Observer, AxStatus>;

  /// Register `notification` on `element`. Events are deposited in `sink`
  /// and the running loop is stopped.
  fn add_notification(
    &self,
    observer: &mut Self::Observer,
    element: &Self::Element,
    notification: &Self::Value,
    sink: Arc<EventSlot<Self::Element>>,
  ) -> Result<(), AxStatus>;

  fn remove_notification(
    &self,
    observer: &mut Self::Observer,
    element: &Self::Element,
    notification: &Self::Value,
  ) -> Result<(), AxStatus>;

  /// Attach the observer's event source to the current thread's loop.
  fn attach_observer(&self, observer: &Self::Observer);

  fn observer_attached(&self, observer: &Self::Observer) -> bool;

  fn detach_observer(&self, observer: &Self::Observer);

  /// Run the current thread's event loop for at most `timeout`.
  fn run_loop(&self, timeout: Duration) -> RunLoopExit;
}
