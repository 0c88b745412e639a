/*!
In-memory accessibility API for tests.

Elements are reference-counted nodes with a table of attributes. Every
observer-related call is appended to a log so tests can assert the exact
registration and teardown sequence. The native loop is simulated by a
scripted queue of steps consumed one per `run_loop` call; an empty queue
sleeps for the requested timeout and reports `TimedOut`.
*/

#![allow(
  clippy::cast_possible_truncation,
  clippy::cast_precision_loss,
  clippy::float_cmp
)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::traits::{Platform, RunLoopExit};
use crate::a11y::ForeignKind;
use crate::observation::{EventSlot, ObservedEvent};
use crate::status::AxStatus;
use crate::types::{Geometry, ProcessId};

/// Foreign value stand-in.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FakeValue {
  Str(String),
  Bool(bool),
  Int(i64),
  Float(f64),
  Geometry(Geometry),
  Element(FakeElement),
  Array(Vec<FakeValue>),
  /// A type the bridge does not convert.
  Other,
  /// Reports the given kind, but every decoder fails on it.
  Undecodable(ForeignKind),
}

#[derive(Debug, Clone)]
struct Attribute {
  /// `None` reports "no value".
  value: Option<FakeValue>,
  settable: bool,
}

#[derive(Debug)]
struct Node {
  id: u64,
  pid: Option<i32>,
  attributes: Mutex<BTreeMap<String, Attribute>>,
  actions: Mutex<Vec<String>>,
  performed: Mutex<Vec<String>>,
}

/// Retained element reference. Clones share the node; equality is by node id.
#[derive(Debug, Clone)]
pub(crate) struct FakeElement(Arc<Node>);

impl PartialEq for FakeElement {
  fn eq(&self, other: &Self) -> bool {
    self.0.id == other.0.id
  }
}

impl FakeElement {
  pub(crate) fn id(&self) -> u64 {
    self.0.id
  }

  /// Number of live references to this node (including any held by the
  /// platform's own registry).
  pub(crate) fn ref_count(&self) -> usize {
    Arc::strong_count(&self.0)
  }

  pub(crate) fn with_attribute(self, name: &str, value: FakeValue, settable: bool) -> Self {
    self.0.attributes.lock().insert(
      name.to_owned(),
      Attribute {
        value: Some(value),
        settable,
      },
    );
    self
  }

  /// Attribute that exists but currently has no value.
  pub(crate) fn with_empty_attribute(self, name: &str) -> Self {
    self.0.attributes.lock().insert(
      name.to_owned(),
      Attribute {
        value: None,
        settable: false,
      },
    );
    self
  }

  pub(crate) fn with_actions(self, actions: &[&str]) -> Self {
    *self.0.actions.lock() = actions.iter().map(|a| (*a).to_owned()).collect();
    self
  }

  pub(crate) fn stored(&self, name: &str) -> Option<FakeValue> {
    self.0.attributes.lock().get(name).and_then(|a| a.value.clone())
  }

  pub(crate) fn performed(&self) -> Vec<String> {
    self.0.performed.lock().clone()
  }
}

/// Entry in the call log.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
  CreateObserver(i32),
  AddNotification(String),
  RemoveNotification(String),
  Attach,
  Detach,
  ReleaseObserver,
  RunLoop,
  SetAttribute(String),
  SetTimeout(f32),
}

/// One scripted iteration of the native loop.
pub(crate) enum Step {
  /// Deliver an event to every active registration and stop the loop.
  /// `None` simulates a notification name that cannot be decoded.
  Fire {
    element: FakeElement,
    notification: Option<String>,
  },
  /// Loop exits because it has no sources.
  Finish,
  /// Run arbitrary code while "blocked", then report a handled source.
  Run(Box<dyn FnOnce() + Send>),
}

/// Injected failures.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Failures {
  pub(crate) create_observer: Option<AxStatus>,
  pub(crate) add_notification: Option<AxStatus>,
  pub(crate) remove_notification: Option<AxStatus>,
  pub(crate) set_attribute: Option<AxStatus>,
}

struct Registration {
  observer: u64,
  element: FakeElement,
  notification: String,
  sink: Arc<EventSlot<FakeElement>>,
}

#[derive(Default)]
struct State {
  next_id: AtomicU64,
  trusted: Mutex<bool>,
  frontmost: Mutex<Option<i32>>,
  apps: Mutex<HashMap<i32, FakeElement>>,
  calls: Mutex<Vec<Call>>,
  script: Mutex<VecDeque<Step>>,
  failures: Mutex<Failures>,
  registrations: Mutex<Vec<Registration>>,
  attached: Mutex<Vec<u64>>,
}

/// Recording fake of the accessibility API. Clones share state.
#[derive(Clone, Default)]
pub(crate) struct FakePlatform {
  state: Arc<State>,
}

impl fmt::Debug for FakePlatform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FakePlatform")
      .field("calls", &self.state.calls.lock().len())
      .finish_non_exhaustive()
  }
}

/// Observer owned by a session. Dropping it logs `ReleaseObserver`.
#[derive(Debug)]
pub(crate) struct FakeObserver {
  id: u64,
  platform: FakePlatform,
}

impl Drop for FakeObserver {
  fn drop(&mut self) {
    self.platform.record(Call::ReleaseObserver);
  }
}

impl FakePlatform {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  fn next_id(&self) -> u64 {
    self.state.next_id.fetch_add(1, Ordering::Relaxed) + 1
  }

  fn node(&self, id: u64, pid: Option<i32>) -> FakeElement {
    FakeElement(Arc::new(Node {
      id,
      pid,
      attributes: Mutex::new(BTreeMap::new()),
      actions: Mutex::new(Vec::new()),
      performed: Mutex::new(Vec::new()),
    }))
  }

  /// Fresh element owned by `pid`.
  pub(crate) fn element(&self, pid: i32) -> FakeElement {
    self.node(self.next_id(), Some(pid))
  }

  /// Element whose pid lookup fails with `InvalidUIElement`.
  pub(crate) fn orphan(&self) -> FakeElement {
    self.node(self.next_id(), None)
  }

  /// A distinct reference the foreign side considers equal to `element`.
  pub(crate) fn twin(&self, element: &FakeElement) -> FakeElement {
    self.node(element.id(), element.0.pid)
  }

  pub(crate) fn add_application(&self, pid: i32) -> FakeElement {
    let app = self.element(pid);
    self.state.apps.lock().insert(pid, app.clone());
    app
  }

  pub(crate) fn set_trusted(&self, trusted: bool) {
    *self.state.trusted.lock() = trusted;
  }

  pub(crate) fn set_frontmost(&self, pid: Option<i32>) {
    *self.state.frontmost.lock() = pid;
  }

  pub(crate) fn fail(&self, f: impl FnOnce(&mut Failures)) {
    f(&mut self.state.failures.lock());
  }

  pub(crate) fn script(&self, step: Step) {
    self.state.script.lock().push_back(step);
  }

  pub(crate) fn fire(&self, element: &FakeElement, notification: &str) {
    self.script(Step::Fire {
      element: element.clone(),
      notification: Some(notification.to_owned()),
    });
  }

  pub(crate) fn calls(&self) -> Vec<Call> {
    self.state.calls.lock().clone()
  }

  pub(crate) fn count(&self, call: &Call) -> usize {
    self.state.calls.lock().iter().filter(|c| *c == call).count()
  }

  /// Registrations still present on some observer.
  pub(crate) fn active_registrations(&self) -> usize {
    self.state.registrations.lock().len()
  }

  fn record(&self, call: Call) {
    self.state.calls.lock().push(call);
  }

  fn with_attribute<T>(
    element: &FakeElement,
    name: &str,
    f: impl FnOnce(&mut Attribute) -> Result<T, AxStatus>,
  ) -> Result<T, AxStatus> {
    let mut attributes = element.0.attributes.lock();
    let attribute = attributes
      .get_mut(name)
      .ok_or(AxStatus::ATTRIBUTE_UNSUPPORTED)?;
    f(attribute)
  }
}

impl Platform for FakePlatform {
  type Element = FakeElement;
  type Value = FakeValue;
  type Observer = FakeObserver;

  fn api_enabled(&self) -> bool {
    *self.state.trusted.lock()
  }

  fn frontmost_pid(&self) -> Option<ProcessId> {
    self.state.frontmost.lock().map(ProcessId)
  }

  fn system_wide_element(&self) -> Option<FakeElement> {
    Some(self.orphan())
  }

  fn application_element(&self, pid: ProcessId) -> Option<FakeElement> {
    self.state.apps.lock().get(&pid.as_raw()).cloned()
  }

  fn elements_equal(&self, a: &FakeElement, b: &FakeElement) -> bool {
    a == b
  }

  fn element_pid(&self, element: &FakeElement) -> Result<ProcessId, AxStatus> {
    element.0.pid.map(ProcessId).ok_or(AxStatus::INVALID_UI_ELEMENT)
  }

  fn copy_attribute_names(&self, element: &FakeElement) -> Result<FakeValue, AxStatus> {
    let names = element.0.attributes.lock().keys().cloned().map(FakeValue::Str).collect();
    Ok(FakeValue::Array(names))
  }

  fn copy_action_names(&self, element: &FakeElement) -> Result<FakeValue, AxStatus> {
    let names = element.0.actions.lock().iter().cloned().map(FakeValue::Str).collect();
    Ok(FakeValue::Array(names))
  }

  fn perform_action(&self, element: &FakeElement, action: &str) -> Result<(), AxStatus> {
    if !element.0.actions.lock().iter().any(|a| a == action) {
      return Err(AxStatus::ACTION_UNSUPPORTED);
    }
    element.0.performed.lock().push(action.to_owned());
    Ok(())
  }

  fn copy_attribute_value(
    &self,
    element: &FakeElement,
    attribute: &str,
  ) -> Result<FakeValue, AxStatus> {
    Self::with_attribute(element, attribute, |a| a.value.clone().ok_or(AxStatus::NO_VALUE))
  }

  fn is_attribute_settable(
    &self,
    element: &FakeElement,
    attribute: &str,
  ) -> Result<bool, AxStatus> {
    Self::with_attribute(element, attribute, |a| Ok(a.settable))
  }

  fn set_attribute_value(
    &self,
    element: &FakeElement,
    attribute: &str,
    value: &FakeValue,
  ) -> Result<(), AxStatus> {
    if let Some(status) = self.state.failures.lock().set_attribute {
      return Err(status);
    }
    self.record(Call::SetAttribute(attribute.to_owned()));
    Self::with_attribute(element, attribute, |a| {
      a.value = Some(value.clone());
      Ok(())
    })
  }

  fn set_messaging_timeout(&self, element: &FakeElement, seconds: f32) -> Result<(), AxStatus> {
    if seconds < 0.0 {
      return Err(AxStatus::ILLEGAL_ARGUMENT);
    }
    if element.0.pid.is_none() {
      return Err(AxStatus::INVALID_UI_ELEMENT);
    }
    self.record(Call::SetTimeout(seconds));
    Ok(())
  }

  fn kind_of(&self, value: &FakeValue) -> ForeignKind {
    match value {
      FakeValue::Str(_) => ForeignKind::String,
      FakeValue::Bool(_) => ForeignKind::Boolean,
      FakeValue::Int(_) => ForeignKind::Number { float: false },
      FakeValue::Float(_) => ForeignKind::Number { float: true },
      FakeValue::Geometry(g) => ForeignKind::Geometry(g.kind()),
      FakeValue::Element(_) => ForeignKind::Element,
      FakeValue::Array(_) => ForeignKind::Array,
      FakeValue::Other => ForeignKind::Other,
      FakeValue::Undecodable(kind) => *kind,
    }
  }

  fn string_value(&self, value: &FakeValue) -> Option<String> {
    match value {
      FakeValue::Str(s) => Some(s.clone()),
      _ => None,
    }
  }

  fn bool_value(&self, value: &FakeValue) -> Option<bool> {
    match value {
      FakeValue::Bool(b) => Some(*b),
      _ => None,
    }
  }

  fn int_value(&self, value: &FakeValue) -> Option<i64> {
    match value {
      FakeValue::Int(n) => Some(*n),
      FakeValue::Float(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => Some(*n as i64),
      _ => None,
    }
  }

  fn float_value(&self, value: &FakeValue) -> Option<f64> {
    match value {
      FakeValue::Int(n) => Some(*n as f64),
      FakeValue::Float(n) => Some(*n),
      _ => None,
    }
  }

  fn geometry_value(&self, value: &FakeValue) -> Option<Geometry> {
    match value {
      FakeValue::Geometry(g) => Some(*g),
      _ => None,
    }
  }

  fn element_value(&self, value: &FakeValue) -> Option<FakeElement> {
    match value {
      FakeValue::Element(e) => Some(e.clone()),
      _ => None,
    }
  }

  fn array_items(&self, value: &FakeValue) -> Option<Vec<FakeValue>> {
    match value {
      FakeValue::Array(items) => Some(items.clone()),
      _ => None,
    }
  }

  fn new_string(&self, s: &str) -> FakeValue {
    FakeValue::Str(s.to_owned())
  }

  fn new_bool(&self, b: bool) -> FakeValue {
    FakeValue::Bool(b)
  }

  fn new_float(&self, n: f64) -> FakeValue {
    FakeValue::Float(n)
  }

  fn new_geometry(&self, geometry: Geometry) -> Option<FakeValue> {
    Some(FakeValue::Geometry(geometry))
  }

  fn create_observer(&self, pid: ProcessId) -> Result<FakeObserver, AxStatus> {
    if let Some(status) = self.state.failures.lock().create_observer {
      return Err(status);
    }
    self.record(Call::CreateObserver(pid.as_raw()));
    Ok(FakeObserver {
      id: self.next_id(),
      platform: self.clone(),
    })
  }

  fn add_notification(
    &self,
    observer: &mut FakeObserver,
    element: &FakeElement,
    notification: &FakeValue,
    sink: Arc<EventSlot<FakeElement>>,
  ) -> Result<(), AxStatus> {
    if let Some(status) = self.state.failures.lock().add_notification {
      return Err(status);
    }
    let name = self.string_value(notification).unwrap_or_default();
    self.record(Call::AddNotification(name.clone()));
    self.state.registrations.lock().push(Registration {
      observer: observer.id,
      element: element.clone(),
      notification: name,
      sink,
    });
    Ok(())
  }

  fn remove_notification(
    &self,
    observer: &mut FakeObserver,
    element: &FakeElement,
    notification: &FakeValue,
  ) -> Result<(), AxStatus> {
    let name = self.string_value(notification).unwrap_or_default();
    self.record(Call::RemoveNotification(name.clone()));
    let mut registrations = self.state.registrations.lock();
    let before = registrations.len();
    registrations
      .retain(|r| !(r.observer == observer.id && r.element == *element && r.notification == name));
    if registrations.len() == before {
      return Err(AxStatus::NOTIFICATION_NOT_REGISTERED);
    }
    drop(registrations);

    if let Some(status) = self.state.failures.lock().remove_notification {
      return Err(status);
    }
    Ok(())
  }

  fn attach_observer(&self, observer: &FakeObserver) {
    self.record(Call::Attach);
    self.state.attached.lock().push(observer.id);
  }

  fn observer_attached(&self, observer: &FakeObserver) -> bool {
    self.state.attached.lock().contains(&observer.id)
  }

  fn detach_observer(&self, observer: &FakeObserver) {
    self.record(Call::Detach);
    self.state.attached.lock().retain(|id| *id != observer.id);
  }

  fn run_loop(&self, timeout: Duration) -> RunLoopExit {
    self.record(Call::RunLoop);
    let step = self.state.script.lock().pop_front();
    match step {
      None => {
        std::thread::sleep(timeout);
        RunLoopExit::TimedOut
      }
      Some(Step::Fire {
        element,
        notification,
      }) => {
        let registrations = self.state.registrations.lock();
        for registration in registrations.iter() {
          registration.sink.offer(ObservedEvent {
            element: element.clone(),
            notification: notification.clone(),
          });
        }
        RunLoopExit::Stopped
      }
      Some(Step::Finish) => RunLoopExit::Finished,
      Some(Step::Run(f)) => {
        f();
        RunLoopExit::HandledSource
      }
    }
  }
}
