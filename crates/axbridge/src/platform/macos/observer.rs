/*!
Observer management and callback for macOS accessibility.

macOS `AXObserver` callbacks receive a raw `refcon` pointer. We hand it a
boxed context id and keep the session's event slot in a global registry
keyed by that id, so the callback never dereferences session memory.

The callback does three things: retain the element, deposit it in the slot,
stop the current run loop. Dispatch to the host happens later on the
waiting thread.
*/

#![allow(unsafe_code)]

use objc2_application_services::{AXObserver, AXUIElement};
use objc2_core_foundation::{
  kCFRunLoopDefaultMode, CFRetained, CFRunLoop, CFRunLoopRunResult, CFString,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use super::handles::{MacElement, MacObserver, MacValue, Registered};
use super::status;
use crate::observation::{EventSlot, ObservedEvent};
use crate::platform::RunLoopExit;
use crate::status::AxStatus;
use crate::types::ProcessId;

type Sink = Arc<EventSlot<MacElement>>;

/// Next available context ID.
static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle passed to macOS callbacks.
/// Contains only an ID that maps to the sink in `OBSERVER_CONTEXTS`.
#[repr(C)]
pub(crate) struct ContextHandle {
  context_id: u64,
}

/// Global registry mapping context IDs to event slots.
static OBSERVER_CONTEXTS: LazyLock<Mutex<HashMap<u64, Sink>>> =
  LazyLock::new(|| Mutex::new(HashMap::new()));

fn register_context(sink: Sink) -> *mut ContextHandle {
  let context_id = NEXT_CONTEXT_ID.fetch_add(1, AtomicOrdering::Relaxed);
  OBSERVER_CONTEXTS.lock().insert(context_id, sink);
  Box::into_raw(Box::new(ContextHandle { context_id }))
}

/// Unregister and free a context handle.
pub(super) fn unregister_context(handle_ptr: *mut ContextHandle) {
  if handle_ptr.is_null() {
    return;
  }
  unsafe {
    let handle = Box::from_raw(handle_ptr);
    OBSERVER_CONTEXTS.lock().remove(&handle.context_id);
  }
}

/// Look up the sink for a handle. Clones the `Arc` so the lock is released
/// before the slot is touched.
fn lookup_context(handle_ptr: *const ContextHandle) -> Option<Sink> {
  if handle_ptr.is_null() {
    return None;
  }
  unsafe {
    let handle = &*handle_ptr;
    OBSERVER_CONTEXTS.lock().get(&handle.context_id).cloned()
  }
}

/// Create an `AXObserver` for `pid`. The caller attaches it to a run loop.
pub(super) fn create_observer(pid: ProcessId) -> Result<MacObserver, AxStatus> {
  let observer = unsafe {
    let mut observer_ptr: *mut AXObserver = std::ptr::null_mut();
    let result = AXObserver::create(
      pid.as_raw(),
      Some(observer_callback),
      NonNull::from(&mut observer_ptr),
    );
    status(result)?;
    CFRetained::from_raw(NonNull::new(observer_ptr).ok_or(AxStatus::FAILURE)?)
  };

  let source = unsafe { observer.run_loop_source() };
  Ok(MacObserver {
    inner: observer,
    source,
    contexts: Vec::new(),
  })
}

fn notification_name(value: &MacValue) -> Result<&CFString, AxStatus> {
  value
    .inner()
    .downcast_ref::<CFString>()
    .ok_or(AxStatus::ILLEGAL_ARGUMENT)
}

pub(super) fn add_notification(
  observer: &mut MacObserver,
  element: &MacElement,
  notification: &MacValue,
  sink: Sink,
) -> Result<(), AxStatus> {
  let name = notification_name(notification)?;
  let context = register_context(sink);
  let result = unsafe {
    observer
      .inner
      .add_notification(element.inner(), name, context.cast::<c_void>())
  };
  if let Err(e) = status(result) {
    unregister_context(context);
    return Err(e);
  }

  observer.contexts.push(Registered {
    element: element.clone(),
    notification: name.to_string(),
    context,
    active: true,
  });
  Ok(())
}

pub(super) fn remove_notification(
  observer: &mut MacObserver,
  element: &MacElement,
  notification: &MacValue,
) -> Result<(), AxStatus> {
  let name = notification_name(notification)?;
  let result = unsafe { observer.inner.remove_notification(element.inner(), name) };

  // The context itself is freed with the observer.
  let key = name.to_string();
  if let Some(registered) = observer
    .contexts
    .iter_mut()
    .find(|r| r.active && r.notification == key && r.element.cf_equal(element))
  {
    registered.active = false;
  }
  status(result)
}

pub(super) fn attach(observer: &MacObserver) {
  unsafe {
    if let Some(run_loop) = CFRunLoop::current() {
      run_loop.add_source(Some(&observer.source), kCFRunLoopDefaultMode);
    }
  }
}

pub(super) fn is_attached(observer: &MacObserver) -> bool {
  unsafe {
    CFRunLoop::current().is_some_and(|run_loop| {
      run_loop.contains_source(Some(&observer.source), kCFRunLoopDefaultMode)
    })
  }
}

pub(super) fn detach(observer: &MacObserver) {
  unsafe {
    if let Some(run_loop) = CFRunLoop::current() {
      run_loop.remove_source(Some(&observer.source), kCFRunLoopDefaultMode);
    }
  }
}

/// Run the current thread's loop in the default mode.
pub(super) fn run_loop(timeout: Duration) -> RunLoopExit {
  let result =
    unsafe { CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, timeout.as_secs_f64(), false) };
  if result == CFRunLoopRunResult::Stopped {
    RunLoopExit::Stopped
  } else if result == CFRunLoopRunResult::TimedOut {
    RunLoopExit::TimedOut
  } else if result == CFRunLoopRunResult::HandledSource {
    RunLoopExit::HandledSource
  } else {
    RunLoopExit::Finished
  }
}

/// Observer callback: hand the event to the waiting session and stop the loop.
unsafe extern "C-unwind" fn observer_callback(
  _observer: NonNull<AXObserver>,
  element: NonNull<AXUIElement>,
  notification: NonNull<CFString>,
  refcon: *mut c_void,
) {
  use std::panic::AssertUnwindSafe;

  let result = std::panic::catch_unwind(AssertUnwindSafe(|| {
    let Some(sink) = lookup_context(refcon as *const ContextHandle) else {
      return;
    };

    let name = notification.as_ref().to_string();
    log::trace!("observer fired: {name}");
    let event = ObservedEvent {
      element: MacElement(CFRetained::retain(element)),
      notification: (!name.is_empty()).then_some(name),
    };
    sink.offer(event);

    if let Some(run_loop) = CFRunLoop::current() {
      run_loop.stop();
    }
  }));

  if result.is_err() {
    log::warn!("Accessibility notification handler panicked (possibly invalid element)");
  }
}
