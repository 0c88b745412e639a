/*!
Observer session state machine.
*/

use std::sync::Arc;
use std::time::Instant;

use super::cancel::{CancellationToken, InterruptGuard};
use super::slot::{EventSlot, ObservedEvent};
use super::{Callback, WaitOutcome, WaitRequest};
use crate::a11y::HostValue;
use crate::config::WaitConfig;
use crate::element::ElementHandle;
use crate::host::HostRuntime;
use crate::platform::{Platform, RunLoopExit};
use crate::status::foreign_error;
use crate::types::{BridgeError, BridgeResult, ErrorKind, ProcessId};

/// Lifecycle of one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
  Idle,
  Registering,
  Waiting,
  Dispatching,
  TearingDown,
  Completed,
  TimedOut,
  Cancelled,
  Failed,
}

#[derive(Debug)]
struct Tracker {
  state: SessionState,
}

impl Tracker {
  const fn new() -> Self {
    Self {
      state: SessionState::Idle,
    }
  }

  fn enter(&mut self, next: SessionState) {
    log::debug!("observer session: {:?} -> {next:?}", self.state);
    self.state = next;
  }
}

/// Run one blocking wait on `element`.
#[allow(clippy::needless_pass_by_value)]
pub(crate) fn run<P, H>(
  platform: &P,
  element: &P::Element,
  host: &mut H,
  request: WaitRequest<H::Object, H::Callable>,
  config: &WaitConfig,
) -> BridgeResult<WaitOutcome<H::Object>>
where
  P: Platform,
  H: HostRuntime<P>,
{
  let mut tracker = Tracker::new();
  tracker.enter(SessionState::Registering);

  let sink = Arc::new(EventSlot::new());
  let registration = match Registration::register(platform, element, &request.notification, &sink)
  {
    Ok(registration) => registration,
    Err(e) => {
      tracker.enter(SessionState::Failed);
      return Err(e);
    }
  };

  tracker.enter(SessionState::Waiting);
  let token = CancellationToken::new();
  let guard = if config.trap_interrupts {
    InterruptGuard::install(&token)
  } else {
    InterruptGuard::disabled()
  };

  let outcome = wait_loop(platform, host, &sink, &token, &request, config, &mut tracker);

  tracker.enter(SessionState::TearingDown);
  drop(guard);
  let teardown = registration.teardown();

  match (outcome, teardown) {
    (Ok(outcome), Ok(())) => {
      tracker.enter(if outcome.is_completed() {
        SessionState::Completed
      } else {
        SessionState::TimedOut
      });
      Ok(outcome)
    }
    (Ok(_), Err(e)) => {
      tracker.enter(SessionState::Failed);
      Err(e)
    }
    (Err(e), teardown) => {
      if let Err(t) = teardown {
        log::warn!("Teardown failed while surfacing '{e}': {t}");
      }
      tracker.enter(if e.is_cancelled() {
        SessionState::Cancelled
      } else {
        SessionState::Failed
      });
      Err(e)
    }
  }
}

fn wait_loop<P, H>(
  platform: &P,
  host: &mut H,
  sink: &EventSlot<P::Element>,
  token: &CancellationToken,
  request: &WaitRequest<H::Object, H::Callable>,
  config: &WaitConfig,
  tracker: &mut Tracker,
) -> BridgeResult<WaitOutcome<H::Object>>
where
  P: Platform,
  H: HostRuntime<P>,
{
  let deadline = Instant::now() + request.timeout;
  let mut deliveries = 0;

  loop {
    let remaining = deadline.saturating_duration_since(Instant::now());
    if remaining.is_zero() {
      return Ok(WaitOutcome::TimedOut);
    }
    let slice = config.slice(remaining);

    let exit = host.without_lock(|| platform.run_loop(slice));

    if token.is_cancelled() {
      return Err(BridgeError::Cancelled);
    }

    if let Some(event) = sink.take() {
      tracker.enter(SessionState::Dispatching);
      deliveries += 1;
      if let Some(value) = dispatch(platform, host, event, request.callback.as_ref())? {
        return Ok(WaitOutcome::Completed { value, deliveries });
      }
      tracker.enter(SessionState::Waiting);
      continue;
    }

    match exit {
      RunLoopExit::Finished => {
        return Err(BridgeError::Platform(
          "run loop finished with no event sources".into(),
        ))
      }
      RunLoopExit::Stopped | RunLoopExit::TimedOut | RunLoopExit::HandledSource => {}
    }
  }
}

/// Handle one delivery. `Some(value)` stops the wait with `value`.
fn dispatch<P, H>(
  platform: &P,
  host: &mut H,
  event: ObservedEvent<P::Element>,
  callback: Option<&Callback<H::Object, H::Callable>>,
) -> BridgeResult<Option<H::Object>>
where
  P: Platform,
  H: HostRuntime<P>,
{
  match event.notification.as_deref() {
    Some(name) => log::trace!("dispatching {name}"),
    None => log::trace!("dispatching notification with undecodable name"),
  }

  let Some(callback) = callback else {
    return Ok(Some(host.bool_object(true)));
  };

  let mut args = Vec::with_capacity(callback.args.len() + 1);
  if !callback.args.is_empty() {
    let handle = ElementHandle::from_retained(platform.clone(), event.element);
    args.push(host.to_object(HostValue::Element(handle)));
    args.extend(callback.args.iter().cloned());
  }

  let value = host
    .call(&callback.function, args, &callback.kwargs)
    .map_err(BridgeError::callback)?;
  let stop = host.truthiness(&value).map_err(BridgeError::callback)?;
  Ok(stop.then_some(value))
}

/// Observer, notification and loop attachment owned by one session.
///
/// Teardown runs once, either explicitly through [`Registration::teardown`]
/// or from `Drop`. The observer and the name value are released after it.
struct Registration<'a, P: Platform> {
  platform: &'a P,
  element: &'a P::Element,
  observer: P::Observer,
  name: P::Value,
  added: bool,
  torn_down: bool,
}

impl<'a, P: Platform> Registration<'a, P> {
  fn register(
    platform: &'a P,
    element: &'a P::Element,
    notification: &str,
    sink: &Arc<EventSlot<P::Element>>,
  ) -> BridgeResult<Self> {
    let pid: ProcessId = platform.element_pid(element).map_err(|status| BridgeError::Ax {
      kind: ErrorKind::InvalidReference,
      message: "Could not get Pid for UI element".into(),
      status,
    })?;

    let observer = platform
      .create_observer(pid)
      .map_err(|status| foreign_error(status, "Could not create observer for notification"))?;

    let mut registration = Self {
      platform,
      element,
      observer,
      name: platform.new_string(notification),
      added: false,
      torn_down: false,
    };

    platform
      .add_notification(
        &mut registration.observer,
        element,
        &registration.name,
        Arc::clone(sink),
      )
      .map_err(|status| foreign_error(status, "Could not add notification to observer"))?;
    registration.added = true;

    platform.attach_observer(&registration.observer);
    log::debug!("registered {notification} for pid {pid}");
    Ok(registration)
  }

  fn teardown(mut self) -> BridgeResult<()> {
    self.release()
  }

  fn release(&mut self) -> BridgeResult<()> {
    if self.torn_down {
      return Ok(());
    }
    self.torn_down = true;

    if self.platform.observer_attached(&self.observer) {
      self.platform.detach_observer(&self.observer);
    }
    if self.added {
      self.added = false;
      self
        .platform
        .remove_notification(&mut self.observer, self.element, &self.name)
        .map_err(|status| foreign_error(status, "Could not remove notification from observer"))?;
    }
    Ok(())
  }
}

impl<P: Platform> Drop for Registration<'_, P> {
  fn drop(&mut self) {
    if let Err(e) = self.release() {
      log::warn!("Observer teardown failed: {e}");
    }
  }
}
