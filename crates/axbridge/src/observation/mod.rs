/*!
Blocking wait for a foreign notification.

A wait registers one notification on one element, runs the native event
loop until the notification is delivered and accepted, the timeout
elapses, or SIGINT arrives, and then tears everything down in order.

```ignore
let request = WaitRequest::new("AXValueChanged", Duration::from_secs(5));
match element.wait_for(&mut host.enter(), request, &WaitConfig::default())? {
    WaitOutcome::Completed { value, .. } => println!("fired: {value:?}"),
    WaitOutcome::TimedOut => println!("nothing happened"),
}
```

## Session states

`Idle → Registering → Waiting ⇄ Dispatching → TearingDown →
{Completed, TimedOut, Cancelled, Failed}`

Teardown runs exactly once on every exit path: restore the SIGINT
disposition, detach the observer's source, remove the notification,
release the observer.
*/

mod cancel;
mod session;
mod slot;

use std::time::Duration;

pub use cancel::CancellationToken;
pub(crate) use session::run;
pub use session::SessionState;
pub use slot::{EventSlot, ObservedEvent};

use crate::host::HostRuntime;
use crate::platform::Platform;

/// Host callable invoked on each delivery, with its arguments.
#[derive(Debug, Clone)]
pub struct Callback<O, C> {
  pub function: C,
  /// Positional arguments. When non-empty, the element that triggered the
  /// event is prepended.
  pub args: Vec<O>,
  pub kwargs: Vec<(String, O)>,
}

/// What to wait for.
#[derive(Debug, Clone)]
pub struct WaitRequest<O, C> {
  pub notification: String,
  pub timeout: Duration,
  pub callback: Option<Callback<O, C>>,
}

impl<O, C> WaitRequest<O, C> {
  pub fn new(notification: impl Into<String>, timeout: Duration) -> Self {
    Self {
      notification: notification.into(),
      timeout,
      callback: None,
    }
  }

  /// Wait timeout in (fractional) seconds. Negative values wait zero.
  pub fn with_timeout_secs(mut self, seconds: f64) -> Self {
    self.timeout = Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO);
    self
  }

  /// Call `function` on each delivery. The wait continues while it returns
  /// a falsy value.
  pub fn with_callback(mut self, function: C, args: Vec<O>, kwargs: Vec<(String, O)>) -> Self {
    self.callback = Some(Callback {
      function,
      args,
      kwargs,
    });
    self
  }
}

/// Non-error result of a wait.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitOutcome<O> {
  /// The notification fired and was accepted. `value` is `true` without a
  /// callback, otherwise the callback's truthy return value.
  Completed { value: O, deliveries: usize },
  TimedOut,
}

impl<O> WaitOutcome<O> {
  pub const fn is_completed(&self) -> bool {
    matches!(self, Self::Completed { .. })
  }

  pub const fn value(&self) -> Option<&O> {
    match self {
      Self::Completed { value, .. } => Some(value),
      Self::TimedOut => None,
    }
  }

  /// Collapse into a single host object; a timeout is the canonical false.
  pub fn into_object<P, H>(self, host: &mut H) -> O
  where
    P: Platform,
    H: HostRuntime<P, Object = O>,
  {
    match self {
      Self::Completed { value, .. } => value,
      Self::TimedOut => host.bool_object(false),
    }
  }
}
