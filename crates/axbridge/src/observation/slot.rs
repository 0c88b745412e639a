/*!
Single-slot hand-off between the foreign observer callback and the waiting
session.

The foreign callback runs inside the native event loop. It never calls into
the host: it deposits what fired here and stops the loop. The session takes
the event after the native wait returns, on its own thread.
*/

use parking_lot::Mutex;

/// One delivered notification.
#[derive(Debug, Clone)]
pub struct ObservedEvent<E> {
  /// Retained reference to the element that triggered the event.
  pub element: E,
  /// Decoded notification name. `None` when the foreign name could not be
  /// decoded; delivery still counts.
  pub notification: Option<String>,
}

/// At most one pending event. A second event arriving while the slot is full
/// is dropped.
#[derive(Debug)]
pub struct EventSlot<E> {
  pending: Mutex<Option<ObservedEvent<E>>>,
}

impl<E> Default for EventSlot<E> {
  fn default() -> Self {
    Self {
      pending: Mutex::new(None),
    }
  }
}

impl<E> EventSlot<E> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Deposit an event. Returns `false` if the slot was already occupied.
  pub fn offer(&self, event: ObservedEvent<E>) -> bool {
    let mut pending = self.pending.lock();
    if pending.is_some() {
      log::trace!("event slot occupied, dropping {:?}", event.notification);
      return false;
    }
    *pending = Some(event);
    true
  }

  pub fn take(&self) -> Option<ObservedEvent<E>> {
    self.pending.lock().take()
  }

  pub fn is_empty(&self) -> bool {
    self.pending.lock().is_none()
  }
}
