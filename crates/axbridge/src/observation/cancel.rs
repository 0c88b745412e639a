/*!
Cooperative cancellation of a blocking wait.

The native loop does not react to SIGINT while blocked. The interrupt guard
routes SIGINT into a [`CancellationToken`]; the session checks the token
between slices of the native wait and stops with `Cancelled`.

The guard saves the process's SIGINT disposition when it is installed and
puts it back when dropped, so Ctrl-C behaves as before once the wait ends.
Only one guard can be active per process; a second concurrent wait runs
without interrupt trapping.
*/

#![allow(unsafe_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag requesting that a wait stop as soon as possible.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
  flag: Arc<AtomicBool>,
}

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.flag.store(true, Ordering::SeqCst);
  }

  pub fn is_cancelled(&self) -> bool {
    self.flag.load(Ordering::SeqCst)
  }

  #[cfg(unix)]
  fn flag(&self) -> Arc<AtomicBool> {
    Arc::clone(&self.flag)
  }
}

#[cfg(unix)]
mod sigint {
  use std::ptr;
  use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};

  /// Flag of the wait currently trapping SIGINT. Null when none is.
  static ACTIVE: AtomicPtr<AtomicBool> = AtomicPtr::new(ptr::null_mut());

  // Only touches an atomic, which is async-signal-safe.
  extern "C" fn on_interrupt(_signal: libc::c_int) {
    let flag = ACTIVE.load(Ordering::SeqCst);
    if !flag.is_null() {
      unsafe { (*flag).store(true, Ordering::SeqCst) };
    }
  }

  pub(super) fn handler() -> libc::sighandler_t {
    on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t
  }

  /// Claim the process-wide slot for `flag`. The caller keeps `flag` alive
  /// until [`release`].
  pub(super) fn claim(flag: *const AtomicBool) -> bool {
    ACTIVE
      .compare_exchange(
        ptr::null_mut(),
        flag.cast_mut(),
        Ordering::SeqCst,
        Ordering::SeqCst,
      )
      .is_ok()
  }

  pub(super) fn release() {
    ACTIVE.store(ptr::null_mut(), Ordering::SeqCst);
  }

  /// Install `handler` for SIGINT, returning the disposition it replaced.
  pub(super) fn swap(handler: libc::sighandler_t) -> std::io::Result<libc::sigaction> {
    unsafe {
      let mut action: libc::sigaction = std::mem::zeroed();
      action.sa_sigaction = handler;
      action.sa_flags = libc::SA_RESTART;
      libc::sigemptyset(&raw mut action.sa_mask);

      let mut previous: libc::sigaction = std::mem::zeroed();
      if libc::sigaction(libc::SIGINT, &raw const action, &raw mut previous) == 0 {
        Ok(previous)
      } else {
        Err(std::io::Error::last_os_error())
      }
    }
  }

  pub(super) fn restore(previous: &libc::sigaction) -> std::io::Result<()> {
    let result = unsafe { libc::sigaction(libc::SIGINT, previous, ptr::null_mut()) };
    if result == 0 {
      Ok(())
    } else {
      Err(std::io::Error::last_os_error())
    }
  }

  #[cfg(test)]
  pub(crate) fn current() -> libc::sighandler_t {
    unsafe {
      let mut current: libc::sigaction = std::mem::zeroed();
      libc::sigaction(libc::SIGINT, ptr::null(), &raw mut current);
      current.sa_sigaction
    }
  }
}

#[cfg(unix)]
struct Saved {
  previous: libc::sigaction,
  // Keeps the flag behind the handler's pointer alive.
  _flag: Arc<AtomicBool>,
}

/// Routes SIGINT into a token for as long as it lives. Dropping it restores
/// the previous disposition.
pub(crate) struct InterruptGuard {
  #[cfg(unix)]
  saved: Option<Saved>,
}

impl std::fmt::Debug for InterruptGuard {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    #[cfg(unix)]
    let active = self.saved.is_some();
    #[cfg(not(unix))]
    let active = false;
    f.debug_struct("InterruptGuard")
      .field("active", &active)
      .finish()
  }
}

impl InterruptGuard {
  #[cfg(unix)]
  pub(crate) fn install(token: &CancellationToken) -> Self {
    let flag = token.flag();
    if !sigint::claim(Arc::as_ptr(&flag)) {
      log::warn!("Another wait is trapping SIGINT, this wait is not interruptible");
      return Self::disabled();
    }

    match sigint::swap(sigint::handler()) {
      Ok(previous) => {
        log::debug!("SIGINT routed to wait cancellation");
        Self {
          saved: Some(Saved {
            previous,
            _flag: flag,
          }),
        }
      }
      Err(e) => {
        sigint::release();
        log::warn!("Could not install SIGINT handler, wait is not interruptible: {e}");
        Self::disabled()
      }
    }
  }

  #[cfg(not(unix))]
  pub(crate) fn install(_token: &CancellationToken) -> Self {
    log::warn!("SIGINT trapping is not supported on this platform");
    Self {}
  }

  pub(crate) const fn disabled() -> Self {
    Self {
      #[cfg(unix)]
      saved: None,
    }
  }
}

impl Drop for InterruptGuard {
  fn drop(&mut self) {
    #[cfg(unix)]
    if let Some(saved) = self.saved.take() {
      if let Err(e) = sigint::restore(&saved.previous) {
        log::warn!("Could not restore previous SIGINT handler: {e}");
      }
      sigint::release();
    }
  }
}

/// Serializes tests that change the process's SIGINT disposition.
#[cfg(test)]
pub(crate) static INTERRUPT_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

/// Deliver SIGINT to the calling thread.
#[cfg(all(test, unix))]
pub(crate) fn raise_interrupt() {
  unsafe {
    libc::raise(libc::SIGINT);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clones_share_state() {
    let token = CancellationToken::new();
    let other = token.clone();
    assert!(!other.is_cancelled());
    token.cancel();
    assert!(other.is_cancelled());
  }

  #[cfg(unix)]
  #[test]
  fn raised_interrupt_cancels_token() {
    let _lock = INTERRUPT_LOCK.lock();
    let token = CancellationToken::new();
    let guard = InterruptGuard::install(&token);
    assert!(guard.saved.is_some());

    raise_interrupt();
    assert!(token.is_cancelled());
    drop(guard);
  }

  #[cfg(unix)]
  #[test]
  fn second_guard_is_disabled_while_first_is_active() {
    let _lock = INTERRUPT_LOCK.lock();
    let first = InterruptGuard::install(&CancellationToken::new());
    let second = InterruptGuard::install(&CancellationToken::new());
    assert!(first.saved.is_some());
    assert!(second.saved.is_none());
    drop(second);
    drop(first);

    let again = InterruptGuard::install(&CancellationToken::new());
    assert!(again.saved.is_some());
  }

  #[cfg(unix)]
  #[test]
  fn drop_restores_previous_disposition() {
    let _lock = INTERRUPT_LOCK.lock();
    let Ok(outer) = sigint::swap(libc::SIG_IGN) else {
      panic!("could not set SIGINT to ignore");
    };

    let guard = InterruptGuard::install(&CancellationToken::new());
    assert_eq!(sigint::current(), sigint::handler());
    drop(guard);
    assert_eq!(sigint::current(), libc::SIG_IGN);

    assert!(sigint::restore(&outer).is_ok());
  }

  #[cfg(unix)]
  const CHILD_ENV: &str = "AXBRIDGE_INTERRUPT_CHILD";

  /// Runs only inside the process spawned by
  /// `sigint_terminates_process_after_wait`.
  #[cfg(unix)]
  #[test]
  fn interrupt_child_default_disposition() {
    if std::env::var_os(CHILD_ENV).is_none() {
      return;
    }
    assert!(sigint::swap(libc::SIG_DFL).is_ok());
    drop(InterruptGuard::install(&CancellationToken::new()));
    raise_interrupt();
    std::thread::sleep(std::time::Duration::from_millis(200));
  }

  #[cfg(unix)]
  #[test]
  fn sigint_terminates_process_after_wait() {
    use std::os::unix::process::ExitStatusExt;

    let _lock = INTERRUPT_LOCK.lock();
    let Ok(exe) = std::env::current_exe() else {
      panic!("test binary path unavailable");
    };
    let status = std::process::Command::new(exe)
      .args([
        "observation::cancel::tests::interrupt_child_default_disposition",
        "--exact",
        "--test-threads=1",
        "--quiet",
      ])
      .env(CHILD_ENV, "1")
      .stdout(std::process::Stdio::null())
      .stderr(std::process::Stdio::null())
      .status();
    let Ok(status) = status else {
      panic!("could not spawn child test process");
    };
    assert_eq!(status.signal(), Some(libc::SIGINT), "child exited with {status}");
  }
}
