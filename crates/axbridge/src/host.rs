/*!
Host runtime boundary.

An observer session re-enters the host to run the user callback. Everything
it needs from the host is behind [`HostRuntime`]:
- marshal a bridge value into a host object,
- call a host callable with positional and keyword arguments,
- coerce the result to a boolean (may fail),
- release the host's serialization lock around the blocking native wait.

[`NativeHost`] is the in-process runtime: objects are [`HostValue`]s,
callables are Rust closures and the serialization lock is a plain mutex.
*/

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::a11y::HostValue;
use crate::platform::Platform;

/// What the observer session needs from the host runtime.
///
/// Implementations are used while the host's serialization lock is held;
/// [`HostRuntime::without_lock`] is the only place it is released.
pub trait HostRuntime<P: Platform> {
  type Object: Clone;
  type Callable;
  type Error: std::error::Error + Send + Sync + 'static;

  fn to_object(&mut self, value: HostValue<P>) -> Self::Object;

  fn call(
    &mut self,
    callable: &Self::Callable,
    args: Vec<Self::Object>,
    kwargs: &[(String, Self::Object)],
  ) -> Result<Self::Object, Self::Error>;

  fn truthiness(&mut self, object: &Self::Object) -> Result<bool, Self::Error>;

  /// Canonical true / false object.
  fn bool_object(&mut self, value: bool) -> Self::Object;

  /// Run `f` with the serialization lock released, re-acquiring it before
  /// returning.
  fn without_lock<T>(&mut self, f: impl FnOnce() -> T) -> T;
}

/// Error raised by a native callback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CallbackError(pub String);

impl CallbackError {
  pub fn new(message: impl Into<String>) -> Self {
    Self(message.into())
  }
}

/// Keyword arguments passed to a native callback.
pub type Kwargs<P> = [(String, HostValue<P>)];

/// Callback signature for [`NativeHost`].
pub type NativeCallable<P> =
  Arc<dyn Fn(Vec<HostValue<P>>, &Kwargs<P>) -> Result<HostValue<P>, CallbackError>>;

/// Wrap a closure as a [`NativeCallable`].
pub fn callable<P, F>(f: F) -> NativeCallable<P>
where
  P: Platform,
  F: Fn(Vec<HostValue<P>>, &Kwargs<P>) -> Result<HostValue<P>, CallbackError> + 'static,
{
  Arc::new(f)
}

/// In-process host runtime. Clones share the serialization lock.
#[derive(Debug, Clone, Default)]
pub struct NativeHost {
  lock: Arc<Mutex<()>>,
}

impl NativeHost {
  pub fn new() -> Self {
    Self::default()
  }

  /// Acquire the serialization lock. Host work happens through the scope.
  pub fn enter(&self) -> HostScope<'_> {
    HostScope {
      guard: self.lock.lock(),
    }
  }

  /// Whether some thread currently holds the serialization lock.
  pub fn is_locked(&self) -> bool {
    self.lock.is_locked()
  }
}

/// Holds the [`NativeHost`] serialization lock.
pub struct HostScope<'a> {
  guard: MutexGuard<'a, ()>,
}

impl fmt::Debug for HostScope<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("HostScope").finish_non_exhaustive()
  }
}

impl<P: Platform> HostRuntime<P> for HostScope<'_> {
  type Object = HostValue<P>;
  type Callable = NativeCallable<P>;
  type Error = CallbackError;

  fn to_object(&mut self, value: HostValue<P>) -> HostValue<P> {
    value
  }

  fn call(
    &mut self,
    callable: &NativeCallable<P>,
    args: Vec<HostValue<P>>,
    kwargs: &Kwargs<P>,
  ) -> Result<HostValue<P>, CallbackError> {
    callable(args, kwargs)
  }

  fn truthiness(&mut self, object: &HostValue<P>) -> Result<bool, CallbackError> {
    Ok(object.is_truthy())
  }

  fn bool_object(&mut self, value: bool) -> HostValue<P> {
    HostValue::Bool(value)
  }

  fn without_lock<T>(&mut self, f: impl FnOnce() -> T) -> T {
    MutexGuard::unlocked(&mut self.guard, f)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::fake::FakePlatform;

  #[test]
  fn lock_is_released_only_inside_without_lock() {
    let host = NativeHost::new();
    let mut scope = host.enter();
    assert!(host.is_locked());

    let seen = HostRuntime::<FakePlatform>::without_lock(&mut scope, || host.is_locked());
    assert!(!seen);
    assert!(host.is_locked());

    drop(scope);
    assert!(!host.is_locked());
  }

  #[test]
  fn other_threads_run_during_without_lock() {
    let host = NativeHost::new();
    let mut scope = host.enter();
    let other = host.clone();

    let ran = HostRuntime::<FakePlatform>::without_lock(&mut scope, || {
      std::thread::spawn(move || {
        let _scope = other.enter();
        true
      })
      .join()
      .unwrap_or(false)
    });
    assert!(ran);
  }

  #[test]
  fn calls_closures_with_kwargs() {
    let host = NativeHost::new();
    let mut scope = host.enter();
    let f: NativeCallable<FakePlatform> = callable(|args, kwargs| {
      let named = kwargs.iter().find(|(k, _)| k == "n").map(|(_, v)| v.clone());
      let positional = i64::try_from(args.len()).unwrap_or(0);
      Ok(HostValue::Int(
        positional + named.and_then(|v| v.as_i64()).unwrap_or(0),
      ))
    });

    let out = HostRuntime::<FakePlatform>::call(
      &mut scope,
      &f,
      vec![HostValue::None, HostValue::None],
      &[("n".to_owned(), HostValue::Int(10))],
    )
    .unwrap_or(HostValue::None);
    assert_eq!(out, HostValue::Int(12));
  }
}
