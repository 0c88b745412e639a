/*! Opaque platform handles.

All three wrap a `CFRetained`, so `Clone` is `CFRetain` and `Drop` is
`CFRelease`. The rest of the crate never sees the raw CF pointers.
*/

#![allow(unsafe_code)]

use objc2_application_services::{AXObserver, AXUIElement};
use objc2_core_foundation::{CFRetained, CFRunLoopSource, CFType, Type};
use std::ffi::c_void;

use super::observer::{unregister_context, ContextHandle};

// FFI binding for CFEqual (not exposed by objc2-core-foundation)
extern "C" {
  fn CFEqual(cf1: *const c_void, cf2: *const c_void) -> u8;
}

/// Retained `AXUIElement`.
#[derive(Clone)]
pub struct MacElement(pub(super) CFRetained<AXUIElement>);

impl MacElement {
  pub(super) fn inner(&self) -> &AXUIElement {
    &self.0
  }

  /// Compare with another handle using `CFEqual` (local, no IPC).
  pub(super) fn cf_equal(&self, other: &Self) -> bool {
    // Use as_ptr() to get the CF pointer, not a pointer to the wrapper.
    let a = CFRetained::as_ptr(&self.0).as_ptr().cast::<c_void>();
    let b = CFRetained::as_ptr(&other.0).as_ptr().cast::<c_void>();
    unsafe { CFEqual(a, b) != 0 }
  }
}

unsafe impl Send for MacElement {}
unsafe impl Sync for MacElement {}

/// Retained CF value of any type.
#[derive(Clone)]
pub struct MacValue(pub(super) CFRetained<CFType>);

impl MacValue {
  pub(super) fn new<T: Type>(value: CFRetained<T>) -> Self {
    // SAFETY: every CF object is a CFType.
    Self(unsafe { CFRetained::cast_unchecked(value) })
  }

  pub(super) fn inner(&self) -> &CFType {
    &self.0
  }
}

/// Retained `AXObserver` plus the callback contexts it hands to macOS.
///
/// Contexts live until the observer is released, so a late callback never
/// sees a freed refcon.
pub struct MacObserver {
  pub(super) inner: CFRetained<AXObserver>,
  pub(super) source: CFRetained<CFRunLoopSource>,
  pub(super) contexts: Vec<Registered>,
}

/// One notification registered on this observer.
pub(super) struct Registered {
  pub(super) element: MacElement,
  pub(super) notification: String,
  pub(super) context: *mut ContextHandle,
  pub(super) active: bool,
}

impl Drop for MacObserver {
  fn drop(&mut self) {
    for registered in self.contexts.drain(..) {
      unregister_context(registered.context);
    }
  }
}
