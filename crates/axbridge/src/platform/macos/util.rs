/*! Process-level queries. */

#![allow(unsafe_code)]

use objc2_app_kit::NSRunningApplication;
use objc2_application_services::{AXIsProcessTrusted, AXUIElement};
use objc2_core_foundation::CFRetained;

use crate::types::ProcessId;

/// Create an `AXUIElement` for an application by PID.
pub(super) fn app_element(pid: ProcessId) -> CFRetained<AXUIElement> {
  unsafe { AXUIElement::new_application(pid.as_raw()) }
}

pub(super) fn system_wide_element() -> CFRetained<AXUIElement> {
  unsafe { AXUIElement::new_system_wide() }
}

/// Check if accessibility permissions are granted.
pub(super) fn has_permissions() -> bool {
  unsafe { AXIsProcessTrusted() }
}

/// PID of the application that currently owns the menu bar.
pub(super) fn frontmost_pid() -> Option<ProcessId> {
  let app: *mut NSRunningApplication = unsafe {
    let workspace: *mut objc2::runtime::AnyObject =
      objc2::msg_send![objc2::class!(NSWorkspace), sharedWorkspace];
    if workspace.is_null() {
      return None;
    }
    objc2::msg_send![workspace, frontmostApplication]
  };
  if app.is_null() {
    return None;
  }
  let pid: i32 = unsafe { objc2::msg_send![app, processIdentifier] };
  Some(ProcessId(pid))
}
