/*! Platform Abstraction Layer */

mod traits;
pub use traits::{Platform, RunLoopExit};

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::{MacElement, MacObserver, MacPlatform, MacValue};

/// The accessibility API of the running OS.
#[cfg(target_os = "macos")]
pub type CurrentPlatform = MacPlatform;

#[cfg(test)]
pub(crate) mod fake;
