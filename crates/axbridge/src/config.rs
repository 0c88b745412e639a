/*!
Configuration for blocking notification waits.

All values have sensible defaults. Create a custom config to override:

```ignore
use axbridge::WaitConfig;
use std::time::Duration;

let config = WaitConfig {
    poll_interval: Duration::from_millis(20),
    ..Default::default()
};
```
*/

use std::time::Duration;

/// Slice length used when `poll_interval` is zero.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on a single slice, so SIGINT is acted on within this time
/// whatever `poll_interval` says.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Wait configuration.
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
  /// Longest single slice of the native wait. Cancellation is checked
  /// between slices. Zero means the default, and values above
  /// [`MAX_POLL_INTERVAL`] are clamped to it.
  /// Default: 100ms.
  pub poll_interval: Duration,

  /// Route SIGINT into the wait's cancellation token while it runs.
  /// Default: true.
  pub trap_interrupts: bool,
}

impl Default for WaitConfig {
  fn default() -> Self {
    Self {
      poll_interval: DEFAULT_POLL_INTERVAL,
      trap_interrupts: true,
    }
  }
}

impl WaitConfig {
  /// Create a new config with default values.
  pub fn new() -> Self {
    Self::default()
  }

  /// Length of the next native wait slice when `remaining` is left before
  /// the deadline. Never zero unless `remaining` is.
  pub fn slice(&self, remaining: Duration) -> Duration {
    let interval = if self.poll_interval.is_zero() {
      DEFAULT_POLL_INTERVAL
    } else {
      self.poll_interval.min(MAX_POLL_INTERVAL)
    };
    remaining.min(interval)
  }
}
