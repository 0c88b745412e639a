/*!
axbridge - accessibility object model bridge for a host runtime

```ignore
use axbridge::{ElementHandle, NativeHost, WaitConfig, WaitRequest};
use axbridge::platform::MacPlatform;

let platform = MacPlatform;
let app = ElementHandle::application(&platform, axbridge::frontmost_pid(&platform)?)?;

// Read and write attributes as host values
let title = app.attribute("AXTitle")?;
app.set_attribute("AXFrontmost", &true.into())?;

// Block until the focused window changes (or 5 seconds pass)
let host = NativeHost::new();
let mut scope = host.enter();
let request = WaitRequest::new("AXFocusedWindowChanged", Duration::from_secs(5));
let outcome = app.clone().wait_for(&mut scope, request, &WaitConfig::default())?;
```
*/

pub mod a11y;
pub mod bridge;
pub mod config;
mod element;
pub mod host;
pub mod observation;
pub mod platform;
pub mod status;

mod types;
pub use types::*;

pub use a11y::{ForeignKind, HostValue};
pub use bridge::{to_foreign, to_host, TargetShape};
pub use config::WaitConfig;
pub use element::{api_enabled, frontmost_pid, ElementHandle};
pub use host::{callable, CallbackError, HostRuntime, NativeHost};
pub use observation::{CancellationToken, WaitOutcome, WaitRequest};
pub use status::AxStatus;
