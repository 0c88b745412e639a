/*! Branded ID types. */

use derive_more::{Display, From, Into};
use serde::Serialize;

/// Process ID - branded type to distinguish from other integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, From, Into)]
pub struct ProcessId(pub i32);

impl ProcessId {
  pub const fn as_raw(self) -> i32 {
    self.0
  }
}
