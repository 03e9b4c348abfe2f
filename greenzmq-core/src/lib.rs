//! greenzmq Core
//!
//! Runtime-agnostic building blocks for sharing one edge-triggered socket
//! between many cooperative tasks on a single thread:
//! - Task identity scopes (`task`)
//! - Scheduler seam injected into every primitive (`hub`)
//! - Directions and readiness bits (`readiness`)
//! - Reentrant FIFO lock (`lock`)
//! - Single-waiter wake gate (`gate`)
//! - Error types (`error`)
//!
//! Everything here is `!Send`: the primitives coordinate tasks that share a
//! thread, never threads.

#![cfg_attr(not(test), deny(unsafe_code))]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod gate;
pub mod hub;
pub mod lock;
pub mod readiness;
pub mod task;

pub use error::SyncError;
pub use gate::WakeGate;
pub use hub::Hub;
pub use lock::{FairLock, FairLockGuard};
pub use readiness::{Direction, Readiness};
pub use task::{scoped, TaskId};

pub mod prelude {
    pub use crate::error::SyncError;
    pub use crate::gate::WakeGate;
    pub use crate::hub::Hub;
    pub use crate::lock::{FairLock, FairLockGuard};
    pub use crate::readiness::{Direction, Readiness};
    pub use crate::task::{scoped, TaskId};
}
