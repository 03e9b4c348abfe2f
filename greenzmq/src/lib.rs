//! # greenzmq
//!
//! Share one non-blocking ZeroMQ socket between many cooperative tasks.
//!
//! libzmq sockets are not safe for concurrent use, and their readiness
//! descriptor is edge-triggered: it signals once when *something* changes,
//! and any send, receive or event query can silently consume that edge. Two
//! tasks naively waiting on the same descriptor lose wakeups or interleave
//! the frames of their multipart messages.
//!
//! ## Architecture
//!
//! - **`greenzmq-core`**: runtime-agnostic primitives (`FairLock`,
//!   `WakeGate`, task identity, the `Hub` scheduler seam)
//! - **`greenzmq`**: the socket adapter (this crate)
//!
//! Per socket kind, each direction is either *locked* (one task at a time,
//! strict FIFO, multipart sequences never split), *lock-free* (REQ/REP,
//! whose lockstep protocol already serializes callers) or unsupported.
//! At most one task per socket waits on the descriptor; everybody else parks
//! on a per-direction gate and is woken when an operation on the other
//! direction may have changed readiness.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::future::try_join_all;
//! use greenzmq::{scoped, Context, Flags, SocketKind};
//!
//! # fn main() -> greenzmq::Result<()> {
//! compio::runtime::Runtime::new()?.block_on(async {
//!     let ctx = Context::new();
//!     let push = ctx.socket(SocketKind::Push)?;
//!     push.with_raw(|raw| raw.as_zmq().bind("tcp://127.0.0.1:5555"))??;
//!
//!     // Each scope is one task as far as the adapter is concerned.
//!     let workers = (0..4u8).map(|worker| {
//!         let push = &push;
//!         scoped(async move {
//!             push.send_framed(vec![vec![worker].into(), "done".into()], Flags::NONE)
//!                 .await
//!         })
//!     });
//!     try_join_all(workers).await?;
//!     Ok::<_, greenzmq::Error>(())
//! })
//! # }
//! ```
//!
//! With the compio runtime, spawn tasks that share a socket as
//! `compio::runtime::spawn(scoped(fut))`.
//!
//! ## Safety
//!
//! - The only `unsafe` is the descriptor borrow handed to the compio driver
//!   (`runtime`)
//! - Everything is `!Send`: sockets are shared between tasks of one thread

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod context;
pub mod dev_tracing;
pub mod dispatch;
pub mod error;
pub mod flags;
pub mod options;
pub mod raw;
pub mod runtime;
pub mod socket;
pub mod socket_kind;
mod trampoline;

pub use bytes::Bytes;
pub use greenzmq_core::{scoped, Direction, FairLock, Hub, Readiness, SyncError, TaskId, WakeGate};

pub use context::Context;
pub use dispatch::{Dispatch, Strategy};
pub use error::{Error, Result};
pub use flags::Flags;
pub use options::{AdapterOptions, WakePolicy};
pub use raw::{Attempt, Frame, RawSocket, ZmqSocket};
pub use runtime::CompioHub;
pub use socket::GreenSocket;
pub use socket_kind::SocketKind;

/// Everything needed to share sockets between tasks
///
/// ```rust
/// use greenzmq::prelude::*;
/// ```
pub mod prelude {
    pub use crate::context::Context;
    pub use crate::error::{Error, Result};
    pub use crate::flags::Flags;
    pub use crate::options::{AdapterOptions, WakePolicy};
    pub use crate::raw::Frame;
    pub use crate::socket::GreenSocket;
    pub use crate::socket_kind::SocketKind;
    pub use bytes::Bytes;
    pub use greenzmq_core::scoped;
}
