//! compio integration.
//!
//! [`CompioHub`] is the default [`Hub`]: readiness waits go to the compio
//! driver as a one-shot poll on the socket's descriptor. Task identity comes
//! from [`scoped`](crate::scoped), so spawn tasks that share a socket as
//! `compio::runtime::spawn(greenzmq::scoped(fut))`.

#![allow(unsafe_code)]

use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};

use async_trait::async_trait;
use compio::runtime::fd::PollFd;
use greenzmq_core::{Direction, Hub};
use tracing::trace;

/// Hub backed by the compio runtime of the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompioHub;

impl CompioHub {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl Hub for CompioHub {
    async fn wait(&self, fd: RawFd, direction: Direction) -> io::Result<()> {
        trace!(fd, %direction, "polling descriptor");
        // The messaging descriptor only ever signals readability.
        let poll = PollFd::new(Descriptor(fd))?;
        poll.read_ready().await
    }
}

/// Borrowed view of a descriptor owned by the raw socket.
#[derive(Debug, Clone, Copy)]
struct Descriptor(RawFd);

impl AsFd for Descriptor {
    fn as_fd(&self) -> BorrowedFd<'_> {
        // SAFETY: the raw socket owns the descriptor and is only dropped once
        // no task is inside the readiness wait (`GreenSocket::close` defers
        // it until the waiter has left), and the `PollFd` holding this borrow
        // never outlives that wait.
        unsafe { BorrowedFd::borrow_raw(self.0) }
    }
}

impl AsRawFd for Descriptor {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}
