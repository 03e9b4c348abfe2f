//! Scheduler seam.
//!
//! Everything the primitives need from the cooperative runtime besides
//! `Waker`s: the identity of the running task and a readiness wait on a
//! descriptor. Passing a [`Hub`] explicitly lets tests drive the primitives
//! with a fake scheduler.

use std::future::Future;
use std::io;
use std::os::fd::RawFd;
use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;

use crate::readiness::Direction;
use crate::task::TaskId;

/// Cooperative scheduler services.
#[async_trait(?Send)]
pub trait Hub {
    /// Identity of the task currently running on this thread.
    fn current_task(&self) -> TaskId {
        TaskId::current()
    }

    /// Suspend until `fd` signals readiness.
    ///
    /// `direction` names the operation that is waiting. Messaging
    /// descriptors only ever signal readability, whatever the direction, so
    /// implementations are free to ignore it.
    async fn wait(&self, fd: RawFd, direction: Direction) -> io::Result<()>;

    /// Suspend once and let every other ready task run before resuming.
    async fn yield_now(&self) {
        YieldNow { yielded: false }.await;
    }
}

/// Pending exactly once, waking itself so it is polled again.
struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
