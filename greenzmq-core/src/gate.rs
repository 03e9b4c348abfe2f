//! `WakeGate`: single-waiter, at-most-once wake coordinator.
//!
//! A task is "blocked" on a gate either directly, by awaiting
//! [`WakeGate::block`], or indirectly, when the trampoline records it on the
//! gate while it waits for socket readiness. [`WakeGate::wake`] resumes it in
//! both cases without the caller needing to know which.
//!
//! Each block cycle accepts at most one wake. Leaving the cycle for any reason
//! (resumed, closed, or the future dropped) clears the record together with
//! any wake still pending, so a late wake can never resolve a later,
//! unrelated block.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use tracing::trace;

use crate::error::{Result, SyncError};
use crate::hub::Hub;
use crate::task::TaskId;

struct Blocked {
    task: TaskId,
    cycle: u64,
    waker: Waker,
}

#[derive(Default)]
struct GateState {
    blocked: Option<Blocked>,
    pending: bool,
    closed: bool,
    next_cycle: u64,
}

impl GateState {
    fn clear(&mut self) {
        self.blocked = None;
        self.pending = false;
    }
}

/// Single-waiter wake coordinator.
pub struct WakeGate {
    hub: Rc<dyn Hub>,
    state: RefCell<GateState>,
}

impl WakeGate {
    pub fn new(hub: Rc<dyn Hub>) -> Self {
        Self {
            hub,
            state: RefCell::new(GateState::default()),
        }
    }

    /// Record the current task as the gate's waiter and suspend until woken.
    ///
    /// # Errors
    ///
    /// - [`SyncError::DoubleBlock`] if another task is already recorded
    /// - [`SyncError::Closed`] if the gate is or becomes closed
    pub fn block(&self) -> Block<'_> {
        Block {
            gate: self,
            cycle: None,
            done: false,
        }
    }

    /// Schedule the recorded waiter.
    ///
    /// Returns `true` only for the call that actually scheduled a resumption;
    /// with no waiter, or with a wake already pending, this is a no-op.
    pub fn wake(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.pending {
            return false;
        }
        match state.blocked.as_ref() {
            Some(blocked) => {
                trace!(task = %blocked.task, "waking gate waiter");
                blocked.waker.wake_by_ref();
            }
            None => return false,
        }
        state.pending = true;
        true
    }

    /// Close the gate: the current waiter (if any) resumes with
    /// [`SyncError::Closed`], and so does every later `block()`.
    pub fn close(&self) {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        if let Some(blocked) = &state.blocked {
            blocked.waker.wake_by_ref();
        }
    }

    /// Whether a task is currently recorded
    pub fn is_blocked(&self) -> bool {
        self.state.borrow().blocked.is_some()
    }

    /// Whether a wake has been scheduled but not yet consumed
    pub fn is_pending(&self) -> bool {
        self.state.borrow().pending
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }
}

/// Future returned by [`WakeGate::block`].
pub struct Block<'a> {
    gate: &'a WakeGate,
    cycle: Option<u64>,
    done: bool,
}

impl Future for Block<'_> {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let mut state = this.gate.state.borrow_mut();

        if this.cycle.is_none() {
            if state.closed {
                this.done = true;
                return Poll::Ready(Err(SyncError::Closed));
            }
            if state.blocked.is_some() {
                this.done = true;
                return Poll::Ready(Err(SyncError::DoubleBlock));
            }
            let cycle = state.next_cycle;
            state.next_cycle += 1;
            state.blocked = Some(Blocked {
                task: this.gate.hub.current_task(),
                cycle,
                waker: cx.waker().clone(),
            });
            state.pending = false;
            this.cycle = Some(cycle);
            return Poll::Pending;
        }

        if state.closed {
            state.clear();
            this.done = true;
            return Poll::Ready(Err(SyncError::Closed));
        }
        if state.pending {
            state.clear();
            this.done = true;
            return Poll::Ready(Ok(()));
        }
        if let Some(blocked) = state.blocked.as_mut() {
            blocked.waker.clone_from(cx.waker());
        }
        Poll::Pending
    }
}

impl Drop for Block<'_> {
    fn drop(&mut self) {
        let Some(cycle) = self.cycle else { return };
        if self.done {
            return;
        }
        let mut state = self.gate.state.borrow_mut();
        if state.blocked.as_ref().is_some_and(|b| b.cycle == cycle) {
            // Cancels a pending wake along with the record.
            state.clear();
        }
    }
}
