//! Readiness trampoline.
//!
//! At most one task per socket is ever inside the external readiness wait.
//! That task stays recorded on its direction's [`WakeGate`] while it waits,
//! so a `wake()` from another task interrupts the wait just like it would
//! interrupt a plain `block()`. A task of the other direction that needs to
//! wait in the meantime parks on its own gate instead.
//!
//! Returning from [`Trampoline::wait`] never means "ready": callers always
//! retry the non-blocking operation.

use std::cell::Cell;
use std::os::fd::RawFd;
use std::rc::Rc;

use futures::future::{select, Either};
use greenzmq_core::{Direction, Hub, Readiness, WakeGate};
use tracing::trace;

use crate::error::Result;

pub(crate) struct Trampoline {
    /// Direction of the task currently inside the external wait
    active: Cell<Option<Direction>>,
    send_gate: WakeGate,
    recv_gate: WakeGate,
}

impl Trampoline {
    pub(crate) fn new(hub: &Rc<dyn Hub>) -> Self {
        Self {
            active: Cell::new(None),
            send_gate: WakeGate::new(hub.clone()),
            recv_gate: WakeGate::new(hub.clone()),
        }
    }

    pub(crate) fn gate(&self, direction: Direction) -> &WakeGate {
        match direction {
            Direction::Send => &self.send_gate,
            Direction::Recv => &self.recv_gate,
        }
    }

    /// No task is inside the external wait
    pub(crate) fn is_idle(&self) -> bool {
        self.active.get().is_none()
    }

    pub(crate) fn has_waiters(&self) -> bool {
        self.send_gate.is_blocked() || self.recv_gate.is_blocked()
    }

    pub(crate) fn wake(&self, direction: Direction) -> bool {
        self.gate(direction).wake()
    }

    /// Wake the gates whose direction `readiness` reports as ready.
    pub(crate) fn wake_ready(&self, readiness: Readiness) {
        if readiness.allows(Direction::Send) {
            self.send_gate.wake();
        }
        if readiness.allows(Direction::Recv) {
            self.recv_gate.wake();
        }
    }

    pub(crate) fn close(&self) {
        self.send_gate.close();
        self.recv_gate.close();
    }

    /// Suspend until `fd` may have become ready or this direction is woken.
    pub(crate) async fn wait(&self, hub: &dyn Hub, fd: RawFd, direction: Direction) -> Result<()> {
        let gate = self.gate(direction);

        if let Some(active) = self.active.get() {
            trace!(%direction, %active, "readiness wait already in progress, parking");
            gate.block().await?;
            return Ok(());
        }

        trace!(%direction, fd, "entering readiness wait");
        let guard = ActiveWait::enter(self, direction);
        let outcome = match select(hub.wait(fd, direction), gate.block()).await {
            Either::Left((ready, _)) => {
                // The descriptor fires for both directions and this task is
                // about to consume the edge.
                if ready.is_ok() {
                    self.wake(direction.opposite());
                }
                ready.map_err(Into::into)
            }
            Either::Right((woken, _)) => woken.map_err(Into::into),
        };
        if outcome.is_ok() {
            guard.disarm();
        }
        trace!(%direction, ok = outcome.is_ok(), "left readiness wait");
        outcome
    }
}

/// Marks the trampoline as occupied for the lifetime of one external wait.
///
/// If dropped while still armed (the wait failed or the waiting task was
/// cancelled) it wakes the opposite gate, so a parked task takes over the
/// external wait instead of sleeping with nobody watching the descriptor.
struct ActiveWait<'a> {
    trampoline: &'a Trampoline,
    direction: Direction,
    armed: bool,
}

impl<'a> ActiveWait<'a> {
    fn enter(trampoline: &'a Trampoline, direction: Direction) -> Self {
        trampoline.active.set(Some(direction));
        Self {
            trampoline,
            direction,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ActiveWait<'_> {
    fn drop(&mut self) {
        self.trampoline.active.set(None);
        if self.armed && self.trampoline.wake(self.direction.opposite()) {
            trace!(direction = %self.direction, "handed readiness wait over");
        }
    }
}
