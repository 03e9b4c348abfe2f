//! Scripted socket and fake scheduler shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::poll_fn;
use std::io;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::task::{Poll, Waker};

use async_trait::async_trait;
use bytes::Bytes;
use greenzmq::{
    AdapterOptions, Attempt, Direction, Frame, GreenSocket, Hub, RawSocket, Readiness, SocketKind,
};

/// State shared between a [`StubSocket`] and the test driving it.
pub struct StubState {
    kind: SocketKind,
    /// Outcomes consumed by the next sends before the default behaviour applies
    pub send_script: RefCell<VecDeque<Attempt<()>>>,
    pub recv_script: RefCell<VecDeque<Attempt<Frame>>>,
    /// Frames waiting to be received
    pub inbox: RefCell<VecDeque<Frame>>,
    /// Whether an unscripted send succeeds
    pub writable: Cell<bool>,
    pub sent: RefCell<Vec<(Bytes, bool)>>,
    pub send_attempts: Cell<usize>,
    pub recv_attempts: Cell<usize>,
    pub readiness_queries: Cell<usize>,
    /// Set once the adapter has dropped the raw socket
    pub dropped: Cell<bool>,
}

impl StubState {
    pub fn sent_payloads(&self) -> Vec<(String, bool)> {
        self.sent
            .borrow()
            .iter()
            .map(|(data, more)| (String::from_utf8_lossy(data).into_owned(), *more))
            .collect()
    }

    pub fn deliver(&self, data: &'static str, more: bool) {
        self.inbox.borrow_mut().push_back(Frame::new(data, more));
    }
}

pub struct StubSocket {
    state: Rc<StubState>,
}

impl StubSocket {
    pub fn new(kind: SocketKind) -> (Self, Rc<StubState>) {
        let state = Rc::new(StubState {
            kind,
            send_script: RefCell::default(),
            recv_script: RefCell::default(),
            inbox: RefCell::default(),
            writable: Cell::new(true),
            sent: RefCell::default(),
            send_attempts: Cell::new(0),
            recv_attempts: Cell::new(0),
            readiness_queries: Cell::new(0),
            dropped: Cell::new(false),
        });
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl Drop for StubSocket {
    fn drop(&mut self) {
        self.state.dropped.set(true);
    }
}

impl RawSocket for StubSocket {
    fn kind(&self) -> SocketKind {
        self.state.kind
    }

    fn descriptor(&self) -> Result<RawFd, zmq::Error> {
        Ok(42)
    }

    fn try_send(&self, data: &[u8], more: bool) -> Attempt<()> {
        let state = &self.state;
        state.send_attempts.set(state.send_attempts.get() + 1);
        let outcome = state.send_script.borrow_mut().pop_front();
        let outcome = outcome.unwrap_or(if state.writable.get() {
            Attempt::Done(())
        } else {
            Attempt::WouldBlock
        });
        if outcome == Attempt::Done(()) {
            state
                .sent
                .borrow_mut()
                .push((Bytes::copy_from_slice(data), more));
        }
        outcome
    }

    fn try_recv(&self) -> Attempt<Frame> {
        let state = &self.state;
        state.recv_attempts.set(state.recv_attempts.get() + 1);
        if let Some(outcome) = state.recv_script.borrow_mut().pop_front() {
            return outcome;
        }
        match state.inbox.borrow_mut().pop_front() {
            Some(frame) => Attempt::Done(frame),
            None => Attempt::WouldBlock,
        }
    }

    fn readiness(&self) -> Result<Readiness, zmq::Error> {
        let state = &self.state;
        state.readiness_queries.set(state.readiness_queries.get() + 1);
        let mut readiness = Readiness::NONE;
        if !state.inbox.borrow().is_empty() {
            readiness = readiness | Readiness::READABLE;
        }
        if state.writable.get() {
            readiness = readiness | Readiness::WRITABLE;
        }
        Ok(readiness)
    }
}

/// Scheduler whose readiness waits either yield once or park until
/// [`FakeHub::release_all`].
pub struct FakeHub {
    manual: bool,
    waits: RefCell<Vec<Direction>>,
    yields: Cell<usize>,
    generation: Cell<u64>,
    parked: RefCell<Vec<Waker>>,
}

impl FakeHub {
    /// Every wait returns after yielding to the executor once.
    pub fn yielding() -> Rc<Self> {
        Rc::new(Self::with_mode(false))
    }

    /// Waits park until the test calls `release_all`.
    pub fn manual() -> Rc<Self> {
        Rc::new(Self::with_mode(true))
    }

    fn with_mode(manual: bool) -> Self {
        Self {
            manual,
            waits: RefCell::default(),
            yields: Cell::new(0),
            generation: Cell::new(0),
            parked: RefCell::default(),
        }
    }

    /// Directions of every readiness wait entered so far
    pub fn waits(&self) -> Vec<Direction> {
        self.waits.borrow().clone()
    }

    /// Number of plain yields to the scheduler
    pub fn yields(&self) -> usize {
        self.yields.get()
    }

    /// Readiness waits plus yields: every way a retry loop can suspend
    pub fn suspensions(&self) -> usize {
        self.waits.borrow().len() + self.yields.get()
    }

    /// Signal the descriptor: every wait in progress returns.
    pub fn release_all(&self) {
        self.generation.set(self.generation.get() + 1);
        let parked = std::mem::take(&mut *self.parked.borrow_mut());
        for waker in parked {
            waker.wake();
        }
    }
}

#[async_trait(?Send)]
impl Hub for FakeHub {
    async fn wait(&self, _fd: RawFd, direction: Direction) -> io::Result<()> {
        self.waits.borrow_mut().push(direction);
        let start = self.generation.get();
        let mut yielded = false;
        poll_fn(|cx| {
            if self.manual {
                if self.generation.get() != start {
                    return Poll::Ready(Ok(()));
                }
                self.parked.borrow_mut().push(cx.waker().clone());
                return Poll::Pending;
            }
            if yielded {
                return Poll::Ready(Ok(()));
            }
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        })
        .await
    }

    async fn yield_now(&self) {
        self.yields.set(self.yields.get() + 1);
        let mut yielded = false;
        poll_fn(|cx| {
            if yielded {
                return Poll::Ready(());
            }
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        })
        .await;
    }
}

pub fn stub_socket(kind: SocketKind, hub: &Rc<FakeHub>) -> (Rc<GreenSocket<StubSocket>>, Rc<StubState>) {
    stub_socket_with(kind, hub, AdapterOptions::default())
}

pub fn stub_socket_with(
    kind: SocketKind,
    hub: &Rc<FakeHub>,
    options: AdapterOptions,
) -> (Rc<GreenSocket<StubSocket>>, Rc<StubState>) {
    let (raw, state) = StubSocket::new(kind);
    let hub: Rc<dyn Hub> = hub.clone();
    (Rc::new(GreenSocket::with_options(raw, hub, options)), state)
}
