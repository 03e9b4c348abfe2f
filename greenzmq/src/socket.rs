//! `GreenSocket`: one raw socket shared by many cooperative tasks.
//!
//! # Flow
//!
//! ```text
//! send/recv ─► Dispatch (per kind, per direction)
//!                ├─ Unsupported ─► Error::Unsupported, no suspension
//!                ├─ Locked ─────► FairLock ─► retry loop ─► always-wake other side ─► release
//!                └─ LockFree ───► retry loop ─► explicit readiness check
//!
//! retry loop: attempt ─┬─ Done ─────► return
//!                      ├─ WouldBlock ► check readiness ─┬─ ready ─────► yield ──────┐
//!                      │                                └─ not ready ─► trampoline ─┴► attempt again
//!                      └─ Failed ────► return error
//! ```
//!
//! `Flags::DONTWAIT` calls make exactly one attempt per frame and never
//! suspend; on locked directions they only proceed if the lock is free (or
//! already held by the caller), so they can never split another task's
//! multipart message.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use bytes::Bytes;
use greenzmq_core::{Direction, FairLock, Hub, Readiness};
use tracing::{debug, trace};

use crate::dispatch::{Dispatch, Strategy};
use crate::error::{Error, Result};
use crate::flags::Flags;
use crate::options::{AdapterOptions, WakePolicy};
use crate::raw::{Attempt, Frame, RawSocket, ZmqSocket};
use crate::socket_kind::SocketKind;
use crate::trampoline::Trampoline;

enum Path<'a> {
    Locked(&'a FairLock),
    LockFree,
}

/// Cooperative facade over a non-blocking socket.
///
/// Share it between tasks on one thread with `Rc`. All operations take
/// `&self`.
pub struct GreenSocket<R: RawSocket = ZmqSocket> {
    raw: RefCell<Option<R>>,
    kind: SocketKind,
    dispatch: &'static Dispatch,
    hub: Rc<dyn Hub>,
    trampoline: Trampoline,
    send_lock: Option<FairLock>,
    recv_lock: Option<FairLock>,
    options: AdapterOptions,
    closed: Cell<bool>,
}

impl<R: RawSocket> GreenSocket<R> {
    /// Wrap `raw`, picking the dispatch profile from its kind.
    pub fn new(raw: R, hub: Rc<dyn Hub>) -> Self {
        Self::with_options(raw, hub, AdapterOptions::default())
    }

    pub fn with_options(raw: R, hub: Rc<dyn Hub>, options: AdapterOptions) -> Self {
        let kind = raw.kind();
        let dispatch = Dispatch::for_kind(kind);
        debug!(%kind, send = ?dispatch.send, recv = ?dispatch.recv, "creating green socket");

        let lock_for = |strategy: Strategy| {
            (strategy == Strategy::Locked).then(|| FairLock::new(hub.clone()))
        };
        let send_lock = lock_for(dispatch.send);
        let recv_lock = lock_for(dispatch.recv);

        Self {
            raw: RefCell::new(Some(raw)),
            kind,
            dispatch,
            trampoline: Trampoline::new(&hub),
            hub,
            send_lock,
            recv_lock,
            options,
            closed: Cell::new(false),
        }
    }

    pub fn kind(&self) -> SocketKind {
        self.kind
    }

    pub fn dispatch(&self) -> &'static Dispatch {
        self.dispatch
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Run `f` against the raw socket (bind, connect, options...).
    ///
    /// # Errors
    ///
    /// [`Error::Closed`] once the socket is closed.
    pub fn with_raw<T>(&self, f: impl FnOnce(&R) -> T) -> Result<T> {
        if self.closed.get() {
            return Err(Error::Closed);
        }
        let raw = self.raw.borrow();
        raw.as_ref().map(f).ok_or(Error::Closed)
    }

    /// Query ZMQ_EVENTS and wake every gate the result reports as ready.
    ///
    /// Besides returning the bits, this is the explicit-check wake policy:
    /// the query makes libzmq process pending events, so a task waiting on
    /// the descriptor could otherwise miss an edge.
    pub fn query_readiness(&self) -> Result<Readiness> {
        let readiness = self.with_raw(R::readiness)??;
        self.trampoline.wake_ready(readiness);
        Ok(readiness)
    }

    /// Send one frame.
    ///
    /// `Flags::SNDMORE` marks it as a non-final part; `Flags::DONTWAIT` turns
    /// would-block into an immediate `EAGAIN`.
    pub async fn send(&self, data: impl Into<Bytes>, flags: Flags) -> Result<()> {
        let data = data.into();
        self.send_frames(std::slice::from_ref(&data), flags).await
    }

    /// Send all `frames` as one multipart message.
    ///
    /// The send lock is held across the whole sequence, so frames from two
    /// tasks never interleave.
    pub async fn send_framed(&self, frames: Vec<Bytes>, flags: Flags) -> Result<()> {
        self.send_frames(&frames, flags).await
    }

    /// Receive one frame.
    pub async fn recv(&self, flags: Flags) -> Result<Frame> {
        let path = self.path(Direction::Recv)?;
        if flags.contains(Flags::DONTWAIT) {
            return self.nonblocking(&path, Direction::Recv, || self.recv_frame_now());
        }
        let op = self.retry(Direction::Recv, R::try_recv);
        self.on_path(path, Direction::Recv, op).await
    }

    /// Receive every part of the next message.
    pub async fn recv_framed(&self, flags: Flags) -> Result<Vec<Bytes>> {
        let path = self.path(Direction::Recv)?;
        if flags.contains(Flags::DONTWAIT) {
            return self.nonblocking(&path, Direction::Recv, || self.recv_parts_now());
        }
        self.on_path(path, Direction::Recv, self.recv_parts()).await
    }

    /// Close the socket.
    ///
    /// Every task parked on this socket resumes with [`Error::Closed`];
    /// tasks still queued for a lock get the same error once their turn
    /// comes. Later calls fail immediately. The raw socket is dropped as
    /// soon as no task is waiting on its descriptor.
    pub fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        debug!(kind = %self.kind, "closing green socket");
        self.trampoline.close();
        // With a task inside the readiness wait, the descriptor goes away
        // once that task has left it.
        self.drop_raw();
    }

    async fn send_frames(&self, frames: &[Bytes], flags: Flags) -> Result<()> {
        let path = self.path(Direction::Send)?;
        let more = flags.contains(Flags::SNDMORE);
        if flags.contains(Flags::DONTWAIT) {
            return self.nonblocking(&path, Direction::Send, || self.send_now(frames, more));
        }
        self.on_path(path, Direction::Send, self.send_blocking(frames, more))
            .await
    }

    fn path(&self, direction: Direction) -> Result<Path<'_>> {
        let lock = match direction {
            Direction::Send => self.send_lock.as_ref(),
            Direction::Recv => self.recv_lock.as_ref(),
        };
        match self.dispatch.strategy(direction) {
            Strategy::Unsupported => Err(Error::Unsupported {
                kind: self.kind,
                direction,
            }),
            _ if self.closed.get() => Err(Error::Closed),
            Strategy::Locked => Ok(lock.map_or(Path::LockFree, Path::Locked)),
            Strategy::LockFree => Ok(Path::LockFree),
        }
    }

    /// Run a blocking operation under the discipline of `path`.
    async fn on_path<T>(
        &self,
        path: Path<'_>,
        direction: Direction,
        op: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match path {
            Path::LockFree => {
                let result = op.await;
                self.notify(direction, self.options.fast_wake);
                result
            }
            Path::Locked(lock) => {
                let _guard = lock.lock().await?;
                let result = op.await;
                self.notify(direction, self.options.locked_wake);
                result
            }
        }
    }

    fn nonblocking<T>(
        &self,
        path: &Path<'_>,
        direction: Direction,
        op: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let _guard = match path {
            Path::Locked(lock) => match lock.try_lock() {
                Some(guard) => Some(guard),
                None => {
                    trace!(%direction, "lock busy, no-block call would block");
                    return Err(Error::would_block());
                }
            },
            Path::LockFree => None,
        };
        let result = op();
        self.notify(direction, self.options.fast_wake);
        result
    }

    /// Tell the other direction that readiness may have changed.
    fn notify(&self, direction: Direction, policy: WakePolicy) {
        if self.closed.get() {
            return;
        }
        match policy {
            WakePolicy::Always => {
                self.trampoline.wake(direction.opposite());
            }
            WakePolicy::ExplicitCheck => {
                if !self.trampoline.has_waiters() {
                    return;
                }
                if let Err(err) = self.query_readiness() {
                    debug!(%err, "readiness query after {direction} failed");
                }
            }
        }
    }

    async fn retry<T>(
        &self,
        direction: Direction,
        mut op: impl FnMut(&R) -> Attempt<T>,
    ) -> Result<T> {
        loop {
            match self.with_raw(&mut op)? {
                Attempt::Done(value) => return Ok(value),
                Attempt::WouldBlock => self.park(direction).await?,
                Attempt::Failed(err) => return Err(err.into()),
            }
        }
    }

    /// One suspension per would-block.
    async fn park(&self, direction: Direction) -> Result<()> {
        if self.options.check_before_park {
            let readiness = self.query_readiness()?;
            if readiness.allows(direction) {
                // The edge is already consumed, so the descriptor may never
                // fire again; yield instead of waiting on it.
                trace!(%direction, "ready after explicit check, yielding");
                self.hub.yield_now().await;
                return Ok(());
            }
        }
        let fd = self.with_raw(R::descriptor)??;
        let result = self.trampoline.wait(&*self.hub, fd, direction).await;
        if self.closed.get() {
            self.drop_raw();
        }
        result
    }

    /// Drop the raw socket unless a task is still polling its descriptor.
    fn drop_raw(&self) {
        if !self.trampoline.is_idle() {
            return;
        }
        // Deferred to drop if a `with_raw` closure is running.
        if let Ok(mut raw) = self.raw.try_borrow_mut() {
            if raw.take().is_some() {
                trace!(kind = %self.kind, "raw socket dropped");
            }
        }
    }

    async fn send_blocking(&self, frames: &[Bytes], more: bool) -> Result<()> {
        for (i, frame) in frames.iter().enumerate() {
            let more = more || i + 1 < frames.len();
            self.retry(Direction::Send, |raw: &R| raw.try_send(frame, more))
                .await?;
        }
        Ok(())
    }

    async fn recv_parts(&self) -> Result<Vec<Bytes>> {
        let mut parts = Vec::new();
        loop {
            let frame = self.retry(Direction::Recv, R::try_recv).await?;
            parts.push(frame.data);
            if !frame.more {
                return Ok(parts);
            }
        }
    }

    fn send_now(&self, frames: &[Bytes], more: bool) -> Result<()> {
        for (i, frame) in frames.iter().enumerate() {
            let more = more || i + 1 < frames.len();
            expect_done(self.with_raw(|raw| raw.try_send(frame, more))?)?;
        }
        Ok(())
    }

    fn recv_frame_now(&self) -> Result<Frame> {
        expect_done(self.with_raw(R::try_recv)?)
    }

    fn recv_parts_now(&self) -> Result<Vec<Bytes>> {
        let mut parts = Vec::new();
        loop {
            let frame = self.recv_frame_now()?;
            parts.push(frame.data);
            if !frame.more {
                return Ok(parts);
            }
        }
    }
}

fn expect_done<T>(attempt: Attempt<T>) -> Result<T> {
    match attempt {
        Attempt::Done(value) => Ok(value),
        Attempt::WouldBlock => Err(Error::would_block()),
        Attempt::Failed(err) => Err(err.into()),
    }
}
