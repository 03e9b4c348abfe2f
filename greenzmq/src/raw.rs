//! Raw non-blocking socket seam.
//!
//! [`RawSocket`] is everything the adapter needs from the messaging library:
//! single non-blocking attempts, the readiness descriptor and the
//! `ZMQ_EVENTS` query. [`ZmqSocket`] is the libzmq implementation; tests
//! substitute scripted sockets.

use std::os::fd::RawFd;

use bytes::Bytes;
use greenzmq_core::Readiness;

use crate::socket_kind::SocketKind;

/// One received message part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Bytes,
    /// More parts of the same message follow (ZMQ_RCVMORE)
    pub more: bool,
}

impl Frame {
    pub fn new(data: impl Into<Bytes>, more: bool) -> Self {
        Self {
            data: data.into(),
            more,
        }
    }
}

/// Outcome of a single non-blocking attempt.
///
/// Would-block is a tag the retry loop inspects, not an error.
#[derive(Debug, PartialEq, Eq)]
pub enum Attempt<T> {
    Done(T),
    WouldBlock,
    Failed(zmq::Error),
}

impl<T> From<Result<T, zmq::Error>> for Attempt<T> {
    fn from(result: Result<T, zmq::Error>) -> Self {
        match result {
            Ok(value) => Self::Done(value),
            Err(zmq::Error::EAGAIN) => Self::WouldBlock,
            Err(err) => Self::Failed(err),
        }
    }
}

/// Non-blocking socket operations.
///
/// Every method refreshes (and may consume) the socket's edge-triggered
/// readiness state as a side effect.
pub trait RawSocket {
    fn kind(&self) -> SocketKind;

    /// Descriptor that becomes readable whenever readiness may have changed
    fn descriptor(&self) -> Result<RawFd, zmq::Error>;

    fn try_send(&self, data: &[u8], more: bool) -> Attempt<()>;

    fn try_recv(&self) -> Attempt<Frame>;

    /// ZMQ_EVENTS
    fn readiness(&self) -> Result<Readiness, zmq::Error>;
}

/// libzmq socket driven in `DONTWAIT` mode.
pub struct ZmqSocket {
    socket: zmq::Socket,
    kind: SocketKind,
}

impl ZmqSocket {
    /// Create a socket of `kind` in `ctx`.
    pub fn new(ctx: &zmq::Context, kind: SocketKind) -> Result<Self, zmq::Error> {
        Ok(Self {
            socket: ctx.socket(kind.into())?,
            kind,
        })
    }

    /// Adopt an existing libzmq socket.
    pub fn from_socket(socket: zmq::Socket) -> Result<Self, zmq::Error> {
        let kind = socket.get_socket_type()?.into();
        Ok(Self { socket, kind })
    }

    /// Underlying socket, for bind/connect and option setup
    pub fn as_zmq(&self) -> &zmq::Socket {
        &self.socket
    }

    pub fn into_inner(self) -> zmq::Socket {
        self.socket
    }
}

impl RawSocket for ZmqSocket {
    fn kind(&self) -> SocketKind {
        self.kind
    }

    fn descriptor(&self) -> Result<RawFd, zmq::Error> {
        self.socket.get_fd()
    }

    fn try_send(&self, data: &[u8], more: bool) -> Attempt<()> {
        let flags = if more {
            zmq::DONTWAIT | zmq::SNDMORE
        } else {
            zmq::DONTWAIT
        };
        self.socket.send(data, flags).into()
    }

    fn try_recv(&self) -> Attempt<Frame> {
        let mut msg = zmq::Message::new();
        match self.socket.recv(&mut msg, zmq::DONTWAIT) {
            Ok(()) => Attempt::Done(Frame {
                data: Bytes::copy_from_slice(&msg),
                more: msg.get_more(),
            }),
            Err(zmq::Error::EAGAIN) => Attempt::WouldBlock,
            Err(err) => Attempt::Failed(err),
        }
    }

    fn readiness(&self) -> Result<Readiness, zmq::Error> {
        let events = self.socket.get_events()?;
        let mut readiness = Readiness::NONE;
        if events.contains(zmq::POLLIN) {
            readiness = readiness | Readiness::READABLE;
        }
        if events.contains(zmq::POLLOUT) {
            readiness = readiness | Readiness::WRITABLE;
        }
        Ok(readiness)
    }
}
