//! Socket kind enumeration for ZeroMQ messaging patterns.
//!
//! The kind only matters here for picking a dispatch profile at
//! construction; its messaging semantics belong to libzmq.

use std::fmt;

/// ZeroMQ socket kinds.
///
/// Corresponds to the ZMQ_TYPE socket option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketKind {
    /// PAIR socket for exclusive bidirectional communication
    Pair = 0,

    /// PUB socket for publishing messages to subscribers
    Pub = 1,

    /// SUB socket for subscribing to published messages
    Sub = 2,

    /// REQ socket for synchronous request-reply client
    Req = 3,

    /// REP socket for synchronous request-reply server
    Rep = 4,

    /// DEALER socket for asynchronous request-reply patterns
    Dealer = 5,

    /// ROUTER socket for routing messages by identity
    Router = 6,

    /// PULL socket for receiving messages from pushers
    Pull = 7,

    /// PUSH socket for sending messages to pullers
    Push = 8,

    /// XPUB socket for extended publisher with subscription awareness
    XPub = 9,

    /// XSUB socket for extended subscriber with dynamic subscriptions
    XSub = 10,

    /// STREAM socket for raw TCP peers
    Stream = 11,
}

impl SocketKind {
    /// Get the socket kind as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "PAIR",
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::Dealer => "DEALER",
            Self::Router => "ROUTER",
            Self::Pull => "PULL",
            Self::Push => "PUSH",
            Self::XPub => "XPUB",
            Self::XSub => "XSUB",
            Self::Stream => "STREAM",
        }
    }

    /// All kinds, in ZMQ_TYPE order.
    pub const ALL: [Self; 12] = [
        Self::Pair,
        Self::Pub,
        Self::Sub,
        Self::Req,
        Self::Rep,
        Self::Dealer,
        Self::Router,
        Self::Pull,
        Self::Push,
        Self::XPub,
        Self::XSub,
        Self::Stream,
    ];
}

impl fmt::Display for SocketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<zmq::SocketType> for SocketKind {
    fn from(ty: zmq::SocketType) -> Self {
        match ty {
            zmq::SocketType::PAIR => Self::Pair,
            zmq::SocketType::PUB => Self::Pub,
            zmq::SocketType::SUB => Self::Sub,
            zmq::SocketType::REQ => Self::Req,
            zmq::SocketType::REP => Self::Rep,
            zmq::SocketType::DEALER => Self::Dealer,
            zmq::SocketType::ROUTER => Self::Router,
            zmq::SocketType::PULL => Self::Pull,
            zmq::SocketType::PUSH => Self::Push,
            zmq::SocketType::XPUB => Self::XPub,
            zmq::SocketType::XSUB => Self::XSub,
            zmq::SocketType::STREAM => Self::Stream,
        }
    }
}

impl From<SocketKind> for zmq::SocketType {
    fn from(kind: SocketKind) -> Self {
        match kind {
            SocketKind::Pair => Self::PAIR,
            SocketKind::Pub => Self::PUB,
            SocketKind::Sub => Self::SUB,
            SocketKind::Req => Self::REQ,
            SocketKind::Rep => Self::REP,
            SocketKind::Dealer => Self::DEALER,
            SocketKind::Router => Self::ROUTER,
            SocketKind::Pull => Self::PULL,
            SocketKind::Push => Self::PUSH,
            SocketKind::XPub => Self::XPUB,
            SocketKind::XSub => Self::XSUB,
            SocketKind::Stream => Self::STREAM,
        }
    }
}
