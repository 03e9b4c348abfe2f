//! Per-kind dispatch profiles.
//!
//! Each socket kind maps, once and for all, to a strategy per direction:
//!
//! | kinds                                    | send        | recv        |
//! |------------------------------------------|-------------|-------------|
//! | PUB, PUSH                                | Locked      | Unsupported |
//! | SUB, PULL                                | Unsupported | Locked      |
//! | PAIR, DEALER, ROUTER, XPUB, XSUB, STREAM | Locked      | Locked      |
//! | REQ, REP                                 | LockFree    | LockFree    |
//!
//! REQ/REP need no lock: libzmq enforces strict send/recv alternation, so at
//! most one task can legitimately be inside each direction.

use greenzmq_core::Direction;

use crate::socket_kind::SocketKind;

/// How operations in one direction are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serialize callers through a `FairLock`; always-wake the other direction
    Locked,
    /// No lock; explicit readiness check to wake the other direction
    LockFree,
    /// Direction not permitted for this kind
    Unsupported,
}

/// Strategy pair selected for a socket kind.
#[derive(Debug, PartialEq, Eq)]
pub struct Dispatch {
    pub send: Strategy,
    pub recv: Strategy,
}

static SEND_ONLY: Dispatch = Dispatch {
    send: Strategy::Locked,
    recv: Strategy::Unsupported,
};

static RECV_ONLY: Dispatch = Dispatch {
    send: Strategy::Unsupported,
    recv: Strategy::Locked,
};

static DUPLEX: Dispatch = Dispatch {
    send: Strategy::Locked,
    recv: Strategy::Locked,
};

static LOCKSTEP: Dispatch = Dispatch {
    send: Strategy::LockFree,
    recv: Strategy::LockFree,
};

impl Dispatch {
    /// Profile for `kind`.
    pub fn for_kind(kind: SocketKind) -> &'static Self {
        match kind {
            SocketKind::Pub | SocketKind::Push => &SEND_ONLY,
            SocketKind::Sub | SocketKind::Pull => &RECV_ONLY,
            SocketKind::Req | SocketKind::Rep => &LOCKSTEP,
            SocketKind::Pair
            | SocketKind::Dealer
            | SocketKind::Router
            | SocketKind::XPub
            | SocketKind::XSub
            | SocketKind::Stream => &DUPLEX,
        }
    }

    pub const fn strategy(&self, direction: Direction) -> Strategy {
        match direction {
            Direction::Send => self.send,
            Direction::Recv => self.recv,
        }
    }
}
