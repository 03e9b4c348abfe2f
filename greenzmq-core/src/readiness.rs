//! Operation directions and the readiness bitmask.

use std::fmt;
use std::ops::BitOr;

/// Direction of a socket operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Send,
    Recv,
}

impl Direction {
    /// The other direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Send => Self::Recv,
            Self::Recv => Self::Send,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Recv => "recv",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Edge-triggered readiness reported by the messaging library.
///
/// Only ever obtained as a side effect of send, receive or an explicit
/// readiness query; it is never polled on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Readiness(u8);

impl Readiness {
    pub const NONE: Self = Self(0);
    /// A message can be received without blocking (POLLIN)
    pub const READABLE: Self = Self(0b01);
    /// A message can be sent without blocking (POLLOUT)
    pub const WRITABLE: Self = Self(0b10);

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether an operation in `direction` may proceed.
    #[must_use]
    pub const fn allows(self, direction: Direction) -> bool {
        match direction {
            Direction::Send => self.contains(Self::WRITABLE),
            Direction::Recv => self.contains(Self::READABLE),
        }
    }
}

impl BitOr for Readiness {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
