//! Per-call send/recv flags.

use std::ops::BitOr;

/// Flags accepted by [`GreenSocket`](crate::GreenSocket) operations.
///
/// Same bit values as libzmq, so they can be passed through unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(i32);

impl Flags {
    pub const NONE: Self = Self(0);
    /// Never suspend; would-block surfaces as `EAGAIN`
    pub const DONTWAIT: Self = Self(zmq::DONTWAIT);
    /// More parts of the same message follow
    pub const SNDMORE: Self = Self(zmq::SNDMORE);

    pub const fn from_bits(bits: i32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> i32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}
