//! Cooperative task identity.
//!
//! Rust futures carry no notion of "which task am I", but reentrant locking
//! needs one. A task gets an identity by being wrapped in [`scoped`]: every
//! poll of the wrapped future publishes its [`TaskId`] in a thread-local so
//! code running inside can read it with [`TaskId::current`].
//!
//! Scopes nest: an inner scope shadows the outer one for the duration of its
//! own poll and restores it afterwards.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

thread_local! {
    static CURRENT: Cell<Option<TaskId>> = const { Cell::new(None) };
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

/// Identity of a cooperative task on the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    /// Allocate a fresh identity, unique on this thread.
    #[must_use]
    pub fn next() -> Self {
        NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            Self(id)
        })
    }

    /// Identity of the task currently being polled.
    ///
    /// Outside of any [`scoped`] future every call returns a fresh anonymous
    /// identity, so such callers never count as reentrant.
    #[must_use]
    pub fn current() -> Self {
        Self::try_current().unwrap_or_else(Self::next)
    }

    /// Identity of the enclosing scope, if any.
    #[must_use]
    pub fn try_current() -> Option<Self> {
        CURRENT.with(Cell::get)
    }

    /// Build an identity from a raw value (tests and diagnostics).
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Future wrapper that runs its inner future under a fixed [`TaskId`].
pub struct Scoped<F> {
    id: TaskId,
    future: Pin<Box<F>>,
}

impl<F> Scoped<F> {
    /// Identity published while the inner future is polled.
    pub const fn id(&self) -> TaskId {
        self.id
    }
}

impl<F: Future> Future for Scoped<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let _enter = Enter::new(this.id);
        this.future.as_mut().poll(cx)
    }
}

/// Give `future` a fresh task identity.
pub fn scoped<F: Future>(future: F) -> Scoped<F> {
    Scoped {
        id: TaskId::next(),
        future: Box::pin(future),
    }
}

/// Restores the previous identity when the poll returns or unwinds.
struct Enter {
    prev: Option<TaskId>,
}

impl Enter {
    fn new(id: TaskId) -> Self {
        let prev = CURRENT.with(|current| current.replace(Some(id)));
        Self { prev }
    }
}

impl Drop for Enter {
    fn drop(&mut self) {
        CURRENT.with(|current| current.set(self.prev));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_anonymous_ids_are_fresh() {
        assert_eq!(TaskId::try_current(), None);
        assert_ne!(TaskId::current(), TaskId::current());
    }

    #[test]
    fn test_scope_is_stable_across_calls() {
        let fut = scoped(async { (TaskId::current(), TaskId::current()) });
        let id = fut.id();
        let (a, b) = block_on(fut);
        assert_eq!(a, id);
        assert_eq!(b, id);
        assert_eq!(TaskId::try_current(), None);
    }

    #[test]
    fn test_nested_scope_restores_outer() {
        let (outer, inner, after) = block_on(scoped(async {
            let outer = TaskId::current();
            let inner = scoped(async { TaskId::current() }).await;
            (outer, inner, TaskId::current())
        }));
        assert_ne!(outer, inner);
        assert_eq!(outer, after);
    }
}
