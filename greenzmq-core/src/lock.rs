//! `FairLock`: reentrant FIFO mutex for cooperative tasks.
//!
//! Same-direction operations on a shared socket must complete in caller
//! order, so the lock never lets a newcomer barge past queued tasks:
//!
//! - `acquire()` succeeds immediately only when the lock is free with an empty
//!   queue, or when the calling task already holds it (reentrant).
//! - `release()` at count zero *schedules* the head of the queue; the head
//!   takes ownership itself when it next runs.
//! - Reentrancy is keyed on [`TaskId`], not on call depth.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use tracing::{debug, error, trace};

use crate::error::{Result, SyncError};
use crate::hub::Hub;
use crate::task::TaskId;

struct Waiter {
    ticket: u64,
    task: TaskId,
    waker: Waker,
}

#[derive(Default)]
struct LockState {
    waiters: VecDeque<Waiter>,
    count: usize,
    holder: Option<TaskId>,
    /// Ticket of the head waiter that `release()` has woken
    scheduled: Option<u64>,
    next_ticket: u64,
}

impl LockState {
    fn try_take(&mut self, task: TaskId) -> bool {
        let reentrant = self.count > 0 && self.holder == Some(task);
        let free = self.count == 0 && self.waiters.is_empty();
        if reentrant || free {
            self.holder = Some(task);
            self.count += 1;
            true
        } else {
            false
        }
    }

    fn schedule_head(&mut self) {
        if let Some(head) = self.waiters.front() {
            trace!(task = %head.task, "scheduling next lock holder");
            self.scheduled = Some(head.ticket);
            head.waker.wake_by_ref();
        }
    }
}

/// Reentrant, strictly FIFO lock over cooperative tasks.
pub struct FairLock {
    hub: Rc<dyn Hub>,
    state: RefCell<LockState>,
}

impl FairLock {
    pub fn new(hub: Rc<dyn Hub>) -> Self {
        Self {
            hub,
            state: RefCell::new(LockState::default()),
        }
    }

    /// Wait until the current task is the sole holder.
    ///
    /// Resolves immediately if the current task already holds the lock.
    pub fn acquire(&self) -> Acquire<'_> {
        Acquire {
            lock: self,
            task: None,
            ticket: None,
            done: false,
        }
    }

    /// Take the lock without suspending.
    ///
    /// Returns `false` if taking it now would require queueing.
    pub fn try_acquire(&self) -> bool {
        let task = self.hub.current_task();
        self.state.borrow_mut().try_take(task)
    }

    /// Drop one level of ownership.
    ///
    /// # Errors
    ///
    /// [`SyncError::LockMisuse`] if the lock is not held.
    pub fn release(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.count == 0 {
            return Err(SyncError::LockMisuse);
        }
        state.count -= 1;
        if state.count == 0 {
            state.holder = None;
            state.schedule_head();
        }
        Ok(())
    }

    /// Acquire and return a guard that releases on drop.
    pub async fn lock(&self) -> Result<FairLockGuard<'_>> {
        self.acquire().await?;
        Ok(FairLockGuard { lock: self })
    }

    /// Guard-returning variant of [`try_acquire`](Self::try_acquire).
    pub fn try_lock(&self) -> Option<FairLockGuard<'_>> {
        self.try_acquire().then_some(FairLockGuard { lock: self })
    }

    /// Current hold count (0 when free)
    pub fn count(&self) -> usize {
        self.state.borrow().count
    }

    pub fn holder(&self) -> Option<TaskId> {
        self.state.borrow().holder
    }

    /// Number of queued tasks
    pub fn waiters(&self) -> usize {
        self.state.borrow().waiters.len()
    }

    pub fn is_locked(&self) -> bool {
        self.count() > 0
    }
}

/// Future returned by [`FairLock::acquire`].
///
/// Dropping it while queued removes the waiter; if the waiter had already
/// been scheduled the next one in line is scheduled instead.
pub struct Acquire<'a> {
    lock: &'a FairLock,
    task: Option<TaskId>,
    ticket: Option<u64>,
    done: bool,
}

impl Future for Acquire<'_> {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        let mut state = this.lock.state.borrow_mut();

        let (Some(ticket), Some(task)) = (this.ticket, this.task) else {
            let task = this.lock.hub.current_task();
            if state.try_take(task) {
                this.done = true;
                return Poll::Ready(Ok(()));
            }
            let ticket = state.next_ticket;
            state.next_ticket += 1;
            state.waiters.push_back(Waiter {
                ticket,
                task,
                waker: cx.waker().clone(),
            });
            debug!(%task, queued = state.waiters.len(), "lock contended, queueing");
            this.ticket = Some(ticket);
            this.task = Some(task);
            return Poll::Pending;
        };

        if state.scheduled != Some(ticket) {
            if let Some(waiter) = state.waiters.iter_mut().find(|w| w.ticket == ticket) {
                waiter.waker.clone_from(cx.waker());
            }
            return Poll::Pending;
        }
        state.scheduled = None;

        match state.waiters.front() {
            Some(head) if head.ticket == ticket => {}
            head => {
                return Poll::Ready(Err(SyncError::WokenOutOfOrder {
                    woken: task,
                    head: head.map_or(task, |w| w.task),
                }));
            }
        }
        if state.count != 0 {
            return Poll::Ready(Err(SyncError::HeldAfterWake { count: state.count }));
        }

        state.waiters.pop_front();
        state.holder = Some(task);
        state.count = 1;
        this.done = true;
        Poll::Ready(Ok(()))
    }
}

impl Drop for Acquire<'_> {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket else { return };
        if self.done {
            return;
        }
        let mut state = self.lock.state.borrow_mut();
        state.waiters.retain(|w| w.ticket != ticket);
        if state.scheduled == Some(ticket) {
            state.scheduled = None;
            if state.count == 0 {
                state.schedule_head();
            }
        }
    }
}

/// RAII holder returned by [`FairLock::lock`].
pub struct FairLockGuard<'a> {
    lock: &'a FairLock,
}

impl Drop for FairLockGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.lock.release() {
            error!(%err, "fair lock guard released an unheld lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readiness::Direction;
    use crate::task::scoped;
    use async_trait::async_trait;
    use futures::channel::oneshot;
    use futures::executor::LocalPool;
    use futures::task::{noop_waker_ref, LocalSpawnExt};
    use std::io;
    use std::os::fd::RawFd;

    struct NoIo;

    #[async_trait(?Send)]
    impl Hub for NoIo {
        async fn wait(&self, _fd: RawFd, _direction: Direction) -> io::Result<()> {
            Ok(())
        }
    }

    fn new_lock() -> Rc<FairLock> {
        Rc::new(FairLock::new(Rc::new(NoIo)))
    }

    #[test]
    fn test_release_unacquired_is_misuse() {
        let lock = new_lock();
        assert_eq!(lock.release(), Err(SyncError::LockMisuse));
    }

    #[test]
    fn test_nested_acquire_counts_symmetrically() {
        let lock = new_lock();
        let mut pool = LocalPool::new();
        let l = lock.clone();
        pool.run_until(scoped(async move {
            l.acquire().await.unwrap();
            l.acquire().await.unwrap();
            assert_eq!(l.count(), 2);
            l.release().unwrap();
            assert_eq!(l.count(), 1);
            assert!(l.is_locked());
            l.release().unwrap();
            assert_eq!(l.count(), 0);
            assert_eq!(l.holder(), None);
            assert_eq!(l.release(), Err(SyncError::LockMisuse));
        }));
    }

    #[test]
    fn test_reentrant_holder_blocks_other_task_until_fully_released() {
        let lock = new_lock();
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        let (first_tx, first_rx) = oneshot::channel::<()>();
        let (second_tx, second_rx) = oneshot::channel::<()>();
        let acquired = Rc::new(RefCell::new(false));

        let l = lock.clone();
        spawner
            .spawn_local(scoped(async move {
                l.acquire().await.unwrap();
                l.acquire().await.unwrap();
                first_rx.await.unwrap();
                l.release().unwrap();
                second_rx.await.unwrap();
                l.release().unwrap();
            }))
            .unwrap();

        let l = lock.clone();
        let flag = acquired.clone();
        spawner
            .spawn_local(scoped(async move {
                l.acquire().await.unwrap();
                *flag.borrow_mut() = true;
                l.release().unwrap();
            }))
            .unwrap();

        pool.run_until_stalled();
        assert_eq!(lock.count(), 2);
        assert_eq!(lock.waiters(), 1);
        assert!(!*acquired.borrow());

        first_tx.send(()).unwrap();
        pool.run_until_stalled();
        assert_eq!(lock.count(), 1);
        assert!(!*acquired.borrow());

        second_tx.send(()).unwrap();
        pool.run_until_stalled();
        assert!(*acquired.borrow());
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_fifo_order_without_barging() {
        let lock = new_lock();
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();
        let order = Rc::new(RefCell::new(Vec::new()));
        let (tx, rx) = oneshot::channel::<()>();

        let l = lock.clone();
        let log = order.clone();
        spawner
            .spawn_local(scoped(async move {
                l.acquire().await.unwrap();
                rx.await.unwrap();
                l.release().unwrap();
                // Freed lock with a non-empty queue: must line up behind everyone.
                l.acquire().await.unwrap();
                log.borrow_mut().push(0);
                l.release().unwrap();
            }))
            .unwrap();

        for i in 1..=5 {
            let l = lock.clone();
            let log = order.clone();
            spawner
                .spawn_local(scoped(async move {
                    l.acquire().await.unwrap();
                    log.borrow_mut().push(i);
                    l.release().unwrap();
                }))
                .unwrap();
        }

        pool.run_until_stalled();
        assert_eq!(lock.waiters(), 5);
        tx.send(()).unwrap();
        pool.run_until_stalled();
        assert_eq!(*order.borrow(), vec![1, 2, 3, 4, 5, 0]);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_dropped_scheduled_waiter_passes_turn_on() {
        let lock = new_lock();
        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(lock.try_acquire());

        let mut first = Box::pin(lock.acquire());
        let mut second = Box::pin(lock.acquire());
        assert!(first.as_mut().poll(&mut cx).is_pending());
        assert!(second.as_mut().poll(&mut cx).is_pending());
        assert_eq!(lock.waiters(), 2);

        lock.release().unwrap();
        drop(first);
        assert_eq!(lock.waiters(), 1);
        assert_eq!(second.as_mut().poll(&mut cx), Poll::Ready(Ok(())));
        assert_eq!(lock.count(), 1);
        assert_eq!(lock.waiters(), 0);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let lock = new_lock();
        let mut pool = LocalPool::new();
        let l = lock.clone();
        pool.run_until(scoped(async move {
            let guard = l.lock().await.unwrap();
            assert_eq!(l.count(), 1);
            drop(guard);
            assert_eq!(l.count(), 0);
        }));
    }
}
