//! Debug-only reentrancy guard.
//!
//! Detects a thread re-entering a container whose lock it already
//! holds, typically from inside a `for_each` visitor. In debug builds
//! such a nested entry panics instead of deadlocking on the
//! non-reentrant mutex. In release builds this compiles to a zero-cost
//! no-op and the nested entry deadlocks.

#[cfg(debug_assertions)]
use core::sync::atomic::{AtomicUsize, Ordering};
use core::marker::PhantomData;

#[cfg(debug_assertions)]
static NEXT_THREAD_TOKEN: AtomicUsize = AtomicUsize::new(1);

#[cfg(debug_assertions)]
thread_local! {
    static THREAD_TOKEN: usize = NEXT_THREAD_TOKEN.fetch_add(1, Ordering::Relaxed);
}

#[cfg(debug_assertions)]
fn current_thread_token() -> usize {
    THREAD_TOKEN.with(|t| *t)
}

/// Per-instance owner tracker. Embed next to the lock it guards: call
/// `check` before acquiring the lock and `enter` once it is held.
#[derive(Debug)]
pub struct DebugReentrancy {
    // Token of the thread currently holding the lock, 0 when free.
    #[cfg(debug_assertions)]
    owner: AtomicUsize,
}

impl DebugReentrancy {
    /// Create a new tracker. Const so it can be a field default.
    pub const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            owner: AtomicUsize::new(0),
        }
    }

    /// In debug builds, panics if the calling thread already holds the
    /// guarded lock.
    #[inline]
    pub fn check(&self) {
        #[cfg(debug_assertions)]
        {
            let me = current_thread_token();
            assert!(
                self.owner.load(Ordering::Acquire) != me,
                "reentrancy detected: nested entry into weak container"
            );
        }
    }

    /// Record the calling thread as the lock holder until the returned
    /// guard is dropped. Only call this with the lock held.
    #[inline]
    pub fn enter(&self) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            self.owner.store(current_thread_token(), Ordering::Release);
            return ReentrancyGuard {
                owner: self,
                _lt: PhantomData,
            };
        }

        #[cfg(not(debug_assertions))]
        {
            return ReentrancyGuard { _lt: PhantomData };
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard returned by `DebugReentrancy::enter`.
pub struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    _lt: PhantomData<&'a ()>,
}

impl<'a> Drop for ReentrancyGuard<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            self.owner.owner.store(0, Ordering::Release);
        }
    }
}
