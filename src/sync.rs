//! Purge-then-act locking shared by every container.
//!
//! Each container owns one `PurgeLock` around its storage. Acquiring it
//! runs the purge pass and yields a guard, so the purge and the
//! operation that follows are one critical section: no other thread can
//! slip in between a purge and the read or write it precedes.
//!
//! Entries removed by the purge are parked in the guard and dropped
//! only after the mutex is released. Dropping a key or value may run
//! arbitrary user code, which must never happen with the lock held.

use crate::reentrancy::{DebugReentrancy, ReentrancyGuard};
use core::ops::{Deref, DerefMut};
use parking_lot::{Mutex, MutexGuard};

/// Storage that can sweep out entries whose referents are gone.
pub(crate) trait Purge {
    /// What a purge removes; dropped once the lock is released.
    type Expired;

    /// Remove every expired entry and return what was removed.
    fn purge(&mut self) -> Vec<Self::Expired>;

    /// Number of entries currently stored, live or not.
    fn stored(&self) -> usize;
}

pub(crate) struct PurgeLock<T> {
    state: Mutex<T>,
    reentrancy: DebugReentrancy,
}

impl<T: Purge> PurgeLock<T> {
    pub fn new(state: T) -> Self {
        Self {
            state: Mutex::new(state),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Acquire the lock and purge before handing out the storage.
    pub fn lock(&self) -> Locked<'_, T> {
        let mut locked = self.lock_unpurged();
        let expired = locked.state.purge();
        if !expired.is_empty() {
            tracing::trace!(
                removed = expired.len(),
                remaining = locked.state.stored(),
                "purged expired entries"
            );
        }
        locked.expired = expired;
        locked
    }

    /// Acquire the lock without purging. Only diagnostics use this, to
    /// render dead entries.
    pub fn lock_unpurged(&self) -> Locked<'_, T> {
        self.reentrancy.check();
        let state = self.state.lock();
        let reentry = self.reentrancy.enter();
        Locked {
            _reentry: reentry,
            state,
            expired: Vec::new(),
        }
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.state.get_mut()
    }
}

/// Exclusive access to purged storage.
// Field order is drop order: the owner mark is cleared, then the mutex
// is released, then the expired entries are dropped.
pub(crate) struct Locked<'a, T: Purge> {
    _reentry: ReentrancyGuard<'a>,
    state: MutexGuard<'a, T>,
    expired: Vec<T::Expired>,
}

impl<'a, T: Purge> Locked<'a, T> {
    /// How many entries the purge for this acquisition removed.
    pub fn purged(&self) -> usize {
        self.expired.len()
    }
}

impl<'a, T: Purge> Deref for Locked<'a, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.state
    }
}

impl<'a, T: Purge> DerefMut for Locked<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.state
    }
}
