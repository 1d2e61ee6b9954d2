//! Leaf wrappers around a single weak reference.

use crate::refs::{StrongRef, WeakRef};
use core::fmt;
use core::hash::{Hash, Hasher};

/// Holds a non-owning reference to exactly one referent.
///
/// Slots are immutable once created. Querying a dead slot is not an
/// error; it is the expected steady state until the next purge.
pub struct WeakSlot<W> {
    weak: W,
}

impl<W: WeakRef> WeakSlot<W> {
    pub fn new(strong: &W::Strong) -> Self {
        Self {
            weak: <W::Strong as StrongRef>::downgrade(strong),
        }
    }

    /// The referent, if it is still alive.
    #[inline]
    pub fn get(&self) -> Option<W::Strong> {
        self.weak.upgrade()
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.weak.is_expired()
    }

    /// Identity check against a live referent.
    #[inline]
    pub fn refers_to(&self, strong: &W::Strong) -> bool {
        self.weak.addr() == <W::Strong as StrongRef>::addr(strong)
    }

    #[inline]
    pub(crate) fn addr(&self) -> *const () {
        self.weak.addr()
    }
}

impl<W> fmt::Debug for WeakSlot<W>
where
    W: WeakRef,
    W::Strong: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(strong) => fmt::Debug::fmt(&strong, f),
            None => f.write_str("nil"),
        }
    }
}

/// A weakly held map key: the slot plus the hash of the referent's
/// address, computed once at insertion.
///
/// The cached hash keeps the key hashable after its referent is gone.
/// Equality is identity: a wrapper always equals itself, and two
/// distinct wrappers are equal iff both referents are alive and share
/// an address. Two distinct dead wrappers are never equal.
pub struct WeakKey<W> {
    slot: WeakSlot<W>,
    hash: u64,
}

impl<W: WeakRef> WeakKey<W> {
    pub fn new(strong: &W::Strong, hash: u64) -> Self {
        Self {
            slot: WeakSlot::new(strong),
            hash,
        }
    }

    #[inline]
    pub fn get(&self) -> Option<W::Strong> {
        self.slot.get()
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.slot.is_alive()
    }

    /// Identity match against a probe. A dead key matches nothing.
    #[inline]
    pub fn matches(&self, strong: &W::Strong) -> bool {
        self.slot.is_alive() && self.slot.refers_to(strong)
    }

    #[inline]
    pub fn cached_hash(&self) -> u64 {
        self.hash
    }
}

impl<W: WeakRef> PartialEq for WeakKey<W> {
    fn eq(&self, other: &Self) -> bool {
        if core::ptr::eq(self, other) {
            return true;
        }
        self.slot.is_alive() && other.slot.is_alive() && self.slot.addr() == other.slot.addr()
    }
}

impl<W: WeakRef> Eq for WeakKey<W> {}

impl<W> Hash for WeakKey<W> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl<W> fmt::Debug for WeakKey<W>
where
    W: WeakRef,
    W::Strong: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.slot, f)
    }
}
