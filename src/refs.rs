//! Strong/weak pointer pairs the containers are generic over.
//!
//! A container never owns its referents. It stores the weak half of a
//! pair and hands out the strong half after a successful upgrade.
//! Identity is the address of the shared allocation: a weak pointer
//! keeps the allocation (not the value) alive, so an address held by a
//! container cannot be reused by another object while it is stored.

use std::rc::{self, Rc};
use std::sync::{self, Arc};

/// An owning, reference-counted pointer.
pub trait StrongRef: Clone {
    /// The non-owning counterpart of this pointer.
    type Weak: WeakRef<Strong = Self>;

    /// Create a non-owning pointer to the same allocation.
    fn downgrade(this: &Self) -> Self::Weak;

    /// Address of the shared allocation, with any metadata stripped.
    fn addr(this: &Self) -> *const ();

    /// Identity comparison: true iff both point into the same allocation.
    #[inline]
    fn ptr_eq(this: &Self, other: &Self) -> bool {
        Self::addr(this) == Self::addr(other)
    }
}

/// A non-owning pointer whose liveness can be queried.
pub trait WeakRef {
    /// The owning counterpart of this pointer.
    type Strong: StrongRef<Weak = Self>;

    /// Obtain an owning pointer if the referent is still alive.
    fn upgrade(&self) -> Option<Self::Strong>;

    /// True once the last owning pointer has been dropped.
    fn is_expired(&self) -> bool;

    /// Address of the shared allocation. Stays valid after expiry.
    fn addr(&self) -> *const ();
}

impl<T: ?Sized> StrongRef for Arc<T> {
    type Weak = sync::Weak<T>;

    #[inline]
    fn downgrade(this: &Self) -> Self::Weak {
        Arc::downgrade(this)
    }

    #[inline]
    fn addr(this: &Self) -> *const () {
        Arc::as_ptr(this) as *const ()
    }
}

impl<T: ?Sized> WeakRef for sync::Weak<T> {
    type Strong = Arc<T>;

    #[inline]
    fn upgrade(&self) -> Option<Self::Strong> {
        sync::Weak::upgrade(self)
    }

    #[inline]
    fn is_expired(&self) -> bool {
        self.strong_count() == 0
    }

    #[inline]
    fn addr(&self) -> *const () {
        self.as_ptr() as *const ()
    }
}

impl<T: ?Sized> StrongRef for Rc<T> {
    type Weak = rc::Weak<T>;

    #[inline]
    fn downgrade(this: &Self) -> Self::Weak {
        Rc::downgrade(this)
    }

    #[inline]
    fn addr(this: &Self) -> *const () {
        Rc::as_ptr(this) as *const ()
    }
}

impl<T: ?Sized> WeakRef for rc::Weak<T> {
    type Strong = Rc<T>;

    #[inline]
    fn upgrade(&self) -> Option<Self::Strong> {
        rc::Weak::upgrade(self)
    }

    #[inline]
    fn is_expired(&self) -> bool {
        self.strong_count() == 0
    }

    #[inline]
    fn addr(&self) -> *const () {
        self.as_ptr() as *const ()
    }
}
