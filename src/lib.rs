//! weak-collections: thread-safe containers that hold weak references
//! and forget entries whose referents have been dropped.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: observer lists, caches and associative maps that never extend
//!   the lifetime of the objects they track.
//! - Layers:
//!   - `refs`: the `StrongRef`/`WeakRef` pair the containers are generic
//!     over (`Arc`/`sync::Weak` and `Rc`/`rc::Weak`).
//!   - `slot`: `WeakSlot`, one weak reference; `WeakKey`, a slot plus a
//!     hash cached at insertion so a dead key stays indexable.
//!   - `HandleTable<K, V>`: structural hash table of generational handles
//!     over caller-supplied, stored hashes.
//!   - `PurgeLock<T>`: per-container mutex whose acquisition purges dead
//!     entries first; with a debug-only reentrancy guard.
//!   - Public containers: `WeakSequence`, `WeakValueMap`, `WeakKeyMap`
//!     and `WeakDictionary`.
//!
//! Constraints
//! - Containers never own referents; ownership stays with the caller.
//! - Purge is lazy: dead entries linger until the next operation on the
//!   container, which removes them before doing anything else.
//! - Purge and the requested operation run under one lock acquisition,
//!   so no thread observes a state between the two.
//! - Absence (dead referent, missing key) is `None`, never an error.
//!
//! Identity
//! - Weak keys and sequence deduplication compare allocation addresses.
//!   A weak pointer keeps its allocation alive, so a stored address is
//!   never reused by another object while the entry exists.
//! - Two distinct dead `WeakKey`s are never equal; a key is only equal to
//!   itself once its referent is gone.
//! - `WeakValueMap` keys are owned and compare by value. The asymmetry
//!   follows which side is held weakly.
//!
//! Reentrancy policy
//! - Each container's lock is not reentrant. `WeakSequence::for_each`
//!   runs its visitor under the lock, so the visitor must not call back
//!   into the same container. Debug builds panic on such a call; release
//!   builds deadlock.
//! - Entries removed by a purge are dropped only after the lock is
//!   released, so `Drop` of keys and values may use the container.
//!
//! Ordering
//! - `WeakSequence` yields survivors in insertion order. Map `keys`,
//!   `values` and `entries` come in unspecified order.
//!
//! Notes and non-goals
//! - Not a general concurrent hash map: one mutex per container.
//! - `Index`/`IndexMut` are not implemented; `get`/`set` are the
//!   subscript forms since results are owned `Option`s.

mod handle_table;
#[cfg(test)]
mod handle_table_proptest;
mod reentrancy;
pub mod refs;
pub mod slot;
mod sync;
pub mod weak_dictionary;
pub mod weak_key_map;
pub mod weak_sequence;
pub mod weak_value_map;

// Public surface
pub use refs::{StrongRef, WeakRef};
pub use slot::{WeakKey, WeakSlot};
pub use weak_dictionary::{WeakDictionary, WeakRelation};
pub use weak_key_map::WeakKeyMap;
pub use weak_sequence::WeakSequence;
pub use weak_value_map::WeakValueMap;
