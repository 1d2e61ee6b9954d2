//! WeakSequence: an ordered, identity-deduplicated list of weak references.

use crate::refs::WeakRef;
use crate::slot::WeakSlot;
use crate::sync::{Purge, PurgeLock};
use core::fmt;

struct Entry<W> {
    // Insertion id, strictly increasing along `entries`.
    id: u64,
    slot: WeakSlot<W>,
}

struct SequenceState<W> {
    entries: Vec<Entry<W>>,
    next_id: u64,
}

impl<W: WeakRef> SequenceState<W> {
    fn push(&mut self, object: &W::Strong) {
        self.next_id += 1;
        self.entries.push(Entry {
            id: self.next_id,
            slot: WeakSlot::new(object),
        });
    }

    fn position(&self, strong: &W::Strong) -> Option<usize> {
        self.entries.iter().position(|e| e.slot.refers_to(strong))
    }

    /// Index of the first entry inserted after `id`.
    fn first_after(&self, id: u64) -> usize {
        self.entries.partition_point(|e| e.id <= id)
    }
}

impl<W: WeakRef> Purge for SequenceState<W> {
    type Expired = WeakSlot<W>;

    fn purge(&mut self) -> Vec<WeakSlot<W>> {
        if self.entries.iter().all(|e| e.slot.is_alive()) {
            return Vec::new();
        }
        let mut expired = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if entry.slot.is_alive() {
                kept.push(entry);
            } else {
                expired.push(entry.slot);
            }
        }
        self.entries = kept;
        expired
    }

    fn stored(&self) -> usize {
        self.entries.len()
    }
}

/// An ordered collection of weak references, deduplicated by identity.
///
/// Every operation purges dead slots and then acts, both under the same
/// lock acquisition. Survivors keep their insertion order.
///
/// The visitor passed to [`for_each`](Self::for_each) runs with the lock
/// held and must not call back into the same sequence. Debug builds
/// panic on such a nested call; release builds deadlock.
///
/// ```
/// use std::sync::{Arc, Weak};
/// use weak_collections::WeakSequence;
///
/// let observers: WeakSequence<Weak<String>> = WeakSequence::new();
/// let a = Arc::new("a".to_string());
/// observers.add(&a);
/// assert_eq!(observers.len(), 1);
/// drop(a);
/// assert!(observers.is_empty());
/// ```
pub struct WeakSequence<W> {
    state: PurgeLock<SequenceState<W>>,
}

impl<W: WeakRef> Default for WeakSequence<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: WeakRef> WeakSequence<W> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: PurgeLock::new(SequenceState {
                entries: Vec::with_capacity(capacity),
                next_id: 0,
            }),
        }
    }

    /// A sequence holding just `first`.
    pub fn with(first: &W::Strong) -> Self {
        let seq = Self::new();
        seq.add(first);
        seq
    }

    /// Append a weak reference to `object` unless it is already present.
    /// Returns true if a new slot was added.
    pub fn add(&self, object: &W::Strong) -> bool {
        let mut state = self.state.lock();
        if state.position(object).is_some() {
            return false;
        }
        state.push(object);
        true
    }

    /// Remove `object` if present, returning it.
    pub fn remove(&self, object: &W::Strong) -> Option<W::Strong> {
        let mut state = self.state.lock();
        let index = state.position(object)?;
        state.entries.remove(index).slot.get()
    }

    pub fn contains(&self, object: &W::Strong) -> bool {
        self.state.lock().position(object).is_some()
    }

    /// Call `visit` on every live referent in order. The first error stops
    /// the traversal and is returned.
    pub fn for_each<E, F>(&self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(W::Strong) -> Result<(), E>,
    {
        let state = self.state.lock();
        for entry in state.entries.iter() {
            if let Some(object) = entry.slot.get() {
                visit(object)?;
            }
        }
        Ok(())
    }

    /// Number of live referents.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The live referents, in order.
    pub fn to_vec(&self) -> Vec<W::Strong> {
        self.state
            .lock()
            .entries
            .iter()
            .filter_map(|e| e.slot.get())
            .collect()
    }

    /// Sweep out dead slots now. Returns how many were removed.
    pub fn purge(&self) -> usize {
        self.state.lock().purged()
    }

    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Start a fresh pass over the sequence.
    ///
    /// Each iterator keeps its own position, so nested loops, zipped
    /// passes and passes on several threads do not disturb each other.
    pub fn iter(&self) -> Iter<'_, W> {
        Iter {
            seq: self,
            last_id: 0,
        }
    }
}

impl<'a, W> FromIterator<&'a W::Strong> for WeakSequence<W>
where
    W: WeakRef,
    W::Strong: 'a,
{
    fn from_iter<I: IntoIterator<Item = &'a W::Strong>>(iter: I) -> Self {
        let mut seq = Self::new();
        seq.extend(iter);
        seq
    }
}

impl<'a, W> Extend<&'a W::Strong> for WeakSequence<W>
where
    W: WeakRef,
    W::Strong: 'a,
{
    fn extend<I: IntoIterator<Item = &'a W::Strong>>(&mut self, iter: I) {
        let state = self.state.get_mut();
        for object in iter {
            if !state
                .entries
                .iter()
                .any(|e| e.slot.is_alive() && e.slot.refers_to(object))
            {
                state.push(object);
            }
        }
    }
}

impl<W> fmt::Debug for WeakSequence<W>
where
    W: WeakRef,
    W::Strong: fmt::Debug,
{
    /// Renders every stored slot, dead ones as `nil`, without purging.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock_unpurged();
        f.debug_list()
            .entries(state.entries.iter().map(|e| &e.slot))
            .finish()
    }
}

/// Stateful pass over a [`WeakSequence`]. Each `next` purges, then yields
/// the first live referent inserted after the one it yielded last.
///
/// Positions are insertion ids rather than indices, so purges and
/// removals never make a pass skip or repeat a survivor. Not fused: once
/// exhausted, elements added later are still yielded by further calls
/// to `next`.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Iter<'a, W> {
    seq: &'a WeakSequence<W>,
    // Insertion id of the last referent yielded, 0 before the first.
    last_id: u64,
}

impl<'a, W: WeakRef> Iterator for Iter<'a, W> {
    type Item = W::Strong;

    fn next(&mut self) -> Option<Self::Item> {
        let state = self.seq.state.lock();
        let start = state.first_after(self.last_id);
        // A referent may die between the purge and here; skip it.
        let (id, object) = state.entries.get(start..)?.iter().find_map(|e| {
            e.slot.get().map(|object| (e.id, object))
        })?;
        self.last_id = id;
        Some(object)
    }
}

impl<'a, W: WeakRef> IntoIterator for &'a WeakSequence<W> {
    type Item = W::Strong;
    type IntoIter = Iter<'a, W>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
