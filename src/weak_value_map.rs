//! WeakValueMap: owned keys mapped to weakly held values.

use crate::handle_table::HandleTable;
use crate::refs::WeakRef;
use crate::slot::WeakSlot;
use crate::sync::{Purge, PurgeLock};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

struct ValueEntries<K, W> {
    table: HandleTable<K, WeakSlot<W>>,
}

impl<K, W: WeakRef> Purge for ValueEntries<K, W> {
    type Expired = (K, WeakSlot<W>);

    fn purge(&mut self) -> Vec<Self::Expired> {
        self.table.retain(|_, slot| slot.is_alive())
    }

    fn stored(&self) -> usize {
        self.table.len()
    }
}

/// A map from owned keys to weakly held values.
///
/// An entry disappears once its value has been dropped everywhere else.
/// Keys compare by ordinary `Eq`/`Hash`. Every operation purges dead
/// entries first, under the same lock acquisition as the operation.
/// Iteration order of `keys`/`values` is unspecified.
pub struct WeakValueMap<K, W, S = RandomState> {
    hasher: S,
    entries: PurgeLock<ValueEntries<K, W>>,
}

impl<K, W> WeakValueMap<K, W>
where
    K: Eq + Hash,
    W: WeakRef,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<K, W> Default for WeakValueMap<K, W>
where
    K: Eq + Hash,
    W: WeakRef,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, W, S> WeakValueMap<K, W, S>
where
    K: Eq + Hash,
    W: WeakRef,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            entries: PurgeLock::new(ValueEntries {
                table: HandleTable::with_capacity(capacity),
            }),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Number of entries whose value is alive.
    pub fn len(&self) -> usize {
        self.entries.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value stored under `key`, if it is still alive.
    pub fn get<Q>(&self, key: &Q) -> Option<W::Strong>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(key);
        let entries = self.entries.lock();
        let handle = entries.table.find(hash, |k| k.borrow() == key)?;
        entries.table.get(handle).and_then(|(_, slot)| slot.get())
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).is_some()
    }

    /// Store a weak reference to `value` under `key`. Returns the value
    /// previously stored there, if it was alive.
    pub fn insert(&self, key: K, value: &W::Strong) -> Option<W::Strong> {
        let hash = self.hasher.hash_one(&key);
        // The rejected duplicate key is dropped here, after the lock.
        let replaced = self
            .entries
            .lock()
            .table
            .upsert(hash, key, WeakSlot::new(value));
        replaced.and_then(|(_, old)| old.get())
    }

    /// Index-style assignment: `Some` stores the value, `None` removes the
    /// key. There is no "present but empty" entry.
    pub fn set(&self, key: K, value: Option<&W::Strong>) -> Option<W::Strong> {
        match value {
            Some(value) => self.insert(key, value),
            None => self.remove(&key),
        }
    }

    /// Remove `key`, returning its value if it was alive.
    pub fn remove<Q>(&self, key: &Q) -> Option<W::Strong>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(key);
        let removed = {
            let mut entries = self.entries.lock();
            let handle = entries.table.find(hash, |k| k.borrow() == key)?;
            entries.table.remove(handle)
        };
        removed.and_then(|(_, slot)| slot.get())
    }

    /// Keys of the live entries.
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.entries
            .lock()
            .table
            .iter()
            .filter(|(_, slot)| slot.is_alive())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// The live values.
    pub fn values(&self) -> Vec<W::Strong> {
        self.entries
            .lock()
            .table
            .iter()
            .filter_map(|(_, slot)| slot.get())
            .collect()
    }

    /// Snapshot of the live entries.
    pub fn entries(&self) -> Vec<(K, W::Strong)>
    where
        K: Clone,
    {
        self.entries
            .lock()
            .table
            .iter()
            .filter_map(|(k, slot)| slot.get().map(|v| (k.clone(), v)))
            .collect()
    }

    /// Sweep out dead entries now. Returns how many were removed.
    pub fn purge(&self) -> usize {
        self.entries.lock().purged()
    }

    pub fn clear(&self) {
        let drained = self.entries.lock().table.clear();
        drop(drained);
    }
}

impl<'a, K, W, S> FromIterator<(K, &'a W::Strong)> for WeakValueMap<K, W, S>
where
    K: Eq + Hash,
    W: WeakRef,
    W::Strong: 'a,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, &'a W::Strong)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let map = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<K, W, S> fmt::Debug for WeakValueMap<K, W, S>
where
    K: fmt::Debug,
    W: WeakRef,
    W::Strong: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_map()
            .entries(
                entries
                    .table
                    .iter()
                    .filter_map(|(k, slot)| slot.get().map(|v| (k, v))),
            )
            .finish()
    }
}
