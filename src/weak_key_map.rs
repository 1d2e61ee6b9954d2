//! WeakKeyMap: weakly held keys mapped to owned values.

use crate::handle_table::HandleTable;
use crate::refs::{StrongRef, WeakRef};
use crate::slot::WeakKey;
use crate::sync::{Purge, PurgeLock};
use core::fmt;
use core::hash::BuildHasher;
use std::collections::hash_map::RandomState;

struct KeyEntries<W, V> {
    table: HandleTable<WeakKey<W>, V>,
}

impl<W: WeakRef, V> Purge for KeyEntries<W, V> {
    type Expired = (WeakKey<W>, V);

    fn purge(&mut self) -> Vec<Self::Expired> {
        self.table.retain(|key, _| key.is_alive())
    }

    fn stored(&self) -> usize {
        self.table.len()
    }
}

/// A map from weakly held keys to owned values.
///
/// Keys match by identity: two distinct objects that compare equal by
/// value are distinct keys. The hash of a key is taken from its address
/// once, at insertion, so the entry stays indexable after the key is
/// dropped; the entry and its value go away on the next purge.
///
/// ```
/// use std::rc::{Rc, Weak};
/// use weak_collections::WeakKeyMap;
///
/// let labels: WeakKeyMap<Weak<str>, u32> = WeakKeyMap::new();
/// let view: Rc<str> = Rc::from("view");
/// labels.insert(&view, 7);
/// assert_eq!(labels.get(&view), Some(7));
/// assert_eq!(labels.get(&Rc::from("view")), None);
/// ```
pub struct WeakKeyMap<W, V, S = RandomState> {
    hasher: S,
    entries: PurgeLock<KeyEntries<W, V>>,
}

impl<W: WeakRef, V> WeakKeyMap<W, V> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }
}

impl<W: WeakRef, V> Default for WeakKeyMap<W, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W, V, S> WeakKeyMap<W, V, S>
where
    W: WeakRef,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(0, hasher)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            entries: PurgeLock::new(KeyEntries {
                table: HandleTable::with_capacity(capacity),
            }),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    fn identity_hash(&self, key: &W::Strong) -> u64 {
        self.hasher.hash_one(<W::Strong as StrongRef>::addr(key) as usize)
    }

    /// Number of entries whose key is alive.
    pub fn len(&self) -> usize {
        self.entries.lock().table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` on the value stored under `key`.
    pub fn get_with<R>(&self, key: &W::Strong, f: impl FnOnce(&V) -> R) -> Option<R> {
        let hash = self.identity_hash(key);
        let entries = self.entries.lock();
        let handle = entries.table.find(hash, |k| k.matches(key))?;
        entries.table.get(handle).map(|(_, v)| f(v))
    }

    /// A clone of the value stored under `key`.
    pub fn get(&self, key: &W::Strong) -> Option<V>
    where
        V: Clone,
    {
        self.get_with(key, V::clone)
    }

    pub fn contains_key(&self, key: &W::Strong) -> bool {
        self.get_with(key, |_| ()).is_some()
    }

    /// Run `f` on the value stored under `key`, allowing it to be modified
    /// in place.
    pub fn update<R>(&self, key: &W::Strong, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        let hash = self.identity_hash(key);
        let mut entries = self.entries.lock();
        let handle = entries.table.find(hash, |k| k.matches(key))?;
        entries.table.value_mut(handle).map(f)
    }

    /// Store `value` under `key`. Returns the value it replaces.
    pub fn insert(&self, key: &W::Strong, value: V) -> Option<V> {
        let hash = self.identity_hash(key);
        let replaced = self
            .entries
            .lock()
            .table
            .upsert(hash, WeakKey::new(key, hash), value);
        replaced.map(|(_, old)| old)
    }

    /// Index-style assignment: `Some` stores the value, `None` removes the
    /// key.
    pub fn set(&self, key: &W::Strong, value: Option<V>) -> Option<V> {
        match value {
            Some(value) => self.insert(key, value),
            None => self.remove(key),
        }
    }

    /// Remove `key`, returning its value.
    pub fn remove(&self, key: &W::Strong) -> Option<V> {
        let hash = self.identity_hash(key);
        let removed = {
            let mut entries = self.entries.lock();
            let handle = entries.table.find(hash, |k| k.matches(key))?;
            entries.table.remove(handle)
        };
        removed.map(|(_, v)| v)
    }

    /// The live keys.
    pub fn keys(&self) -> Vec<W::Strong> {
        self.entries
            .lock()
            .table
            .iter()
            .filter_map(|(k, _)| k.get())
            .collect()
    }

    /// Values of the entries whose key is alive.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.entries
            .lock()
            .table
            .iter()
            .filter(|(k, _)| k.is_alive())
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Snapshot of the live entries.
    pub fn entries(&self) -> Vec<(W::Strong, V)>
    where
        V: Clone,
    {
        self.entries
            .lock()
            .table
            .iter()
            .filter_map(|(k, v)| k.get().map(|k| (k, v.clone())))
            .collect()
    }

    /// Sweep out entries with dead keys now. Returns how many were removed.
    pub fn purge(&self) -> usize {
        self.entries.lock().purged()
    }

    pub fn clear(&self) {
        let drained = self.entries.lock().table.clear();
        drop(drained);
    }
}

impl<'a, W, V, S> FromIterator<(&'a W::Strong, V)> for WeakKeyMap<W, V, S>
where
    W: WeakRef,
    W::Strong: 'a,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (&'a W::Strong, V)>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let map = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl<W, V, S> fmt::Debug for WeakKeyMap<W, V, S>
where
    W: WeakRef,
    W::Strong: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.lock();
        f.debug_map()
            .entries(
                entries
                    .table
                    .iter()
                    .filter_map(|(k, v)| k.get().map(|k| (k, v))),
            )
            .finish()
    }
}
