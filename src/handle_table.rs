//! HandleTable: structural layer under both weak maps.
//!
//! Entries live in a `SlotMap` and are indexed by a `HashTable` of
//! generational keys. The hash of every entry is supplied by the caller
//! at insertion and stored with it; rehashing uses the stored hash and
//! never calls back into `K: Hash`. This is what lets a weakly held key
//! stay indexable after its referent is gone.

use hashbrown::hash_table::Entry as TableEntry;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub(crate) struct Handle(DefaultKey);

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
}

pub(crate) struct HandleTable<K, V> {
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<K, V>>,
}

impl<K, V> Default for HandleTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> HandleTable<K, V> {
    pub fn new() -> Self {
        Self {
            index: HashTable::new(),
            slots: SlotMap::with_key(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity_and_key(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Locate the entry with the given hash whose key satisfies `eq`.
    pub fn find(&self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> Option<Handle> {
        self.index
            .find(hash, |&k| self.slots.get(k).map(|e| eq(&e.key)).unwrap_or(false))
            .map(|&k| Handle(k))
    }

    pub fn get(&self, h: Handle) -> Option<(&K, &V)> {
        self.slots.get(h.0).map(|e| (&e.key, &e.value))
    }

    pub fn value_mut(&mut self, h: Handle) -> Option<&mut V> {
        self.slots.get_mut(h.0).map(|e| &mut e.value)
    }

    pub fn remove(&mut self, h: Handle) -> Option<(K, V)> {
        let k = h.0;
        let entry = self.slots.remove(k)?;
        // Unlink from the index using the stored hash.
        if let Ok(occupied) = self.index.find_entry(entry.hash, |&kk| kk == k) {
            let _ = occupied.remove();
        }
        Some((entry.key, entry.value))
    }

    /// Keep only entries for which `keep` returns true. Returns the
    /// removed entries so the caller decides when they are dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &V) -> bool) -> Vec<(K, V)> {
        let doomed: Vec<Handle> = self
            .slots
            .iter()
            .filter(|(_, e)| !keep(&e.key, &e.value))
            .map(|(k, _)| Handle(k))
            .collect();
        doomed.into_iter().filter_map(|h| self.remove(h)).collect()
    }

    pub fn clear(&mut self) -> Vec<(K, V)> {
        self.index.clear();
        self.slots.drain().map(|(_, e)| (e.key, e.value)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.slots.values().map(|e| (&e.key, &e.value))
    }
}

impl<K: Eq, V> HandleTable<K, V> {
    /// Store `value` under `key`. If an equal key is present its value is
    /// replaced and the stored key kept; the rejected `key` and the old
    /// value are handed back so the caller controls when they drop.
    pub fn upsert(&mut self, hash: u64, key: K, value: V) -> Option<(K, V)> {
        match self.index.entry(
            hash,
            |&kk| self.slots.get(kk).map(|e| e.key == key).unwrap_or(false),
            |&kk| self.slots.get(kk).map(|e| e.hash).unwrap_or(0),
        ) {
            TableEntry::Occupied(o) => {
                let slot = *o.get();
                match self.slots.get_mut(slot) {
                    Some(e) => Some((key, core::mem::replace(&mut e.value, value))),
                    None => None,
                }
            }
            TableEntry::Vacant(v) => {
                let k = self.slots.insert(Entry { key, value, hash });
                let _ = v.insert(k);
                None
            }
        }
    }
}
