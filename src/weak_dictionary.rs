//! WeakDictionary: one map type covering both weak directions.

use crate::refs::WeakRef;
use crate::weak_key_map::WeakKeyMap;
use crate::weak_value_map::WeakValueMap;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Which side of a [`WeakDictionary`] is held weakly.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum WeakRelation {
    /// Weak keys, matched by identity; values are owned.
    WeakToStrong,
    /// Owned keys, matched by value; values are weak.
    StrongToWeak,
}

enum Storage<K: WeakRef, V: WeakRef, S> {
    WeakToStrong(WeakKeyMap<K, V::Strong, S>),
    StrongToWeak(WeakValueMap<K::Strong, V, S>),
}

/// A map between two kinds of shared objects where one side is held
/// weakly. The [`WeakRelation`] is chosen at construction and never
/// changes; every operation delegates to the matching
/// [`WeakKeyMap`] or [`WeakValueMap`].
///
/// ```
/// use std::sync::{Arc, Weak};
/// use weak_collections::{WeakDictionary, WeakRelation};
///
/// let dict: WeakDictionary<Weak<String>, Weak<u32>> =
///     WeakDictionary::new(WeakRelation::StrongToWeak);
/// let key = Arc::new("name".to_string());
/// let value = Arc::new(1);
/// dict.set(&key, Some(&value));
/// assert_eq!(dict.get(&Arc::new("name".to_string())), Some(value.clone()));
/// drop(value);
/// assert_eq!(dict.len(), 0);
/// ```
pub struct WeakDictionary<K: WeakRef, V: WeakRef, S = RandomState> {
    storage: Storage<K, V, S>,
}

impl<K, V> WeakDictionary<K, V>
where
    K: WeakRef,
    K::Strong: Eq + Hash,
    V: WeakRef,
{
    pub fn new(relation: WeakRelation) -> Self {
        Self::with_hasher(relation, RandomState::new())
    }
}

impl<K, V, S> WeakDictionary<K, V, S>
where
    K: WeakRef,
    K::Strong: Eq + Hash,
    V: WeakRef,
    S: BuildHasher,
{
    pub fn with_hasher(relation: WeakRelation, hasher: S) -> Self {
        let storage = match relation {
            WeakRelation::WeakToStrong => Storage::WeakToStrong(WeakKeyMap::with_hasher(hasher)),
            WeakRelation::StrongToWeak => Storage::StrongToWeak(WeakValueMap::with_hasher(hasher)),
        };
        Self { storage }
    }

    pub fn relation(&self) -> WeakRelation {
        match self.storage {
            Storage::WeakToStrong(_) => WeakRelation::WeakToStrong,
            Storage::StrongToWeak(_) => WeakRelation::StrongToWeak,
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::WeakToStrong(m) => m.len(),
            Storage::StrongToWeak(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The value for `key`. Weak keys match by identity, owned keys by
    /// value.
    pub fn get(&self, key: &K::Strong) -> Option<V::Strong> {
        match &self.storage {
            Storage::WeakToStrong(m) => m.get(key),
            Storage::StrongToWeak(m) => m.get(key),
        }
    }

    pub fn contains_key(&self, key: &K::Strong) -> bool {
        match &self.storage {
            Storage::WeakToStrong(m) => m.contains_key(key),
            Storage::StrongToWeak(m) => m.contains_key(key),
        }
    }

    /// Store `value` under `key`, returning the live value it replaces.
    pub fn insert(&self, key: &K::Strong, value: &V::Strong) -> Option<V::Strong> {
        match &self.storage {
            Storage::WeakToStrong(m) => m.insert(key, value.clone()),
            Storage::StrongToWeak(m) => m.insert(key.clone(), value),
        }
    }

    /// Index-style assignment: `None` removes the key.
    pub fn set(&self, key: &K::Strong, value: Option<&V::Strong>) -> Option<V::Strong> {
        match value {
            Some(value) => self.insert(key, value),
            None => self.remove(key),
        }
    }

    pub fn remove(&self, key: &K::Strong) -> Option<V::Strong> {
        match &self.storage {
            Storage::WeakToStrong(m) => m.remove(key),
            Storage::StrongToWeak(m) => m.remove(key),
        }
    }

    pub fn keys(&self) -> Vec<K::Strong> {
        match &self.storage {
            Storage::WeakToStrong(m) => m.keys(),
            Storage::StrongToWeak(m) => m.keys(),
        }
    }

    pub fn values(&self) -> Vec<V::Strong> {
        match &self.storage {
            Storage::WeakToStrong(m) => m.values(),
            Storage::StrongToWeak(m) => m.values(),
        }
    }

    pub fn entries(&self) -> Vec<(K::Strong, V::Strong)> {
        match &self.storage {
            Storage::WeakToStrong(m) => m.entries(),
            Storage::StrongToWeak(m) => m.entries(),
        }
    }

    /// Sweep out dead entries now. Returns how many were removed.
    pub fn purge(&self) -> usize {
        match &self.storage {
            Storage::WeakToStrong(m) => m.purge(),
            Storage::StrongToWeak(m) => m.purge(),
        }
    }

    pub fn clear(&self) {
        match &self.storage {
            Storage::WeakToStrong(m) => m.clear(),
            Storage::StrongToWeak(m) => m.clear(),
        }
    }
}

impl<K, V, S> fmt::Debug for WeakDictionary<K, V, S>
where
    K: WeakRef,
    K::Strong: fmt::Debug,
    V: WeakRef,
    V::Strong: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.storage {
            Storage::WeakToStrong(m) => f.debug_tuple("WeakToStrong").field(m).finish(),
            Storage::StrongToWeak(m) => f.debug_tuple("StrongToWeak").field(m).finish(),
        }
    }
}
