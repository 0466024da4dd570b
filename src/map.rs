//! Map: a `hashbrown::HashMap` behind one exclusive lock.

use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashMap;
use parking_lot::Mutex;
use std::collections::hash_map::RandomState;

pub struct Map<K, V, S = RandomState> {
    entries: Mutex<HashMap<K, V, S>>,
    reentrancy: DebugReentrancy,
}

impl<K, V> Map<K, V> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }
}

impl<K, V, S> Map<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            entries: Mutex::new(HashMap::with_hasher(hasher)),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Take ownership of `entries` as the initial contents.
    pub fn with_value(entries: HashMap<K, V, S>) -> Self {
        Self {
            entries: Mutex::new(entries),
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.reentrancy.check("len");
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reentrancy.check("is_empty");
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.reentrancy.check("clear");
        let old: Vec<(K, V)> = self.entries.lock().drain().collect();
        drop(old);
    }

    /// Run `action` with the map locked.
    ///
    /// `action` must not call into this map: the thread would deadlock.
    pub fn exclusive<R, F>(&self, action: F) -> R
    where
        F: FnOnce(&mut HashMap<K, V, S>) -> R,
    {
        self.reentrancy.check("exclusive");
        let mut entries = self.entries.lock();
        let _g = self.reentrancy.enter();
        action(&mut *entries)
    }

    pub fn into_inner(self) -> HashMap<K, V, S> {
        self.entries.into_inner()
    }
}

impl<K, V, S> Map<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn store(&self, key: K, value: V) {
        self.reentrancy.check("store");
        let old = self.entries.lock().insert(key, value);
        drop(old);
    }

    pub fn load_and_delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.reentrancy.check("load_and_delete");
        self.entries.lock().remove(key)
    }

    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.reentrancy.check("delete");
        let old = self.entries.lock().remove(key);
        drop(old);
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.reentrancy.check("contains_key");
        self.entries.lock().contains_key(key)
    }
}

impl<K, V, S> Map<K, V, S>
where
    K: Eq + Hash,
    V: Clone,
    S: BuildHasher,
{
    pub fn load<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.reentrancy.check("load");
        self.entries.lock().get(key).cloned()
    }

    /// Return the existing value for `key` (and `true`), or store `value`
    /// and return it (and `false`).
    pub fn load_or_store(&self, key: K, value: V) -> (V, bool) {
        self.reentrancy.check("load_or_store");
        let mut entries = self.entries.lock();
        match entries.get(&key) {
            Some(existing) => (existing.clone(), true),
            None => {
                entries.insert(key, value.clone());
                (value, false)
            }
        }
    }
}

impl<K, V, S> Map<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    /// Store `new` under `key` if the current value equals `old`.
    pub fn compare_and_swap(&self, key: &K, old: &V, new: V) -> bool {
        self.reentrancy.check("compare_and_swap");
        let replaced = {
            let mut entries = self.entries.lock();
            match entries.get_mut(key) {
                Some(cur) if *cur == *old => core::mem::replace(cur, new),
                _ => return false,
            }
        };
        drop(replaced);
        true
    }

    /// Delete `key` if its value equals `old`.
    pub fn compare_and_delete(&self, key: &K, old: &V) -> bool {
        self.reentrancy.check("compare_and_delete");
        let removed = {
            let mut entries = self.entries.lock();
            if !entries.get(key).is_some_and(|cur| *cur == *old) {
                return false;
            }
            entries.remove(key)
        };
        drop(removed);
        true
    }
}

impl<K: Clone, V: Clone, S> Map<K, V, S> {
    /// Visit a snapshot of the entries until `visit` returns false. Entry
    /// order is unspecified.
    pub fn range<F>(&self, mut visit: F)
    where
        F: FnMut(K, V) -> bool,
    {
        self.reentrancy.check("range");
        let snapshot: Vec<(K, V)> = self
            .entries
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (k, v) in snapshot {
            if !visit(k, v) {
                break;
            }
        }
    }
}

impl<K, V> Default for Map<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> fmt::Debug for Map<K, V, S>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("entries", &*self.entries.lock())
            .finish()
    }
}
