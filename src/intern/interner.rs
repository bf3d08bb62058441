use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

/// Registry mapping identity keys to shared node instances.
///
/// Entries are only evicted through [`invalidate`](Interner::invalidate),
/// [`rekey`](Interner::rekey) or [`clear`](Interner::clear). The registry
/// lock is never held while calling out to anything but the `make` closure
/// of [`intern`](Interner::intern), which must not intern recursively.
pub struct Interner<K, N> {
    entries: Mutex<HashMap<K, Arc<N>>>,
}

impl<K, N> Default for Interner<K, N> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone + fmt::Debug, N> Interner<K, N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance registered under `key`, creating it with `make`
    /// if there is none.
    pub fn intern(&self, key: K, make: impl FnOnce() -> Arc<N>) -> Arc<N> {
        let mut entries = self.entries.lock();
        if let Some(existing) = entries.get(&key) {
            return Arc::clone(existing);
        }
        trace!("Interning new instance for {:?}", key);
        let created = make();
        entries.insert(key, Arc::clone(&created));
        created
    }

    pub fn get(&self, key: &K) -> Option<Arc<N>> {
        self.entries.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Evicts `key`; the next lookup creates a fresh instance.
    pub fn invalidate(&self, key: &K) -> Option<Arc<N>> {
        let removed = self.entries.lock().remove(key);
        if removed.is_some() {
            trace!("Invalidated {:?}", key);
        }
        removed
    }

    /// Evicts every entry whose key matches.
    pub fn invalidate_where(&self, mut matches: impl FnMut(&K) -> bool) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !matches(key));
        let evicted = before - entries.len();
        trace!("Invalidated {} entries", evicted);
        evicted
    }

    /// Moves every entry for which `rename` returns a new key to that key,
    /// replacing whatever was registered there.
    pub fn rekey(&self, mut rename: impl FnMut(&K) -> Option<K>) -> usize {
        let mut entries = self.entries.lock();
        let moved: Vec<(K, K)> = entries
            .keys()
            .filter_map(|key| rename(key).map(|renamed| (key.clone(), renamed)))
            .collect();
        let mut relocated = Vec::with_capacity(moved.len());
        for (old, new) in moved {
            if let Some(instance) = entries.remove(&old) {
                trace!("Rekeying {:?} to {:?}", old, new);
                relocated.push((new, instance));
            }
        }
        let count = relocated.len();
        entries.extend(relocated);
        count
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<K, N> fmt::Debug for Interner<K, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner")
            .field("len", &self.entries.lock().len())
            .finish()
    }
}
