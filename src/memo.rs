//! Bounded memo tables for values that are expensive to rebuild every frame.
//!
//! Solar events only change once per day and bars only change when the cycle
//! or the terminal width does, so the render loop looks them up here instead
//! of recomputing them on each redraw.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

/// A memo table holding at most `capacity` entries.
///
/// Values are shared through `Arc`, so repeated lookups with the same key hand
/// back the same instance. When the table is full the oldest entry is evicted.
#[derive(Debug)]
pub struct Memo<K, V> {
    capacity: usize,
    entries: HashMap<K, (u64, Arc<V>)>,
    clock: u64,
    misses: u64,
}

impl<K: Eq + Hash + Clone, V> Memo<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            clock: 0,
            misses: 0,
        }
    }

    /// Return the memoized value for `key`, building it with `compute` on a miss.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        self.clock += 1;
        let stamp = self.clock;

        if let Some((last_used, value)) = self.entries.get_mut(&key) {
            *last_used = stamp;
            return Ok(Arc::clone(value));
        }

        let value = Arc::new(compute()?);
        self.misses += 1;
        if self.entries.len() >= self.capacity {
            self.evict_oldest();
        }
        self.entries.insert(key, (stamp, Arc::clone(&value)));
        Ok(value)
    }

    /// Infallible variant of [`Memo::get_or_try_insert_with`].
    pub fn get_or_insert_with(&mut self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        match self.get_or_try_insert_with::<std::convert::Infallible>(key, || Ok(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    fn evict_oldest(&mut self) {
        if let Some(oldest) = self
            .entries
            .iter()
            .min_by_key(|(_, (last_used, _))| *last_used)
            .map(|(key, _)| key.clone())
        {
            self.entries.remove(&oldest);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many lookups had to compute a fresh value.
    pub fn misses(&self) -> u64 {
        self.misses
    }
}
