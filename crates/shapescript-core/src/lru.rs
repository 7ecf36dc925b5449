// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A cost- and count-bounded LRU cache.
//!
//! A hash index plus an intrusive doubly linked list over a slab: `put`,
//! `get`, and `remove` are O(1) amortized, with no pointer chasing
//! through `Rc`/`Box` nodes. All mutation is serialized by the caller
//! holding a single `Mutex` over the whole structure (§5: "the cache lock
//! is the only lock in the core").

use std::hash::Hash;

use rustc_hash::FxHashMap;

const NIL: usize = usize::MAX;

struct Entry<K, V> {
    key: K,
    value: V,
    cost: u64,
    prev: usize,
    next: usize,
}

/// A cost+count bounded LRU cache. Not thread-safe on its own — callers
/// needing concurrent access wrap it in a `Mutex` (see
/// [`crate::cache::GeometryCache`]).
pub struct LruCache<K, V> {
    slab: Vec<Option<Entry<K, V>>>,
    index: FxHashMap<K, usize>,
    free: Vec<usize>,
    head: usize, // most recently used
    tail: usize, // least recently used
    count_limit: usize,
    cost_limit: u64,
    cost: u64,
}

impl<K: Eq + Hash + Clone, V> LruCache<K, V> {
    /// Builds an empty cache bounded by `count_limit` entries and
    /// `cost_limit` total cost. `usize::MAX`/`u64::MAX` effectively
    /// disables the corresponding bound.
    #[must_use]
    pub fn new(count_limit: usize, cost_limit: u64) -> Self {
        Self {
            slab: Vec::new(),
            index: FxHashMap::default(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            count_limit,
            cost_limit,
            cost: 0,
        }
    }

    /// The number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The sum of all held entries' costs.
    #[must_use]
    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Looks up `key`, promoting it to most-recently-used on a hit.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.move_to_front(slot);
        self.slab[slot].as_ref().map(|e| &e.value)
    }

    /// Looks up `key` without promoting it.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        let slot = *self.index.get(key)?;
        self.slab[slot].as_ref().map(|e| &e.value)
    }

    /// Inserts or replaces `key`, promoting it to most-recently-used,
    /// then evicts from the LRU end until both bounds are satisfied.
    pub fn put(&mut self, key: K, value: V, cost: u64) {
        if let Some(&slot) = self.index.get(&key) {
            self.cost = self.cost.saturating_sub(self.slab[slot].as_ref().map_or(0, |e| e.cost));
            if let Some(entry) = self.slab[slot].as_mut() {
                entry.value = value;
                entry.cost = cost;
            }
            self.cost += cost;
            self.move_to_front(slot);
        } else {
            let slot = self.alloc_slot(key.clone(), value, cost);
            self.index.insert(key, slot);
            self.push_front(slot);
            self.cost += cost;
        }
        self.evict_to_bounds();
    }

    /// Removes `key`, if present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.index.remove(key)?;
        self.unlink(slot);
        let entry = self.slab[slot].take().expect("index pointed at a live slot");
        self.cost = self.cost.saturating_sub(entry.cost);
        self.free.push(slot);
        Some(entry.value)
    }

    /// Drops every entry. Used both for an explicit `clear()` call and
    /// for an externally signalled memory-pressure event.
    pub fn clear(&mut self) {
        self.slab.clear();
        self.index.clear();
        self.free.clear();
        self.head = NIL;
        self.tail = NIL;
        self.cost = 0;
    }

    /// Tightens (or loosens) the count bound, evicting immediately if the
    /// new bound is now exceeded: tightening a limit at runtime triggers
    /// immediate eviction.
    pub fn set_count_limit(&mut self, limit: usize) {
        self.count_limit = limit;
        self.evict_to_bounds();
    }

    /// Tightens (or loosens) the cost bound, evicting immediately if
    /// necessary.
    pub fn set_cost_limit(&mut self, limit: u64) {
        self.cost_limit = limit;
        self.evict_to_bounds();
    }

    /// Iterates `(key, value)` pairs from most- to least-recently-used.
    pub fn iter_by_recency(&self) -> impl Iterator<Item = (&K, &V)> {
        let mut slot = self.head;
        std::iter::from_fn(move || {
            if slot == NIL {
                return None;
            }
            let entry = self.slab[slot].as_ref()?;
            slot = entry.next;
            Some((&entry.key, &entry.value))
        })
    }

    /// Iterates `(key, value)` pairs in unspecified order, faster than
    /// [`LruCache::iter_by_recency`] when order does not matter.
    pub fn iter_unordered(&self) -> impl Iterator<Item = (&K, &V)> {
        self.slab.iter().filter_map(|slot| slot.as_ref()).map(|e| (&e.key, &e.value))
    }

    fn alloc_slot(&mut self, key: K, value: V, cost: u64) -> usize {
        let entry = Entry { key, value, cost, prev: NIL, next: NIL };
        if let Some(slot) = self.free.pop() {
            self.slab[slot] = Some(entry);
            slot
        } else {
            self.slab.push(Some(entry));
            self.slab.len() - 1
        }
    }

    fn push_front(&mut self, slot: usize) {
        if let Some(entry) = self.slab[slot].as_mut() {
            entry.prev = NIL;
            entry.next = self.head;
        }
        if self.head != NIL {
            if let Some(old_head) = self.slab[self.head].as_mut() {
                old_head.prev = slot;
            }
        }
        self.head = slot;
        if self.tail == NIL {
            self.tail = slot;
        }
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.slab[slot].as_ref() {
            Some(e) => (e.prev, e.next),
            None => return,
        };
        if prev != NIL {
            if let Some(p) = self.slab[prev].as_mut() {
                p.next = next;
            }
        } else {
            self.head = next;
        }
        if next != NIL {
            if let Some(n) = self.slab[next].as_mut() {
                n.prev = prev;
            }
        } else {
            self.tail = prev;
        }
    }

    fn move_to_front(&mut self, slot: usize) {
        if self.head == slot {
            return;
        }
        self.unlink(slot);
        self.push_front(slot);
    }

    fn evict_to_bounds(&mut self) {
        while (self.index.len() > self.count_limit || self.cost > self.cost_limit) && self.tail != NIL {
            let lru_slot = self.tail;
            let key = self.slab[lru_slot].as_ref().expect("tail points at a live slot").key.clone();
            self.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let mut cache: LruCache<&str, i32> = LruCache::new(10, u64::MAX);
        cache.put("a", 1, 1);
        assert_eq!(cache.get(&"a"), Some(&1));
    }

    #[test]
    fn evicts_least_recently_used_on_count_pressure() {
        let mut cache: LruCache<&str, i32> = LruCache::new(2, u64::MAX);
        cache.put("a", 1, 1);
        cache.put("b", 2, 1);
        cache.get(&"a"); // promote a, b is now the LRU entry
        cache.put("c", 3, 1);
        assert_eq!(cache.peek(&"b"), None);
        assert_eq!(cache.peek(&"a"), Some(&1));
        assert_eq!(cache.peek(&"c"), Some(&3));
    }

    #[test]
    fn evicts_on_cost_pressure() {
        let mut cache: LruCache<&str, i32> = LruCache::new(100, 5);
        cache.put("a", 1, 3);
        cache.put("b", 2, 3);
        assert!(cache.cost() <= 5);
        assert_eq!(cache.peek(&"a"), None);
    }

    #[test]
    fn tightening_limit_evicts_immediately() {
        let mut cache: LruCache<&str, i32> = LruCache::new(10, u64::MAX);
        cache.put("a", 1, 1);
        cache.put("b", 2, 1);
        cache.put("c", 3, 1);
        cache.set_count_limit(1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek(&"c"), Some(&3));
    }

    #[test]
    fn clear_drops_everything() {
        let mut cache: LruCache<&str, i32> = LruCache::new(10, u64::MAX);
        cache.put("a", 1, 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.cost(), 0);
    }

    #[test]
    fn remove_missing_key_is_not_an_error() {
        let mut cache: LruCache<&str, i32> = LruCache::new(10, u64::MAX);
        assert_eq!(cache.remove(&"missing"), None);
    }

    #[test]
    fn reused_slot_after_eviction_does_not_corrupt_list() {
        let mut cache: LruCache<&str, i32> = LruCache::new(1, u64::MAX);
        cache.put("a", 1, 1);
        cache.put("b", 2, 1);
        cache.put("c", 3, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek(&"c"), Some(&3));
    }

    proptest::proptest! {
        #[test]
        fn count_bound_never_exceeded(
            count_limit in 1_usize..8,
            keys in proptest::collection::vec(0_u32..20, 0..64),
        ) {
            let mut cache: LruCache<u32, u32> = LruCache::new(count_limit, u64::MAX);
            for key in keys {
                cache.put(key, key, 1);
                proptest::prop_assert!(cache.len() <= count_limit);
            }
        }

        #[test]
        fn cost_bound_never_exceeded(
            cost_limit in 1_u64..32,
            costs in proptest::collection::vec(1_u64..8, 0..64),
        ) {
            let mut cache: LruCache<usize, u64> = LruCache::new(usize::MAX, cost_limit);
            for (key, cost) in costs.into_iter().enumerate() {
                cache.put(key, cost, cost);
                proptest::prop_assert!(cache.cost() <= cost_limit);
            }
        }

        #[test]
        fn every_held_entry_is_retrievable(
            keys in proptest::collection::vec(0_u32..16, 0..32),
        ) {
            let mut cache: LruCache<u32, u32> = LruCache::new(usize::MAX, u64::MAX);
            for key in &keys {
                cache.put(*key, *key, 1);
            }
            for (key, value) in cache.iter_unordered() {
                proptest::prop_assert_eq!(key, value);
            }
        }
    }
}
