use std::collections::HashMap;

use log::trace;

const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Exact,
    /// The true score is at least the stored one.
    LowerBound,
    /// The true score is at most the stored one.
    UpperBound,
}

impl NodeType {
    /// Classifies a fail-hard search result obtained with the window `(alpha, beta)`.
    pub fn classify(score: i32, alpha: i32, beta: i32) -> Self {
        if score <= alpha {
            NodeType::UpperBound
        } else if score >= beta {
            NodeType::LowerBound
        } else {
            NodeType::Exact
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranspositionEntry {
    pub key: u64,
    pub score: i32,
    pub depth: u8,
    pub node_type: NodeType,
}

impl TranspositionEntry {
    pub fn new(key: u64, depth: usize, score: i32, node_type: NodeType) -> Self {
        Self {
            key,
            score,
            depth: depth.min(u8::MAX as usize) as u8,
            node_type,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    entry: TranspositionEntry,
    prev: usize,
    next: usize,
}

/// Bounded score cache keyed by position key, evicting the least recently used entry.
///
/// Entries live in a slab threaded by a doubly linked recency list: `head` is the most
/// recently used slot and `tail` the next one to evict.
#[derive(Debug, Clone)]
pub struct TranspositionTable {
    index: HashMap<u64, usize>,
    slots: Vec<Slot>,
    head: usize,
    tail: usize,
    capacity: usize,
}

impl TranspositionTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            head: NIL,
            tail: NIL,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.head = NIL;
        self.tail = NIL;
    }

    /// Whether `key` is cached, without affecting its recency.
    pub fn contains(&self, key: u64) -> bool {
        self.index.contains_key(&key)
    }

    /// Looks up `key`, marking it most recently used on a hit.
    pub fn get(&mut self, key: u64) -> Option<TranspositionEntry> {
        let slot = *self.index.get(&key)?;
        self.touch(slot);
        Some(self.slots[slot].entry)
    }

    /// Returns a stored score usable for a search of `depth` plies with window `(alpha, beta)`.
    pub fn probe(&mut self, key: u64, depth: usize, alpha: i32, beta: i32) -> Option<i32> {
        let entry = self.get(key)?;
        if (entry.depth as usize) < depth {
            return None;
        }

        match entry.node_type {
            NodeType::Exact => Some(entry.score),
            NodeType::LowerBound if entry.score >= beta => Some(entry.score),
            NodeType::UpperBound if entry.score <= alpha => Some(entry.score),
            _ => None,
        }
    }

    /// Inserts or replaces the entry for `entry.key` and marks it most recently used.
    pub fn store(&mut self, entry: TranspositionEntry) {
        if self.capacity == 0 {
            return;
        }

        if let Some(&slot) = self.index.get(&entry.key) {
            self.slots[slot].entry = entry;
            self.touch(slot);
            return;
        }

        let slot = if self.slots.len() < self.capacity {
            self.slots.push(Slot {
                entry,
                prev: NIL,
                next: NIL,
            });
            self.slots.len() - 1
        } else {
            let lru = self.tail;
            self.unlink(lru);
            let evicted = self.slots[lru].entry.key;
            self.index.remove(&evicted);
            trace!("evicted {evicted:#018x} from the transposition table");
            self.slots[lru].entry = entry;
            lru
        };

        self.index.insert(entry.key, slot);
        self.push_front(slot);
    }

    /// Cached keys, most recently used first.
    pub fn keys_by_recency(&self) -> Vec<u64> {
        let mut keys = Vec::with_capacity(self.len());
        let mut slot = self.head;
        while slot != NIL {
            keys.push(self.slots[slot].entry.key);
            slot = self.slots[slot].next;
        }
        keys
    }

    fn touch(&mut self, slot: usize) {
        if self.head != slot {
            self.unlink(slot);
            self.push_front(slot);
        }
    }

    fn unlink(&mut self, slot: usize) {
        let Slot { prev, next, .. } = self.slots[slot];
        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.slots[slot].prev = NIL;
        self.slots[slot].next = NIL;
    }

    fn push_front(&mut self, slot: usize) {
        let head = self.head;
        self.slots[slot].prev = NIL;
        self.slots[slot].next = head;
        if head != NIL {
            self.slots[head].prev = slot;
        } else {
            self.tail = slot;
        }
        self.head = slot;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn exact(key: u64, score: i32) -> TranspositionEntry {
        TranspositionEntry::new(key, 1, score, NodeType::Exact)
    }

    #[test]
    fn test_store_and_get() {
        let mut table = TranspositionTable::new(4);
        assert!(table.get(1).is_none());

        table.store(exact(1, 42));
        assert_eq!(table.get(1).map(|e| e.score), Some(42));

        table.store(exact(1, -7));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(1).map(|e| e.score), Some(-7));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut table = TranspositionTable::new(3);
        table.store(exact(1, 1));
        table.store(exact(2, 2));
        table.store(exact(3, 3));

        // Reading 1 makes 2 the oldest entry
        assert!(table.get(1).is_some());
        table.store(exact(4, 4));

        assert_eq!(table.len(), 3);
        assert!(!table.contains(2));
        assert_eq!(table.keys_by_recency(), vec![4, 1, 3]);
    }

    #[test]
    fn test_update_refreshes_recency() {
        let mut table = TranspositionTable::new(2);
        table.store(exact(1, 1));
        table.store(exact(2, 2));
        table.store(exact(1, 10));
        table.store(exact(3, 3));

        assert!(table.contains(1));
        assert!(!table.contains(2));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut table = TranspositionTable::new(0);
        table.store(exact(1, 1));
        assert!(table.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut table = TranspositionTable::new(2);
        table.store(exact(1, 1));
        table.store(exact(2, 2));
        table.clear();
        assert!(table.is_empty());
        assert!(table.keys_by_recency().is_empty());

        table.store(exact(3, 3));
        assert_eq!(table.keys_by_recency(), vec![3]);
    }

    #[test]
    fn test_probe_respects_depth_and_bounds() {
        let mut table = TranspositionTable::new(8);
        table.store(TranspositionEntry::new(1, 3, 50, NodeType::Exact));
        table.store(TranspositionEntry::new(2, 3, 50, NodeType::LowerBound));
        table.store(TranspositionEntry::new(3, 3, 50, NodeType::UpperBound));

        assert_eq!(table.probe(1, 3, -100, 100), Some(50));
        assert_eq!(table.probe(1, 4, -100, 100), None);

        assert_eq!(table.probe(2, 2, -100, 40), Some(50));
        assert_eq!(table.probe(2, 2, -100, 100), None);

        assert_eq!(table.probe(3, 2, 60, 100), Some(50));
        assert_eq!(table.probe(3, 2, 0, 100), None);
    }

    #[test]
    fn test_classify() {
        assert_eq!(NodeType::classify(-10, -10, 10), NodeType::UpperBound);
        assert_eq!(NodeType::classify(10, -10, 10), NodeType::LowerBound);
        assert_eq!(NodeType::classify(0, -10, 10), NodeType::Exact);
    }

    proptest! {
        #[test]
        fn prop_behaves_like_lru_model(
            capacity in 1usize..8,
            ops in prop::collection::vec((any::<bool>(), 0u64..12), 0..200),
        ) {
            let mut table = TranspositionTable::new(capacity);
            // Most recently used first
            let mut model: Vec<u64> = Vec::new();

            for (is_store, key) in ops {
                let position = model.iter().position(|&k| k == key);
                if is_store {
                    table.store(exact(key, key as i32));
                    match position {
                        Some(i) => {
                            model.remove(i);
                        }
                        None if model.len() == capacity => {
                            model.pop();
                        }
                        None => {}
                    }
                    model.insert(0, key);
                } else {
                    prop_assert_eq!(table.get(key).is_some(), position.is_some());
                    if let Some(i) = position {
                        model.remove(i);
                        model.insert(0, key);
                    }
                }

                prop_assert!(table.len() <= capacity);
                prop_assert_eq!(table.keys_by_recency(), model.clone());
            }
        }
    }
}
