//! One level of the two-level index
//! =================================
//!
//! A separately chained hash table whose nodes live in an [`Arena`]. Chains
//! link nodes by handle, and the bucket table grows through a fixed
//! progression of prime sizes once the load factor passes 3/4.
//!
//! Traversal goes through a [`LevelCursor`], which walks arena slots rather
//! than hash chains. Rehashing only relinks chains, so a cursor stays valid
//! across inserts, and deleting the entry a cursor points at is deferred to
//! the cursor's next advance.

use ahash::RandomState;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

use super::arena::{Arena, Handle};

/// Bucket table sizes, smallest first.
pub const PRIME_CAPACITIES: [usize; 23] = [
    53, 101, 211, 503, 1553, 3407, 6803, 12503, 25013, 50261, 104729, 250007, 500009, 1000003,
    2000029, 4000037, 10000019, 25000009, 50000047, 104395301, 217645177, 512927357, 1000000007,
];

const MAX_LOAD_NUMERATOR: usize = 3;
const MAX_LOAD_DENOMINATOR: usize = 4;

// Fixed seeds keep chain layout identical across runs.
const HASH_SEEDS: [u64; 4] = [
    0x243f_6a88_85a3_08d3,
    0x1319_8a2e_0370_7344,
    0xa409_3822_299f_31d0,
    0x082e_fa98_ec4e_6c89,
];

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    hash: u64,
    next: Option<Handle>,
}

#[derive(Debug, Clone)]
pub struct HashLevel<K, V> {
    heads: Vec<Option<Handle>>,
    nodes: Arena<Node<K, V>>,
    size_class: usize,
    hasher: RandomState,
}

impl<K: Hash + Eq, V> Default for HashLevel<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V> HashLevel<K, V> {
    pub fn new() -> Self {
        let [a, b, c, d] = HASH_SEEDS;
        Self {
            heads: vec![None; PRIME_CAPACITIES[0]],
            nodes: Arena::new(),
            size_class: 0,
            hasher: RandomState::with_seeds(a, b, c, d),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current bucket table size.
    pub fn capacity(&self) -> usize {
        self.heads.len()
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.heads.len() as u64) as usize
    }

    pub fn find<Q>(&self, key: &Q) -> Option<Handle>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(key);
        let mut link = self.heads[self.bucket_of(hash)];
        while let Some(handle) = link {
            let node = self.nodes.get(handle)?;
            if node.hash == hash && node.key.borrow() == key {
                return Some(handle);
            }
            link = node.next;
        }
        None
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).and_then(|handle| self.value(handle))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.find(key)?;
        self.value_mut(handle)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    pub fn entry_at(&self, handle: Handle) -> Option<(&K, &V)> {
        self.nodes.get(handle).map(|node| (&node.key, &node.value))
    }

    pub fn key(&self, handle: Handle) -> Option<&K> {
        self.nodes.get(handle).map(|node| &node.key)
    }

    pub fn value(&self, handle: Handle) -> Option<&V> {
        self.nodes.get(handle).map(|node| &node.value)
    }

    pub fn value_mut(&mut self, handle: Handle) -> Option<&mut V> {
        self.nodes.get_mut(handle).map(|node| &mut node.value)
    }

    /// Handle of the node for `key`, creating it with `make` when absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> Handle
    where
        F: FnOnce() -> V,
    {
        if let Some(handle) = self.find(&key) {
            return handle;
        }
        self.insert_new(key, make())
    }

    /// Insert or overwrite. Returns the previous value for `key`, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.find(&key) {
            Some(handle) => self
                .value_mut(handle)
                .map(|slot| std::mem::replace(slot, value)),
            None => {
                self.insert_new(key, value);
                None
            }
        }
    }

    fn insert_new(&mut self, key: K, value: V) -> Handle {
        if (self.len() + 1) * MAX_LOAD_DENOMINATOR > self.capacity() * MAX_LOAD_NUMERATOR {
            self.grow();
        }
        let hash = self.hasher.hash_one(&key);
        let bucket = self.bucket_of(hash);
        let handle = self.nodes.insert(Node {
            key,
            value,
            hash,
            next: self.heads[bucket],
        });
        self.heads[bucket] = Some(handle);
        handle
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let handle = self.find(key)?;
        self.remove_handle(handle)
    }

    /// Unlink and free the node behind `handle`. A stale handle is a no-op.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<(K, V)> {
        let hash = self.nodes.get(handle)?.hash;
        let bucket = self.bucket_of(hash);
        let successor = self.nodes.get(handle)?.next;

        if self.heads[bucket] == Some(handle) {
            self.heads[bucket] = successor;
        } else {
            let mut link = self.heads[bucket];
            while let Some(current) = link {
                let node = self.nodes.get_mut(current)?;
                if node.next == Some(handle) {
                    node.next = successor;
                    break;
                }
                link = node.next;
            }
        }

        self.nodes.remove(handle).map(|node| (node.key, node.value))
    }

    /// Rehash every node into the next prime-sized bucket table.
    fn grow(&mut self) {
        if self.size_class + 1 >= PRIME_CAPACITIES.len() {
            return;
        }
        self.size_class += 1;
        let capacity = PRIME_CAPACITIES[self.size_class];
        self.heads = vec![None; capacity];

        let placed: Vec<(Handle, u64)> = self
            .nodes
            .iter()
            .map(|(handle, node)| (handle, node.hash))
            .collect();
        for (handle, hash) in placed {
            let bucket = (hash % capacity as u64) as usize;
            let previous_head = self.heads[bucket];
            if let Some(node) = self.nodes.get_mut(handle) {
                node.next = previous_head;
            }
            self.heads[bucket] = Some(handle);
        }
    }

    /// Entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &K, &V)> + '_ {
        self.nodes
            .iter()
            .map(|(handle, node)| (handle, &node.key, &node.value))
    }

    pub fn cursor(&self) -> LevelCursor {
        LevelCursor::new()
    }

    /// Handle of the first node at or after slot `position`.
    pub(crate) fn next_from(&self, position: usize) -> Option<Handle> {
        self.nodes.next_occupied(position)
    }
}

/// Removal-safe traversal over one [`HashLevel`].
///
/// The cursor remembers a slot position instead of borrowing the level, so
/// the level (or an enclosing structure) can be mutated between advances and
/// nested cursors over different levels never alias.
#[derive(Debug, Clone, Default)]
pub struct LevelCursor {
    position: usize,
    current: Option<Handle>,
    pending: Option<Handle>,
    exhausted: bool,
}

impl LevelCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently yielded node.
    pub fn current(&self) -> Option<Handle> {
        self.current
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Mark the most recently yielded node for removal on the next advance.
    /// Returns false if nothing has been yielded.
    pub fn remove_current(&mut self) -> bool {
        match self.current.take() {
            Some(handle) => {
                self.pending = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Hand the pending removal to the caller instead of freeing it here.
    pub(crate) fn take_pending(&mut self) -> Option<Handle> {
        self.pending.take()
    }

    /// Move to the next live node without touching the pending removal.
    pub(crate) fn step<K: Hash + Eq, V>(&mut self, level: &HashLevel<K, V>) -> Option<Handle> {
        if self.exhausted {
            self.current = None;
            return None;
        }
        match level.next_from(self.position) {
            Some(handle) => {
                self.position = handle.index() + 1;
                self.current = Some(handle);
                Some(handle)
            }
            None => {
                self.current = None;
                self.exhausted = true;
                None
            }
        }
    }

    /// Free the pending node, if any, then yield the next one.
    pub fn advance<K: Hash + Eq, V>(&mut self, level: &mut HashLevel<K, V>) -> Option<Handle> {
        if let Some(handle) = self.take_pending() {
            level.remove_handle(handle);
        }
        self.step(level)
    }
}
