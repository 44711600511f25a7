//! ClosedAddressingMap: separate chaining over a fixed number of buckets.
//!
//! Each bucket is an independent [`SinglyLinkedList`]. Inserts append to
//! the tail of the key's bucket without looking for an existing entry, so a
//! key inserted twice is stored twice; `search` and `remove` act on the
//! oldest matching entry. The bucket count never changes: the load factor is
//! reported but never triggers a resize.

use crate::error::MapError;
use crate::key::{modulo_hash, TableKey};
use crate::map::{Backend, Map};
use crate::singly_linked_list::SinglyLinkedList;
use core::fmt;

#[derive(Clone, Debug)]
pub struct ClosedAddressingMap<K, V> {
    buckets: Vec<SinglyLinkedList<K, V>>,
    len: usize,
}

impl<K: TableKey, V> ClosedAddressingMap<K, V> {
    pub fn with_capacity(bucket_count: usize) -> Result<Self, MapError> {
        if bucket_count == 0 {
            return Err(MapError::InvalidCapacity);
        }
        let mut buckets = Vec::with_capacity(bucket_count);
        buckets.resize_with(bucket_count, SinglyLinkedList::new);
        Ok(Self { buckets, len: 0 })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Entries per bucket. Purely observational.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.buckets.len() as f64
    }

    /// Bucket index `key` hashes to.
    pub fn bucket_of(&self, key: &K) -> usize {
        modulo_hash(key, self.buckets.len())
    }

    /// Read access to one chain, in insertion order.
    pub fn bucket(&self, index: usize) -> Option<&SinglyLinkedList<K, V>> {
        self.buckets.get(index)
    }

    /// Append `(key, value)` to the tail of its bucket. Never fails.
    pub fn insert(&mut self, key: K, value: V) {
        let index = self.bucket_of(&key);
        self.buckets[index].push_back(key, value);
        self.len += 1;
    }

    /// Remove the first entry for `key` from its bucket. An absent key is a
    /// no-op; the removed pair is returned when there was one.
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let index = self.bucket_of(key);
        let bucket = &mut self.buckets[index];
        let position = bucket.find(key)?;
        let removed = bucket.remove(position).ok()?;
        self.len -= 1;
        Some(removed)
    }

    pub fn search(&self, key: &K) -> Result<&V, MapError> {
        self.buckets[self.bucket_of(key)]
            .lookup(key)
            .ok_or(MapError::NotFound)
    }

    /// Every stored entry, bucket by bucket, each bucket in chain order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.buckets.iter().flat_map(|b| b.iter())
    }
}

impl<K: TableKey, V> Map<K, V> for ClosedAddressingMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> Result<(), MapError> {
        ClosedAddressingMap::insert(self, key, value);
        Ok(())
    }

    fn remove(&mut self, key: &K) -> Result<(), MapError> {
        ClosedAddressingMap::remove(self, key);
        Ok(())
    }

    fn search(&self, key: &K) -> Result<&V, MapError> {
        ClosedAddressingMap::search(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn backend(&self) -> Backend {
        Backend::ClosedAddressing
    }
}

/// One line per non-empty bucket, chained entries left to right.
impl<K: fmt::Display, V: fmt::Display> fmt::Display for ClosedAddressingMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bucket in self.buckets.iter().filter(|b| !b.is_empty()) {
            writeln!(f, "{}", bucket)?;
        }
        Ok(())
    }
}
