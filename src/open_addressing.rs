//! OpenAddressingMap: fixed-size flat table with linear probing and
//! tombstone deletion.
//!
//! Removal never compacts the table. A removed entry leaves a tombstone
//! that probes walk past, so keys stored further along the same run stay
//! reachable. Every probe stops either at a never-used slot or after one
//! full lap around the table, whichever comes first; the lap bound is what
//! keeps a table made entirely of tombstones from looping forever.

use crate::error::MapError;
use crate::key::{modulo_hash, TableKey};
use crate::map::{Backend, Map};

#[derive(Clone, Debug)]
enum Slot<K, V> {
    /// Never held an entry; ends every probe.
    Vacant,
    Occupied {
        key: K,
        value: V,
    },
    /// Held an entry that was removed; probes continue past it and inserts
    /// may reuse it.
    Tombstone,
}

/// Linear-probing hash map with a fixed capacity.
///
/// Keys are unique: inserting a key that is already live fails with
/// [`MapError::DuplicateKey`] and leaves the stored value untouched.
#[derive(Clone, Debug)]
pub struct OpenAddressingMap<K, V> {
    slots: Vec<Slot<K, V>>,
    len: usize,
    tombstones: usize,
}

impl<K: TableKey, V> OpenAddressingMap<K, V> {
    pub fn with_capacity(capacity: usize) -> Result<Self, MapError> {
        if capacity == 0 {
            return Err(MapError::InvalidCapacity);
        }
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Vacant);
        Ok(Self {
            slots,
            len: 0,
            tombstones: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Live entries over capacity. Tombstones do not count.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity() as f64
    }

    /// Number of slots currently holding a tombstone.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// Slot index holding `key` live, if any.
    fn probe(&self, key: &K) -> Option<usize> {
        let capacity = self.capacity();
        let start = modulo_hash(key, capacity);
        let mut index = start;
        loop {
            match &self.slots[index] {
                Slot::Vacant => return None,
                Slot::Occupied { key: k, .. } if k.same(key) => return Some(index),
                _ => {}
            }
            index = (index + 1) % capacity;
            if index == start {
                return None;
            }
        }
    }

    /// Insert a new key.
    ///
    /// Fails with `CapacityExhausted` when every slot is live and with
    /// `DuplicateKey` when the key is already present. The entry lands in
    /// the first tombstone or vacant slot of its probe run.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), MapError> {
        let capacity = self.capacity();
        if self.len == capacity {
            return Err(MapError::CapacityExhausted { capacity });
        }

        let start = modulo_hash(&key, capacity);
        let mut index = start;
        let mut reusable = None;
        loop {
            match &self.slots[index] {
                Slot::Vacant => {
                    reusable = reusable.or(Some(index));
                    break;
                }
                Slot::Tombstone => {
                    reusable = reusable.or(Some(index));
                }
                Slot::Occupied { key: k, .. } => {
                    if k.same(&key) {
                        return Err(MapError::DuplicateKey);
                    }
                }
            }
            index = (index + 1) % capacity;
            if index == start {
                break;
            }
        }

        let index = reusable.ok_or(MapError::TableFull)?;
        if let Slot::Tombstone = self.slots[index] {
            self.tombstones -= 1;
        }
        self.slots[index] = Slot::Occupied { key, value };
        self.len += 1;
        Ok(())
    }

    /// Tombstone the live entry for `key`; `NotFound` if there is none.
    pub fn remove(&mut self, key: &K) -> Result<(), MapError> {
        let index = self.probe(key).ok_or(MapError::NotFound)?;
        self.slots[index] = Slot::Tombstone;
        self.len -= 1;
        self.tombstones += 1;
        Ok(())
    }

    pub fn search(&self, key: &K) -> Result<&V, MapError> {
        match self.probe(key).map(|index| &self.slots[index]) {
            Some(Slot::Occupied { value, .. }) => Ok(value),
            _ => Err(MapError::NotFound),
        }
    }
}

impl<K: TableKey, V> Map<K, V> for OpenAddressingMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> Result<(), MapError> {
        OpenAddressingMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<(), MapError> {
        OpenAddressingMap::remove(self, key)
    }

    fn search(&self, key: &K) -> Result<&V, MapError> {
        OpenAddressingMap::search(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn backend(&self) -> Backend {
        Backend::OpenAddressing
    }
}
