//! Error taxonomy shared by every backend.
//!
//! Not every backend raises every variant: closed addressing and cuckoo
//! hashing treat removal of an absent key as a successful no-op, while
//! open addressing and the AVL tree report `NotFound`. Callers that need a
//! uniform answer should `search` first.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    /// Open addressing insert while every slot holds a live entry.
    #[error("capacity exhausted: all {capacity} slots are live")]
    CapacityExhausted { capacity: usize },

    /// A probe went all the way around the table without finding a slot
    /// that could take the entry. Cannot currently occur: open addressing
    /// rejects a table with every slot live as `CapacityExhausted` first, so
    /// any full lap meets a vacant or tombstone slot.
    #[error("table is full")]
    TableFull,

    /// Open addressing insert of a key that is already live.
    #[error("key already exists")]
    DuplicateKey,

    #[error("key not found")]
    NotFound,

    /// Sequence position outside the valid range.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Hash backends need at least one slot or bucket.
    #[error("capacity must be greater than zero")]
    InvalidCapacity,

    /// Cuckoo growth gave up after `attempts` doublings; the table still
    /// holds every entry it had before the failed insert.
    #[error("rehash limit reached after {attempts} doublings (capacity {capacity})")]
    RehashLimit { attempts: usize, capacity: usize },

    #[error("unknown backend: {0:?}")]
    UnknownBackend(String),
}

#[cfg(test)]
mod tests {
    use super::MapError;

    #[test]
    fn messages_carry_context() {
        let e = MapError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(e.to_string(), "index 4 out of range for length 2");

        let e = MapError::CapacityExhausted { capacity: 8 };
        assert_eq!(e.to_string(), "capacity exhausted: all 8 slots are live");

        let e = MapError::UnknownBackend("splay".to_string());
        assert_eq!(e.to_string(), "unknown backend: \"splay\"");
    }
}
