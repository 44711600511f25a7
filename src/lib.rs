//! probemap: four interchangeable key/value map backends behind one trait,
//! with deterministic hashing so that slot placement can be inspected and
//! tested exactly.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: compare classic map strategies on equal footing. Each backend
//!   implements [`Map`] and can be chosen at runtime through [`Backend`].
//! - Backends:
//!   - OpenAddressingMap<K, V>: fixed-size flat table, linear probing,
//!     tombstone deletion.
//!   - ClosedAddressingMap<K, V>: fixed bucket count, each bucket a
//!     [`SinglyLinkedList`]; duplicates are kept.
//!   - CuckooMap<K, V>: two arrays with independent hash functions,
//!     bounded eviction chains, growth by doubling.
//!   - AvlMap<K, V>: height-balanced search tree in a slotmap arena.
//!
//! Keys and hashing
//! - Keys implement [`TableKey`]: fixed-width integers, floats, `char`,
//!   `bool` and `String`. Hashing goes through `TableKey::fold`, never
//!   through `std::hash`, so positions depend only on `(key, capacity)`.
//! - Two hash families: [`modulo_hash`] for open/closed addressing and the
//!   first cuckoo array, [`multiplicative_hash`] for the second cuckoo
//!   array.
//!
//! Constraints
//! - Single-threaded; no interior mutability, no `unsafe`.
//! - Only cuckoo hashing resizes. Open addressing reports exhaustion and
//!   closed addressing only reports its load factor.
//! - Duplicate and not-found policy differs per backend; see [`Map`].
//!
//! Failure model
//! - Every fallible operation returns [`MapError`]. A failed operation
//!   leaves the map exactly as it was, including a cuckoo insert that runs
//!   out of rehash attempts.
//!
//! Logging
//! - Cuckoo growth is reported through the `log` facade at `debug`, an
//!   abandoned insert at `warn`, AVL rotations at `trace`. No logger is
//!   installed by the library.
//!
//! Notes and non-goals
//! - No iteration order guarantees across backends, no concurrent access,
//!   no persistence.

pub mod avl;
pub mod closed_addressing;
pub mod cuckoo;
mod error;
mod key;
mod map;
mod map_proptest;
pub mod open_addressing;
pub mod singly_linked_list;

// Public surface
pub use avl::{AvlMap, Rotations};
pub use closed_addressing::ClosedAddressingMap;
pub use cuckoo::{CuckooConfig, CuckooMap, Side};
pub use error::MapError;
pub use key::{modulo_hash, multiplicative_hash, TableKey, GOLDEN_FRACTION, MULTIPLICATIVE_DOMAIN};
pub use map::{Backend, Map};
pub use open_addressing::OpenAddressingMap;
pub use singly_linked_list::SinglyLinkedList;
