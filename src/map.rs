//! The map contract shared by all backends and the backend selector.

use crate::avl::AvlMap;
use crate::closed_addressing::ClosedAddressingMap;
use crate::cuckoo::CuckooMap;
use crate::error::MapError;
use crate::key::TableKey;
use crate::open_addressing::OpenAddressingMap;
use core::fmt;
use core::str::FromStr;

/// Operations every backend supports.
///
/// What happens on a duplicate insert or on removing an absent key is up to
/// the backend:
///
/// | backend            | insert existing key | remove absent key |
/// |--------------------|---------------------|-------------------|
/// | open addressing    | `DuplicateKey`      | `NotFound`        |
/// | closed addressing  | second chain entry  | `Ok(())`          |
/// | cuckoo             | `Ok(())`, unchanged | `Ok(())`          |
/// | AVL                | `Ok(())`, unchanged | `NotFound`        |
///
/// `search` reports `NotFound` everywhere.
pub trait Map<K, V> {
    fn insert(&mut self, key: K, value: V) -> Result<(), MapError>;

    fn remove(&mut self, key: &K) -> Result<(), MapError>;

    fn search(&self, key: &K) -> Result<&V, MapError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn backend(&self) -> Backend;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Backend {
    OpenAddressing,
    ClosedAddressing,
    Cuckoo,
    Avl,
}

impl Backend {
    pub const ALL: [Backend; 4] = [
        Backend::OpenAddressing,
        Backend::ClosedAddressing,
        Backend::Cuckoo,
        Backend::Avl,
    ];

    /// Construct an empty map of this kind.
    ///
    /// `capacity` is the slot count for open addressing, the bucket count
    /// for closed addressing and the initial per-array size for cuckoo
    /// hashing. The AVL tree grows on demand and ignores it.
    pub fn build<K, V>(self, capacity: usize) -> Result<Box<dyn Map<K, V>>, MapError>
    where
        K: TableKey + 'static,
        V: 'static,
    {
        let map: Box<dyn Map<K, V>> = match self {
            Backend::OpenAddressing => Box::new(OpenAddressingMap::with_capacity(capacity)?),
            Backend::ClosedAddressing => Box::new(ClosedAddressingMap::with_capacity(capacity)?),
            Backend::Cuckoo => Box::new(CuckooMap::with_capacity(capacity)?),
            Backend::Avl => Box::new(AvlMap::new()),
        };
        Ok(map)
    }

    fn name(self) -> &'static str {
        match self {
            Backend::OpenAddressing => "open-addressing",
            Backend::ClosedAddressing => "closed-addressing",
            Backend::Cuckoo => "cuckoo",
            Backend::Avl => "avl",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = MapError;

    /// Accepts the display name, case-insensitively, with `_` or `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Backend::ALL
            .into_iter()
            .find(|b| b.name() == wanted)
            .ok_or_else(|| MapError::UnknownBackend(s.to_string()))
    }
}
