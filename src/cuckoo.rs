//! CuckooMap: two-table cuckoo hashing with bounded displacement.
//!
//! Design
//! - Two arrays of `capacity` slots. The first is indexed by
//!   [`modulo_hash`], the second by [`multiplicative_hash`]. A live key sits
//!   at its designated slot in exactly one of them, so lookups and removals
//!   examine two slots and never scan.
//! - Insert places the new pair in the first array, evicting the occupant
//!   to its slot in the second array, which may evict again into the first,
//!   and so on for at most `displacement_limit` rounds.
//! - Running out of rounds means the eviction chain is cycling. The swaps
//!   are undone so the tables are exactly as before the insert, then the
//!   table is rehashed: capacity doubles and every entry, plus the pending
//!   one, is laid out again. A layout that cycles doubles again.
//!
//! Growth bound
//! - Each insert may double the table at most `max_rehashes` times. After
//!   that the insert fails with [`MapError::RehashLimit`] and the table
//!   keeps every entry it had. Layouts are planned on borrowed keys and
//!   only committed once every entry has a slot, so a failed attempt moves
//!   nothing.

use crate::error::MapError;
use crate::key::{modulo_hash, multiplicative_hash, TableKey};
use crate::map::{Backend, Map};
use core::fmt;
use core::mem;

/// Tuning knobs for [`CuckooMap`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CuckooConfig {
    /// Eviction rounds per insert before a cycle is assumed. Each round
    /// touches one slot in each array. Zero is treated as one.
    pub displacement_limit: usize,
    /// Doublings a single insert may trigger before giving up.
    pub max_rehashes: usize,
}

impl Default for CuckooConfig {
    fn default() -> Self {
        Self {
            displacement_limit: 5,
            max_rehashes: 16,
        }
    }
}

/// Which of the two arrays a slot belongs to.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Side {
    First,
    Second,
}

fn slot_for<K: TableKey>(key: &K, side: Side, capacity: usize) -> usize {
    match side {
        Side::First => modulo_hash(key, capacity),
        Side::Second => multiplicative_hash(key, capacity),
    }
}

/// Eviction loop shared by insert and by rehash planning.
///
/// On success `item` (or whatever it evicted) ends up placed. On failure
/// every swap is reverted in reverse order and the original `item` is
/// handed back, leaving both tables untouched.
fn displace<T, F>(
    first: &mut [Option<T>],
    second: &mut [Option<T>],
    item: T,
    limit: usize,
    index_of: F,
) -> Result<(), T>
where
    F: Fn(&T, Side) -> usize,
{
    let mut carried = item;
    let mut path = Vec::with_capacity(2 * limit);
    for _ in 0..limit {
        for side in [Side::First, Side::Second] {
            let index = index_of(&carried, side);
            let table = match side {
                Side::First => &mut *first,
                Side::Second => &mut *second,
            };
            match &mut table[index] {
                Some(occupant) => {
                    mem::swap(occupant, &mut carried);
                    path.push((side, index));
                }
                empty => {
                    *empty = Some(carried);
                    return Ok(());
                }
            }
        }
    }

    for (side, index) in path.into_iter().rev() {
        let table = match side {
            Side::First => &mut *first,
            Side::Second => &mut *second,
        };
        if let Some(occupant) = &mut table[index] {
            mem::swap(occupant, &mut carried);
        }
    }
    Err(carried)
}

/// Where an entry lives before a rehash commits.
#[derive(Copy, Clone, Debug)]
enum Origin {
    First(usize),
    Second(usize),
    Pending,
}

/// An entry being laid out during rehash planning.
#[derive(Clone)]
struct Planned<'a, K> {
    key: &'a K,
    origin: Origin,
}

type Layout = Vec<Option<Origin>>;

/// Cuckoo hash map with amortized O(1) insert and two-probe lookups.
///
/// Inserting a key that is already present is a no-op: the stored value is
/// kept. Removing an absent key is a no-op as well.
#[derive(Clone, Debug)]
pub struct CuckooMap<K, V> {
    first: Vec<Option<(K, V)>>,
    second: Vec<Option<(K, V)>>,
    capacity: usize,
    len: usize,
    rehashes: usize,
    config: CuckooConfig,
}

impl<K: TableKey, V> CuckooMap<K, V> {
    pub fn with_capacity(capacity: usize) -> Result<Self, MapError> {
        Self::with_config(capacity, CuckooConfig::default())
    }

    pub fn with_config(capacity: usize, config: CuckooConfig) -> Result<Self, MapError> {
        if capacity == 0 {
            return Err(MapError::InvalidCapacity);
        }
        let config = CuckooConfig {
            displacement_limit: config.displacement_limit.max(1),
            ..config
        };
        Ok(Self {
            first: empty_table(capacity),
            second: empty_table(capacity),
            capacity,
            len: 0,
            rehashes: 0,
            config,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Slots per array.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Live entries over the per-array capacity.
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.capacity as f64
    }

    /// Total doublings since construction; the capacity is always the
    /// initial capacity times `2^rehash_count()`.
    pub fn rehash_count(&self) -> usize {
        self.rehashes
    }

    pub fn config(&self) -> CuckooConfig {
        self.config
    }

    /// Array and slot holding `key`, checking only its two designated slots.
    pub fn position(&self, key: &K) -> Option<(Side, usize)> {
        [Side::First, Side::Second].into_iter().find_map(|side| {
            let index = slot_for(key, side, self.capacity);
            match &self.table(side)[index] {
                Some((k, _)) if k.same(key) => Some((side, index)),
                _ => None,
            }
        })
    }

    fn table(&self, side: Side) -> &[Option<(K, V)>] {
        match side {
            Side::First => &self.first,
            Side::Second => &self.second,
        }
    }

    fn table_mut(&mut self, side: Side) -> &mut [Option<(K, V)>] {
        match side {
            Side::First => &mut self.first,
            Side::Second => &mut self.second,
        }
    }

    /// Insert `key` unless it is already present.
    ///
    /// Fails only when a displacement cycle persists through
    /// `max_rehashes` doublings.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), MapError> {
        if self.position(&key).is_some() {
            return Ok(());
        }
        let capacity = self.capacity;
        let placed = displace(
            &mut self.first,
            &mut self.second,
            (key, value),
            self.config.displacement_limit,
            |entry: &(K, V), side| slot_for(&entry.0, side, capacity),
        );
        match placed {
            Ok(()) => {
                self.len += 1;
                Ok(())
            }
            Err(pending) => self.rehash(pending),
        }
    }

    /// Clear the slot holding `key` and return its entry. Absent keys are a
    /// silent no-op.
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let (side, index) = self.position(key)?;
        let removed = self.table_mut(side)[index].take()?;
        self.len -= 1;
        Some(removed)
    }

    pub fn search(&self, key: &K) -> Result<&V, MapError> {
        let (side, index) = self.position(key).ok_or(MapError::NotFound)?;
        match &self.table(side)[index] {
            Some((_, value)) => Ok(value),
            None => Err(MapError::NotFound),
        }
    }

    /// Every live entry with its array and slot; first array, then second.
    pub fn iter(&self) -> impl Iterator<Item = (Side, usize, &K, &V)> + '_ {
        occupied(&self.first)
            .map(|(i, k, v)| (Side::First, i, k, v))
            .chain(occupied(&self.second).map(|(i, k, v)| (Side::Second, i, k, v)))
    }

    /// Double until every entry plus `pending` fits, then commit.
    fn rehash(&mut self, pending: (K, V)) -> Result<(), MapError> {
        let mut capacity = self.capacity;
        let mut attempts = 0;
        while attempts < self.config.max_rehashes {
            capacity = match capacity.checked_mul(2) {
                Some(c) => c,
                None => break,
            };
            attempts += 1;
            if let Some((first, second)) = self.plan(capacity, &pending.0) {
                log::debug!(
                    "cuckoo rehash: capacity {} -> {} ({} doubling(s), {} entries)",
                    self.capacity,
                    capacity,
                    attempts,
                    self.len + 1
                );
                self.commit(capacity, first, second, pending);
                self.rehashes += attempts;
                return Ok(());
            }
        }
        log::warn!(
            "cuckoo rehash gave up after {} doubling(s) at capacity {}; dropping key {:?}",
            attempts,
            self.capacity,
            pending.0
        );
        Err(MapError::RehashLimit {
            attempts,
            capacity: self.capacity,
        })
    }

    /// Lay out every live key plus `pending` at `capacity`, borrowing keys
    /// only. `None` if some entry cannot be placed.
    fn plan(&self, capacity: usize, pending: &K) -> Option<(Layout, Layout)> {
        let mut first: Vec<Option<Planned<'_, K>>> = vec![None; capacity];
        let mut second: Vec<Option<Planned<'_, K>>> = vec![None; capacity];

        let entries = occupied(&self.first)
            .map(|(i, key, _)| Planned {
                key,
                origin: Origin::First(i),
            })
            .chain(occupied(&self.second).map(|(i, key, _)| Planned {
                key,
                origin: Origin::Second(i),
            }))
            .chain(core::iter::once(Planned {
                key: pending,
                origin: Origin::Pending,
            }));

        for entry in entries {
            displace(
                &mut first,
                &mut second,
                entry,
                self.config.displacement_limit,
                |p, side| slot_for(p.key, side, capacity),
            )
            .ok()?;
        }

        Some((origins(first), origins(second)))
    }

    /// Move every entry to the slot `plan` chose for it.
    fn commit(&mut self, capacity: usize, first: Layout, second: Layout, pending: (K, V)) {
        let mut old_first = mem::take(&mut self.first);
        let mut old_second = mem::take(&mut self.second);
        let mut pending = Some(pending);
        let mut claim = |origin: Origin| match origin {
            Origin::First(i) => old_first[i].take(),
            Origin::Second(i) => old_second[i].take(),
            Origin::Pending => pending.take(),
        };
        self.first = first.into_iter().map(|o| o.and_then(&mut claim)).collect();
        self.second = second.into_iter().map(|o| o.and_then(&mut claim)).collect();
        self.capacity = capacity;
        self.len += 1;
    }
}

fn occupied<K, V>(table: &[Option<(K, V)>]) -> impl Iterator<Item = (usize, &K, &V)> + '_ {
    table
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.as_ref().map(|(k, v)| (i, k, v)))
}

fn origins<K>(planned: Vec<Option<Planned<'_, K>>>) -> Layout {
    planned.into_iter().map(|p| p.map(|p| p.origin)).collect()
}

fn empty_table<T>(capacity: usize) -> Vec<Option<T>> {
    let mut table = Vec::with_capacity(capacity);
    table.resize_with(capacity, || None);
    table
}

impl<K: TableKey, V> Map<K, V> for CuckooMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> Result<(), MapError> {
        CuckooMap::insert(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Result<(), MapError> {
        CuckooMap::remove(self, key);
        Ok(())
    }

    fn search(&self, key: &K) -> Result<&V, MapError> {
        CuckooMap::search(self, key)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn backend(&self) -> Backend {
        Backend::Cuckoo
    }
}

struct Cell<'a, K, V>(&'a Option<(K, V)>);

impl<K: fmt::Display, V: fmt::Display> fmt::Display for Cell<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((k, v)) => write!(f, "{{ {}, {} }}", k, v),
            None => f.write_str("{ - }"),
        }
    }
}

/// Side-by-side dump of both arrays, one row per index with at least one
/// occupied slot.
impl<K: fmt::Display, V: fmt::Display> fmt::Display for CuckooMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Array 1 | Array 2")?;
        for (i, (a, b)) in self.first.iter().zip(&self.second).enumerate() {
            if a.is_some() || b.is_some() {
                writeln!(f, "{}: {} {}", i, Cell(a), Cell(b))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every live key sits at its own hash in the array that holds it.
    fn assert_placement<K: TableKey, V>(m: &CuckooMap<K, V>) {
        let mut count = 0;
        for (side, index, key, _) in m.iter() {
            assert_eq!(index, slot_for(key, side, m.capacity()), "{:?} misplaced", key);
            assert_eq!(m.position(key), Some((side, index)));
            count += 1;
        }
        assert_eq!(count, m.len());
    }

    const SCENARIO: [i32; 10] = [20, 50, 53, 75, 100, 67, 105, 36, 3, 39];

    /// Invariant: the reference key set at capacity 11 loses nothing, forces
    /// rehashing, and ends at 11 doubled twice.
    #[test]
    fn reference_scenario() {
        let mut m = CuckooMap::with_capacity(11).unwrap();
        for k in SCENARIO {
            m.insert(k, k * 10).unwrap();
            assert_placement(&m);
        }
        assert_eq!(m.len(), SCENARIO.len());
        assert!(m.rehash_count() >= 1);
        assert_eq!(m.capacity(), 11 << m.rehash_count());
        assert_eq!(m.capacity(), 44);
        for k in SCENARIO {
            assert_eq!(m.search(&k), Ok(&(k * 10)));
        }
    }

    /// Invariant: re-inserting a present key is a no-op that keeps the value.
    #[test]
    fn duplicate_insert_is_noop() {
        let mut m = CuckooMap::with_capacity(8).unwrap();
        m.insert("a".to_string(), 1).unwrap();
        m.insert("a".to_string(), 2).unwrap();
        assert_eq!(m.len(), 1);
        assert_eq!(m.search(&"a".to_string()), Ok(&1));
    }

    /// Invariant: evicted keys move to the second array and stay findable;
    /// removal clears exactly the designated slot.
    #[test]
    fn eviction_and_remove() {
        let mut m = CuckooMap::with_capacity(11).unwrap();
        m.insert(9, 'a').unwrap();
        m.insert(20, 'b').unwrap();
        assert_eq!(m.position(&20), Some((Side::First, 9)));
        assert_eq!(m.position(&9), Some((Side::Second, 0)));
        assert_placement(&m);

        assert_eq!(m.remove(&9), Some((9, 'a')));
        assert_eq!(m.search(&9), Err(MapError::NotFound));
        assert_eq!(m.remove(&9), None);
        assert_eq!(m.remove(&31), None);
        assert_eq!(m.search(&20), Ok(&'b'));
        assert_eq!(m.len(), 1);
    }

    /// Invariant: with no growth allowed a cycle surfaces as `RehashLimit`
    /// and the table is left exactly as it was.
    #[test]
    fn rehash_limit_preserves_entries() {
        let config = CuckooConfig {
            displacement_limit: 5,
            max_rehashes: 0,
        };
        let mut m = CuckooMap::with_config(11, config).unwrap();
        m.insert(9, 9).unwrap();
        m.insert(20, 20).unwrap();
        // 9, 20 and 31 share both designated slots at capacity 11.
        assert_eq!(
            m.insert(31, 31),
            Err(MapError::RehashLimit {
                attempts: 0,
                capacity: 11
            })
        );
        assert_eq!(m.len(), 2);
        assert_eq!(m.capacity(), 11);
        assert_eq!(m.position(&20), Some((Side::First, 9)));
        assert_eq!(m.position(&9), Some((Side::Second, 0)));
        assert_eq!(m.search(&31), Err(MapError::NotFound));
    }

    /// Invariant: one doubling is enough when the grown layout separates the
    /// cycling keys.
    #[test]
    fn single_rehash_resolves_cycle() {
        let config = CuckooConfig {
            displacement_limit: 5,
            max_rehashes: 1,
        };
        let mut m = CuckooMap::with_config(11, config).unwrap();
        for k in [9, 20, 31] {
            m.insert(k, k).unwrap();
        }
        assert_eq!(m.capacity(), 22);
        assert_eq!(m.rehash_count(), 1);
        assert_placement(&m);
        for k in [9, 20, 31] {
            assert_eq!(m.search(&k), Ok(&k));
        }
    }

    /// Invariant: a zero displacement limit still makes progress.
    #[test]
    fn zero_displacement_limit_is_clamped() {
        let config = CuckooConfig {
            displacement_limit: 0,
            max_rehashes: 4,
        };
        let mut m = CuckooMap::with_config(4, config).unwrap();
        assert_eq!(m.config().displacement_limit, 1);
        m.insert(1u8, ()).unwrap();
        assert_eq!(m.search(&1), Ok(&()));
    }

    #[test]
    fn string_keys() {
        let mut m = CuckooMap::with_capacity(5).unwrap();
        for w in ["alpha", "beta", "gamma", "delta", "epsilon", "zeta"] {
            m.insert(w.to_string(), w.len()).unwrap();
        }
        assert_eq!(m.len(), 6);
        assert_placement(&m);
        assert_eq!(m.search(&"gamma".to_string()), Ok(&5));
    }

    #[test]
    fn display_rows() {
        let mut m = CuckooMap::with_capacity(11).unwrap();
        m.insert(9, 1).unwrap();
        m.insert(20, 2).unwrap();
        assert_eq!(
            m.to_string(),
            "Array 1 | Array 2\n0: { - } { 9, 1 }\n9: { 20, 2 } { - }\n"
        );
    }

    /// Invariant: a clone owns its own arrays.
    #[test]
    fn clone_is_deep() {
        let mut a = CuckooMap::with_capacity(4).unwrap();
        a.insert(1, "one".to_string()).unwrap();
        let b = a.clone();
        a.remove(&1);
        assert!(a.is_empty());
        assert_eq!(b.search(&1).map(String::as_str), Ok("one"));
    }
}
