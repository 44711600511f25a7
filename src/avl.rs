//! AvlMap: height-balanced binary search tree used as a map backend.
//!
//! Nodes live in a `SlotMap` arena owned by the map and refer to their
//! children by `NodeId`. Every id is held by exactly one parent link (or by
//! `root`), so the arena is tree-shaped: no sharing, no cycles, and dropping
//! the map frees every node without recursion.
//!
//! Insert and remove descend recursively and rebalance each node on the way
//! back up, so the recursion depth is the tree height, O(log n).

use crate::error::MapError;
use crate::key::TableKey;
use crate::map::{Backend, Map};
use core::cmp::Ordering;
use core::fmt;
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    struct NodeId;
}

struct Node<K, V> {
    key: K,
    value: V,
    left: Option<NodeId>,
    right: Option<NodeId>,
    height: i32,
}

/// Running totals of single rotations performed by a tree. A double
/// rotation counts once on each side.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Rotations {
    pub left: usize,
    pub right: usize,
}

/// AVL tree map.
///
/// Inserting a key that is already present is a no-op: neither the key nor
/// its value change. Removing an absent key reports [`MapError::NotFound`]
/// and leaves the tree as it was.
pub struct AvlMap<K, V> {
    nodes: SlotMap<NodeId, Node<K, V>>,
    root: Option<NodeId>,
    rotations: Rotations,
}

impl<K: TableKey, V> AvlMap<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            rotations: Rotations::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Height of the whole tree; 0 when empty.
    pub fn height(&self) -> usize {
        self.height_of(self.root) as usize
    }

    pub fn rotations(&self) -> Rotations {
        self.rotations
    }

    pub fn root_key(&self) -> Option<&K> {
        self.root.map(|id| &self.nodes[id].key)
    }

    /// Insert `key` unless it is already present. Returns whether the tree
    /// changed.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let root = self.root;
        let (root, inserted) = self.insert_at(root, key, value);
        self.root = Some(root);
        inserted
    }

    /// Remove `key` and return its value.
    pub fn remove(&mut self, key: &K) -> Result<V, MapError> {
        let mut removed = None;
        let root = self.root;
        self.root = self.remove_at(root, key, &mut removed);
        removed.ok_or(MapError::NotFound)
    }

    pub fn search(&self, key: &K) -> Result<&V, MapError> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.nodes[id];
            cur = match key.compare(&node.key) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Ok(&node.value),
            };
        }
        Err(MapError::NotFound)
    }

    fn height_of(&self, node: Option<NodeId>) -> i32 {
        node.map_or(0, |id| self.nodes[id].height)
    }

    fn balance_factor(&self, id: NodeId) -> i32 {
        let node = &self.nodes[id];
        self.height_of(node.right) - self.height_of(node.left)
    }

    fn update_height(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let height = self.height_of(node.left).max(self.height_of(node.right)) + 1;
        self.nodes[id].height = height;
    }

    fn rotate_right(&mut self, id: NodeId) -> NodeId {
        let Some(pivot) = self.nodes[id].left else {
            return id;
        };
        self.nodes[id].left = self.nodes[pivot].right;
        self.nodes[pivot].right = Some(id);
        self.update_height(id);
        self.update_height(pivot);
        self.rotations.right += 1;
        log::trace!("avl: right rotation at {:?}", self.nodes[id].key);
        pivot
    }

    fn rotate_left(&mut self, id: NodeId) -> NodeId {
        let Some(pivot) = self.nodes[id].right else {
            return id;
        };
        self.nodes[id].right = self.nodes[pivot].left;
        self.nodes[pivot].left = Some(id);
        self.update_height(id);
        self.update_height(pivot);
        self.rotations.left += 1;
        log::trace!("avl: left rotation at {:?}", self.nodes[id].key);
        pivot
    }

    /// Restore the height invariant at `id`; returns the subtree's new root.
    fn rebalance(&mut self, id: NodeId) -> NodeId {
        self.update_height(id);
        match self.balance_factor(id) {
            2 => {
                if let Some(right) = self.nodes[id].right {
                    if self.balance_factor(right) < 0 {
                        let right = self.rotate_right(right);
                        self.nodes[id].right = Some(right);
                    }
                }
                self.rotate_left(id)
            }
            -2 => {
                if let Some(left) = self.nodes[id].left {
                    if self.balance_factor(left) > 0 {
                        let left = self.rotate_left(left);
                        self.nodes[id].left = Some(left);
                    }
                }
                self.rotate_right(id)
            }
            _ => id,
        }
    }

    fn insert_at(&mut self, node: Option<NodeId>, key: K, value: V) -> (NodeId, bool) {
        let Some(id) = node else {
            let leaf = self.nodes.insert(Node {
                key,
                value,
                left: None,
                right: None,
                height: 1,
            });
            return (leaf, true);
        };
        let inserted = match key.compare(&self.nodes[id].key) {
            Ordering::Less => {
                let left = self.nodes[id].left;
                let (child, inserted) = self.insert_at(left, key, value);
                self.nodes[id].left = Some(child);
                inserted
            }
            Ordering::Greater => {
                let right = self.nodes[id].right;
                let (child, inserted) = self.insert_at(right, key, value);
                self.nodes[id].right = Some(child);
                inserted
            }
            Ordering::Equal => false,
        };
        if inserted {
            (self.rebalance(id), true)
        } else {
            (id, false)
        }
    }

    /// Unlink the leftmost node of the subtree at `id`. Returns that node
    /// and the rebalanced remainder of the subtree.
    fn detach_min(&mut self, id: NodeId) -> (NodeId, Option<NodeId>) {
        match self.nodes[id].left {
            None => (id, self.nodes[id].right),
            Some(left) => {
                let (min, rest) = self.detach_min(left);
                self.nodes[id].left = rest;
                (min, Some(self.rebalance(id)))
            }
        }
    }

    fn remove_at(
        &mut self,
        node: Option<NodeId>,
        key: &K,
        removed: &mut Option<V>,
    ) -> Option<NodeId> {
        let id = node?;
        match key.compare(&self.nodes[id].key) {
            Ordering::Less => {
                let left = self.nodes[id].left;
                self.nodes[id].left = self.remove_at(left, key, removed);
            }
            Ordering::Greater => {
                let right = self.nodes[id].right;
                self.nodes[id].right = self.remove_at(right, key, removed);
            }
            Ordering::Equal => {
                let gone = self.nodes.remove(id)?;
                *removed = Some(gone.value);
                let Some(right) = gone.right else {
                    return gone.left;
                };
                // The in-order successor takes the removed node's place.
                let (successor, rest) = self.detach_min(right);
                self.nodes[successor].left = gone.left;
                self.nodes[successor].right = rest;
                return Some(self.rebalance(successor));
            }
        }
        Some(self.rebalance(id))
    }

    fn in_order(&self) -> InOrder<'_, K, V> {
        InOrder {
            nodes: &self.nodes,
            stack: Vec::new(),
            next: self.root,
        }
    }
}

impl<K: TableKey + Default, V: Default> AvlMap<K, V> {
    /// Tree seeded with `size` default entries. All of them share the
    /// default key, so at most one node results.
    pub fn with_size(size: usize) -> Self {
        let mut map = Self::new();
        for _ in 0..size {
            map.insert(K::default(), V::default());
        }
        map
    }
}

impl<K: TableKey, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy by pre-order traversal and reinsertion.
impl<K: TableKey, V: Clone> Clone for AvlMap<K, V> {
    fn clone(&self) -> Self {
        let mut copy = Self::new();
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            stack.extend(node.left);
            stack.extend(node.right);
            copy.insert(node.key.clone(), node.value.clone());
        }
        copy
    }
}

impl<K: TableKey, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.in_order()).finish()
    }
}

impl<K: TableKey, V> Map<K, V> for AvlMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> Result<(), MapError> {
        AvlMap::insert(self, key, value);
        Ok(())
    }

    fn remove(&mut self, key: &K) -> Result<(), MapError> {
        AvlMap::remove(self, key).map(|_| ())
    }

    fn search(&self, key: &K) -> Result<&V, MapError> {
        AvlMap::search(self, key)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn backend(&self) -> Backend {
        Backend::Avl
    }
}

/// In-order walk with an explicit stack.
struct InOrder<'a, K, V> {
    nodes: &'a SlotMap<NodeId, Node<K, V>>,
    stack: Vec<NodeId>,
    next: Option<NodeId>,
}

impl<'a, K, V> Iterator for InOrder<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        while let Some(id) = self.next {
            self.stack.push(id);
            self.next = nodes[id].left;
        }
        let node = &nodes[self.stack.pop()?];
        self.next = node.right;
        Some((&node.key, &node.value))
    }
}

#[cfg(test)]
impl<K: TableKey, V> AvlMap<K, V> {
    /// Check heights, balance, ordering and node count; returns the height
    /// of the subtree at `node`.
    fn check_subtree(&self, node: Option<NodeId>, seen: &mut usize) -> i32 {
        let Some(id) = node else { return 0 };
        let n = &self.nodes[id];
        let hl = self.check_subtree(n.left, seen);
        let hr = self.check_subtree(n.right, seen);
        assert!((hr - hl).abs() <= 1, "unbalanced at {:?}", n.key);
        assert_eq!(n.height, hl.max(hr) + 1, "stale height at {:?}", n.key);
        *seen += 1;
        n.height
    }

    pub(crate) fn check_consistency(&self) {
        let mut seen = 0;
        self.check_subtree(self.root, &mut seen);
        assert_eq!(seen, self.len(), "reachable nodes differ from arena size");
        let keys: Vec<&K> = self.in_order().map(|(k, _)| k).collect();
        for pair in keys.windows(2) {
            assert_eq!(pair[0].compare(pair[1]), Ordering::Less, "keys out of order");
        }
    }

    fn children_of_root(&self) -> (Option<&K>, Option<&K>) {
        match self.root {
            Some(id) => {
                let n = &self.nodes[id];
                (
                    n.left.map(|c| &self.nodes[c].key),
                    n.right.map(|c| &self.nodes[c].key),
                )
            }
            None => (None, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

    /// Invariant: ascending 10, 20, 30 takes exactly one left rotation and
    /// leaves 20 at the root over 10 and 30.
    #[test]
    fn ascending_triple_rotates_left_once() {
        let mut m = AvlMap::new();
        for k in [10, 20, 30] {
            m.insert(k, ());
        }
        assert_eq!(m.rotations(), Rotations { left: 1, right: 0 });
        assert_eq!(m.root_key(), Some(&20));
        assert_eq!(m.children_of_root(), (Some(&10), Some(&30)));
        assert_eq!(m.height(), 2);
        m.check_consistency();
    }

    #[test]
    fn descending_triple_rotates_right_once() {
        let mut m = AvlMap::new();
        for k in [30, 20, 10] {
            m.insert(k, ());
        }
        assert_eq!(m.rotations(), Rotations { left: 0, right: 1 });
        assert_eq!(m.root_key(), Some(&20));
        assert_eq!(m.children_of_root(), (Some(&10), Some(&30)));
    }

    /// Invariant: zig-zag shapes take a double rotation.
    #[test]
    fn double_rotations() {
        let mut lr = AvlMap::new();
        for k in [30, 10, 20] {
            lr.insert(k, ());
        }
        assert_eq!(lr.rotations(), Rotations { left: 1, right: 1 });
        assert_eq!(lr.root_key(), Some(&20));
        assert_eq!(lr.children_of_root(), (Some(&10), Some(&30)));

        let mut rl = AvlMap::new();
        for k in [10, 30, 20] {
            rl.insert(k, ());
        }
        assert_eq!(rl.rotations(), Rotations { left: 1, right: 1 });
        assert_eq!(rl.root_key(), Some(&20));
        assert_eq!(rl.children_of_root(), (Some(&10), Some(&30)));
    }

    /// Invariant: inserting a present key changes nothing.
    #[test]
    fn duplicate_insert_is_noop() {
        let mut m = AvlMap::new();
        assert!(m.insert("k".to_string(), 1));
        assert!(!m.insert("k".to_string(), 2));
        assert_eq!(m.len(), 1);
        assert_eq!(m.search(&"k".to_string()), Ok(&1));
    }

    /// Invariant: removal of leaves, single-child and two-child nodes keeps
    /// the tree balanced and ordered; absent keys report `NotFound`.
    #[test]
    fn remove_shapes() {
        let mut m = AvlMap::new();
        for k in [50, 30, 70, 20, 40, 60, 80, 10] {
            m.insert(k, k * 2);
        }
        m.check_consistency();

        // leaf
        assert_eq!(m.remove(&80), Ok(160));
        m.check_consistency();
        // one child
        assert_eq!(m.remove(&20), Ok(40));
        m.check_consistency();
        // two children, root
        assert_eq!(m.remove(&50), Ok(100));
        m.check_consistency();
        assert_eq!(m.root_key(), Some(&60));

        assert_eq!(m.remove(&50), Err(MapError::NotFound));
        assert_eq!(m.len(), 5);
        for k in [10, 30, 40, 60, 70] {
            assert_eq!(m.search(&k), Ok(&(k * 2)));
        }
        for k in [20, 50, 80] {
            assert_eq!(m.search(&k), Err(MapError::NotFound));
        }
    }

    #[test]
    fn remove_until_empty() {
        let mut m = AvlMap::new();
        m.insert(1u8, 'a');
        assert_eq!(m.remove(&1), Ok('a'));
        assert!(m.is_empty());
        assert_eq!(m.root_key(), None);
        assert_eq!(m.height(), 0);
        assert_eq!(m.remove(&1), Err(MapError::NotFound));
    }

    /// Invariant: balance and ordering hold after every step of a shuffled
    /// insert/remove workload.
    #[test]
    fn shuffled_workload_stays_balanced() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut values: Vec<i32> = (0..1_000).collect();
        values.shuffle(&mut rng);

        let mut m = AvlMap::new();
        for v in &values {
            assert!(m.insert(*v, *v + 1));
            m.check_consistency();
        }
        assert_eq!(m.len(), values.len());

        values.shuffle(&mut rng);
        let (gone, kept) = values.split_at(values.len() / 2);
        for v in gone {
            assert_eq!(m.remove(v), Ok(*v + 1));
            m.check_consistency();
        }
        for v in gone {
            assert_eq!(m.search(v), Err(MapError::NotFound));
        }
        for v in kept {
            assert_eq!(m.search(v), Ok(&(*v + 1)));
        }
    }

    /// Invariant: sorted input still yields logarithmic height.
    #[test]
    fn sorted_range_height() {
        let mut m = AvlMap::new();
        for k in 0..1_000u32 {
            m.insert(k, ());
        }
        m.check_consistency();
        assert!(m.height() <= 14, "height {}", m.height());
    }

    #[test]
    fn with_size_collapses_to_one_node() {
        let m: AvlMap<i32, String> = AvlMap::with_size(5);
        assert_eq!(m.len(), 1);
        assert_eq!(m.search(&0).map(String::as_str), Ok(""));
        let empty: AvlMap<char, u8> = AvlMap::with_size(0);
        assert!(empty.is_empty());
    }

    /// Invariant: a clone holds the same entries in separate nodes.
    #[test]
    fn clone_is_deep() {
        let mut a = AvlMap::new();
        for k in ["m", "c", "x", "a", "e"] {
            a.insert(k.to_string(), k.len());
        }
        let mut b = a.clone();
        b.check_consistency();
        assert_eq!(format!("{:?}", a), format!("{:?}", b));

        a.remove(&"c".to_string()).unwrap();
        b.insert("z".to_string(), 1);
        assert_eq!(b.search(&"c".to_string()), Ok(&1));
        assert_eq!(a.search(&"z".to_string()), Err(MapError::NotFound));
    }

    #[test]
    fn float_keys_order_totally() {
        let mut m = AvlMap::new();
        for k in [2.5f64, -1.0, 0.0, -0.0, 10.25] {
            m.insert(k, ());
        }
        assert_eq!(m.len(), 5);
        m.check_consistency();
        assert_eq!(format!("{:?}", m), "{-1.0: (), -0.0: (), 0.0: (), 2.5: (), 10.25: ()}");
    }
}
