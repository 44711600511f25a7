//! SinglyLinkedList: ordered key/value chain used as bucket storage by the
//! closed-addressing map.
//!
//! Each node is owned by the link before it (`Option<Box<Node>>`), so a
//! chain is a plain ownership path with no sharing. Walking, cloning and
//! dropping are all iterative; a bucket that degenerates into a very long
//! chain never recurses.

use crate::error::MapError;
use crate::key::TableKey;
use core::fmt;

type Link<K, V> = Option<Box<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    next: Link<K, V>,
}

pub struct SinglyLinkedList<K, V> {
    head: Link<K, V>,
    len: usize,
}

/// Follows `next` links to the empty link after the last node.
fn tail_of<K, V>(link: &mut Link<K, V>) -> &mut Link<K, V> {
    let mut cur = link;
    while let Some(node) = cur {
        cur = &mut node.next;
    }
    cur
}

impl<K, V> SinglyLinkedList<K, V> {
    pub fn new() -> Self {
        Self { head: None, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn push_front(&mut self, key: K, value: V) {
        let next = self.head.take();
        self.head = Some(Box::new(Node { key, value, next }));
        self.len += 1;
    }

    pub fn push_back(&mut self, key: K, value: V) {
        *tail_of(&mut self.head) = Some(Box::new(Node {
            key,
            value,
            next: None,
        }));
        self.len += 1;
    }

    /// Link that holds position `index`. `None` past the end.
    fn link_at(&mut self, index: usize) -> Option<&mut Link<K, V>> {
        let mut cur = &mut self.head;
        for _ in 0..index {
            cur = &mut cur.as_mut()?.next;
        }
        Some(cur)
    }

    /// Insert so the new entry ends up at position `index`, shifting the
    /// entry already there back by one. `index` must be in `[0, len)`;
    /// appending goes through `push_back`.
    pub fn insert(&mut self, key: K, value: V, index: usize) -> Result<(), MapError> {
        let len = self.len;
        let out_of_range = MapError::IndexOutOfRange { index, len };
        if index >= len {
            return Err(out_of_range);
        }
        let link = self.link_at(index).ok_or(out_of_range)?;
        let next = link.take();
        *link = Some(Box::new(Node { key, value, next }));
        self.len += 1;
        Ok(())
    }

    /// Unlink the entry at `index` and hand it back.
    pub fn remove(&mut self, index: usize) -> Result<(K, V), MapError> {
        let len = self.len;
        let out_of_range = MapError::IndexOutOfRange { index, len };
        if index >= len {
            return Err(out_of_range);
        }
        let link = self.link_at(index).ok_or(out_of_range.clone())?;
        let node = link.take().ok_or(out_of_range)?;
        let Node { key, value, next } = *node;
        *link = next;
        self.len -= 1;
        Ok((key, value))
    }

    pub fn pop_front(&mut self) -> Option<(K, V)> {
        self.remove(0).ok()
    }

    pub fn pop_back(&mut self) -> Option<(K, V)> {
        let last = self.len.checked_sub(1)?;
        self.remove(last).ok()
    }

    pub fn get(&self, index: usize) -> Result<&V, MapError> {
        self.iter()
            .nth(index)
            .map(|(_, v)| v)
            .ok_or(MapError::IndexOutOfRange {
                index,
                len: self.len,
            })
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            next: self.head.as_deref(),
            remaining: self.len,
        }
    }
}

impl<K: TableKey, V> SinglyLinkedList<K, V> {
    /// Position of the first entry whose key equals `key`.
    pub fn find(&self, key: &K) -> Option<usize> {
        self.iter().position(|(k, _)| k.same(key))
    }

    /// Value of the first entry whose key equals `key`.
    pub fn lookup(&self, key: &K) -> Option<&V> {
        self.iter().find(|(k, _)| k.same(key)).map(|(_, v)| v)
    }
}

impl<K, V> Default for SinglyLinkedList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Drop for SinglyLinkedList<K, V> {
    fn drop(&mut self) {
        let mut cur = self.head.take();
        while let Some(mut node) = cur {
            cur = node.next.take();
        }
    }
}

impl<K, V> Extend<(K, V)> for SinglyLinkedList<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let mut tail = tail_of(&mut self.head);
        for (key, value) in iter {
            let node = tail.insert(Box::new(Node {
                key,
                value,
                next: None,
            }));
            tail = &mut node.next;
            self.len += 1;
        }
    }
}

impl<K, V> FromIterator<(K, V)> for SinglyLinkedList<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<K: Clone, V: Clone> Clone for SinglyLinkedList<K, V> {
    fn clone(&self) -> Self {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for SinglyLinkedList<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Renders the chain as `{ k, v } -> { k, v } -> `.
impl<K: fmt::Display, V: fmt::Display> fmt::Display for SinglyLinkedList<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in self.iter() {
            write!(f, "{{ {}, {} }} -> ", k, v)?;
        }
        Ok(())
    }
}

/// Front-to-back iterator over a chain.
pub struct Iter<'a, K, V> {
    next: Option<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.next.map(|node| {
            self.next = node.next.as_deref();
            self.remaining -= 1;
            (&node.key, &node.value)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &SinglyLinkedList<i32, &'static str>) -> Vec<i32> {
        list.iter().map(|(k, _)| *k).collect()
    }

    /// Invariant: push_back preserves insertion order; push_front prepends.
    #[test]
    fn push_order() {
        let mut l = SinglyLinkedList::new();
        l.push_back(2, "b");
        l.push_back(3, "c");
        l.push_front(1, "a");
        assert_eq!(keys(&l), vec![1, 2, 3]);
        assert_eq!(l.len(), 3);
        assert!(!l.is_empty());
    }

    /// Invariant: positional insert accepts `[0, len)` and places the entry
    /// exactly at `index`; anything beyond is rejected without change.
    #[test]
    fn positional_insert() {
        let mut l = SinglyLinkedList::new();
        l.push_back(10, "x");
        l.push_back(30, "z");
        l.insert(20, "y", 1).unwrap();
        assert_eq!(keys(&l), vec![10, 20, 30]);
        l.insert(5, "w", 0).unwrap();
        assert_eq!(keys(&l), vec![5, 10, 20, 30]);

        match l.insert(40, "v", 5) {
            Err(MapError::IndexOutOfRange { index: 5, len: 4 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(l.len(), 4);
    }

    /// Invariant: `index == len` is out of range for positional insert,
    /// including on an empty list; the list is left unchanged.
    #[test]
    fn insert_at_len_rejected() {
        let mut empty: SinglyLinkedList<i32, &str> = SinglyLinkedList::new();
        assert_eq!(
            empty.insert(1, "a", 0),
            Err(MapError::IndexOutOfRange { index: 0, len: 0 })
        );
        assert!(empty.is_empty());

        let mut l: SinglyLinkedList<i32, &str> = [(1, "a"), (2, "b")].into_iter().collect();
        assert_eq!(
            l.insert(3, "c", 2),
            Err(MapError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(l.len(), 2);
        assert_eq!(keys(&l), vec![1, 2]);
    }

    /// Invariant: remove is valid on `[0, len)` only and returns the owned
    /// entry; head, middle and tail removal all relink correctly.
    #[test]
    fn remove_by_position() {
        let mut l: SinglyLinkedList<i32, &str> =
            [(1, "a"), (2, "b"), (3, "c"), (4, "d")].into_iter().collect();
        assert_eq!(l.remove(1).unwrap(), (2, "b"));
        assert_eq!(l.remove(2).unwrap(), (4, "d"));
        assert_eq!(l.remove(0).unwrap(), (1, "a"));
        assert_eq!(keys(&l), vec![3]);

        assert_eq!(
            l.remove(1),
            Err(MapError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(l.remove(0).unwrap(), (3, "c"));
        assert!(l.is_empty());
        assert!(l.remove(0).is_err());
    }

    /// Invariant: pops on an empty chain report `None` instead of failing.
    #[test]
    fn pops() {
        let mut l: SinglyLinkedList<i32, &str> = [(1, "a"), (2, "b")].into_iter().collect();
        assert_eq!(l.pop_back(), Some((2, "b")));
        assert_eq!(l.pop_front(), Some((1, "a")));
        assert_eq!(l.pop_front(), None);
        assert_eq!(l.pop_back(), None);
        assert_eq!(l.len(), 0);
    }

    /// Invariant: `find` reports the first matching position; `get` reads by
    /// position.
    #[test]
    fn find_and_get() {
        let mut l = SinglyLinkedList::new();
        l.push_back(5, "first");
        l.push_back(6, "other");
        l.push_back(5, "second");
        assert_eq!(l.find(&5), Some(0));
        assert_eq!(l.find(&6), Some(1));
        assert_eq!(l.find(&7), None);
        assert_eq!(l.lookup(&5), Some(&"first"));
        assert_eq!(l.get(2), Ok(&"second"));
        assert!(l.get(3).is_err());
    }

    /// Invariant: a clone owns its own nodes.
    #[test]
    fn clone_is_deep() {
        let mut a: SinglyLinkedList<i32, String> = SinglyLinkedList::new();
        a.push_back(1, "one".to_string());
        let mut b = a.clone();
        b.push_back(2, "two".to_string());
        let _ = a.pop_front();
        assert!(a.is_empty());
        assert_eq!(b.len(), 2);
        assert_eq!(b.get(0).unwrap(), "one");
    }

    #[test]
    fn display_format() {
        let l: SinglyLinkedList<i32, i32> = [(1, 10), (2, 20)].into_iter().collect();
        assert_eq!(l.to_string(), "{ 1, 10 } -> { 2, 20 } -> ");
        assert_eq!(SinglyLinkedList::<i32, i32>::new().to_string(), "");
    }

    /// Invariant: dropping a very long chain does not recurse.
    #[test]
    fn long_chain_drops() {
        let l: SinglyLinkedList<u32, ()> = (0..200_000u32).map(|i| (i, ())).collect();
        assert_eq!(l.len(), 200_000);
        assert_eq!(l.iter().len(), 200_000);
        drop(l);
    }
}
