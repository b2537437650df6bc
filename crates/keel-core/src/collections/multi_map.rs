// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! An ordered multi-map backed by one shared linked sequence.
//!
//! Every key owns a contiguous slice of the sequence, delimited by its first
//! node and a *terminal* sentinel node that holds no value. New values for a
//! key are spliced in right before its terminal, which keeps insertion order.
//! Nodes live in an arena and are addressed by [`NodeId`], so a caller can hold
//! on to a position across mutations and compare it against a remembered
//! terminal instead of chasing pointers.

use std::collections::HashMap;
use std::hash::Hash;

/// The index of a node inside a [`MultiMap`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The slice of the shared sequence owned by one key.
///
/// The logical values are every node from `first` up to, but excluding,
/// `terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    first: NodeId,
    terminal: NodeId,
}

impl Range {
    /// The first node holding a value.
    pub fn first(&self) -> NodeId {
        self.first
    }

    /// The sentinel node closing the range.
    pub fn terminal(&self) -> NodeId {
        self.terminal
    }
}

#[derive(Debug)]
struct Node<V> {
    value: Option<V>,
    /// Terminal of the owning range; `None` for sentinels and vacated slots.
    terminal: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// A map from a key to an ordered sequence of values.
///
/// Removal of a single value is O(1) once its node is known, and vacated
/// arena slots are recycled for later insertions.
#[derive(Debug)]
pub struct MultiMap<K, V> {
    nodes: Vec<Node<V>>,
    free: Vec<usize>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    ranges: HashMap<K, Range>,
}

impl<K: Eq + Hash, V> MultiMap<K, V> {
    /// Creates an empty multi-map.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            ranges: HashMap::new(),
        }
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Returns `true` if no key is present.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns `true` if `key` has at least one value.
    pub fn contains_key(&self, key: &K) -> bool {
        self.ranges.contains_key(key)
    }

    /// Returns the range owned by `key`, if any.
    pub fn range(&self, key: &K) -> Option<Range> {
        self.ranges.get(key).copied()
    }

    /// Returns the number of values stored under `key`.
    pub fn count(&self, key: &K) -> usize {
        self.values(key).count()
    }

    /// Returns an iterator over the keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.ranges.keys()
    }

    /// Returns the node following `node` in the shared sequence.
    ///
    /// Returns `None` for the last node or for a vacated slot.
    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.next)
    }

    /// Returns the value held by `node`.
    ///
    /// Terminal sentinels and vacated slots hold nothing.
    pub fn value(&self, node: NodeId) -> Option<&V> {
        self.nodes.get(node.0).and_then(|n| n.value.as_ref())
    }

    /// Appends `value` to the sequence of `key`.
    pub fn add(&mut self, key: K, value: V) {
        if let Some(range) = self.ranges.get(&key).copied() {
            let node = self.alloc(Some(value), Some(range.terminal));
            self.link_before(Some(range.terminal), node);
            return;
        }

        let first = self.alloc(Some(value), None);
        self.link_before(None, first);
        let terminal = self.alloc(None, None);
        self.link_before(None, terminal);
        self.nodes[first.0].terminal = Some(terminal);
        self.ranges.insert(key, Range { first, terminal });
    }

    /// Returns the first node under `key` whose value matches `predicate`.
    pub fn find(&self, key: &K, mut predicate: impl FnMut(&V) -> bool) -> Option<NodeId> {
        let range = self.ranges.get(key)?;
        let mut current = range.first;
        while current != range.terminal {
            let node = self.nodes.get(current.0)?;
            if node.value.as_ref().is_some_and(&mut predicate) {
                return Some(current);
            }
            current = node.next?;
        }
        None
    }

    /// Removes `node` from the range of `key` and returns its value.
    ///
    /// Removing the last value collapses the range and drops the key.
    /// Returns `None`, leaving the map untouched, if `node` is not a live
    /// value node of `key`.
    pub fn remove_node(&mut self, key: &K, node: NodeId) -> Option<V> {
        let range = self.ranges.get(key).copied()?;
        let owned = self
            .nodes
            .get(node.0)
            .is_some_and(|n| n.value.is_some() && n.terminal == Some(range.terminal));
        if !owned {
            return None;
        }

        if node == range.first {
            let next = self.next(node)?;
            if next == range.terminal {
                self.ranges.remove(key);
                self.unlink(range.terminal);
            } else if let Some(r) = self.ranges.get_mut(key) {
                r.first = next;
            }
        }

        self.unlink(node)
    }

    /// Removes every value under `key`. Returns `false` if the key was absent.
    pub fn remove_all(&mut self, key: &K) -> bool {
        let Some(range) = self.ranges.remove(key) else {
            return false;
        };

        let mut current = Some(range.first);
        while let Some(node) = current {
            current = self.next(node);
            self.unlink(node);
            if node == range.terminal {
                break;
            }
        }
        true
    }

    /// Returns an iterator over the values of `key`, in insertion order.
    pub fn values(&self, key: &K) -> Values<'_, K, V> {
        let range = self.ranges.get(key);
        Values {
            map: self,
            current: range.map(|r| r.first),
            terminal: range.map(|r| r.terminal),
        }
    }

    /// Returns an iterator over every value in the shared sequence.
    pub fn iter(&self) -> impl Iterator<Item = &V> {
        let mut current = self.head;
        std::iter::from_fn(move || loop {
            let node = self.nodes.get(current?.0)?;
            current = node.next;
            if let Some(value) = node.value.as_ref() {
                return Some(value);
            }
        })
    }

    /// Removes all keys and values.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.ranges.clear();
        self.head = None;
        self.tail = None;
    }

    fn alloc(&mut self, value: Option<V>, terminal: Option<NodeId>) -> NodeId {
        let node = Node {
            value,
            terminal,
            prev: None,
            next: None,
        };
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = node;
                NodeId(index)
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Splices `node` in front of `at`, or at the tail when `at` is `None`.
    fn link_before(&mut self, at: Option<NodeId>, node: NodeId) {
        let prev = match at {
            Some(at) => self.nodes[at.0].prev,
            None => self.tail,
        };

        self.nodes[node.0].prev = prev;
        self.nodes[node.0].next = at;

        match prev {
            Some(p) => self.nodes[p.0].next = Some(node),
            None => self.head = Some(node),
        }
        match at {
            Some(a) => self.nodes[a.0].prev = Some(node),
            None => self.tail = Some(node),
        }
    }

    fn unlink(&mut self, node: NodeId) -> Option<V> {
        let (prev, next) = {
            let n = self.nodes.get(node.0)?;
            (n.prev, n.next)
        };

        match prev {
            Some(p) => self.nodes[p.0].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n.0].prev = prev,
            None => self.tail = prev,
        }

        let slot = &mut self.nodes[node.0];
        slot.terminal = None;
        slot.prev = None;
        slot.next = None;
        self.free.push(node.0);
        slot.value.take()
    }
}

impl<K: Eq + Hash, V: PartialEq> MultiMap<K, V> {
    /// Returns `true` if `value` is stored under `key`.
    pub fn contains(&self, key: &K, value: &V) -> bool {
        self.find(key, |v| v == value).is_some()
    }

    /// Removes the first occurrence of `value` under `key`.
    pub fn remove(&mut self, key: &K, value: &V) -> bool {
        match self.find(key, |v| v == value) {
            Some(node) => self.remove_node(key, node).is_some(),
            None => false,
        }
    }
}

impl<K: Eq + Hash, V> Default for MultiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the values of one key, see [`MultiMap::values`].
pub struct Values<'a, K, V> {
    map: &'a MultiMap<K, V>,
    current: Option<NodeId>,
    terminal: Option<NodeId>,
}

impl<'a, K: Eq + Hash, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        if Some(current) == self.terminal {
            self.current = None;
            return None;
        }
        let node = self.map.nodes.get(current.0)?;
        self.current = node.next;
        node.value.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(map: &MultiMap<i32, &'static str>, key: i32) -> Vec<&'static str> {
        map.values(&key).copied().collect()
    }

    #[test]
    fn values_keep_insertion_order_per_key() {
        let mut map = MultiMap::new();
        map.add(1, "a");
        map.add(2, "x");
        map.add(1, "b");
        map.add(2, "y");
        map.add(1, "c");

        assert_eq!(collect(&map, 1), vec!["a", "b", "c"]);
        assert_eq!(collect(&map, 2), vec!["x", "y"]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.count(&1), 3);
    }

    #[test]
    fn shared_sequence_holds_contiguous_ranges() {
        let mut map = MultiMap::new();
        map.add(1, "a");
        map.add(2, "x");
        map.add(1, "b");

        let all: Vec<_> = map.iter().copied().collect();
        assert_eq!(all, vec!["a", "b", "x"]);
    }

    #[test]
    fn removing_first_moves_range_start() {
        let mut map = MultiMap::new();
        map.add(1, "a");
        map.add(1, "b");

        assert!(map.remove(&1, &"a"));
        let range = map.range(&1).unwrap();
        assert_eq!(map.value(range.first()), Some(&"b"));
        assert_eq!(collect(&map, 1), vec!["b"]);
    }

    #[test]
    fn removing_last_value_collapses_the_key() {
        let mut map = MultiMap::new();
        map.add(1, "a");
        assert!(map.remove(&1, &"a"));

        assert!(!map.contains_key(&1));
        assert!(map.is_empty());
        assert_eq!(map.iter().count(), 0);
        assert!(!map.remove(&1, &"a"));
    }

    #[test]
    fn remembered_terminal_stops_a_walk_after_a_collapse() {
        let mut map = MultiMap::new();
        map.add(1, "a");
        map.add(2, "x");

        let range = map.range(&1).unwrap();
        let next = map.next(range.first()).unwrap();
        assert_eq!(next, range.terminal());

        // Collapse the range while a walk remembers its terminal.
        map.remove(&1, &"a");
        assert_eq!(next, range.terminal());
        assert_eq!(map.value(next), None);
    }

    #[test]
    fn vacated_slots_are_recycled() {
        let mut map = MultiMap::new();
        map.add(1, "a");
        map.add(1, "b");
        let before = map.nodes.len();

        map.remove(&1, &"b");
        map.add(1, "c");

        assert_eq!(map.nodes.len(), before);
        assert_eq!(collect(&map, 1), vec!["a", "c"]);
    }

    #[test]
    fn stale_or_foreign_nodes_are_not_removed() {
        let mut map = MultiMap::new();
        map.add(1, "a");
        map.add(1, "b");
        map.add(3, "z");
        let b = map.find(&1, |v| *v == "b").unwrap();
        let z = map.find(&3, |v| *v == "z").unwrap();
        let terminal = map.range(&1).unwrap().terminal();

        assert_eq!(map.remove_node(&1, b), Some("b"));
        assert_eq!(map.remove_node(&1, b), None, "the slot is already vacated");
        assert_eq!(map.remove_node(&1, z), None, "the node belongs to another key");
        assert_eq!(map.remove_node(&1, terminal), None);
        assert_eq!(map.free.len(), 1);

        map.add(2, "x");
        map.add(2, "y");
        assert_eq!(collect(&map, 1), vec!["a"]);
        assert_eq!(collect(&map, 2), vec!["x", "y"]);
        assert_eq!(collect(&map, 3), vec!["z"]);
        assert_eq!(map.iter().count(), 4);
    }

    #[test]
    fn remove_all_drops_every_value_of_a_key() {
        let mut map = MultiMap::new();
        map.add(1, "a");
        map.add(1, "b");
        map.add(2, "x");

        assert!(map.remove_all(&1));
        assert!(!map.remove_all(&1));
        assert_eq!(map.iter().copied().collect::<Vec<_>>(), vec!["x"]);
        assert!(map.contains(&2, &"x"));
    }

    #[test]
    fn clear_resets_everything() {
        let mut map = MultiMap::new();
        map.add(1, "a");
        map.clear();
        assert!(map.is_empty());
        assert_eq!(map.values(&1).count(), 0);
        map.add(1, "b");
        assert_eq!(collect(&map, 1), vec!["b"]);
    }
}
