//! Pointer-flow graph
//!
//! Directed graph whose edges mean set inclusion: `pt(source) ⊆
//! pt(target)`. Pointers are interned to dense ids; each slot owns its
//! points-to set and successor list, so the whole graph is a flat arena
//! with no ownership cycles. Each edge is stored at most once.

use rustc_hash::{FxHashMap, FxHashSet};
use std::hash::Hash;

use super::points_to_set::PointsToSet;

pub type PointerId = u32;

#[derive(Debug, Clone)]
struct PointerEntry<K> {
    key: K,
    pts: PointsToSet,
    succs: Vec<PointerId>,
}

/// Flow graph over interned pointers of kind `K` (context-insensitive or
/// context-sensitive)
#[derive(Debug, Clone)]
pub struct PointerFlowGraph<K> {
    entries: Vec<PointerEntry<K>>,
    index: FxHashMap<K, PointerId>,
    edge_set: FxHashSet<(PointerId, PointerId)>,
}

impl<K: Eq + Hash + Clone> Default for PointerFlowGraph<K> {
    fn default() -> Self {
        Self { entries: Vec::new(), index: FxHashMap::default(), edge_set: FxHashSet::default() }
    }
}

impl<K: Eq + Hash + Clone> PointerFlowGraph<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a pointer, creating an empty slot on first sight
    pub fn get_or_insert(&mut self, key: K) -> PointerId {
        if let Some(&id) = self.index.get(&key) {
            return id;
        }
        let id = self.entries.len() as PointerId;
        self.entries.push(PointerEntry {
            key: key.clone(),
            pts: PointsToSet::new(),
            succs: Vec::new(),
        });
        self.index.insert(key, id);
        id
    }

    pub fn lookup(&self, key: &K) -> Option<PointerId> {
        self.index.get(key).copied()
    }

    #[inline]
    pub fn key(&self, p: PointerId) -> &K {
        &self.entries[p as usize].key
    }

    #[inline]
    pub fn pt(&self, p: PointerId) -> &PointsToSet {
        &self.entries[p as usize].pts
    }

    #[inline]
    pub fn pt_mut(&mut self, p: PointerId) -> &mut PointsToSet {
        &mut self.entries[p as usize].pts
    }

    /// Insert the inclusion edge `source ⊆ target`; returns false if it
    /// was already present
    pub fn add_edge(&mut self, source: PointerId, target: PointerId) -> bool {
        if !self.edge_set.insert((source, target)) {
            return false;
        }
        self.entries[source as usize].succs.push(target);
        true
    }

    #[inline]
    pub fn succs_of(&self, p: PointerId) -> &[PointerId] {
        &self.entries[p as usize].succs
    }

    pub fn pointer_count(&self) -> usize {
        self.entries.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_set.len()
    }

    /// Iterate over all interned pointers
    pub fn pointers(&self) -> impl Iterator<Item = (PointerId, &K)> + '_ {
        self.entries.iter().enumerate().map(|(i, e)| (i as PointerId, &e.key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interning() {
        let mut pfg: PointerFlowGraph<&str> = PointerFlowGraph::new();
        let a = pfg.get_or_insert("a");
        let b = pfg.get_or_insert("b");
        assert_eq!(pfg.get_or_insert("a"), a);
        assert_ne!(a, b);
        assert_eq!(pfg.pointer_count(), 2);
    }

    #[test]
    fn test_edges_stored_once() {
        let mut pfg: PointerFlowGraph<&str> = PointerFlowGraph::new();
        let a = pfg.get_or_insert("a");
        let b = pfg.get_or_insert("b");
        assert!(pfg.add_edge(a, b));
        assert!(!pfg.add_edge(a, b));
        assert_eq!(pfg.succs_of(a), &[b]);
        assert_eq!(pfg.edge_count(), 1);
    }
}
