//! Context-sensitive call graph
//!
//! Same shape as the context-insensitive graph, but both endpoints are
//! context-qualified. The taint layer walks its edges on finish to
//! collect sink flows.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::shared::models::CallKind;

use super::context::{CsCallSiteId, CsMethodId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsCallEdge {
    pub kind: CallKind,
    pub call_site: CsCallSiteId,
    pub callee: CsMethodId,
}

#[derive(Debug, Default)]
pub struct CsCallGraph {
    edges: Vec<CsCallEdge>,
    edge_set: FxHashSet<(CsCallSiteId, CsMethodId)>,
    callees: FxHashMap<CsCallSiteId, Vec<CsMethodId>>,
    callers: FxHashMap<CsMethodId, Vec<CsCallSiteId>>,
    reachable: Vec<CsMethodId>,
    reachable_set: FxHashSet<CsMethodId>,
    entries: Vec<CsMethodId>,
}

impl CsCallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry_method(&mut self, m: CsMethodId) {
        self.entries.push(m);
    }

    #[inline]
    pub fn contains(&self, m: CsMethodId) -> bool {
        self.reachable_set.contains(&m)
    }

    pub fn add_reachable_method(&mut self, m: CsMethodId) -> bool {
        if self.reachable_set.insert(m) {
            self.reachable.push(m);
            true
        } else {
            false
        }
    }

    pub fn add_edge(&mut self, edge: CsCallEdge) -> bool {
        if !self.edge_set.insert((edge.call_site, edge.callee)) {
            return false;
        }
        self.callees.entry(edge.call_site).or_default().push(edge.callee);
        self.callers.entry(edge.callee).or_default().push(edge.call_site);
        self.edges.push(edge);
        true
    }

    #[inline]
    pub fn has_edge(&self, call_site: CsCallSiteId, callee: CsMethodId) -> bool {
        self.edge_set.contains(&(call_site, callee))
    }

    pub fn callees_of(&self, call_site: CsCallSiteId) -> &[CsMethodId] {
        self.callees.get(&call_site).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn callers_of(&self, m: CsMethodId) -> &[CsCallSiteId] {
        self.callers.get(&m).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn reachable_methods(&self) -> &[CsMethodId] {
        &self.reachable
    }

    pub fn edges(&self) -> impl Iterator<Item = &CsCallEdge> + '_ {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
