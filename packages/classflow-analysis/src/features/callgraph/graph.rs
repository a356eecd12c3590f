//! Call graph: (call site, callee) edges plus the reachable-method set

use rustc_hash::{FxHashMap, FxHashSet};

use crate::shared::graphs::CallGraphView;
use crate::shared::models::{CallKind, MethodId, StmtId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallEdge {
    pub kind: CallKind,
    pub call_site: StmtId,
    pub callee: MethodId,
}

/// Context-insensitive call graph
#[derive(Debug, Default)]
pub struct CallGraph {
    edges: Vec<CallEdge>,
    edge_set: FxHashSet<(StmtId, MethodId)>,
    callees: FxHashMap<StmtId, Vec<MethodId>>,
    callers: FxHashMap<MethodId, Vec<StmtId>>,
    reachable: Vec<MethodId>,
    reachable_set: FxHashSet<MethodId>,
    entries: Vec<MethodId>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry_method(&mut self, m: MethodId) {
        self.entries.push(m);
    }

    pub fn entry_methods(&self) -> &[MethodId] {
        &self.entries
    }

    /// Whether `m` has already been marked reachable (and therefore had
    /// its statements processed)
    #[inline]
    pub fn contains(&self, m: MethodId) -> bool {
        self.reachable_set.contains(&m)
    }

    /// Mark `m` reachable; returns false if it already was
    pub fn add_reachable_method(&mut self, m: MethodId) -> bool {
        if self.reachable_set.insert(m) {
            self.reachable.push(m);
            true
        } else {
            false
        }
    }

    /// Insert an edge; each (call site, callee) pair is stored once
    pub fn add_edge(&mut self, edge: CallEdge) -> bool {
        if !self.edge_set.insert((edge.call_site, edge.callee)) {
            return false;
        }
        self.callees.entry(edge.call_site).or_default().push(edge.callee);
        self.callers.entry(edge.callee).or_default().push(edge.call_site);
        self.edges.push(edge);
        true
    }

    #[inline]
    pub fn has_edge(&self, call_site: StmtId, callee: MethodId) -> bool {
        self.edge_set.contains(&(call_site, callee))
    }

    pub fn callers_of(&self, m: MethodId) -> &[StmtId] {
        self.callers.get(&m).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edges(&self) -> impl Iterator<Item = &CallEdge> + '_ {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl CallGraphView for CallGraph {
    fn reachable_methods(&self) -> &[MethodId] {
        &self.reachable
    }

    fn callees_of(&self, call_site: StmtId) -> &[MethodId] {
        self.callees.get(&call_site).map(Vec::as_slice).unwrap_or(&[])
    }
}
