//! Unified pointer-analysis result
//!
//! The context-insensitive projection every downstream consumer works
//! with: `pt(var)` is the union over all contexts, the call graph is
//! context-erased, and the heap model rides along so clients can inspect
//! object identities. Both solvers produce this view; the CS solver
//! additionally keeps its context-qualified state in
//! [`super::super::infrastructure::cs_solver::CsPtaResult`].

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

use crate::features::callgraph::CallGraph;
use crate::shared::models::{HeapModel, ObjId, VarId};

/// Context-insensitive points-to facts plus the call graph they induced
#[derive(Debug)]
pub struct PointerAnalysisResult {
    var_pts: FxHashMap<VarId, BTreeSet<ObjId>>,
    vars: Vec<VarId>,
    call_graph: CallGraph,
    heap: HeapModel,
}

impl PointerAnalysisResult {
    pub fn new(
        var_pts: FxHashMap<VarId, BTreeSet<ObjId>>,
        call_graph: CallGraph,
        heap: HeapModel,
    ) -> Self {
        let mut vars: Vec<VarId> = var_pts.keys().copied().collect();
        vars.sort_unstable();
        Self { var_pts, vars, call_graph, heap }
    }

    /// Objects the variable may point to (empty if untracked)
    pub fn points_to(&self, var: VarId) -> impl Iterator<Item = ObjId> + '_ {
        self.var_pts.get(&var).into_iter().flatten().copied()
    }

    pub fn pt(&self, var: VarId) -> Option<&BTreeSet<ObjId>> {
        self.var_pts.get(&var)
    }

    /// Whether two variables may point to a common object
    pub fn may_alias(&self, a: VarId, b: VarId) -> bool {
        match (self.var_pts.get(&a), self.var_pts.get(&b)) {
            (Some(pa), Some(pb)) => pa.intersection(pb).next().is_some(),
            _ => false,
        }
    }

    /// All variables with a (possibly empty) recorded points-to set,
    /// in ascending id order
    pub fn vars(&self) -> &[VarId] {
        &self.vars
    }

    pub fn call_graph(&self) -> &CallGraph {
        &self.call_graph
    }

    pub fn heap(&self) -> &HeapModel {
        &self.heap
    }
}
