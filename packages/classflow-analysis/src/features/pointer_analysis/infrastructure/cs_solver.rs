//! Context-sensitive Andersen solver
//!
//! The same propagation loop as the context-insensitive solver, but
//! every variable, method, call site and heap object carries a context
//! chosen by the [`ContextSelector`]. The taint layer hooks in at call
//! edges (sources and transfer rules), at propagation (transfer re-fire
//! when taint reaches a call's base or argument) and at the end (sink
//! collection); the re-fire is what keeps the fixed point independent
//! of worklist pop order.

use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, info};

use crate::errors::{AnalysisError, Result};
use crate::features::callgraph::{resolve_callee, CallEdge, CallGraph};
use crate::features::taint::{TaintAnalysis, TaintFlow, TaintSeed};
use crate::shared::models::{
    FieldAccess, HeapModel, Invoke, MethodId, ObjId, Program, StmtId, StmtKind, VarId,
};

use super::super::application::result::PointerAnalysisResult;
use super::super::domain::context::{
    ContextManager, CsManager, CsMethodId, CsObjId, CtxId,
};
use super::super::domain::cs_call_graph::{CsCallEdge, CsCallGraph};
use super::super::domain::pfg::{PointerFlowGraph, PointerId};
use super::super::domain::pointer::CsPointer;
use super::super::domain::points_to_set::PointsToSet;
use super::selector::ContextSelector;

/// Result of the context-sensitive analysis: the context-qualified state
/// plus a context-insensitive projection for downstream consumers
#[derive(Debug)]
pub struct CsPtaResult {
    ctxs: ContextManager,
    csm: CsManager,
    pfg: PointerFlowGraph<CsPointer>,
    call_graph: CsCallGraph,
    taint_flows: BTreeSet<TaintFlow>,
    ci: PointerAnalysisResult,
}

impl CsPtaResult {
    /// The context-insensitive projection (union over contexts)
    pub fn ci(&self) -> &PointerAnalysisResult {
        &self.ci
    }

    /// Context-qualified points-to set of `(ctx, var)`
    pub fn points_to_cs(&self, ctx: CtxId, var: VarId) -> Vec<(CtxId, ObjId)> {
        self.pfg
            .lookup(&CsPointer::Var(ctx, var))
            .map(|p| self.pfg.pt(p).iter().map(|o| self.csm.obj_of(o)).collect())
            .unwrap_or_default()
    }

    pub fn cs_call_graph(&self) -> &CsCallGraph {
        &self.call_graph
    }

    pub fn contexts(&self) -> &ContextManager {
        &self.ctxs
    }

    /// Detected source → sink flows, deterministically ordered
    pub fn taint_flows(&self) -> &BTreeSet<TaintFlow> {
        &self.taint_flows
    }
}

/// Context-sensitive inclusion-based pointer analysis
pub struct CsSolver<'a> {
    program: &'a Program,
    selector: &'a dyn ContextSelector,
    heap: HeapModel,
    ctxs: ContextManager,
    csm: CsManager,
    pfg: PointerFlowGraph<CsPointer>,
    call_graph: CsCallGraph,
    worklist: VecDeque<(PointerId, PointsToSet)>,
    taint: Option<TaintAnalysis>,
    propagations: usize,
}

impl<'a> CsSolver<'a> {
    pub fn new(program: &'a Program, selector: &'a dyn ContextSelector) -> Self {
        Self {
            program,
            selector,
            heap: HeapModel::new(),
            ctxs: ContextManager::new(),
            csm: CsManager::new(),
            pfg: PointerFlowGraph::new(),
            call_graph: CsCallGraph::new(),
            worklist: VecDeque::new(),
            taint: None,
            propagations: 0,
        }
    }

    /// Attach taint processing to this run
    pub fn with_taint(mut self, taint: TaintAnalysis) -> Self {
        self.taint = Some(taint);
        self
    }

    pub fn solve(mut self) -> Result<CsPtaResult> {
        let entry = self
            .program
            .entry_method()
            .ok_or_else(|| AnalysisError::malformed("program has no entry method"))?;
        let empty = self.selector.empty_context();
        let cs_entry = self.csm.cs_method(empty, entry);
        self.call_graph.add_entry_method(cs_entry);
        self.add_reachable(cs_entry);
        self.analyze();

        info!(
            pointers = self.pfg.pointer_count(),
            pfg_edges = self.pfg.edge_count(),
            contexts = self.ctxs.context_count(),
            reachable = self.call_graph.reachable_methods().len(),
            propagations = self.propagations,
            "CS pointer analysis converged"
        );

        let taint_flows = match &self.taint {
            Some(t) => {
                t.collect_flows(self.program, &self.heap, &self.csm, &self.call_graph, &self.pfg)
            }
            None => BTreeSet::new(),
        };
        Ok(self.into_result(taint_flows))
    }

    fn into_result(self, taint_flows: BTreeSet<TaintFlow>) -> CsPtaResult {
        // context-erased projection of points-to sets and call graph
        let mut var_pts = rustc_hash::FxHashMap::default();
        for (p, key) in self.pfg.pointers() {
            if let CsPointer::Var(_, v) = *key {
                let objs: &mut BTreeSet<ObjId> = var_pts.entry(v).or_default();
                for cs_obj in self.pfg.pt(p).iter() {
                    objs.insert(self.csm.obj_of(cs_obj).1);
                }
            }
        }
        let mut ci_cg = CallGraph::new();
        if let Some(entry) = self.program.entry_method() {
            ci_cg.add_entry_method(entry);
        }
        for &cs_m in self.call_graph.reachable_methods() {
            ci_cg.add_reachable_method(self.csm.method_of(cs_m).1);
        }
        for edge in self.call_graph.edges() {
            let (_, call_site) = self.csm.call_site_of(edge.call_site);
            let (_, callee) = self.csm.method_of(edge.callee);
            ci_cg.add_edge(CallEdge { kind: edge.kind, call_site, callee });
        }

        CsPtaResult {
            ctxs: self.ctxs,
            csm: self.csm,
            pfg: self.pfg,
            call_graph: self.call_graph,
            taint_flows,
            ci: PointerAnalysisResult::new(var_pts, ci_cg, self.heap),
        }
    }

    /// Mark a context-qualified method reachable and process its
    /// statements once
    fn add_reachable(&mut self, cs_method: CsMethodId) {
        if self.call_graph.contains(cs_method) {
            return;
        }
        self.call_graph.add_reachable_method(cs_method);
        let (ctx, method) = self.csm.method_of(cs_method);
        debug!(method = %self.program.method(method).name, ctx, "CS method reachable");
        let Some(body) = self.program.method(method).body.as_ref() else {
            return;
        };
        let stmts = body.stmts.clone();
        for s in stmts {
            self.process_stmt(ctx, method, s);
        }
    }

    fn process_stmt(&mut self, ctx: CtxId, method: MethodId, s: StmtId) {
        match self.program.stmt(s).kind.clone() {
            StmtKind::New { lhs, ty } => {
                let obj = self.heap.obj_at(s, ty);
                let heap_ctx = self.selector.select_heap_context(&mut self.ctxs, ctx, method, obj);
                let cs_obj = self.csm.cs_obj(heap_ctx, obj);
                let x = self.pfg.get_or_insert(CsPointer::Var(ctx, lhs));
                self.worklist.push_back((x, PointsToSet::singleton(cs_obj)));
            }
            StmtKind::Copy { lhs, rhs } => {
                self.add_pfg_edge(CsPointer::Var(ctx, rhs), CsPointer::Var(ctx, lhs));
            }
            StmtKind::LoadField { lhs, access: FieldAccess::Static { field } } => {
                self.add_pfg_edge(CsPointer::StaticField(field), CsPointer::Var(ctx, lhs));
            }
            StmtKind::StoreField { access: FieldAccess::Static { field }, rhs } => {
                self.add_pfg_edge(CsPointer::Var(ctx, rhs), CsPointer::StaticField(field));
            }
            StmtKind::Invoke(inv) if inv.is_static() => {
                if let Some(callee) = resolve_callee(self.program, None, s) {
                    let callee_ctx = self.selector.select_context(&mut self.ctxs, ctx, s, callee);
                    self.process_call_edge(ctx, s, callee_ctx, callee, &inv);
                }
            }
            _ => {}
        }
    }

    /// Add a context-sensitive call edge, wire parameters and returns,
    /// and run the taint hooks
    fn process_call_edge(
        &mut self,
        caller_ctx: CtxId,
        call_site: StmtId,
        callee_ctx: CtxId,
        callee: MethodId,
        inv: &Invoke,
    ) {
        let cs_site = self.csm.cs_call_site(caller_ctx, call_site);
        let cs_callee = self.csm.cs_method(callee_ctx, callee);
        if self.call_graph.has_edge(cs_site, cs_callee) {
            // points-to sets may have grown since the edge was added
            self.run_taint_transfers(caller_ctx, call_site, callee);
            return;
        }
        self.call_graph.add_edge(CsCallEdge { kind: inv.kind, call_site: cs_site, callee: cs_callee });
        self.add_reachable(cs_callee);

        if let Some(body) = self.program.method(callee).body.as_ref() {
            let params = body.params.clone();
            let returns = body.return_vars.clone();
            for (i, &param) in params.iter().enumerate() {
                if let Some(&arg) = inv.args.get(i) {
                    self.add_pfg_edge(
                        CsPointer::Var(caller_ctx, arg),
                        CsPointer::Var(callee_ctx, param),
                    );
                }
            }
            if let Some(result) = inv.result {
                for ret in returns {
                    self.add_pfg_edge(
                        CsPointer::Var(callee_ctx, ret),
                        CsPointer::Var(caller_ctx, result),
                    );
                }
            }
        }

        self.run_taint_source(caller_ctx, call_site, callee);
        self.run_taint_transfers(caller_ctx, call_site, callee);
    }

    fn add_pfg_edge(&mut self, source: CsPointer, target: CsPointer) {
        let s = self.pfg.get_or_insert(source);
        let t = self.pfg.get_or_insert(target);
        if self.pfg.add_edge(s, t) && !self.pfg.pt(s).is_empty() {
            self.worklist.push_back((t, self.pfg.pt(s).clone()));
        }
    }

    fn analyze(&mut self) {
        let program = self.program;
        while let Some((n, pts)) = self.worklist.pop_front() {
            let delta = self.propagate(n, &pts);
            if delta.is_empty() {
                continue;
            }
            let CsPointer::Var(ctx, v) = *self.pfg.key(n) else {
                continue;
            };
            for cs_obj in delta.iter() {
                for &s in &program.var(v).store_fields {
                    if let StmtKind::StoreField {
                        access: FieldAccess::Instance { field, .. },
                        rhs,
                    } = &program.stmt(s).kind
                    {
                        self.add_pfg_edge(
                            CsPointer::Var(ctx, *rhs),
                            CsPointer::InstanceField(cs_obj, *field),
                        );
                    }
                }
                for &s in &program.var(v).load_fields {
                    if let StmtKind::LoadField {
                        lhs,
                        access: FieldAccess::Instance { field, .. },
                    } = &program.stmt(s).kind
                    {
                        self.add_pfg_edge(
                            CsPointer::InstanceField(cs_obj, *field),
                            CsPointer::Var(ctx, *lhs),
                        );
                    }
                }
                for &s in &program.var(v).store_arrays {
                    if let StmtKind::StoreArray { rhs, .. } = &program.stmt(s).kind {
                        self.add_pfg_edge(CsPointer::Var(ctx, *rhs), CsPointer::ArrayIndex(cs_obj));
                    }
                }
                for &s in &program.var(v).load_arrays {
                    if let StmtKind::LoadArray { lhs, .. } = &program.stmt(s).kind {
                        self.add_pfg_edge(CsPointer::ArrayIndex(cs_obj), CsPointer::Var(ctx, *lhs));
                    }
                }
                self.process_instance_calls(ctx, v, cs_obj);
            }
            self.refire_taint(ctx, v, &delta);
        }
    }

    fn propagate(&mut self, n: PointerId, pts: &PointsToSet) -> PointsToSet {
        let delta = pts.difference(self.pfg.pt(n));
        if !delta.is_empty() {
            self.pfg.pt_mut(n).union_with(&delta);
            self.propagations += 1;
            let succs = self.pfg.succs_of(n).to_vec();
            for s in succs {
                self.worklist.push_back((s, delta.clone()));
            }
        }
        delta
    }

    /// A new receiver object reached `(ctx, v)`: dispatch every call
    /// through `v` on the object's concrete type, in the context the
    /// selector picks
    fn process_instance_calls(&mut self, ctx: CtxId, v: VarId, recv: CsObjId) {
        let program = self.program;
        let (recv_heap_ctx, recv_obj) = self.csm.obj_of(recv);
        for &call_site in &program.var(v).invokes {
            let recv_class = self.heap.obj(recv_obj).ty.as_class();
            let Some(callee) = resolve_callee(program, recv_class, call_site) else {
                continue;
            };
            let callee_ctx = self.selector.select_instance_context(
                &mut self.ctxs,
                ctx,
                call_site,
                recv_heap_ctx,
                recv_obj,
                callee,
            );
            if let Some(body) = program.method(callee).body.as_ref() {
                if let Some(this) = body.this_var {
                    let this_ptr = self.pfg.get_or_insert(CsPointer::Var(callee_ctx, this));
                    self.worklist.push_back((this_ptr, PointsToSet::singleton(recv)));
                }
            }
            if let Some(inv) = program.invoke(call_site) {
                self.process_call_edge(ctx, call_site, callee_ctx, callee, inv);
            }
        }
    }

    // ─── taint hooks ────────────────────────────────────────────────────

    fn enqueue_seed(&mut self, seed: TaintSeed) {
        let cs_obj = self.csm.cs_obj(ContextManager::EMPTY, seed.obj);
        let p = self.pfg.get_or_insert(CsPointer::Var(seed.ctx, seed.var));
        self.worklist.push_back((p, PointsToSet::singleton(cs_obj)));
    }

    fn run_taint_source(&mut self, caller_ctx: CtxId, call_site: StmtId, callee: MethodId) {
        let seed = match &self.taint {
            Some(t) => t.process_source(self.program, &mut self.heap, call_site, caller_ctx, callee),
            None => return,
        };
        if let Some(seed) = seed {
            self.enqueue_seed(seed);
        }
    }

    fn run_taint_transfers(&mut self, caller_ctx: CtxId, call_site: StmtId, callee: MethodId) {
        let seeds = match &self.taint {
            Some(t) => t.process_transfers(
                self.program,
                &mut self.heap,
                &self.csm,
                &self.pfg,
                caller_ctx,
                call_site,
                callee,
            ),
            None => return,
        };
        for seed in seeds {
            self.enqueue_seed(seed);
        }
    }

    /// Taint objects arrived at `(ctx, v)`: re-apply the transfer rules
    /// of every already-resolved call where `v` is the base or an
    /// argument
    fn refire_taint(&mut self, ctx: CtxId, v: VarId, delta: &PointsToSet) {
        if self.taint.is_none() {
            return;
        }
        let has_taint = delta
            .iter()
            .any(|cs_obj| self.heap.is_taint(self.csm.obj_of(cs_obj).1));
        if !has_taint {
            return;
        }
        let program = self.program;
        let mut sites: Vec<StmtId> = program
            .var(v)
            .invokes
            .iter()
            .chain(program.var(v).arg_invokes.iter())
            .copied()
            .collect();
        sites.sort_unstable();
        sites.dedup();
        for site in sites {
            let Some(cs_site) = self.csm.lookup_call_site(ctx, site) else {
                continue;
            };
            let callees = self.call_graph.callees_of(cs_site).to_vec();
            for cs_callee in callees {
                let (_, callee) = self.csm.method_of(cs_callee);
                self.run_taint_transfers(ctx, site, callee);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::selector::{CallSiteSelector, ContextInsensitiveSelector};
    use crate::shared::models::{ProgramBuilder, Type};

    /// id(x) { return x } called with two different objects; 1-call-site
    /// sensitivity keeps the results apart, the CI selector conflates them
    fn two_calls_program() -> (Program, VarId, VarId) {
        let mut b = ProgramBuilder::new();
        let main_class = b.add_class("Main");
        let oc = b.add_class("O");
        let id = b.add_method(main_class, "id", vec![Type::Reference(oc)], Type::Reference(oc));
        b.mark_static(id);
        let mut mb = b.body(id);
        let x = mb.param("x", Type::Reference(oc));
        mb.ret(Some(x));
        mb.finish();

        let main = b.add_method(main_class, "main", vec![], Type::Void);
        b.mark_static(main);
        b.set_entry(main);
        let target = b.method_ref(id);
        let mut mb = b.body(main);
        let a = mb.var("a", Type::Reference(oc));
        let c = mb.var("c", Type::Reference(oc));
        let r1 = mb.var("r1", Type::Reference(oc));
        let r2 = mb.var("r2", Type::Reference(oc));
        mb.new_obj(a, Type::Reference(oc));
        mb.new_obj(c, Type::Reference(oc));
        mb.call_static(target, vec![a], Some(r1));
        mb.call_static(target, vec![c], Some(r2));
        mb.ret(None);
        mb.finish();
        (b.finish().unwrap(), r1, r2)
    }

    #[test]
    fn test_ci_selector_conflates_call_sites() {
        let (p, r1, r2) = two_calls_program();
        let selector = ContextInsensitiveSelector;
        let result = CsSolver::new(&p, &selector).solve().unwrap();
        // one shared context: both results see both objects
        assert!(result.ci().may_alias(r1, r2));
        assert_eq!(result.ci().points_to(r1).count(), 2);
    }

    #[test]
    fn test_one_call_site_distinguishes_call_sites() {
        let (p, r1, r2) = two_calls_program();
        let selector = CallSiteSelector::new(1);
        let result = CsSolver::new(&p, &selector).solve().unwrap();
        assert_eq!(result.ci().points_to(r1).count(), 1);
        assert_eq!(result.ci().points_to(r2).count(), 1);
        assert!(!result.ci().may_alias(r1, r2));
    }

    #[test]
    fn test_cs_matches_ci_solver_projection() {
        use super::super::ci_solver::CiSolver;
        let (p, r1, r2) = two_calls_program();
        let ci = CiSolver::new(&p).solve().unwrap();
        let selector = ContextInsensitiveSelector;
        let cs = CsSolver::new(&p, &selector).solve().unwrap();
        for v in [r1, r2] {
            let a: Vec<_> = ci.points_to(v).collect();
            let b: Vec<_> = cs.ci().points_to(v).collect();
            assert_eq!(a, b);
        }
    }
}
