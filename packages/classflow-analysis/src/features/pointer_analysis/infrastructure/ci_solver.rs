//! Context-insensitive Andersen solver
//!
//! Worklist propagation over the pointer-flow graph with on-the-fly
//! call-graph construction. Statement processing wires up the edges that
//! are known statically (copies, static field accesses, static calls);
//! instance field/array accesses and virtual dispatch fire lazily as
//! receiver points-to sets grow.

use std::collections::VecDeque;
use tracing::{debug, info};

use crate::errors::{AnalysisError, Result};
use crate::features::callgraph::{resolve_callee, CallEdge, CallGraph};
use crate::shared::graphs::CallGraphView;
use crate::shared::models::{
    FieldAccess, HeapModel, Invoke, MethodId, ObjId, Program, StmtId, StmtKind, VarId,
};

use super::super::application::result::PointerAnalysisResult;
use super::super::domain::pfg::{PointerFlowGraph, PointerId};
use super::super::domain::pointer::Pointer;
use super::super::domain::points_to_set::PointsToSet;

/// Andersen-style context-insensitive pointer analysis
pub struct CiSolver<'a> {
    program: &'a Program,
    heap: HeapModel,
    pfg: PointerFlowGraph<Pointer>,
    call_graph: CallGraph,
    worklist: VecDeque<(PointerId, PointsToSet)>,
    propagations: usize,
}

impl<'a> CiSolver<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self {
            program,
            heap: HeapModel::new(),
            pfg: PointerFlowGraph::new(),
            call_graph: CallGraph::new(),
            worklist: VecDeque::new(),
            propagations: 0,
        }
    }

    /// Run the analysis from the program entry method
    pub fn solve(mut self) -> Result<PointerAnalysisResult> {
        let entry = self
            .program
            .entry_method()
            .ok_or_else(|| AnalysisError::malformed("program has no entry method"))?;
        self.call_graph.add_entry_method(entry);
        self.add_reachable(entry);
        self.analyze();

        info!(
            pointers = self.pfg.pointer_count(),
            pfg_edges = self.pfg.edge_count(),
            reachable = self.call_graph.reachable_methods().len(),
            propagations = self.propagations,
            "CI pointer analysis converged"
        );
        Ok(self.into_result())
    }

    fn into_result(self) -> PointerAnalysisResult {
        let mut var_pts = rustc_hash::FxHashMap::default();
        for (p, key) in self.pfg.pointers() {
            if let Pointer::Var(v) = *key {
                var_pts
                    .entry(v)
                    .or_insert_with(std::collections::BTreeSet::new)
                    .extend(self.pfg.pt(p).iter());
            }
        }
        PointerAnalysisResult::new(var_pts, self.call_graph, self.heap)
    }

    /// Mark a method reachable and process its statements once
    fn add_reachable(&mut self, method: MethodId) {
        if self.call_graph.contains(method) {
            return;
        }
        self.call_graph.add_reachable_method(method);
        debug!(method = %self.program.method(method).name, "method reachable");
        let Some(body) = self.program.method(method).body.as_ref() else {
            return;
        };
        let stmts = body.stmts.clone();
        for s in stmts {
            self.process_stmt(s);
        }
    }

    fn process_stmt(&mut self, s: StmtId) {
        match self.program.stmt(s).kind.clone() {
            StmtKind::New { lhs, ty } => {
                let obj = self.heap.obj_at(s, ty);
                let x = self.pfg.get_or_insert(Pointer::Var(lhs));
                self.worklist.push_back((x, PointsToSet::singleton(obj)));
            }
            StmtKind::Copy { lhs, rhs } => {
                self.add_pfg_edge(Pointer::Var(rhs), Pointer::Var(lhs));
            }
            StmtKind::LoadField { lhs, access: FieldAccess::Static { field } } => {
                self.add_pfg_edge(Pointer::StaticField(field), Pointer::Var(lhs));
            }
            StmtKind::StoreField { access: FieldAccess::Static { field }, rhs } => {
                self.add_pfg_edge(Pointer::Var(rhs), Pointer::StaticField(field));
            }
            StmtKind::Invoke(inv) if inv.is_static() => {
                if let Some(callee) = resolve_callee(self.program, None, s) {
                    self.process_call_edge(s, &inv, callee);
                }
            }
            _ => {}
        }
    }

    /// Add a call-graph edge and wire arguments, parameters and returns.
    /// No-op when the edge already exists.
    fn process_call_edge(&mut self, call_site: StmtId, inv: &Invoke, callee: MethodId) {
        if self.call_graph.has_edge(call_site, callee) {
            return;
        }
        self.call_graph.add_edge(CallEdge { kind: inv.kind, call_site, callee });
        self.add_reachable(callee);

        let Some(body) = self.program.method(callee).body.as_ref() else {
            return;
        };
        let params = body.params.clone();
        let returns = body.return_vars.clone();
        for (i, &param) in params.iter().enumerate() {
            if let Some(&arg) = inv.args.get(i) {
                self.add_pfg_edge(Pointer::Var(arg), Pointer::Var(param));
            }
        }
        if let Some(result) = inv.result {
            for ret in returns {
                self.add_pfg_edge(Pointer::Var(ret), Pointer::Var(result));
            }
        }
    }

    /// Insert `source ⊆ target`; existing points-to facts flow immediately
    fn add_pfg_edge(&mut self, source: Pointer, target: Pointer) {
        let s = self.pfg.get_or_insert(source);
        let t = self.pfg.get_or_insert(target);
        if self.pfg.add_edge(s, t) && !self.pfg.pt(s).is_empty() {
            self.worklist.push_back((t, self.pfg.pt(s).clone()));
        }
    }

    /// Drain the worklist to the fixed point
    fn analyze(&mut self) {
        let program = self.program;
        while let Some((n, pts)) = self.worklist.pop_front() {
            let delta = self.propagate(n, &pts);
            if delta.is_empty() {
                continue;
            }
            let Pointer::Var(v) = *self.pfg.key(n) else {
                continue;
            };
            for obj in delta.iter() {
                for &s in &program.var(v).store_fields {
                    if let StmtKind::StoreField {
                        access: FieldAccess::Instance { field, .. },
                        rhs,
                    } = &program.stmt(s).kind
                    {
                        self.add_pfg_edge(Pointer::Var(*rhs), Pointer::InstanceField(obj, *field));
                    }
                }
                for &s in &program.var(v).load_fields {
                    if let StmtKind::LoadField {
                        lhs,
                        access: FieldAccess::Instance { field, .. },
                    } = &program.stmt(s).kind
                    {
                        self.add_pfg_edge(Pointer::InstanceField(obj, *field), Pointer::Var(*lhs));
                    }
                }
                for &s in &program.var(v).store_arrays {
                    if let StmtKind::StoreArray { rhs, .. } = &program.stmt(s).kind {
                        self.add_pfg_edge(Pointer::Var(*rhs), Pointer::ArrayIndex(obj));
                    }
                }
                for &s in &program.var(v).load_arrays {
                    if let StmtKind::LoadArray { lhs, .. } = &program.stmt(s).kind {
                        self.add_pfg_edge(Pointer::ArrayIndex(obj), Pointer::Var(*lhs));
                    }
                }
                self.process_instance_calls(v, obj);
            }
        }
    }

    /// Fold `pts` into `pt(n)` and forward the growth to PFG successors;
    /// returns the difference set
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

    /// A new receiver object arrived at `v`: dispatch every call through
    /// `v` against the object's concrete type
    fn process_instance_calls(&mut self, v: VarId, recv: ObjId) {
        let program = self.program;
        for &call_site in &program.var(v).invokes {
            let recv_class = self.heap.obj(recv).ty.as_class();
            let Some(callee) = resolve_callee(program, recv_class, call_site) else {
                continue;
            };
            if let Some(body) = program.method(callee).body.as_ref() {
                if let Some(this) = body.this_var {
                    let this_ptr = self.pfg.get_or_insert(Pointer::Var(this));
                    self.worklist.push_back((this_ptr, PointsToSet::singleton(recv)));
                }
            }
            if let Some(inv) = program.invoke(call_site) {
                self.process_call_edge(call_site, inv, callee);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{ProgramBuilder, Type};

    #[test]
    fn test_alloc_copy_alias() {
        // x = new O(); y = x  →  pt(x) = pt(y) = {O@site}
        let mut b = ProgramBuilder::new();
        let main_class = b.add_class("Main");
        let o = b.add_class("O");
        let m = b.add_method(main_class, "main", vec![], Type::Void);
        b.mark_static(m);
        b.set_entry(m);
        let mut mb = b.body(m);
        let x = mb.var("x", Type::Reference(o));
        let y = mb.var("y", Type::Reference(o));
        mb.new_obj(x, Type::Reference(o));
        mb.copy(y, x);
        mb.ret(None);
        mb.finish();
        let p = b.finish().unwrap();

        let result = CiSolver::new(&p).solve().unwrap();
        let px: Vec<_> = result.points_to(x).collect();
        let py: Vec<_> = result.points_to(y).collect();
        assert_eq!(px.len(), 1);
        assert_eq!(px, py);
        assert!(result.may_alias(x, y));
    }

    #[test]
    fn test_field_flow_through_alias() {
        // x = new O(); y = x; p = new P(); y.f = p; z = x.f  →  pt(z) = {P}
        let mut b = ProgramBuilder::new();
        let main_class = b.add_class("Main");
        let o = b.add_class("O");
        let pc = b.add_class("P");
        let f = b.add_field(o, "f", Type::Reference(pc), false);
        let m = b.add_method(main_class, "main", vec![], Type::Void);
        b.mark_static(m);
        b.set_entry(m);
        let mut mb = b.body(m);
        let x = mb.var("x", Type::Reference(o));
        let y = mb.var("y", Type::Reference(o));
        let pv = mb.var("p", Type::Reference(pc));
        let z = mb.var("z", Type::Reference(pc));
        mb.new_obj(x, Type::Reference(o));
        mb.copy(y, x);
        mb.new_obj(pv, Type::Reference(pc));
        mb.store_field(y, f, pv);
        mb.load_field(z, x, f);
        mb.ret(None);
        mb.finish();
        let p = b.finish().unwrap();

        let result = CiSolver::new(&p).solve().unwrap();
        let pz: Vec<_> = result.points_to(z).collect();
        let pp: Vec<_> = result.points_to(pv).collect();
        assert_eq!(pz, pp);
        assert_eq!(pz.len(), 1);
    }

    #[test]
    fn test_array_indices_are_erased() {
        // a[0] = p; q = a[1]  →  pt(q) ⊇ pt(p)
        let mut b = ProgramBuilder::new();
        let main_class = b.add_class("Main");
        let pc = b.add_class("P");
        let arr_ty = Type::Array(Box::new(Type::Reference(pc)));
        let m = b.add_method(main_class, "main", vec![], Type::Void);
        b.mark_static(m);
        b.set_entry(m);
        let mut mb = b.body(m);
        let a = mb.var("a", arr_ty.clone());
        let i0 = mb.var("i0", Type::int());
        let i1 = mb.var("i1", Type::int());
        let pv = mb.var("p", Type::Reference(pc));
        let q = mb.var("q", Type::Reference(pc));
        mb.new_obj(a, arr_ty);
        mb.assign_lit(i0, 0);
        mb.assign_lit(i1, 1);
        mb.new_obj(pv, Type::Reference(pc));
        mb.store_array(a, i0, pv);
        mb.load_array(q, a, i1);
        mb.ret(None);
        mb.finish();
        let p = b.finish().unwrap();

        let result = CiSolver::new(&p).solve().unwrap();
        assert!(result.may_alias(q, pv));
    }

    #[test]
    fn test_virtual_call_binds_this_params_and_return() {
        // o = new A(); r = o.id(p) where A.id(x) { return x; }
        let mut b = ProgramBuilder::new();
        let main_class = b.add_class("Main");
        let a = b.add_class("A");
        let pc = b.add_class("P");
        let id = b.add_method(a, "id", vec![Type::Reference(pc)], Type::Reference(pc));
        let mut mb = b.body(id);
        let x = mb.param("x", Type::Reference(pc));
        mb.ret(Some(x));
        mb.finish();

        let m = b.add_method(main_class, "main", vec![], Type::Void);
        b.mark_static(m);
        b.set_entry(m);
        let target = b.method_ref(id);
        let mut mb = b.body(m);
        let o = mb.var("o", Type::Reference(a));
        let pv = mb.var("p", Type::Reference(pc));
        let r = mb.var("r", Type::Reference(pc));
        mb.new_obj(o, Type::Reference(a));
        mb.new_obj(pv, Type::Reference(pc));
        mb.call_virtual(o, target, vec![pv], Some(r));
        mb.ret(None);
        mb.finish();
        let p = b.finish().unwrap();

        let result = CiSolver::new(&p).solve().unwrap();
        assert!(result.call_graph().contains(id));
        assert!(result.may_alias(r, pv));
        let this_var = p.method(id).body.as_ref().unwrap().this_var.unwrap();
        assert!(result.may_alias(this_var, o));
    }
}
