//! Interprocedural constant propagation with an alias-aware heap
//!
//! Lifts the intraprocedural transfer onto the ICFG. Variable facts stay
//! flow-sensitive; heap slots live in a flow-insensitive value map keyed
//! by `(object, field)`, `(class, field)` or `(object, abstract index)`.
//! The two worlds are kept consistent by the store → load dirtying rule:
//! whenever a store lowers a heap value, every load statement that could
//! observe that slot through an alias is pushed back on the worklist.
//!
//! The `(object, NAC)` array key doubles as "a store through an unknown
//! index may have written any slot of this object"; constant-indexed
//! loads meet it in.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::features::dataflow::application::constprop::evaluate as evaluate_intra;
use crate::features::dataflow::domain::fact::CpFact;
use crate::features::dataflow::domain::value::Value;
use crate::features::pointer_analysis::PointerAnalysisResult;
use crate::shared::graphs::{Icfg, IcfgEdge, IcfgEdgeKind};
use crate::shared::models::{
    ClassId, Exp, FieldAccess, FieldId, ObjId, Program, StmtId, StmtKind, VarId,
};

use super::inter_solver::InterDataflowAnalysis;

/// Key into the flow-insensitive heap value map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum HeapKey {
    Instance(ObjId, FieldId),
    Static(ClassId, FieldId),
    /// Array slot under an abstract index value
    Array(ObjId, Value),
}

/// Interprocedural constant propagation for int-like values
pub struct InterConstantPropagation<'a> {
    program: &'a Program,
    pta: &'a PointerAnalysisResult,
    /// var → variables whose points-to sets intersect it (self included)
    alias_map: FxHashMap<VarId, Vec<VarId>>,
    val_map: FxHashMap<HeapKey, Value>,
    static_load_map: FxHashMap<(ClassId, FieldId), Vec<StmtId>>,
}

impl<'a> InterConstantPropagation<'a> {
    pub fn new(program: &'a Program, pta: &'a PointerAnalysisResult, icfg: &Icfg) -> Self {
        let mut analysis = Self {
            program,
            pta,
            alias_map: FxHashMap::default(),
            val_map: FxHashMap::default(),
            static_load_map: FxHashMap::default(),
        };
        analysis.build_alias_map();
        analysis.build_static_load_map(icfg);
        analysis
    }

    /// Two variables alias iff their points-to sets intersect; every
    /// variable aliases itself
    fn build_alias_map(&mut self) {
        for &v in self.pta.vars() {
            let mut aliases = vec![v];
            for &w in self.pta.vars() {
                if w != v && self.pta.may_alias(v, w) {
                    aliases.push(w);
                }
            }
            self.alias_map.insert(v, aliases);
        }
        debug!(vars = self.alias_map.len(), "alias map built");
    }

    fn build_static_load_map(&mut self, icfg: &Icfg) {
        for node in icfg.nodes() {
            if let StmtKind::LoadField { access: FieldAccess::Static { field }, .. } =
                self.program.stmt(node).kind
            {
                let class = self.program.field(field).class;
                self.static_load_map.entry((class, field)).or_default().push(node);
            }
        }
    }

    #[inline]
    fn val_get(&self, key: HeapKey) -> Value {
        self.val_map.get(&key).copied().unwrap_or(Value::Undef)
    }

    /// Expression evaluation extended with heap lookups; everything else
    /// falls back to the intraprocedural evaluator
    fn evaluate(&self, exp: &Exp, in_fact: &CpFact) -> Value {
        let pta = self.pta;
        match exp {
            Exp::Field(FieldAccess::Instance { base, field }) => {
                let mut v = Value::Undef;
                for obj in pta.points_to(*base) {
                    v = v.meet(self.val_get(HeapKey::Instance(obj, *field)));
                }
                v
            }
            Exp::Field(FieldAccess::Static { field }) => {
                self.val_get(HeapKey::Static(self.program.field(*field).class, *field))
            }
            Exp::Array { base, index } => {
                let idx = evaluate_intra(self.program, &Exp::Var(*index), in_fact);
                match idx {
                    Value::Const(_) => {
                        let mut v = Value::Undef;
                        for obj in pta.points_to(*base) {
                            v = v.meet(self.val_get(HeapKey::Array(obj, idx)));
                            // an unknown-index store may have hit this slot
                            v = v.meet(self.val_get(HeapKey::Array(obj, Value::Nac)));
                        }
                        v
                    }
                    Value::Nac => {
                        let mut v = Value::Undef;
                        for obj in pta.points_to(*base) {
                            for (key, &val) in &self.val_map {
                                if matches!(key, HeapKey::Array(o, _) if *o == obj) {
                                    v = v.meet(val);
                                }
                            }
                        }
                        v
                    }
                    Value::Undef => Value::Undef,
                }
            }
            _ => evaluate_intra(self.program, exp, in_fact),
        }
    }

    /// Store statements lower heap values and dirty the loads that could
    /// observe the slot through an alias
    fn process_store(&mut self, stmt: StmtId, in_fact: &CpFact, deferred: &mut Vec<StmtId>) {
        let program = self.program;
        match &program.stmt(stmt).kind {
            StmtKind::StoreArray { base, index, rhs } => {
                let idx = evaluate_intra(program, &Exp::Var(*index), in_fact);
                if idx.is_undef() || !program.can_hold_int(*rhs) {
                    return;
                }
                let stored = self.evaluate(&Exp::Var(*rhs), in_fact);
                let objs: Vec<ObjId> = self.pta.points_to(*base).collect();
                for obj in objs {
                    if self.lower(HeapKey::Array(obj, idx), stored) {
                        for alias in self.aliases_of(*base) {
                            deferred.extend(program.var(alias).load_arrays.iter().copied());
                        }
                    }
                }
            }
            StmtKind::StoreField { access: FieldAccess::Instance { base, field }, rhs } => {
                if !program.can_hold_int(*rhs) {
                    return;
                }
                let stored = self.evaluate(&Exp::Var(*rhs), in_fact);
                let objs: Vec<ObjId> = self.pta.points_to(*base).collect();
                for obj in objs {
                    if self.lower(HeapKey::Instance(obj, *field), stored) {
                        for alias in self.aliases_of(*base) {
                            for &load in &program.var(alias).load_fields {
                                if let StmtKind::LoadField { access, .. } =
                                    &program.stmt(load).kind
                                {
                                    if access.field() == *field {
                                        deferred.push(load);
                                    }
                                }
                            }
                        }
                    }
                }
            }
            StmtKind::StoreField { access: FieldAccess::Static { field }, rhs } => {
                if !program.can_hold_int(*rhs) {
                    return;
                }
                let stored = self.evaluate(&Exp::Var(*rhs), in_fact);
                let class = program.field(*field).class;
                if self.lower(HeapKey::Static(class, *field), stored) {
                    if let Some(loads) = self.static_load_map.get(&(class, *field)) {
                        deferred.extend(loads.iter().copied());
                    }
                }
            }
            _ => {}
        }
    }

    /// Meet `value` into the slot; returns true if the slot changed
    fn lower(&mut self, key: HeapKey, value: Value) -> bool {
        let old = self.val_get(key);
        let new = old.meet(value);
        if new != old {
            self.val_map.insert(key, new);
            true
        } else {
            false
        }
    }

    fn aliases_of(&self, var: VarId) -> Vec<VarId> {
        self.alias_map.get(&var).cloned().unwrap_or_else(|| vec![var])
    }
}

impl InterDataflowAnalysis for InterConstantPropagation<'_> {
    type Fact = CpFact;

    fn new_boundary_fact(&self, boundary: StmtId) -> CpFact {
        let mut fact = CpFact::new();
        let method = self.program.stmt(boundary).method;
        if let Some(body) = self.program.method(method).body.as_ref() {
            for &p in &body.params {
                if self.program.can_hold_int(p) {
                    fact.update(p, Value::Nac);
                }
            }
        }
        fact
    }

    fn new_initial_fact(&self) -> CpFact {
        CpFact::new()
    }

    fn meet_into(&self, fact: &CpFact, target: &mut CpFact) {
        target.meet_with(fact);
    }

    fn is_call(&self, stmt: StmtId) -> bool {
        self.program.is_call(stmt)
    }

    /// Call nodes pass the fact through unchanged; the left-hand side is
    /// supplied by the return edge
    fn transfer_call_node(&mut self, _stmt: StmtId, input: &CpFact, output: &mut CpFact) -> bool {
        let old = output.clone();
        output.copy_from(input);
        old != *output
    }

    fn transfer_non_call_node(
        &mut self,
        stmt: StmtId,
        input: &CpFact,
        output: &mut CpFact,
        deferred: &mut Vec<StmtId>,
    ) -> bool {
        self.process_store(stmt, input, deferred);

        let old = output.clone();
        output.copy_from(input);
        if let Some((lhs, rvalue)) = self.program.def(stmt) {
            if self.program.can_hold_int(lhs) {
                output.remove(lhs); // kill
                let value = self.evaluate(&rvalue, input); // gen
                output.update(lhs, value);
            }
        }
        old != *output
    }

    fn transfer_normal_edge(&self, _edge: &IcfgEdge, out: &CpFact) -> CpFact {
        out.clone()
    }

    fn transfer_call_to_return_edge(&self, edge: &IcfgEdge, out: &CpFact) -> CpFact {
        let mut fact = out.clone();
        if let Some(invoke) = self.program.invoke(edge.source) {
            if let Some(result) = invoke.result {
                fact.remove(result);
            }
        }
        fact
    }

    /// Bind argument values to the callee's formal parameters
    fn transfer_call_edge(&self, edge: &IcfgEdge, call_site_out: &CpFact) -> CpFact {
        let mut fact = CpFact::new();
        let IcfgEdgeKind::Call { callee } = edge.kind else {
            return fact;
        };
        let Some(invoke) = self.program.invoke(edge.source) else {
            return fact;
        };
        if let Some(body) = self.program.method(callee).body.as_ref() {
            for (i, &param) in body.params.iter().enumerate() {
                if let Some(&arg) = invoke.args.get(i) {
                    fact.update(param, call_site_out.get(arg));
                }
            }
        }
        fact
    }

    /// The call's left-hand side becomes the meet of the callee's return
    /// variables
    fn transfer_return_edge(&self, edge: &IcfgEdge, return_out: &CpFact) -> CpFact {
        let mut fact = CpFact::new();
        let IcfgEdgeKind::Return { call_site, ref return_vars, .. } = edge.kind else {
            return fact;
        };
        let Some(invoke) = self.program.invoke(call_site) else {
            return fact;
        };
        if let Some(result) = invoke.result {
            let mut value = Value::Undef;
            for &ret in return_vars {
                value = value.meet(return_out.get(ret));
            }
            fact.update(result, value);
        }
        fact
    }
}
