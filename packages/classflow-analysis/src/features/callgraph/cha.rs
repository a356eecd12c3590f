//! Class-hierarchy analysis
//!
//! Resolves every call site against the declared hierarchy only; no
//! heap information. Virtual and interface calls walk the declaring
//! class plus its *direct* subclasses, subinterfaces and implementors;
//! deeper targets are discovered transitively as the resolved callees
//! themselves become reachable and are processed in turn.

use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

use crate::errors::{AnalysisError, Result};
use crate::shared::graphs::CallGraphView;
use crate::shared::models::{CallKind, ClassId, MethodId, Program, StmtId, SubsigId};

use super::graph::{CallEdge, CallGraph};

/// The first non-abstract method matching `subsig`, searching `class`
/// and then its superclass chain. The hierarchy is validated acyclic at
/// program construction, so the recursion terminates.
pub fn dispatch(program: &Program, class: ClassId, subsig: SubsigId) -> Option<MethodId> {
    for &m in &program.class(class).methods {
        let md = program.method(m);
        if md.subsig == subsig && !md.is_abstract {
            return Some(m);
        }
    }
    program.superclass(class).and_then(|sup| dispatch(program, sup, subsig))
}

/// Resolve the unique callee of a call site given the receiver's
/// concrete class (ignored for static calls). `None` means the dispatch
/// failed and the edge is omitted.
pub fn resolve_callee(
    program: &Program,
    recv_class: Option<ClassId>,
    call_site: StmtId,
) -> Option<MethodId> {
    let invoke = program.invoke(call_site)?;
    let mr = invoke.method_ref;
    match invoke.kind {
        CallKind::Static => program.declared_method(mr.class, mr.subsig),
        CallKind::Special => dispatch(program, mr.class, mr.subsig),
        CallKind::Virtual | CallKind::Interface => {
            dispatch(program, recv_class.unwrap_or(mr.class), mr.subsig)
        }
    }
}

pub struct ChaBuilder<'a> {
    program: &'a Program,
}

impl<'a> ChaBuilder<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// Build the call graph from the program's entry method
    pub fn build(&self) -> Result<CallGraph> {
        let entry = self
            .program
            .entry_method()
            .ok_or_else(|| AnalysisError::malformed("program has no entry method"))?;

        let mut call_graph = CallGraph::new();
        call_graph.add_entry_method(entry);

        let mut worklist = VecDeque::from([entry]);
        while let Some(method) = worklist.pop_front() {
            if call_graph.contains(method) {
                continue;
            }
            call_graph.add_reachable_method(method);

            let call_sites: Vec<StmtId> = self.program.call_sites_in(method).collect();
            for call_site in call_sites {
                let kind = self
                    .program
                    .invoke(call_site)
                    .map(|inv| inv.kind)
                    .unwrap_or(CallKind::Static);
                for callee in self.resolve(call_site) {
                    call_graph.add_edge(CallEdge { kind, call_site, callee });
                    worklist.push_back(callee);
                }
            }
        }

        debug!(
            methods = call_graph.reachable_methods().len(),
            edges = call_graph.edge_count(),
            "CHA call graph built"
        );
        Ok(call_graph)
    }

    /// Resolve the possible callees of a call site via the hierarchy.
    ///
    /// Unresolvable targets are simply omitted; CHA over-approximates
    /// upward (extra targets), never downward.
    pub fn resolve(&self, call_site: StmtId) -> BTreeSet<MethodId> {
        let mut targets = BTreeSet::new();
        let Some(invoke) = self.program.invoke(call_site) else {
            return targets;
        };
        let declaring = invoke.method_ref.class;
        let subsig = invoke.method_ref.subsig;

        match invoke.kind {
            CallKind::Static => {
                targets.extend(self.program.declared_method(declaring, subsig));
            }
            CallKind::Special => {
                targets.extend(self.dispatch(declaring, subsig));
            }
            CallKind::Virtual | CallKind::Interface => {
                targets.extend(self.dispatch(declaring, subsig));
                for &c in self.program.direct_subclasses(declaring) {
                    targets.extend(self.dispatch(c, subsig));
                }
                for &c in self.program.direct_subinterfaces(declaring) {
                    targets.extend(self.dispatch(c, subsig));
                }
                for &c in self.program.direct_implementors(declaring) {
                    targets.extend(self.dispatch(c, subsig));
                }
            }
        }
        targets
    }

    /// See [`dispatch`]
    pub fn dispatch(&self, class: ClassId, subsig: SubsigId) -> Option<MethodId> {
        dispatch(self.program, class, subsig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::graphs::CallGraphView;
    use crate::shared::models::{ProgramBuilder, Type};

    /// A, B extends A, C extends A, each defining m()
    fn hierarchy_program() -> (Program, MethodId, [MethodId; 3], StmtId) {
        let mut b = ProgramBuilder::new();
        let main_class = b.add_class("Main");
        let a = b.add_class("A");
        let bc = b.add_class("B");
        let cc = b.add_class("C");
        b.set_superclass(bc, a);
        b.set_superclass(cc, a);

        let am = b.add_method(a, "m", vec![], Type::Void);
        let bm = b.add_method(bc, "m", vec![], Type::Void);
        let cm = b.add_method(cc, "m", vec![], Type::Void);
        for m in [am, bm, cm] {
            let mut mb = b.body(m);
            mb.ret(None);
            mb.finish();
        }

        let main = b.add_method(main_class, "main", vec![], Type::Void);
        b.mark_static(main);
        b.set_entry(main);
        let target = b.method_ref(am);
        let mut mb = b.body(main);
        let recv = mb.var("a", Type::Reference(a));
        mb.new_obj(recv, Type::Reference(a));
        mb.call_virtual(recv, target, vec![], None);
        mb.ret(None);
        mb.finish();

        let p = b.finish().unwrap();
        let call_site = p.call_sites_in(main).next().unwrap();
        (p, main, [am, bm, cm], call_site)
    }

    #[test]
    fn test_virtual_resolves_direct_subclasses() {
        let (p, _, [am, bm, cm], call_site) = hierarchy_program();
        let cha = ChaBuilder::new(&p);
        let targets = cha.resolve(call_site);
        assert_eq!(targets, BTreeSet::from([am, bm, cm]));
    }

    #[test]
    fn test_build_reaches_all_targets() {
        let (p, main, [am, bm, cm], call_site) = hierarchy_program();
        let cg = ChaBuilder::new(&p).build().unwrap();
        assert!(cg.contains(main));
        for m in [am, bm, cm] {
            assert!(cg.contains(m));
        }
        assert_eq!(cg.callees_of(call_site).len(), 3);
    }

    #[test]
    fn test_dispatch_walks_superclass_chain() {
        // B extends A; only A defines m(); dispatch(B, m) = A.m
        let mut b = ProgramBuilder::new();
        let a = b.add_class("A");
        let bc = b.add_class("B");
        b.set_superclass(bc, a);
        let am = b.add_method(a, "m", vec![], Type::Void);
        let mut mb = b.body(am);
        mb.ret(None);
        mb.finish();
        let p = b.finish().unwrap();

        let cha = ChaBuilder::new(&p);
        let subsig = p.method(am).subsig;
        assert_eq!(cha.dispatch(bc, subsig), Some(am));
        assert_eq!(cha.dispatch(a, subsig), Some(am));
    }

    #[test]
    fn test_abstract_methods_not_dispatched() {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("A");
        let am = b.add_method(a, "m", vec![], Type::Void);
        b.mark_abstract(am);
        let p = b.finish().unwrap();

        let cha = ChaBuilder::new(&p);
        assert_eq!(cha.dispatch(a, p.method(am).subsig), None);
    }
}
