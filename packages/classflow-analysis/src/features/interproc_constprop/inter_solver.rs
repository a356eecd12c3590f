//! Interprocedural worklist solver
//!
//! Forward fixed-point engine over the ICFG. Edge transfers run while
//! the in-fact is assembled from incoming edges; node transfers come in
//! call and non-call flavors. Non-call transfers receive a deferred-work
//! queue so an analysis can dirty statements elsewhere in the program
//! (the alias-aware heap needs stores to re-enqueue dependent loads);
//! those statements are pushed back on the worklist before termination.

use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use crate::features::dataflow::domain::result::DataflowResult;
use crate::shared::graphs::{Icfg, IcfgEdge, IcfgEdgeKind};
use crate::shared::models::StmtId;

/// A forward interprocedural dataflow analysis over ICFG nodes and edges
pub trait InterDataflowAnalysis {
    type Fact: Clone + PartialEq;

    /// Fact at the entry node of an entry method
    fn new_boundary_fact(&self, boundary: StmtId) -> Self::Fact;

    fn new_initial_fact(&self) -> Self::Fact;

    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    fn is_call(&self, stmt: StmtId) -> bool;

    fn transfer_call_node(
        &mut self,
        stmt: StmtId,
        input: &Self::Fact,
        output: &mut Self::Fact,
    ) -> bool;

    fn transfer_non_call_node(
        &mut self,
        stmt: StmtId,
        input: &Self::Fact,
        output: &mut Self::Fact,
        deferred: &mut Vec<StmtId>,
    ) -> bool;

    fn transfer_normal_edge(&self, edge: &IcfgEdge, out: &Self::Fact) -> Self::Fact;

    fn transfer_call_to_return_edge(&self, edge: &IcfgEdge, out: &Self::Fact) -> Self::Fact;

    fn transfer_call_edge(&self, edge: &IcfgEdge, call_site_out: &Self::Fact) -> Self::Fact;

    fn transfer_return_edge(&self, edge: &IcfgEdge, return_out: &Self::Fact) -> Self::Fact;
}

/// Worklist engine for [`InterDataflowAnalysis`]
#[derive(Debug, Default)]
pub struct InterWorkListSolver;

impl InterWorkListSolver {
    pub fn solve<A: InterDataflowAnalysis>(icfg: &Icfg, analysis: &mut A) -> DataflowResult<A::Fact> {
        let mut result = DataflowResult::new();
        for node in icfg.nodes() {
            result.set_in_fact(node, analysis.new_initial_fact());
            result.set_out_fact(node, analysis.new_initial_fact());
        }
        let boundary: FxHashSet<StmtId> = icfg.entry_nodes().iter().copied().collect();
        for &node in icfg.entry_nodes() {
            result.set_out_fact(node, analysis.new_boundary_fact(node));
        }

        let mut worklist: VecDeque<StmtId> =
            icfg.nodes().filter(|n| !boundary.contains(n)).collect();
        let mut queued: FxHashSet<StmtId> = worklist.iter().copied().collect();
        let mut deferred: Vec<StmtId> = Vec::new();

        while let Some(b) = worklist.pop_front() {
            queued.remove(&b);

            let mut input = analysis.new_initial_fact();
            for edge in icfg.in_edges_of(b) {
                let source_out = result.out_fact(edge.source);
                let fact = match &edge.kind {
                    IcfgEdgeKind::Normal => analysis.transfer_normal_edge(edge, source_out),
                    IcfgEdgeKind::CallToReturn => {
                        analysis.transfer_call_to_return_edge(edge, source_out)
                    }
                    IcfgEdgeKind::Call { .. } => analysis.transfer_call_edge(edge, source_out),
                    IcfgEdgeKind::Return { .. } => analysis.transfer_return_edge(edge, source_out),
                };
                analysis.meet_into(&fact, &mut input);
            }

            let changed = if analysis.is_call(b) {
                analysis.transfer_call_node(b, &input, result.out_fact_mut(b))
            } else {
                analysis.transfer_non_call_node(b, &input, result.out_fact_mut(b), &mut deferred)
            };
            result.set_in_fact(b, input);

            if changed {
                for s in icfg.succs_of(b) {
                    if !boundary.contains(&s) && queued.insert(s) {
                        worklist.push_back(s);
                    }
                }
            }
            // stores dirtied loads elsewhere; they must re-run before the
            // fixed point is declared
            for s in deferred.drain(..) {
                if icfg.contains(s) && !boundary.contains(&s) && queued.insert(s) {
                    worklist.push_back(s);
                }
            }
        }

        result
    }
}
