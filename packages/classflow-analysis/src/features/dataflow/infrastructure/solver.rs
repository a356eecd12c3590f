//! Generic dataflow solvers
//!
//! Two engines over the same [`DataflowAnalysis`] contract:
//! - [`WorkListSolver`]: Kildall's worklist algorithm; only re-transfers
//!   nodes whose inputs may have changed.
//! - [`IterativeSolver`]: naive round-robin sweeps until a full pass is
//!   quiet.
//!
//! Both reach the same fixed point: the lattice has finite height and
//! transfers are monotone, so extraction order only affects transient
//! states. Facts are direction-relative: for a backward analysis the
//! solver swaps the roles of in/out and of predecessors/successors.
//!
//! References:
//! - Kildall, "A Unified Approach to Global Program Optimization" (POPL 1973)
//! - Kam & Ullman, "Monotone Data Flow Analysis Frameworks" (1977)

use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use crate::shared::graphs::Cfg;
use crate::shared::models::StmtId;

use super::super::domain::result::DataflowResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// A monotone dataflow analysis over a CFG.
///
/// `transfer_node` receives the node's input-side fact and mutates its
/// output-side fact, returning whether the output changed. "Input" and
/// "output" are relative to [`DataflowAnalysis::direction`]: a forward
/// analysis reads IN and writes OUT, a backward analysis reads OUT and
/// writes IN.
pub trait DataflowAnalysis {
    type Fact: Clone + PartialEq;

    fn direction(&self) -> Direction;

    /// Fact at the boundary (entry for forward, exit for backward)
    fn new_boundary_fact(&self, cfg: &Cfg) -> Self::Fact;

    /// Fact for every non-boundary point before solving
    fn new_initial_fact(&self) -> Self::Fact;

    /// Meet `fact` into `target`
    fn meet_into(&self, fact: &Self::Fact, target: &mut Self::Fact);

    fn transfer_node(&self, stmt: StmtId, input: &Self::Fact, output: &mut Self::Fact) -> bool;
}

fn initialize<A: DataflowAnalysis>(cfg: &Cfg, analysis: &A) -> DataflowResult<A::Fact> {
    let mut result = DataflowResult::new();
    for node in cfg.nodes() {
        result.set_in_fact(node, analysis.new_initial_fact());
        result.set_out_fact(node, analysis.new_initial_fact());
    }
    match analysis.direction() {
        Direction::Forward => result.set_out_fact(cfg.entry(), analysis.new_boundary_fact(cfg)),
        Direction::Backward => result.set_in_fact(cfg.exit(), analysis.new_boundary_fact(cfg)),
    }
    result
}

/// Worklist-based fixed-point engine
#[derive(Debug, Default)]
pub struct WorkListSolver;

impl WorkListSolver {
    pub fn solve<A: DataflowAnalysis>(cfg: &Cfg, analysis: &A) -> DataflowResult<A::Fact> {
        let mut result = initialize(cfg, analysis);
        match analysis.direction() {
            Direction::Forward => Self::solve_forward(cfg, analysis, &mut result),
            Direction::Backward => Self::solve_backward(cfg, analysis, &mut result),
        }
        result
    }

    fn solve_forward<A: DataflowAnalysis>(
        cfg: &Cfg,
        analysis: &A,
        result: &mut DataflowResult<A::Fact>,
    ) {
        let boundary = cfg.entry();
        let mut worklist: VecDeque<StmtId> =
            cfg.nodes().filter(|&n| n != boundary).collect();
        let mut queued: FxHashSet<StmtId> = worklist.iter().copied().collect();

        while let Some(b) = worklist.pop_front() {
            queued.remove(&b);

            let mut input = analysis.new_initial_fact();
            for p in cfg.preds_of(b) {
                analysis.meet_into(result.out_fact(p), &mut input);
            }
            let changed = analysis.transfer_node(b, &input, result.out_fact_mut(b));
            result.set_in_fact(b, input);

            if changed {
                for s in cfg.succs_of(b) {
                    if s != boundary && queued.insert(s) {
                        worklist.push_back(s);
                    }
                }
            }
        }
    }

    fn solve_backward<A: DataflowAnalysis>(
        cfg: &Cfg,
        analysis: &A,
        result: &mut DataflowResult<A::Fact>,
    ) {
        let boundary = cfg.exit();
        let mut worklist: VecDeque<StmtId> =
            cfg.nodes().filter(|&n| n != boundary).collect();
        let mut queued: FxHashSet<StmtId> = worklist.iter().copied().collect();

        while let Some(b) = worklist.pop_front() {
            queued.remove(&b);

            let mut input = analysis.new_initial_fact();
            for s in cfg.succs_of(b) {
                analysis.meet_into(result.in_fact(s), &mut input);
            }
            let changed = analysis.transfer_node(b, &input, result.in_fact_mut(b));
            result.set_out_fact(b, input);

            if changed {
                for p in cfg.preds_of(b) {
                    if p != boundary && queued.insert(p) {
                        worklist.push_back(p);
                    }
                }
            }
        }
    }
}

/// Naive round-robin engine; same fixed point as the worklist solver
#[derive(Debug, Default)]
pub struct IterativeSolver;

impl IterativeSolver {
    pub fn solve<A: DataflowAnalysis>(cfg: &Cfg, analysis: &A) -> DataflowResult<A::Fact> {
        let mut result = initialize(cfg, analysis);
        let forward = analysis.direction() == Direction::Forward;
        let boundary = if forward { cfg.entry() } else { cfg.exit() };

        loop {
            let mut changed = false;
            for b in cfg.nodes() {
                if b == boundary {
                    continue;
                }
                let mut input = analysis.new_initial_fact();
                if forward {
                    for p in cfg.preds_of(b) {
                        analysis.meet_into(result.out_fact(p), &mut input);
                    }
                    changed |= analysis.transfer_node(b, &input, result.out_fact_mut(b));
                    result.set_in_fact(b, input);
                } else {
                    for s in cfg.succs_of(b) {
                        analysis.meet_into(result.in_fact(s), &mut input);
                    }
                    changed |= analysis.transfer_node(b, &input, result.in_fact_mut(b));
                    result.set_out_fact(b, input);
                }
            }
            if !changed {
                break;
            }
        }
        result
    }
}
