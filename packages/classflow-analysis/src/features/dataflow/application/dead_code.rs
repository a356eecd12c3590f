//! Dead-code detection
//!
//! Two passes over one method:
//! 1. Unreachable code: constant branch conditions prune CFG edges, then
//!    a BFS from the entry marks what survives; everything else (minus the
//!    exit node) is dead.
//! 2. Useless assignments: an assignment whose left-hand side is not live
//!    afterwards and whose right-hand side cannot trap or allocate.
//!
//! The result is ordered by statement index.

use rustc_hash::FxHashSet;
use std::collections::{BTreeSet, VecDeque};

use crate::shared::graphs::{Cfg, CfgEdgeKind};
use crate::shared::models::{Exp, Program, StmtId, StmtKind};

use super::super::domain::fact::{CpFact, SetFact};
use super::super::domain::result::DataflowResult;
use super::constprop::evaluate;

pub struct DeadCodeDetection<'a> {
    program: &'a Program,
}

impl<'a> DeadCodeDetection<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// Detect dead statements in the method behind `cfg`, given its
    /// constant-propagation and live-variable results
    pub fn analyze(
        &self,
        cfg: &Cfg,
        constants: &DataflowResult<CpFact>,
        live_vars: &DataflowResult<SetFact>,
    ) -> BTreeSet<StmtId> {
        let pruned = self.prune_constant_branches(cfg, constants);

        // BFS over the surviving edges
        let mut visited: FxHashSet<StmtId> = FxHashSet::default();
        let mut queue: VecDeque<StmtId> = VecDeque::new();
        queue.push_back(cfg.entry());
        while let Some(node) = queue.pop_front() {
            visited.insert(node);
            for succ in cfg.succs_of(node) {
                if !visited.contains(&succ) && !pruned.contains(&(node, succ)) {
                    queue.push_back(succ);
                }
            }
        }

        let mut dead: BTreeSet<StmtId> = cfg.nodes().collect();
        dead.remove(&cfg.exit());
        dead.retain(|n| !visited.contains(n));

        // useless assignments among the live statements
        for stmt in cfg.nodes() {
            if dead.contains(&stmt) {
                continue;
            }
            if let Some((var, rvalue)) = self.program.assign_def(stmt) {
                if !live_vars.out_fact(stmt).contains(var) && !rvalue.has_side_effect() {
                    dead.insert(stmt);
                }
            }
        }

        dead
    }

    /// Edges ruled out by constant branch conditions
    fn prune_constant_branches(
        &self,
        cfg: &Cfg,
        constants: &DataflowResult<CpFact>,
    ) -> FxHashSet<(StmtId, StmtId)> {
        let mut pruned = FxHashSet::default();
        for stmt in cfg.nodes() {
            match &self.program.stmt(stmt).kind {
                StmtKind::If { op, op1, op2, target } => {
                    let cond = Exp::Binary { op: *op, op1: *op1, op2: *op2 };
                    let v = evaluate(self.program, &cond, constants.out_fact(stmt));
                    let Some(c) = v.constant() else { continue };
                    if c == 0 {
                        // the taken branch is dead
                        pruned.insert((stmt, *target));
                    } else {
                        for edge in cfg.out_edges_of(stmt) {
                            if edge.kind == CfgEdgeKind::IfFalse {
                                pruned.insert((stmt, edge.target));
                            }
                        }
                    }
                }
                StmtKind::Switch { var, cases, default } => {
                    let v = evaluate(self.program, &Exp::Var(*var), constants.out_fact(stmt));
                    let Some(c) = v.constant() else { continue };
                    let mut matched = false;
                    for &(value, target) in cases {
                        if c == value {
                            matched = true;
                        } else {
                            pruned.insert((stmt, target));
                        }
                    }
                    if matched {
                        pruned.insert((stmt, *default));
                    }
                }
                _ => {}
            }
        }
        pruned
    }
}
