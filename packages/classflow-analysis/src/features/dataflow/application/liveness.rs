//! Live-variable analysis
//!
//! Backward may-analysis: a variable is live at a point if some path to
//! the exit reads it before redefining it. Dead-code detection consumes
//! the result to flag useless assignments.

use crate::shared::graphs::Cfg;
use crate::shared::models::{Program, StmtId};

use super::super::domain::fact::SetFact;
use super::super::infrastructure::solver::{DataflowAnalysis, Direction};

pub struct LiveVariableAnalysis<'a> {
    program: &'a Program,
}

impl<'a> LiveVariableAnalysis<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }
}

impl DataflowAnalysis for LiveVariableAnalysis<'_> {
    type Fact = SetFact;

    fn direction(&self) -> Direction {
        Direction::Backward
    }

    fn new_boundary_fact(&self, _cfg: &Cfg) -> SetFact {
        SetFact::new()
    }

    fn new_initial_fact(&self) -> SetFact {
        SetFact::new()
    }

    fn meet_into(&self, fact: &SetFact, target: &mut SetFact) {
        target.union_with(fact);
    }

    // backward: input is the OUT set, output is the IN set
    fn transfer_node(&self, stmt: StmtId, input: &SetFact, output: &mut SetFact) -> bool {
        let mut new_in = input.clone();
        if let Some(def) = self.program.def_var(stmt) {
            new_in.remove(def);
        }
        for used in self.program.uses(stmt) {
            new_in.add(used);
        }
        let changed = new_in != *output;
        if changed {
            output.copy_from(&new_in);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::dataflow::infrastructure::solver::WorkListSolver;
    use crate::shared::models::{BinaryOp, ProgramBuilder, Type};

    #[test]
    fn test_dead_def_not_live() {
        let mut b = ProgramBuilder::new();
        let c = b.add_class("Main");
        let m = b.add_method(c, "f", vec![], Type::int());
        b.mark_static(m);
        let mut mb = b.body(m);
        let x = mb.var("x", Type::int());
        let y = mb.var("y", Type::int());
        mb.assign_lit(x, 1); // x overwritten below without a read
        mb.assign_lit(x, 2);
        mb.binary(y, BinaryOp::Add, x, x);
        mb.ret(Some(y));
        mb.finish();
        let p = b.finish().unwrap();

        let cfg = Cfg::build(&p, m).unwrap();
        let live = LiveVariableAnalysis::new(&p);
        let result = WorkListSolver::solve(&cfg, &live);
        let body = p.method(m).body.as_ref().unwrap();
        let first_assign = body.stmts[1];
        let second_assign = body.stmts[2];
        // x is not live right after the first assignment...
        assert!(!result.out_fact(first_assign).contains(x));
        // ...but is live after the second, which feeds the add
        assert!(result.out_fact(second_assign).contains(x));
        assert!(result.in_fact(body.stmts[4]).contains(y));
    }
}
