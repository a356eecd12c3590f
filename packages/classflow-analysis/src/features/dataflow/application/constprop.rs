//! Intraprocedural constant propagation
//!
//! Forward must-analysis over [`CpFact`]s. Integer semantics are 32-bit
//! wrap-around; shifts use the low five bits of the shift amount; logical
//! right shift is unsigned; comparisons produce 0 or 1. Division or
//! remainder by a constant zero evaluates to UNDEF; the program traps
//! before producing a value, even when the dividend is NAC.

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::shared::graphs::Cfg;
use crate::shared::models::{BinaryOp, Exp, MethodId, Program, StmtId};

use super::super::domain::fact::CpFact;
use super::super::domain::result::DataflowResult;
use super::super::domain::value::Value;
use super::super::infrastructure::solver::{DataflowAnalysis, Direction, WorkListSolver};

/// Constant propagation for int-like variables
pub struct ConstantPropagation<'a> {
    program: &'a Program,
}

impl<'a> ConstantPropagation<'a> {
    pub fn new(program: &'a Program) -> Self {
        Self { program }
    }

    /// Solve every method with a body. Methods are independent, so the
    /// fan-out is parallel; each per-method solve stays sequential.
    pub fn run_all(program: &Program) -> Result<FxHashMap<MethodId, DataflowResult<CpFact>>> {
        let methods: Vec<MethodId> =
            program.methods().filter(|&m| program.method(m).body.is_some()).collect();
        methods
            .par_iter()
            .map(|&m| {
                let cfg = Cfg::build(program, m)?;
                let cp = ConstantPropagation::new(program);
                Ok((m, WorkListSolver::solve(&cfg, &cp)))
            })
            .collect()
    }
}

impl DataflowAnalysis for ConstantPropagation<'_> {
    type Fact = CpFact;

    fn direction(&self) -> Direction {
        Direction::Forward
    }

    /// Integer-typed formal parameters enter as NAC; everything else is
    /// absent (UNDEF)
    fn new_boundary_fact(&self, cfg: &Cfg) -> CpFact {
        let mut fact = CpFact::new();
        if let Some(body) = self.program.method(cfg.method()).body.as_ref() {
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

    fn transfer_node(&self, stmt: StmtId, input: &CpFact, output: &mut CpFact) -> bool {
        let old = output.clone();
        output.copy_from(input);

        if let Some((lhs, rvalue)) = self.program.def(stmt) {
            if self.program.can_hold_int(lhs) {
                output.remove(lhs); // kill
                let value = evaluate(self.program, &rvalue, input); // gen
                output.update(lhs, value);
            }
        }

        old != *output
    }
}

/// Evaluate an expression under the given fact.
///
/// Unknown shapes (allocations, casts, field/array accesses, call
/// results) conservatively yield NAC.
pub fn evaluate(program: &Program, exp: &Exp, in_fact: &CpFact) -> Value {
    match exp {
        Exp::Var(v) => {
            if program.can_hold_int(*v) {
                in_fact.get(*v)
            } else {
                Value::Nac
            }
        }
        Exp::IntLiteral(k) => Value::Const(*k),
        Exp::Binary { op, op1, op2 } => {
            let y = in_fact.get(*op1);
            let z = in_fact.get(*op2);
            match (y, z) {
                (Value::Const(a), Value::Const(b)) => apply(*op, a, b),
                (Value::Nac, _) => {
                    // a trapping division by constant zero never reads the
                    // dividend, so the NAC does not leak through
                    if op.may_trap() && z == Value::Const(0) {
                        Value::Undef
                    } else {
                        Value::Nac
                    }
                }
                (_, Value::Nac) => Value::Nac,
                _ => Value::Undef,
            }
        }
        _ => Value::Nac,
    }
}

fn apply(op: BinaryOp, y: i32, z: i32) -> Value {
    let result = match op {
        BinaryOp::Add => y.wrapping_add(z),
        BinaryOp::Sub => y.wrapping_sub(z),
        BinaryOp::Mul => y.wrapping_mul(z),
        BinaryOp::Div => {
            if z == 0 {
                return Value::Undef;
            }
            y.wrapping_div(z)
        }
        BinaryOp::Rem => {
            if z == 0 {
                return Value::Undef;
            }
            y.wrapping_rem(z)
        }
        BinaryOp::And => y & z,
        BinaryOp::Or => y | z,
        BinaryOp::Xor => y ^ z,
        // wrapping shifts mask the shift amount to the low five bits
        BinaryOp::Shl => y.wrapping_shl(z as u32),
        BinaryOp::Shr => y.wrapping_shr(z as u32),
        BinaryOp::UShr => ((y as u32).wrapping_shr(z as u32)) as i32,
        BinaryOp::Eq => (y == z) as i32,
        BinaryOp::Ne => (y != z) as i32,
        BinaryOp::Lt => (y < z) as i32,
        BinaryOp::Gt => (y > z) as i32,
        BinaryOp::Le => (y <= z) as i32,
        BinaryOp::Ge => (y >= z) as i32,
    };
    Value::Const(result)
}
