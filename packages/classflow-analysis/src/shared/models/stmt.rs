//! Statement and expression sum types
//!
//! Statements follow a three-address shape: every operand is a variable,
//! so expression evaluation never recurses. The variant set is exactly
//! what the analyses dispatch on: allocation, copy, field/array loads and
//! stores, invocations, branches and returns, plus the synthetic
//! entry/exit markers the CFG needs.

use serde::{Deserialize, Serialize};

use super::program::{ClassId, FieldId, StmtId, SubsigId, VarId};
use super::types::Type;

/// Binary operators over int-like operands.
///
/// Division and remainder are the two trapping operators; comparisons
/// produce 0 or 1; shifts use the low five bits of the shift amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinaryOp {
    /// Whether this operator may trap at runtime (division by zero)
    #[inline]
    pub fn may_trap(&self) -> bool {
        matches!(self, BinaryOp::Div | BinaryOp::Rem)
    }
}

/// How a call site binds its callee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    /// Class-level call, resolved at the literal receiver class
    Static,
    /// Constructor / super / private call, dispatched from the declaring class
    Special,
    /// Instance call through a class-typed receiver
    Virtual,
    /// Instance call through an interface-typed receiver
    Interface,
}

/// A symbolic reference to a method: declaring class + interned subsignature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub class: ClassId,
    pub subsig: SubsigId,
}

/// A field access path, static or instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldAccess {
    Static { field: FieldId },
    Instance { base: VarId, field: FieldId },
}

impl FieldAccess {
    #[inline]
    pub fn field(&self) -> FieldId {
        match self {
            FieldAccess::Static { field } | FieldAccess::Instance { field, .. } => *field,
        }
    }

    #[inline]
    pub fn base(&self) -> Option<VarId> {
        match self {
            FieldAccess::Instance { base, .. } => Some(*base),
            FieldAccess::Static { .. } => None,
        }
    }
}

/// A call site: callee reference, receiver, arguments and result slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoke {
    pub kind: CallKind,
    pub method_ref: MethodRef,
    /// Receiver variable; `None` for static calls
    pub base: Option<VarId>,
    pub args: Vec<VarId>,
    /// Left-hand side receiving the return value, if any
    pub result: Option<VarId>,
}

impl Invoke {
    #[inline]
    pub fn is_static(&self) -> bool {
        self.kind == CallKind::Static
    }
}

/// Statement kinds.
///
/// Branch targets are statement ids resolved by the builder; `Entry` and
/// `Exit` are synthetic CFG boundary nodes and never appear mid-body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StmtKind {
    Entry,
    Exit,
    Nop,
    /// `x = new T`; the allocation site is the statement itself
    New { lhs: VarId, ty: Type },
    /// `x = y`
    Copy { lhs: VarId, rhs: VarId },
    /// `x = k`
    AssignLiteral { lhs: VarId, value: i32 },
    /// `x = y op z`
    Binary { lhs: VarId, op: BinaryOp, op1: VarId, op2: VarId },
    /// `x = (T) y`
    Cast { lhs: VarId, ty: Type, rhs: VarId },
    /// `x = base.f` or `x = C.f`
    LoadField { lhs: VarId, access: FieldAccess },
    /// `base.f = y` or `C.f = y`
    StoreField { access: FieldAccess, rhs: VarId },
    /// `x = base[i]`
    LoadArray { lhs: VarId, base: VarId, index: VarId },
    /// `base[i] = y`
    StoreArray { base: VarId, index: VarId, rhs: VarId },
    /// `r = base.m(args)` / `r = C.m(args)`
    Invoke(Invoke),
    /// `if (op1 op op2) goto target`; fall-through is the false branch
    If { op: BinaryOp, op1: VarId, op2: VarId, target: StmtId },
    Goto { target: StmtId },
    /// `switch (var)` with constant case values; `default` is mandatory
    Switch { var: VarId, cases: Vec<(i32, StmtId)>, default: StmtId },
    Return { var: Option<VarId> },
}

/// Right-hand-side expression view used by the evaluators.
///
/// Constructed on the fly from statements; carries only ids, so it is
/// cheap to build and match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exp {
    Var(VarId),
    IntLiteral(i32),
    Binary { op: BinaryOp, op1: VarId, op2: VarId },
    Field(FieldAccess),
    Array { base: VarId, index: VarId },
    New(Type),
    Cast { ty: Type, rhs: VarId },
    /// The value returned by a call, opaque to intraprocedural evaluation
    InvokeResult,
}

impl Exp {
    /// Whether evaluating this expression can have an observable side
    /// effect: allocation, a trapping cast, field or array access (may
    /// trap or trigger initialization), or a trapping division/remainder.
    pub fn has_side_effect(&self) -> bool {
        match self {
            Exp::New(_) | Exp::Cast { .. } | Exp::Field(_) | Exp::Array { .. } => true,
            Exp::Binary { op, .. } => op.may_trap(),
            Exp::Var(_) | Exp::IntLiteral(_) | Exp::InvokeResult => false,
        }
    }
}

/// An unresolved branch target handed out by [`super::MethodBuilder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(pub(crate) u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trapping_ops() {
        assert!(BinaryOp::Div.may_trap());
        assert!(BinaryOp::Rem.may_trap());
        assert!(!BinaryOp::Add.may_trap());
        assert!(!BinaryOp::Shl.may_trap());
    }

    #[test]
    fn test_side_effects() {
        assert!(Exp::New(Type::int()).has_side_effect());
        assert!(Exp::Field(FieldAccess::Static { field: 0 }).has_side_effect());
        assert!(Exp::Binary { op: BinaryOp::Div, op1: 0, op2: 1 }.has_side_effect());
        assert!(!Exp::Binary { op: BinaryOp::Add, op1: 0, op2: 1 }.has_side_effect());
        assert!(!Exp::Var(0).has_side_effect());
        assert!(!Exp::IntLiteral(3).has_side_effect());
    }
}
