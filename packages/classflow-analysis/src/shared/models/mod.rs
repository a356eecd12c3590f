//! IR data model
//!
//! The analyses treat the IR as a trusted, fully-interned input: classes,
//! fields, methods, variables and statements are `u32` handles into arenas
//! owned by [`Program`]. Interning is what gives structural keys like
//! `(object, field)` the cheap identity-equality the solvers rely on.
//!
//! There is no parser here; programs are assembled through
//! [`ProgramBuilder`], which resolves branch labels, assigns statement
//! indices and precomputes the per-variable access lists the pointer
//! analyses consume.

mod heap;
mod program;
mod stmt;
mod types;

pub use heap::{HeapModel, ObjData, ObjKind};
pub use program::{
    ClassData, ClassId, FieldData, FieldId, MethodBody, MethodBuilder, MethodData, MethodId,
    ObjId, Program, ProgramBuilder, StmtData, StmtId, SubsigId, VarData, VarId,
};
pub use stmt::{BinaryOp, CallKind, Exp, FieldAccess, Invoke, Label, MethodRef, StmtKind};
pub use types::{PrimitiveType, Type};
