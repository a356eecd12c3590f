//! Pointer kinds
//!
//! The four node flavors of the pointer-flow graph. Array indices are
//! erased: every element of an abstract array object shares one
//! `ArrayIndex` slot. The context-sensitive variant qualifies variables
//! by context and objects by their heap context (via [`CsObjId`]);
//! static fields stay global.

use serde::{Deserialize, Serialize};

use crate::shared::models::{FieldId, ObjId, VarId};

use super::context::{CsObjId, CtxId};

/// Context-insensitive pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pointer {
    Var(VarId),
    StaticField(FieldId),
    InstanceField(ObjId, FieldId),
    ArrayIndex(ObjId),
}

/// Context-sensitive pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CsPointer {
    Var(CtxId, VarId),
    StaticField(FieldId),
    InstanceField(CsObjId, FieldId),
    ArrayIndex(CsObjId),
}
