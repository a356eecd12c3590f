//! Inclusion-based pointer analysis
//!
//! Andersen-style points-to analysis over a pointer-flow graph, with
//! on-the-fly call-graph construction. Two solvers share the machinery:
//! the context-insensitive one works on plain pointers, the
//! context-sensitive one qualifies variables, methods, call sites and
//! heap objects with interned contexts picked by a [`ContextSelector`].
//!
//! References:
//! - Andersen, "Program Analysis and Specialization for C" (1994)
//! - Smaragdakis & Balatsouras, "Pointer Analysis" (FnT PL 2015)

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::result::PointerAnalysisResult;
pub use domain::context::{
    ContextElem, ContextManager, CsCallSiteId, CsManager, CsMethodId, CsObjId, CtxId,
};
pub use domain::cs_call_graph::{CsCallEdge, CsCallGraph};
pub use domain::pfg::{PointerFlowGraph, PointerId};
pub use domain::points_to_set::PointsToSet;
pub use domain::pointer::{CsPointer, Pointer};
pub use infrastructure::ci_solver::CiSolver;
pub use infrastructure::cs_solver::{CsPtaResult, CsSolver};
pub use infrastructure::selector::{
    CallSiteSelector, ContextInsensitiveSelector, ContextSelector, ObjectSelector,
};
