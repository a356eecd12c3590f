//! Call-graph construction
//!
//! The graph container plus the class-hierarchy-analysis builder. The
//! pointer-analysis solvers grow their own call graphs on the fly; this
//! module's CHA builder is the conservative, hierarchy-only resolver.

mod cha;
mod graph;

pub use cha::{dispatch, resolve_callee, ChaBuilder};
pub use graph::{CallEdge, CallGraph};
