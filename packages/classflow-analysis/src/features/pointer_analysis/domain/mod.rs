//! Pointer-analysis domain: pointers, points-to sets, the flow graph,
//! contexts and the context-sensitive call graph

pub mod context;
pub mod cs_call_graph;
pub mod pfg;
pub mod pointer;
pub mod points_to_set;
