//! Analysis features
//!
//! Each feature is a vertical slice: domain types, the algorithms that
//! run over them, and (where it earns its keep) an application-facing
//! result view.

pub mod callgraph;
pub mod dataflow;
pub mod interproc_constprop;
pub mod pointer_analysis;
pub mod taint;
