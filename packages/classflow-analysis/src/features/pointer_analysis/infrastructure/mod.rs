//! Pointer-analysis solvers and context selectors

pub mod ci_solver;
pub mod cs_solver;
pub mod selector;
