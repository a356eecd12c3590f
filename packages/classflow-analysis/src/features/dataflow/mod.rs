//! Intraprocedural dataflow analysis
//!
//! The classic monotone-framework stack: a three-point constant lattice,
//! per-point fact maps, generic fixed-point solvers, and the three
//! analyses built on them: constant propagation, live variables and
//! dead-code detection.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::constprop::{evaluate, ConstantPropagation};
pub use application::dead_code::DeadCodeDetection;
pub use application::liveness::LiveVariableAnalysis;
pub use domain::fact::{CpFact, SetFact};
pub use domain::result::DataflowResult;
pub use domain::value::Value;
pub use infrastructure::solver::{DataflowAnalysis, Direction, IterativeSolver, WorkListSolver};
