/*
 * classflow-analysis: whole-program static analysis for a class-based IR
 *
 * Layout:
 * - shared/    : IR model (arena-interned), CFG/ICFG graph types
 * - features/  : vertical slices: dataflow (lattice, solvers, constant
 *                propagation, liveness, dead code), callgraph (CHA),
 *                pointer_analysis (Andersen CI/CS), interproc_constprop,
 *                taint
 * - config/    : analysis options + taint rule loading
 *
 * Every solver is a single-threaded worklist loop; the only parallelism
 * is the per-method fan-out of intraprocedural constant propagation.
 */

pub mod config;
pub mod errors;
pub mod features;
pub mod shared;

// ═══════════════════════════════════════════════════════════════════════
// Re-exports for the public API
// ═══════════════════════════════════════════════════════════════════════

pub use config::{AnalysisOptions, ContextPolicy};
pub use errors::{AnalysisError, Result};

pub use shared::graphs::{Cfg, CfgEdge, CfgEdgeKind, Icfg, IcfgBuilder, IcfgEdge, IcfgEdgeKind};
pub use shared::models::{
    BinaryOp, CallKind, ClassId, Exp, FieldAccess, FieldId, HeapModel, Invoke, MethodBuilder,
    MethodId, MethodRef, ObjId, PrimitiveType, Program, ProgramBuilder, StmtId, StmtKind, Type,
    VarId,
};

pub use features::callgraph::{ChaBuilder, CallEdge, CallGraph};
pub use features::dataflow::{
    evaluate, ConstantPropagation, CpFact, DataflowAnalysis, DataflowResult, DeadCodeDetection,
    Direction, IterativeSolver, LiveVariableAnalysis, SetFact, Value, WorkListSolver,
};
pub use features::interproc_constprop::{
    run as run_inter_constant_propagation, InterConstantPropagation, InterDataflowAnalysis,
    InterWorkListSolver,
};
pub use features::pointer_analysis::{
    CallSiteSelector, CiSolver, ContextInsensitiveSelector, ContextSelector, CsPtaResult,
    CsSolver, ObjectSelector, PointerAnalysisResult, PointsToSet,
};
pub use features::taint::{TaintAnalysis, TaintConfig, TaintFlow, TransferIndex};
