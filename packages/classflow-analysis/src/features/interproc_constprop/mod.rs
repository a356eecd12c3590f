//! Interprocedural constant propagation
//!
//! The ICFG worklist solver plus the alias-aware analysis that runs on
//! it. [`run`] is the configured entry point: it looks up the pointer
//! analysis named by the options (its absence is fatal) and drives the
//! solver to the fixed point.

mod inter_constprop;
mod inter_solver;

pub use inter_constprop::InterConstantPropagation;
pub use inter_solver::{InterDataflowAnalysis, InterWorkListSolver};

use rustc_hash::FxHashMap;

use crate::config::AnalysisOptions;
use crate::errors::{AnalysisError, Result};
use crate::features::dataflow::domain::fact::CpFact;
use crate::features::dataflow::domain::result::DataflowResult;
use crate::features::pointer_analysis::PointerAnalysisResult;
use crate::shared::graphs::Icfg;
use crate::shared::models::Program;

/// Run interprocedural constant propagation with the pointer-analysis
/// result named by `options.pta`
pub fn run(
    program: &Program,
    icfg: &Icfg,
    options: &AnalysisOptions,
    pta_results: &FxHashMap<String, PointerAnalysisResult>,
) -> Result<DataflowResult<CpFact>> {
    let id = options
        .pta
        .as_deref()
        .ok_or_else(|| AnalysisError::MissingResult("no pointer analysis configured (pta option)".into()))?;
    let pta = pta_results.get(id).ok_or_else(|| {
        AnalysisError::MissingResult(format!("pointer analysis result {id:?} not available"))
    })?;
    let mut analysis = InterConstantPropagation::new(program, pta, icfg);
    Ok(InterWorkListSolver::solve(icfg, &mut analysis))
}
