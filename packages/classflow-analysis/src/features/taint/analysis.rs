//! Taint processing hooks
//!
//! Rides on the context-sensitive solver at three points: source
//! synthesis when a call edge appears, transfer rules at call sites (both
//! when the edge is added and again when base/argument variables later
//! receive taint), and sink collection once the points-to fixed point is
//! reached. All synthesized objects live in the empty heap context.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

use crate::shared::models::{HeapModel, MethodId, ObjId, Program, StmtId, VarId};

use super::super::pointer_analysis::domain::context::{CsManager, CtxId};
use super::super::pointer_analysis::domain::cs_call_graph::CsCallGraph;
use super::super::pointer_analysis::domain::pfg::PointerFlowGraph;
use super::super::pointer_analysis::domain::pointer::CsPointer;
use super::config::{TaintConfig, TransferIndex};
use super::flow::TaintFlow;

/// A taint object to be enqueued at a context-qualified variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaintSeed {
    pub ctx: CtxId,
    pub var: VarId,
    /// Taint object; lives in the empty heap context
    pub obj: ObjId,
}

/// Source/sink/transfer processing over configured rules
#[derive(Debug)]
pub struct TaintAnalysis {
    config: TaintConfig,
}

impl TaintAnalysis {
    pub fn new(config: TaintConfig) -> Self {
        Self { config }
    }

    /// Source hook: a call edge to `callee` was added at `call_site`
    /// running in `caller_ctx`. If the callee matches a source rule, the
    /// call's result variable receives a fresh taint object.
    pub fn process_source(
        &self,
        program: &Program,
        heap: &mut HeapModel,
        call_site: StmtId,
        caller_ctx: CtxId,
        callee: MethodId,
    ) -> Option<TaintSeed> {
        let invoke = program.invoke(call_site)?;
        let result = invoke.result?;
        let return_type = program.return_type_of(callee);
        if !self.config.is_source(callee, return_type) {
            return None;
        }
        let obj = heap.make_taint(call_site, return_type.clone());
        debug!(call_site, callee, "taint source fired");
        Some(TaintSeed { ctx: caller_ctx, var: result, obj })
    }

    /// Transfer hook: apply every matching rule of `callee` at this call
    /// site, re-materializing the taint of the `from` slot onto the `to`
    /// slot with the rule's type. Reads the current points-to sets, so the
    /// solver re-invokes it when those grow.
    pub fn process_transfers(
        &self,
        program: &Program,
        heap: &mut HeapModel,
        csm: &CsManager,
        pfg: &PointerFlowGraph<CsPointer>,
        caller_ctx: CtxId,
        call_site: StmtId,
        callee: MethodId,
    ) -> Vec<TaintSeed> {
        let Some(invoke) = program.invoke(call_site) else {
            return Vec::new();
        };
        let mut seeds = Vec::new();
        let return_type = program.return_type_of(callee).clone();

        // base → result
        if let (Some(base), Some(result)) = (invoke.base, invoke.result) {
            if self.config.has_transfer(callee, TransferIndex::Base, TransferIndex::Result, &return_type)
            {
                for source in taint_sources_of(heap, csm, pfg, caller_ctx, base) {
                    let obj = heap.make_taint(source, return_type.clone());
                    seeds.push(TaintSeed { ctx: caller_ctx, var: result, obj });
                }
            }
        }

        // arg i → base
        if let Some(base) = invoke.base {
            let base_type = program.var(base).ty.clone();
            for (i, &arg) in invoke.args.iter().enumerate() {
                if self.config.has_transfer(callee, TransferIndex::Arg(i), TransferIndex::Base, &base_type)
                {
                    for source in taint_sources_of(heap, csm, pfg, caller_ctx, arg) {
                        let obj = heap.make_taint(source, base_type.clone());
                        seeds.push(TaintSeed { ctx: caller_ctx, var: base, obj });
                    }
                }
            }
        }

        // arg i → result
        if let Some(result) = invoke.result {
            for (i, &arg) in invoke.args.iter().enumerate() {
                if self.config.has_transfer(callee, TransferIndex::Arg(i), TransferIndex::Result, &return_type)
                {
                    for source in taint_sources_of(heap, csm, pfg, caller_ctx, arg) {
                        let obj = heap.make_taint(source, return_type.clone());
                        seeds.push(TaintSeed { ctx: caller_ctx, var: result, obj });
                    }
                }
            }
        }

        seeds
    }

    /// Sink collection over the finished call graph: every tainted object
    /// reaching a configured sink argument becomes one flow.
    pub fn collect_flows(
        &self,
        program: &Program,
        heap: &HeapModel,
        csm: &CsManager,
        call_graph: &CsCallGraph,
        pfg: &PointerFlowGraph<CsPointer>,
    ) -> BTreeSet<TaintFlow> {
        // context-insensitive projection of the variable points-to sets
        let mut var_pts: FxHashMap<VarId, BTreeSet<ObjId>> = FxHashMap::default();
        for (p, key) in pfg.pointers() {
            if let CsPointer::Var(_, v) = *key {
                let objs = var_pts.entry(v).or_default();
                for cs_obj in pfg.pt(p).iter() {
                    objs.insert(csm.obj_of(cs_obj).1);
                }
            }
        }

        let mut flows = BTreeSet::new();
        for &cs_method in call_graph.reachable_methods() {
            let (_, callee) = csm.method_of(cs_method);
            let param_count = program.subsig(program.method(callee).subsig).param_types.len();
            for &cs_site in call_graph.callers_of(cs_method) {
                let (_, call_site) = csm.call_site_of(cs_site);
                let Some(invoke) = program.invoke(call_site) else {
                    continue;
                };
                for i in 0..param_count.min(invoke.args.len()) {
                    if !self.config.is_sink(callee, i) {
                        continue;
                    }
                    let Some(objs) = var_pts.get(&invoke.args[i]) else {
                        continue;
                    };
                    for &obj in objs {
                        if let Some(source_call) = heap.taint_source(obj) {
                            flows.insert(TaintFlow { source_call, sink_call: call_site, index: i });
                        }
                    }
                }
            }
        }

        debug!(flows = flows.len(), "taint flows collected");
        flows
    }
}

/// Source call sites of the taint objects currently in
/// `pt((ctx, var))`
fn taint_sources_of(
    heap: &HeapModel,
    csm: &CsManager,
    pfg: &PointerFlowGraph<CsPointer>,
    ctx: CtxId,
    var: VarId,
) -> Vec<StmtId> {
    let Some(p) = pfg.lookup(&CsPointer::Var(ctx, var)) else {
        return Vec::new();
    };
    pfg.pt(p)
        .iter()
        .filter_map(|cs_obj| heap.taint_source(csm.obj_of(cs_obj).1))
        .collect()
}
