//! Interprocedural control-flow graph
//!
//! The ICFG stitches the per-method CFGs of every reachable method
//! together through the call graph. A call-site node keeps one
//! call-to-return edge per intraprocedural successor, plus one call edge
//! per resolved callee; return edges run from the callee's exit back to
//! the return site and carry the callee's return variables.

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::errors::Result;
use crate::shared::models::{MethodId, Program, StmtId, VarId};

use super::cfg::Cfg;

/// The narrow call-graph interface ICFG construction consumes; both the
/// CHA-built and the PTA-built call graphs implement it.
pub trait CallGraphView {
    fn reachable_methods(&self) -> &[MethodId];
    fn callees_of(&self, call_site: StmtId) -> &[MethodId];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IcfgEdgeKind {
    /// Intraprocedural edge not touching a call site
    Normal,
    /// Call site → callee entry
    Call { callee: MethodId },
    /// Call site → its return site, skipping the callee
    CallToReturn,
    /// Callee exit → return site
    Return { call_site: StmtId, callee: MethodId, return_vars: Vec<VarId> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcfgEdge {
    pub source: StmtId,
    pub target: StmtId,
    pub kind: IcfgEdgeKind,
}

/// Whole-program control-flow graph over statement nodes
#[derive(Debug, Default)]
pub struct Icfg {
    nodes: Vec<StmtId>,
    node_set: FxHashSet<StmtId>,
    out_edges: FxHashMap<StmtId, Vec<IcfgEdge>>,
    in_edges: FxHashMap<StmtId, Vec<IcfgEdge>>,
    /// Entry nodes of the program's entry methods (dataflow boundaries)
    entry_nodes: Vec<StmtId>,
}

impl Icfg {
    pub fn nodes(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn contains(&self, node: StmtId) -> bool {
        self.node_set.contains(&node)
    }

    pub fn entry_nodes(&self) -> &[StmtId] {
        &self.entry_nodes
    }

    pub fn out_edges_of(&self, node: StmtId) -> &[IcfgEdge] {
        self.out_edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_edges_of(&self, node: StmtId) -> &[IcfgEdge] {
        self.in_edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn succs_of(&self, node: StmtId) -> impl Iterator<Item = StmtId> + '_ {
        self.out_edges_of(node).iter().map(|e| e.target)
    }

    fn add_node(&mut self, node: StmtId) {
        if self.node_set.insert(node) {
            self.nodes.push(node);
        }
    }

    fn add_edge(&mut self, edge: IcfgEdge) {
        self.out_edges.entry(edge.source).or_default().push(edge.clone());
        self.in_edges.entry(edge.target).or_default().push(edge);
    }
}

/// Builds an [`Icfg`] from per-method CFGs plus a call graph
pub struct IcfgBuilder;

impl IcfgBuilder {
    pub fn build(program: &Program, call_graph: &dyn CallGraphView) -> Result<Icfg> {
        let mut icfg = Icfg::default();

        let reachable: Vec<MethodId> = call_graph
            .reachable_methods()
            .iter()
            .copied()
            .filter(|&m| program.method(m).body.is_some())
            .collect();

        let mut cfgs = FxHashMap::default();
        for &m in &reachable {
            cfgs.insert(m, Cfg::build(program, m)?);
        }

        for &m in &reachable {
            let cfg = &cfgs[&m];
            for node in cfg.nodes() {
                icfg.add_node(node);
            }
            for node in cfg.nodes() {
                let is_call = program.is_call(node);
                for edge in cfg.out_edges_of(node) {
                    let kind = if is_call {
                        IcfgEdgeKind::CallToReturn
                    } else {
                        IcfgEdgeKind::Normal
                    };
                    icfg.add_edge(IcfgEdge { source: node, target: edge.target, kind });
                }
                if !is_call {
                    continue;
                }
                for &callee in call_graph.callees_of(node) {
                    let Some(body) = program.method(callee).body.as_ref() else {
                        continue;
                    };
                    icfg.add_edge(IcfgEdge {
                        source: node,
                        target: body.entry,
                        kind: IcfgEdgeKind::Call { callee },
                    });
                    for ret_site in cfg.succs_of(node) {
                        icfg.add_edge(IcfgEdge {
                            source: body.exit,
                            target: ret_site,
                            kind: IcfgEdgeKind::Return {
                                call_site: node,
                                callee,
                                return_vars: body.return_vars.clone(),
                            },
                        });
                    }
                }
            }
        }

        if let Some(entry) = program.entry_method() {
            if let Some(body) = program.method(entry).body.as_ref() {
                icfg.entry_nodes.push(body.entry);
            }
        }

        debug!(
            nodes = icfg.node_count(),
            methods = reachable.len(),
            "ICFG constructed"
        );
        Ok(icfg)
    }
}
