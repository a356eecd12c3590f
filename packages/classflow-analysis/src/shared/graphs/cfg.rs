//! Per-method control-flow graph
//!
//! Nodes are statement ids; the synthetic `Entry`/`Exit` statements of the
//! method body are the unique entry and exit. Edges carry the kind the
//! dead-code detector prunes on (if-true/if-false, switch cases).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};
use crate::shared::models::{MethodId, Program, StmtId, StmtKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CfgEdgeKind {
    /// Sequential execution
    FallThrough,
    Goto,
    /// Taken branch of an `if`
    IfTrue,
    /// Fall-through branch of an `if`
    IfFalse,
    /// A `switch` case edge with its matched constant
    SwitchCase(i32),
    SwitchDefault,
    /// `return` to the exit node
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub source: StmtId,
    pub target: StmtId,
    pub kind: CfgEdgeKind,
}

/// Control-flow graph of one method body
#[derive(Debug, Clone)]
pub struct Cfg {
    method: MethodId,
    entry: StmtId,
    exit: StmtId,
    nodes: Vec<StmtId>,
    out_edges: FxHashMap<StmtId, Vec<CfgEdge>>,
    in_edges: FxHashMap<StmtId, Vec<CfgEdge>>,
}

impl Cfg {
    /// Build the CFG of `method` from its statement list and branch targets
    pub fn build(program: &Program, method: MethodId) -> Result<Cfg> {
        let body = program.method(method).body.as_ref().ok_or_else(|| {
            AnalysisError::malformed(format!(
                "cannot build CFG: method {} has no body",
                program.method(method).name
            ))
        })?;

        let mut cfg = Cfg {
            method,
            entry: body.entry,
            exit: body.exit,
            nodes: body.stmts.clone(),
            out_edges: FxHashMap::default(),
            in_edges: FxHashMap::default(),
        };

        for (i, &s) in body.stmts.iter().enumerate() {
            let next = body.stmts.get(i + 1).copied();
            match &program.stmt(s).kind {
                StmtKind::Exit => {}
                StmtKind::Return { .. } => {
                    cfg.add_edge(s, body.exit, CfgEdgeKind::Return);
                }
                StmtKind::Goto { target } => {
                    cfg.add_edge(s, *target, CfgEdgeKind::Goto);
                }
                StmtKind::If { target, .. } => {
                    cfg.add_edge(s, *target, CfgEdgeKind::IfTrue);
                    if let Some(n) = next {
                        cfg.add_edge(s, n, CfgEdgeKind::IfFalse);
                    }
                }
                StmtKind::Switch { cases, default, .. } => {
                    for &(value, target) in cases {
                        cfg.add_edge(s, target, CfgEdgeKind::SwitchCase(value));
                    }
                    cfg.add_edge(s, *default, CfgEdgeKind::SwitchDefault);
                }
                _ => {
                    if let Some(n) = next {
                        cfg.add_edge(s, n, CfgEdgeKind::FallThrough);
                    }
                }
            }
        }
        Ok(cfg)
    }

    fn add_edge(&mut self, source: StmtId, target: StmtId, kind: CfgEdgeKind) {
        let edge = CfgEdge { source, target, kind };
        self.out_edges.entry(source).or_default().push(edge);
        self.in_edges.entry(target).or_default().push(edge);
    }

    #[inline]
    pub fn method(&self) -> MethodId {
        self.method
    }

    #[inline]
    pub fn entry(&self) -> StmtId {
        self.entry
    }

    #[inline]
    pub fn exit(&self) -> StmtId {
        self.exit
    }

    pub fn nodes(&self) -> impl Iterator<Item = StmtId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn out_edges_of(&self, node: StmtId) -> &[CfgEdge] {
        self.out_edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn in_edges_of(&self, node: StmtId) -> &[CfgEdge] {
        self.in_edges.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn succs_of(&self, node: StmtId) -> impl Iterator<Item = StmtId> + '_ {
        self.out_edges_of(node).iter().map(|e| e.target)
    }

    pub fn preds_of(&self, node: StmtId) -> impl Iterator<Item = StmtId> + '_ {
        self.in_edges_of(node).iter().map(|e| e.source)
    }
}
