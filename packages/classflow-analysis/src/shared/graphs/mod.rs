//! Control-flow graph types
//!
//! Per-method CFGs and the whole-program ICFG live here rather than in a
//! feature module because every analysis consumes them.

mod cfg;
mod icfg;

pub use cfg::{Cfg, CfgEdge, CfgEdgeKind};
pub use icfg::{CallGraphView, Icfg, IcfgBuilder, IcfgEdge, IcfgEdgeKind};
