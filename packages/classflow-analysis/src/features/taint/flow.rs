//! A detected source → sink flow

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::models::StmtId;

/// Taint reaching a sink argument. Ordering (source site, sink site,
/// argument index) makes reported flow sets deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaintFlow {
    /// The source call site that introduced the taint
    pub source_call: StmtId,
    /// The sink call site that received it
    pub sink_call: StmtId,
    /// Which sink argument was tainted
    pub index: usize,
}

impl fmt::Display for TaintFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "taint flow: stmt#{} → stmt#{} (arg {})",
            self.source_call, self.sink_call, self.index
        )
    }
}
