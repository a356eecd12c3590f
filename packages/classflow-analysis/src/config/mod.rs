//! Analysis options
//!
//! The narrow configuration surface the engine consumes: which pointer
//! analysis result interprocedural constant propagation reads, where the
//! taint rules live, and which context policy the CS solver runs under.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::AnalysisError;
use crate::features::pointer_analysis::{
    CallSiteSelector, ContextInsensitiveSelector, ContextSelector, ObjectSelector,
};

/// Context-sensitivity policy for the CS solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextPolicy {
    /// Everything in the empty context
    Insensitive,
    /// k most recent call sites
    CallSite(usize),
    /// k receiver allocation sites
    Object(usize),
}

impl ContextPolicy {
    /// Instantiate the selector this policy describes
    pub fn selector(&self) -> Box<dyn ContextSelector> {
        match self {
            ContextPolicy::Insensitive => Box::new(ContextInsensitiveSelector),
            ContextPolicy::CallSite(k) => Box::new(CallSiteSelector::new(*k)),
            ContextPolicy::Object(k) => Box::new(ObjectSelector::new(*k)),
        }
    }
}

impl FromStr for ContextPolicy {
    type Err = AnalysisError;

    /// Accepts `"ci"`, `"<k>-call"` and `"<k>-obj"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "ci" {
            return Ok(ContextPolicy::Insensitive);
        }
        let parse_k = |prefix: &str| -> Option<usize> {
            s.strip_suffix(prefix).and_then(|k| k.strip_suffix('-')).and_then(|k| k.parse().ok())
        };
        if let Some(k) = parse_k("call") {
            return Ok(ContextPolicy::CallSite(k));
        }
        if let Some(k) = parse_k("obj") {
            return Ok(ContextPolicy::Object(k));
        }
        Err(AnalysisError::config(format!(
            "unknown context policy {s:?} (expected \"ci\", \"<k>-call\" or \"<k>-obj\")"
        )))
    }
}

/// Options consumed by the analyses
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Identifier of the pointer-analysis result interprocedural constant
    /// propagation consumes
    pub pta: Option<String>,
    /// Path to the taint rule file (sources / sinks / transfers)
    pub taint_config: Option<PathBuf>,
    /// Context policy for the context-sensitive solver
    pub context: ContextPolicy,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self { pta: None, taint_config: None, context: ContextPolicy::Insensitive }
    }
}

impl AnalysisOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pta(mut self, id: impl Into<String>) -> Self {
        self.pta = Some(id.into());
        self
    }

    pub fn with_taint_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.taint_config = Some(path.into());
        self
    }

    pub fn with_context(mut self, policy: ContextPolicy) -> Self {
        self.context = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_policy_parsing() {
        assert_eq!("ci".parse::<ContextPolicy>().unwrap(), ContextPolicy::Insensitive);
        assert_eq!("1-call".parse::<ContextPolicy>().unwrap(), ContextPolicy::CallSite(1));
        assert_eq!("2-obj".parse::<ContextPolicy>().unwrap(), ContextPolicy::Object(2));
        assert!("3-type".parse::<ContextPolicy>().is_err());
        assert!("call".parse::<ContextPolicy>().is_err());
    }
}
