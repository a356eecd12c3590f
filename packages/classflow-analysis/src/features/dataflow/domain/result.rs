//! Dataflow result: the in/out fact at every program point

use rustc_hash::FxHashMap;

use crate::shared::models::StmtId;

/// In/out facts per statement, produced by the fixed-point solvers
#[derive(Debug, Clone, Default)]
pub struct DataflowResult<F> {
    in_facts: FxHashMap<StmtId, F>,
    out_facts: FxHashMap<StmtId, F>,
}

impl<F> DataflowResult<F> {
    pub fn new() -> Self {
        Self { in_facts: FxHashMap::default(), out_facts: FxHashMap::default() }
    }

    #[inline]
    pub fn in_fact(&self, node: StmtId) -> &F {
        &self.in_facts[&node]
    }

    #[inline]
    pub fn out_fact(&self, node: StmtId) -> &F {
        &self.out_facts[&node]
    }

    pub fn get_in_fact(&self, node: StmtId) -> Option<&F> {
        self.in_facts.get(&node)
    }

    pub fn get_out_fact(&self, node: StmtId) -> Option<&F> {
        self.out_facts.get(&node)
    }

    pub fn set_in_fact(&mut self, node: StmtId, fact: F) {
        self.in_facts.insert(node, fact);
    }

    pub fn set_out_fact(&mut self, node: StmtId, fact: F) {
        self.out_facts.insert(node, fact);
    }

    pub(crate) fn in_fact_mut(&mut self, node: StmtId) -> &mut F {
        self.in_facts.get_mut(&node).expect("in-fact initialized by solver")
    }

    pub(crate) fn out_fact_mut(&mut self, node: StmtId) -> &mut F {
        self.out_facts.get_mut(&node).expect("out-fact initialized by solver")
    }
}
