//! Context selectors
//!
//! A selector decides which context a callee runs in and which heap
//! context an allocation gets. Three classic policies:
//! - [`ContextInsensitiveSelector`]: everything in the empty context
//!   (the CS solver degenerates to the CI analysis).
//! - [`CallSiteSelector`]: k-call-site sensitivity (k-CFA): the callee's
//!   context is the last k call sites; heap contexts keep k−1 elements.
//! - [`ObjectSelector`]: k-object sensitivity: instance callees run in
//!   the receiver object's context, static callees inherit the caller's.
//!
//! References:
//! - Shivers, "Control-Flow Analysis of Higher-Order Languages" (1991)
//! - Milanova et al., "Parameterized Object Sensitivity" (TOSEM 2005)

use crate::shared::models::{MethodId, ObjId, StmtId};

use super::super::domain::context::{ContextElem, ContextManager, CtxId};

/// Picks contexts for callees and heap objects
pub trait ContextSelector {
    /// The distinguished empty context
    fn empty_context(&self) -> CtxId {
        ContextManager::EMPTY
    }

    /// Context for a static-call callee
    fn select_context(
        &self,
        ctxs: &mut ContextManager,
        caller_ctx: CtxId,
        call_site: StmtId,
        callee: MethodId,
    ) -> CtxId;

    /// Context for an instance-call callee, given the receiver object
    fn select_instance_context(
        &self,
        ctxs: &mut ContextManager,
        caller_ctx: CtxId,
        call_site: StmtId,
        recv_heap_ctx: CtxId,
        recv_obj: ObjId,
        callee: MethodId,
    ) -> CtxId;

    /// Heap context for an object allocated by a method running in
    /// `method_ctx`
    fn select_heap_context(
        &self,
        ctxs: &mut ContextManager,
        method_ctx: CtxId,
        method: MethodId,
        obj: ObjId,
    ) -> CtxId;
}

/// Everything lives in the empty context
#[derive(Debug, Default)]
pub struct ContextInsensitiveSelector;

impl ContextSelector for ContextInsensitiveSelector {
    fn select_context(
        &self,
        _ctxs: &mut ContextManager,
        _caller_ctx: CtxId,
        _call_site: StmtId,
        _callee: MethodId,
    ) -> CtxId {
        ContextManager::EMPTY
    }

    fn select_instance_context(
        &self,
        _ctxs: &mut ContextManager,
        _caller_ctx: CtxId,
        _call_site: StmtId,
        _recv_heap_ctx: CtxId,
        _recv_obj: ObjId,
        _callee: MethodId,
    ) -> CtxId {
        ContextManager::EMPTY
    }

    fn select_heap_context(
        &self,
        _ctxs: &mut ContextManager,
        _method_ctx: CtxId,
        _method: MethodId,
        _obj: ObjId,
    ) -> CtxId {
        ContextManager::EMPTY
    }
}

/// k-call-site sensitivity with (k−1)-limited heap contexts
#[derive(Debug)]
pub struct CallSiteSelector {
    k: usize,
}

impl CallSiteSelector {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl ContextSelector for CallSiteSelector {
    fn select_context(
        &self,
        ctxs: &mut ContextManager,
        caller_ctx: CtxId,
        call_site: StmtId,
        _callee: MethodId,
    ) -> CtxId {
        ctxs.append(caller_ctx, ContextElem::CallSite(call_site), self.k)
    }

    fn select_instance_context(
        &self,
        ctxs: &mut ContextManager,
        caller_ctx: CtxId,
        call_site: StmtId,
        _recv_heap_ctx: CtxId,
        _recv_obj: ObjId,
        _callee: MethodId,
    ) -> CtxId {
        ctxs.append(caller_ctx, ContextElem::CallSite(call_site), self.k)
    }

    fn select_heap_context(
        &self,
        ctxs: &mut ContextManager,
        method_ctx: CtxId,
        _method: MethodId,
        _obj: ObjId,
    ) -> CtxId {
        ctxs.limit(method_ctx, self.k.saturating_sub(1))
    }
}

/// k-object sensitivity with (k−1)-limited heap contexts
#[derive(Debug)]
pub struct ObjectSelector {
    k: usize,
}

impl ObjectSelector {
    pub fn new(k: usize) -> Self {
        Self { k }
    }
}

impl ContextSelector for ObjectSelector {
    // static calls inherit the caller's context
    fn select_context(
        &self,
        _ctxs: &mut ContextManager,
        caller_ctx: CtxId,
        _call_site: StmtId,
        _callee: MethodId,
    ) -> CtxId {
        caller_ctx
    }

    fn select_instance_context(
        &self,
        ctxs: &mut ContextManager,
        _caller_ctx: CtxId,
        _call_site: StmtId,
        recv_heap_ctx: CtxId,
        recv_obj: ObjId,
        _callee: MethodId,
    ) -> CtxId {
        ctxs.append(recv_heap_ctx, ContextElem::HeapObj(recv_obj), self.k)
    }

    fn select_heap_context(
        &self,
        ctxs: &mut ContextManager,
        method_ctx: CtxId,
        _method: MethodId,
        _obj: ObjId,
    ) -> CtxId {
        ctxs.limit(method_ctx, self.k.saturating_sub(1))
    }
}
