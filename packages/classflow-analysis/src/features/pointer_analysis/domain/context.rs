//! Contexts and context-sensitive elements
//!
//! A context is an interned sequence of call sites or allocation sites;
//! id 0 is always the distinguished empty context, where synthesized
//! heap objects (taint markers included) live unless a selector says
//! otherwise. [`CsManager`] interns the context-qualified objects,
//! methods and call sites the CS solver and call graph work with.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::shared::models::{MethodId, ObjId, StmtId};

pub type CtxId = u32;
pub type CsObjId = u32;
pub type CsMethodId = u32;
pub type CsCallSiteId = u32;

/// One element of a context string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextElem {
    CallSite(StmtId),
    HeapObj(ObjId),
}

/// Interns context strings to dense [`CtxId`]s
#[derive(Debug)]
pub struct ContextManager {
    contexts: Vec<Vec<ContextElem>>,
    index: FxHashMap<Vec<ContextElem>, CtxId>,
}

impl ContextManager {
    /// The distinguished empty context
    pub const EMPTY: CtxId = 0;

    pub fn new() -> Self {
        let mut mgr =
            Self { contexts: Vec::new(), index: FxHashMap::default() };
        mgr.intern(Vec::new());
        mgr
    }

    pub fn intern(&mut self, elems: Vec<ContextElem>) -> CtxId {
        if let Some(&id) = self.index.get(&elems) {
            return id;
        }
        let id = self.contexts.len() as CtxId;
        self.contexts.push(elems.clone());
        self.index.insert(elems, id);
        id
    }

    #[inline]
    pub fn elements(&self, ctx: CtxId) -> &[ContextElem] {
        &self.contexts[ctx as usize]
    }

    /// Append an element with k-limiting: only the most recent `k`
    /// elements are kept. `k == 0` collapses to the empty context.
    pub fn append(&mut self, ctx: CtxId, elem: ContextElem, k: usize) -> CtxId {
        if k == 0 {
            return Self::EMPTY;
        }
        let mut elems = self.elements(ctx).to_vec();
        elems.push(elem);
        if elems.len() > k {
            elems.drain(..elems.len() - k);
        }
        self.intern(elems)
    }

    /// Truncate to the most recent `k` elements
    pub fn limit(&mut self, ctx: CtxId, k: usize) -> CtxId {
        let elems = self.elements(ctx);
        if elems.len() <= k {
            return ctx;
        }
        let trimmed = elems[elems.len() - k..].to_vec();
        self.intern(trimmed)
    }

    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Interns context-qualified objects, methods and call sites
#[derive(Debug, Default)]
pub struct CsManager {
    cs_objs: Vec<(CtxId, ObjId)>,
    obj_index: FxHashMap<(CtxId, ObjId), CsObjId>,
    cs_methods: Vec<(CtxId, MethodId)>,
    method_index: FxHashMap<(CtxId, MethodId), CsMethodId>,
    cs_call_sites: Vec<(CtxId, StmtId)>,
    call_site_index: FxHashMap<(CtxId, StmtId), CsCallSiteId>,
}

impl CsManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cs_obj(&mut self, heap_ctx: CtxId, obj: ObjId) -> CsObjId {
        if let Some(&id) = self.obj_index.get(&(heap_ctx, obj)) {
            return id;
        }
        let id = self.cs_objs.len() as CsObjId;
        self.cs_objs.push((heap_ctx, obj));
        self.obj_index.insert((heap_ctx, obj), id);
        id
    }

    /// (heap context, object) behind a [`CsObjId`]
    #[inline]
    pub fn obj_of(&self, cs_obj: CsObjId) -> (CtxId, ObjId) {
        self.cs_objs[cs_obj as usize]
    }

    pub fn cs_method(&mut self, ctx: CtxId, method: MethodId) -> CsMethodId {
        if let Some(&id) = self.method_index.get(&(ctx, method)) {
            return id;
        }
        let id = self.cs_methods.len() as CsMethodId;
        self.cs_methods.push((ctx, method));
        self.method_index.insert((ctx, method), id);
        id
    }

    #[inline]
    pub fn method_of(&self, cs_method: CsMethodId) -> (CtxId, MethodId) {
        self.cs_methods[cs_method as usize]
    }

    pub fn cs_method_count(&self) -> usize {
        self.cs_methods.len()
    }

    pub fn cs_call_site(&mut self, ctx: CtxId, call_site: StmtId) -> CsCallSiteId {
        if let Some(&id) = self.call_site_index.get(&(ctx, call_site)) {
            return id;
        }
        let id = self.cs_call_sites.len() as CsCallSiteId;
        self.cs_call_sites.push((ctx, call_site));
        self.call_site_index.insert((ctx, call_site), id);
        id
    }

    #[inline]
    pub fn call_site_of(&self, cs_call_site: CsCallSiteId) -> (CtxId, StmtId) {
        self.cs_call_sites[cs_call_site as usize]
    }

    /// Look up an already-interned call site without creating it
    pub fn lookup_call_site(&self, ctx: CtxId, call_site: StmtId) -> Option<CsCallSiteId> {
        self.call_site_index.get(&(ctx, call_site)).copied()
    }
}
