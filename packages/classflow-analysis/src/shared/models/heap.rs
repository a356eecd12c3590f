//! Allocation-site heap abstraction
//!
//! Concrete heap addresses are collapsed to their allocation sites: every
//! `New` statement yields one canonical [`ObjId`], so points-to sets stay
//! finite. The model also owns the taint objects the taint layer
//! synthesizes, keyed by (source call site, type), so re-materializing
//! the same taint is idempotent and cannot loop.

use rustc_hash::FxHashMap;

use super::program::{ObjId, StmtId};
use super::types::Type;

/// What an abstract object stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjKind {
    /// A `New` allocation site
    Alloc { site: StmtId },
    /// A taint marker flowing from a source call site
    Taint { source: StmtId },
}

/// An abstract heap object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjData {
    pub kind: ObjKind,
    pub ty: Type,
}

/// Interns allocation sites and taint markers to canonical object ids
#[derive(Debug, Default)]
pub struct HeapModel {
    objs: Vec<ObjData>,
    site_index: FxHashMap<StmtId, ObjId>,
    taint_index: FxHashMap<(StmtId, Type), ObjId>,
}

impl HeapModel {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn obj(&self, id: ObjId) -> &ObjData {
        &self.objs[id as usize]
    }

    #[inline]
    pub fn obj_count(&self) -> usize {
        self.objs.len()
    }

    /// The canonical object for an allocation site
    pub fn obj_at(&mut self, site: StmtId, ty: Type) -> ObjId {
        if let Some(&id) = self.site_index.get(&site) {
            return id;
        }
        let id = self.objs.len() as ObjId;
        self.objs.push(ObjData { kind: ObjKind::Alloc { site }, ty });
        self.site_index.insert(site, id);
        id
    }

    /// The canonical taint object for (source call site, type).
    /// Same key, same object; this is what bounds taint synthesis.
    pub fn make_taint(&mut self, source: StmtId, ty: Type) -> ObjId {
        let key = (source, ty.clone());
        if let Some(&id) = self.taint_index.get(&key) {
            return id;
        }
        let id = self.objs.len() as ObjId;
        self.objs.push(ObjData { kind: ObjKind::Taint { source }, ty });
        self.taint_index.insert(key, id);
        id
    }

    #[inline]
    pub fn is_taint(&self, id: ObjId) -> bool {
        matches!(self.obj(id).kind, ObjKind::Taint { .. })
    }

    /// The source call site of a taint object
    #[inline]
    pub fn taint_source(&self, id: ObjId) -> Option<StmtId> {
        match self.obj(id).kind {
            ObjKind::Taint { source } => Some(source),
            ObjKind::Alloc { .. } => None,
        }
    }
}
