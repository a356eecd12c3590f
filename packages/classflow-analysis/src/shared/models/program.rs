//! Whole-program IR arenas and the construction API
//!
//! [`Program`] owns every class, field, method, variable and statement as
//! an index-addressed arena entry. All cross-references are `u32` handles,
//! which keeps graph state (points-to sets, PFG successor lists, fact maps)
//! free of ownership cycles and makes structural keys hashable by identity.
//!
//! [`ProgramBuilder`] is the narrow construction interface: tests and
//! embedders assemble programs through it, and `finish()` is where the
//! fatal structural checks live (cyclic superclass chains, missing bodies).

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{AnalysisError, Result};

use super::stmt::{BinaryOp, CallKind, Exp, FieldAccess, Invoke, Label, MethodRef, StmtKind};
use super::types::Type;

pub type ClassId = u32;
pub type FieldId = u32;
pub type MethodId = u32;
pub type VarId = u32;
pub type StmtId = u32;
pub type SubsigId = u32;
pub type ObjId = u32;

/// A class or interface declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassData {
    pub name: String,
    pub superclass: Option<ClassId>,
    /// Directly implemented (class) or extended (interface) interfaces
    pub interfaces: Vec<ClassId>,
    pub is_interface: bool,
    pub methods: Vec<MethodId>,
    /// Direct subclasses; filled by the builder
    pub subclasses: Vec<ClassId>,
    /// Direct subinterfaces; filled by the builder
    pub subinterfaces: Vec<ClassId>,
    /// Direct implementing classes; filled by the builder
    pub implementors: Vec<ClassId>,
}

/// A field declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldData {
    pub class: ClassId,
    pub name: String,
    pub ty: Type,
    pub is_static: bool,
}

/// Interned method subsignature: name + parameter types + return type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Subsignature {
    pub name: String,
    pub param_types: Vec<Type>,
    pub return_type: Type,
}

/// A method declaration, possibly with a body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodData {
    pub class: ClassId,
    pub name: String,
    pub subsig: SubsigId,
    pub is_static: bool,
    pub is_abstract: bool,
    pub body: Option<MethodBody>,
}

/// The IR of a concrete method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodBody {
    pub params: Vec<VarId>,
    pub this_var: Option<VarId>,
    /// Variables returned by the method's `Return` statements
    pub return_vars: Vec<VarId>,
    /// All statements in order, bracketed by `Entry` and `Exit`
    pub stmts: Vec<StmtId>,
    pub entry: StmtId,
    pub exit: StmtId,
}

/// A local variable, with the precomputed statement lists the pointer
/// analyses walk when the variable's points-to set grows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarData {
    pub name: String,
    pub ty: Type,
    pub method: MethodId,
    /// `x = v.f` statements with `v` as base
    pub load_fields: Vec<StmtId>,
    /// `v.f = y` statements with `v` as base
    pub store_fields: Vec<StmtId>,
    /// `x = v[i]` statements with `v` as base
    pub load_arrays: Vec<StmtId>,
    /// `v[i] = y` statements with `v` as base
    pub store_arrays: Vec<StmtId>,
    /// Call sites with `v` as receiver
    pub invokes: Vec<StmtId>,
    /// Call sites with `v` among the arguments
    pub arg_invokes: Vec<StmtId>,
}

/// A statement: kind plus its position in the owning method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StmtData {
    pub method: MethodId,
    /// Index within the method body (entry = 0)
    pub index: u32,
    pub kind: StmtKind,
}

/// The whole-program IR
#[derive(Debug, Clone, Default)]
pub struct Program {
    classes: Vec<ClassData>,
    fields: Vec<FieldData>,
    methods: Vec<MethodData>,
    vars: Vec<VarData>,
    stmts: Vec<StmtData>,
    subsigs: Vec<Subsignature>,
    entry_method: Option<MethodId>,
}

impl Program {
    #[inline]
    pub fn class(&self, id: ClassId) -> &ClassData {
        &self.classes[id as usize]
    }

    #[inline]
    pub fn field(&self, id: FieldId) -> &FieldData {
        &self.fields[id as usize]
    }

    #[inline]
    pub fn method(&self, id: MethodId) -> &MethodData {
        &self.methods[id as usize]
    }

    #[inline]
    pub fn var(&self, id: VarId) -> &VarData {
        &self.vars[id as usize]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &StmtData {
        &self.stmts[id as usize]
    }

    #[inline]
    pub fn subsig(&self, id: SubsigId) -> &Subsignature {
        &self.subsigs[id as usize]
    }

    #[inline]
    pub fn entry_method(&self) -> Option<MethodId> {
        self.entry_method
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodId> + '_ {
        0..self.methods.len() as MethodId
    }

    pub fn vars(&self) -> impl Iterator<Item = VarId> + '_ {
        0..self.vars.len() as VarId
    }

    /// The return type of a method, via its subsignature
    #[inline]
    pub fn return_type_of(&self, m: MethodId) -> &Type {
        &self.subsig(self.method(m).subsig).return_type
    }

    /// Whether the variable's type is tracked by constant propagation
    #[inline]
    pub fn can_hold_int(&self, v: VarId) -> bool {
        self.var(v).ty.can_hold_int()
    }

    /// Look up a class by its declared name (configuration resolution)
    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        self.classes.iter().position(|c| c.name == name).map(|i| i as ClassId)
    }

    /// Look up a method declared on `class` by plain name
    pub fn method_by_name(&self, class: ClassId, name: &str) -> Option<MethodId> {
        self.class(class).methods.iter().copied().find(|&m| self.method(m).name == name)
    }

    // ─── class hierarchy queries ────────────────────────────────────────

    /// The method declared directly on `class` with the given subsignature
    pub fn declared_method(&self, class: ClassId, subsig: SubsigId) -> Option<MethodId> {
        self.class(class)
            .methods
            .iter()
            .copied()
            .find(|&m| self.method(m).subsig == subsig)
    }

    #[inline]
    pub fn superclass(&self, class: ClassId) -> Option<ClassId> {
        self.class(class).superclass
    }

    #[inline]
    pub fn direct_subclasses(&self, class: ClassId) -> &[ClassId] {
        &self.class(class).subclasses
    }

    #[inline]
    pub fn direct_subinterfaces(&self, class: ClassId) -> &[ClassId] {
        &self.class(class).subinterfaces
    }

    #[inline]
    pub fn direct_implementors(&self, class: ClassId) -> &[ClassId] {
        &self.class(class).implementors
    }

    // ─── statement views ────────────────────────────────────────────────

    /// Definition view: left-hand variable and right-hand expression.
    ///
    /// Includes invocations with a result slot; store statements define a
    /// heap slot, not a variable, so they yield `None`.
    pub fn def(&self, s: StmtId) -> Option<(VarId, Exp)> {
        match &self.stmt(s).kind {
            StmtKind::New { lhs, ty } => Some((*lhs, Exp::New(ty.clone()))),
            StmtKind::Copy { lhs, rhs } => Some((*lhs, Exp::Var(*rhs))),
            StmtKind::AssignLiteral { lhs, value } => Some((*lhs, Exp::IntLiteral(*value))),
            StmtKind::Binary { lhs, op, op1, op2 } => {
                Some((*lhs, Exp::Binary { op: *op, op1: *op1, op2: *op2 }))
            }
            StmtKind::Cast { lhs, ty, rhs } => {
                Some((*lhs, Exp::Cast { ty: ty.clone(), rhs: *rhs }))
            }
            StmtKind::LoadField { lhs, access } => Some((*lhs, Exp::Field(*access))),
            StmtKind::LoadArray { lhs, base, index } => {
                Some((*lhs, Exp::Array { base: *base, index: *index }))
            }
            StmtKind::Invoke(inv) => inv.result.map(|r| (r, Exp::InvokeResult)),
            _ => None,
        }
    }

    /// Like [`Program::def`] but restricted to plain assignments;
    /// invocations are excluded (dead-code detection never removes calls).
    pub fn assign_def(&self, s: StmtId) -> Option<(VarId, Exp)> {
        match self.stmt(s).kind {
            StmtKind::Invoke(_) => None,
            _ => self.def(s),
        }
    }

    /// The variable defined by this statement, if any
    pub fn def_var(&self, s: StmtId) -> Option<VarId> {
        match &self.stmt(s).kind {
            StmtKind::New { lhs, .. }
            | StmtKind::Copy { lhs, .. }
            | StmtKind::AssignLiteral { lhs, .. }
            | StmtKind::Binary { lhs, .. }
            | StmtKind::Cast { lhs, .. }
            | StmtKind::LoadField { lhs, .. }
            | StmtKind::LoadArray { lhs, .. } => Some(*lhs),
            StmtKind::Invoke(inv) => inv.result,
            _ => None,
        }
    }

    /// Variables read by this statement
    pub fn uses(&self, s: StmtId) -> Vec<VarId> {
        match &self.stmt(s).kind {
            StmtKind::Copy { rhs, .. } | StmtKind::Cast { rhs, .. } => vec![*rhs],
            StmtKind::Binary { op1, op2, .. } | StmtKind::If { op1, op2, .. } => {
                vec![*op1, *op2]
            }
            StmtKind::LoadField { access, .. } => access.base().into_iter().collect(),
            StmtKind::StoreField { access, rhs } => {
                let mut u = vec![*rhs];
                u.extend(access.base());
                u
            }
            StmtKind::LoadArray { base, index, .. } => vec![*base, *index],
            StmtKind::StoreArray { base, index, rhs } => vec![*base, *index, *rhs],
            StmtKind::Invoke(inv) => {
                let mut u: Vec<VarId> = inv.base.into_iter().collect();
                u.extend(&inv.args);
                u
            }
            StmtKind::Switch { var, .. } => vec![*var],
            StmtKind::Return { var } => var.into_iter().copied().collect(),
            _ => Vec::new(),
        }
    }

    /// The invoke payload of a call statement
    #[inline]
    pub fn invoke(&self, s: StmtId) -> Option<&Invoke> {
        match &self.stmt(s).kind {
            StmtKind::Invoke(inv) => Some(inv),
            _ => None,
        }
    }

    #[inline]
    pub fn is_call(&self, s: StmtId) -> bool {
        matches!(self.stmt(s).kind, StmtKind::Invoke(_))
    }

    /// All call sites inside a method body
    pub fn call_sites_in(&self, m: MethodId) -> impl Iterator<Item = StmtId> + '_ {
        self.method(m)
            .body
            .iter()
            .flat_map(|b| b.stmts.iter().copied())
            .filter(|&s| self.is_call(s))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════════

/// Assembles a [`Program`]. Structural validation happens in
/// [`ProgramBuilder::finish`].
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    program: Program,
    subsig_index: FxHashMap<Subsignature, SubsigId>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class. Superclass and interfaces can be attached later,
    /// which allows forward references between mutually dependent classes.
    pub fn add_class(&mut self, name: impl Into<String>) -> ClassId {
        let id = self.program.classes.len() as ClassId;
        self.program.classes.push(ClassData {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            is_interface: false,
            methods: Vec::new(),
            subclasses: Vec::new(),
            subinterfaces: Vec::new(),
            implementors: Vec::new(),
        });
        id
    }

    pub fn add_interface(&mut self, name: impl Into<String>) -> ClassId {
        let id = self.add_class(name);
        self.program.classes[id as usize].is_interface = true;
        id
    }

    pub fn set_superclass(&mut self, class: ClassId, superclass: ClassId) {
        self.program.classes[class as usize].superclass = Some(superclass);
    }

    pub fn add_interface_to(&mut self, class: ClassId, interface: ClassId) {
        self.program.classes[class as usize].interfaces.push(interface);
    }

    pub fn add_field(
        &mut self,
        class: ClassId,
        name: impl Into<String>,
        ty: Type,
        is_static: bool,
    ) -> FieldId {
        let id = self.program.fields.len() as FieldId;
        self.program.fields.push(FieldData { class, name: name.into(), ty, is_static });
        id
    }

    /// Intern a subsignature
    pub fn subsig(
        &mut self,
        name: impl Into<String>,
        param_types: Vec<Type>,
        return_type: Type,
    ) -> SubsigId {
        let sig = Subsignature { name: name.into(), param_types, return_type };
        if let Some(&id) = self.subsig_index.get(&sig) {
            return id;
        }
        let id = self.program.subsigs.len() as SubsigId;
        self.program.subsigs.push(sig.clone());
        self.subsig_index.insert(sig, id);
        id
    }

    /// Declare a method (instance, concrete by default)
    pub fn add_method(
        &mut self,
        class: ClassId,
        name: impl Into<String>,
        param_types: Vec<Type>,
        return_type: Type,
    ) -> MethodId {
        let name = name.into();
        let subsig = self.subsig(name.clone(), param_types, return_type);
        let id = self.program.methods.len() as MethodId;
        self.program.methods.push(MethodData {
            class,
            name,
            subsig,
            is_static: false,
            is_abstract: false,
            body: None,
        });
        self.program.classes[class as usize].methods.push(id);
        id
    }

    pub fn mark_static(&mut self, m: MethodId) {
        self.program.methods[m as usize].is_static = true;
    }

    pub fn mark_abstract(&mut self, m: MethodId) {
        self.program.methods[m as usize].is_abstract = true;
    }

    pub fn set_entry(&mut self, m: MethodId) {
        self.program.entry_method = Some(m);
    }

    /// A [`MethodRef`] for building call sites
    pub fn method_ref(&self, m: MethodId) -> MethodRef {
        let md = &self.program.methods[m as usize];
        MethodRef { class: md.class, subsig: md.subsig }
    }

    /// Start building the body of `m`
    pub fn body(&mut self, m: MethodId) -> MethodBuilder<'_> {
        let class = self.program.methods[m as usize].class;
        let this_var = if self.program.methods[m as usize].is_static {
            None
        } else {
            Some(self.add_var(m, "this", Type::Reference(class)))
        };
        MethodBuilder {
            builder: self,
            method: m,
            this_var,
            params: Vec::new(),
            kinds: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn add_var(&mut self, method: MethodId, name: impl Into<String>, ty: Type) -> VarId {
        let id = self.program.vars.len() as VarId;
        self.program.vars.push(VarData {
            name: name.into(),
            ty,
            method,
            load_fields: Vec::new(),
            store_fields: Vec::new(),
            load_arrays: Vec::new(),
            store_arrays: Vec::new(),
            invokes: Vec::new(),
            arg_invokes: Vec::new(),
        });
        id
    }

    /// Validate the hierarchy, wire up reverse links and per-variable
    /// access lists, and hand out the finished program.
    pub fn finish(mut self) -> Result<Program> {
        self.check_hierarchy()?;
        self.link_hierarchy();
        self.index_var_accesses();
        Ok(self.program)
    }

    /// Cyclic superclass chains are programmer error and abort the build
    fn check_hierarchy(&self) -> Result<()> {
        for c in 0..self.program.classes.len() as ClassId {
            let mut slow = Some(c);
            let mut fast = self.program.classes[c as usize].superclass;
            while let (Some(s), Some(f)) = (slow, fast) {
                if s == f {
                    return Err(AnalysisError::CyclicHierarchy(
                        self.program.classes[c as usize].name.clone(),
                    ));
                }
                slow = self.program.classes[s as usize].superclass;
                fast = self.program.classes[f as usize]
                    .superclass
                    .and_then(|n| self.program.classes[n as usize].superclass);
            }
        }
        Ok(())
    }

    fn link_hierarchy(&mut self) {
        for c in 0..self.program.classes.len() as ClassId {
            if let Some(sup) = self.program.classes[c as usize].superclass {
                self.program.classes[sup as usize].subclasses.push(c);
            }
            let is_interface = self.program.classes[c as usize].is_interface;
            let interfaces = self.program.classes[c as usize].interfaces.clone();
            for i in interfaces {
                if is_interface {
                    self.program.classes[i as usize].subinterfaces.push(c);
                } else {
                    self.program.classes[i as usize].implementors.push(c);
                }
            }
        }
    }

    fn index_var_accesses(&mut self) {
        for s in 0..self.program.stmts.len() as StmtId {
            match self.program.stmts[s as usize].kind.clone() {
                StmtKind::LoadField {
                    access: FieldAccess::Instance { base, .. }, ..
                } => self.program.vars[base as usize].load_fields.push(s),
                StmtKind::StoreField {
                    access: FieldAccess::Instance { base, .. }, ..
                } => self.program.vars[base as usize].store_fields.push(s),
                StmtKind::LoadArray { base, .. } => {
                    self.program.vars[base as usize].load_arrays.push(s)
                }
                StmtKind::StoreArray { base, .. } => {
                    self.program.vars[base as usize].store_arrays.push(s)
                }
                StmtKind::Invoke(inv) => {
                    if let Some(b) = inv.base {
                        self.program.vars[b as usize].invokes.push(s);
                    }
                    for &a in &inv.args {
                        let list = &mut self.program.vars[a as usize].arg_invokes;
                        if list.last() != Some(&s) {
                            list.push(s);
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Builds one method body: declares variables, appends statements,
/// resolves labels. Statement order is program order; `Entry`/`Exit`
/// brackets are added automatically.
pub struct MethodBuilder<'a> {
    builder: &'a mut ProgramBuilder,
    method: MethodId,
    this_var: Option<VarId>,
    params: Vec<VarId>,
    kinds: Vec<StmtKind>,
    /// label id → position in `kinds` (None while unbound)
    labels: Vec<Option<usize>>,
}

impl<'a> MethodBuilder<'a> {
    /// The implicit receiver variable (instance methods only)
    pub fn this(&self) -> Option<VarId> {
        self.this_var
    }

    /// Declare the next formal parameter
    pub fn param(&mut self, name: impl Into<String>, ty: Type) -> VarId {
        let v = self.builder.add_var(self.method, name, ty);
        self.params.push(v);
        v
    }

    /// Declare a local variable
    pub fn var(&mut self, name: impl Into<String>, ty: Type) -> VarId {
        self.builder.add_var(self.method, name, ty)
    }

    fn push(&mut self, kind: StmtKind) {
        self.kinds.push(kind);
    }

    pub fn assign_lit(&mut self, lhs: VarId, value: i32) {
        self.push(StmtKind::AssignLiteral { lhs, value });
    }

    pub fn copy(&mut self, lhs: VarId, rhs: VarId) {
        self.push(StmtKind::Copy { lhs, rhs });
    }

    pub fn binary(&mut self, lhs: VarId, op: BinaryOp, op1: VarId, op2: VarId) {
        self.push(StmtKind::Binary { lhs, op, op1, op2 });
    }

    pub fn new_obj(&mut self, lhs: VarId, ty: Type) {
        self.push(StmtKind::New { lhs, ty });
    }

    pub fn cast(&mut self, lhs: VarId, ty: Type, rhs: VarId) {
        self.push(StmtKind::Cast { lhs, ty, rhs });
    }

    pub fn load_field(&mut self, lhs: VarId, base: VarId, field: FieldId) {
        self.push(StmtKind::LoadField { lhs, access: FieldAccess::Instance { base, field } });
    }

    pub fn load_static(&mut self, lhs: VarId, field: FieldId) {
        self.push(StmtKind::LoadField { lhs, access: FieldAccess::Static { field } });
    }

    pub fn store_field(&mut self, base: VarId, field: FieldId, rhs: VarId) {
        self.push(StmtKind::StoreField { access: FieldAccess::Instance { base, field }, rhs });
    }

    pub fn store_static(&mut self, field: FieldId, rhs: VarId) {
        self.push(StmtKind::StoreField { access: FieldAccess::Static { field }, rhs });
    }

    pub fn load_array(&mut self, lhs: VarId, base: VarId, index: VarId) {
        self.push(StmtKind::LoadArray { lhs, base, index });
    }

    pub fn store_array(&mut self, base: VarId, index: VarId, rhs: VarId) {
        self.push(StmtKind::StoreArray { base, index, rhs });
    }

    pub fn invoke(&mut self, invoke: Invoke) {
        self.push(StmtKind::Invoke(invoke));
    }

    /// `r = C.m(args)` convenience for static calls
    pub fn call_static(&mut self, target: MethodRef, args: Vec<VarId>, result: Option<VarId>) {
        self.invoke(Invoke { kind: CallKind::Static, method_ref: target, base: None, args, result });
    }

    /// `r = base.m(args)` convenience for virtual calls
    pub fn call_virtual(
        &mut self,
        base: VarId,
        target: MethodRef,
        args: Vec<VarId>,
        result: Option<VarId>,
    ) {
        self.invoke(Invoke {
            kind: CallKind::Virtual,
            method_ref: target,
            base: Some(base),
            args,
            result,
        });
    }

    /// Allocate a fresh, unbound label
    pub fn fresh_label(&mut self) -> Label {
        let l = Label(self.labels.len() as u32);
        self.labels.push(None);
        l
    }

    /// Bind a label to the next appended statement
    pub fn bind(&mut self, label: Label) {
        self.labels[label.0 as usize] = Some(self.kinds.len());
    }

    /// `if (op1 op op2) goto label`; fall-through is the false branch
    pub fn if_goto(&mut self, op: BinaryOp, op1: VarId, op2: VarId, label: Label) {
        // target patched in finish(); the label id rides in the slot
        self.push(StmtKind::If { op, op1, op2, target: label.0 });
    }

    pub fn goto(&mut self, label: Label) {
        self.push(StmtKind::Goto { target: label.0 });
    }

    pub fn switch(&mut self, var: VarId, cases: Vec<(i32, Label)>, default: Label) {
        let cases = cases.into_iter().map(|(v, l)| (v, l.0)).collect();
        self.push(StmtKind::Switch { var, cases, default: default.0 });
    }

    pub fn ret(&mut self, var: Option<VarId>) {
        self.push(StmtKind::Return { var });
    }

    pub fn nop(&mut self) {
        self.push(StmtKind::Nop);
    }

    /// Seal the body: assign global statement ids, patch label targets
    /// (labels bound past the last statement resolve to `Exit`), collect
    /// return variables and attach the finished [`MethodBody`].
    pub fn finish(self) {
        let MethodBuilder { builder, method, this_var, params, kinds, labels } = self;
        let program = &mut builder.program;
        let base = program.stmts.len() as StmtId;
        let n = kinds.len();
        // entry at base, user statements at base+1..=base+n, exit after
        let entry = base;
        let exit = base + n as StmtId + 1;
        let to_stmt = |pos: usize| base + 1 + pos as StmtId;
        let resolve = |label: u32| -> StmtId {
            match labels[label as usize] {
                Some(pos) if pos < n => to_stmt(pos),
                _ => exit,
            }
        };

        let mut stmts = Vec::with_capacity(n + 2);
        let mut return_vars = Vec::new();
        program.stmts.push(StmtData { method, index: 0, kind: StmtKind::Entry });
        stmts.push(entry);
        for (pos, kind) in kinds.into_iter().enumerate() {
            let kind = match kind {
                StmtKind::If { op, op1, op2, target } => {
                    StmtKind::If { op, op1, op2, target: resolve(target) }
                }
                StmtKind::Goto { target } => StmtKind::Goto { target: resolve(target) },
                StmtKind::Switch { var, cases, default } => StmtKind::Switch {
                    var,
                    cases: cases.into_iter().map(|(v, l)| (v, resolve(l))).collect(),
                    default: resolve(default),
                },
                StmtKind::Return { var } => {
                    if let Some(v) = var {
                        if !return_vars.contains(&v) {
                            return_vars.push(v);
                        }
                    }
                    StmtKind::Return { var }
                }
                other => other,
            };
            program.stmts.push(StmtData { method, index: pos as u32 + 1, kind });
            stmts.push(to_stmt(pos));
        }
        program.stmts.push(StmtData { method, index: n as u32 + 1, kind: StmtKind::Exit });
        stmts.push(exit);

        program.methods[method as usize].body =
            Some(MethodBody { params, this_var, return_vars, stmts, entry, exit });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_simple_method() {
        let mut b = ProgramBuilder::new();
        let c = b.add_class("Main");
        let m = b.add_method(c, "main", vec![], Type::Void);
        b.mark_static(m);
        b.set_entry(m);

        let mut mb = b.body(m);
        let x = mb.var("x", Type::int());
        let y = mb.var("y", Type::int());
        mb.assign_lit(x, 1);
        mb.assign_lit(y, 2);
        mb.binary(x, BinaryOp::Add, x, y);
        mb.ret(None);
        mb.finish();

        let p = b.finish().unwrap();
        let body = p.method(m).body.as_ref().unwrap();
        assert_eq!(body.stmts.len(), 6); // entry + 4 + exit
        assert!(matches!(p.stmt(body.entry).kind, StmtKind::Entry));
        assert!(matches!(p.stmt(body.exit).kind, StmtKind::Exit));
        assert_eq!(p.stmt(body.stmts[1]).index, 1);
        assert_eq!(p.def(body.stmts[3]).unwrap().0, x);
    }

    #[test]
    fn test_label_resolution() {
        let mut b = ProgramBuilder::new();
        let c = b.add_class("Main");
        let m = b.add_method(c, "f", vec![], Type::Void);
        b.mark_static(m);

        let mut mb = b.body(m);
        let x = mb.var("x", Type::int());
        let y = mb.var("y", Type::int());
        mb.assign_lit(x, 0);
        mb.assign_lit(y, 1);
        let end = mb.fresh_label();
        mb.if_goto(BinaryOp::Eq, x, y, end);
        mb.assign_lit(x, 7);
        mb.bind(end);
        mb.ret(None);
        mb.finish();

        let p = b.finish().unwrap();
        let body = p.method(m).body.as_ref().unwrap();
        let if_stmt = body.stmts[3];
        match p.stmt(if_stmt).kind {
            StmtKind::If { target, .. } => assert_eq!(target, body.stmts[5]),
            ref k => panic!("expected if, got {k:?}"),
        }
    }

    #[test]
    fn test_cyclic_hierarchy_rejected() {
        let mut b = ProgramBuilder::new();
        let a = b.add_class("A");
        let c = b.add_class("B");
        b.set_superclass(a, c);
        b.set_superclass(c, a);
        assert!(matches!(b.finish(), Err(AnalysisError::CyclicHierarchy(_))));
    }

    #[test]
    fn test_var_access_lists() {
        let mut b = ProgramBuilder::new();
        let c = b.add_class("A");
        let f = b.add_field(c, "f", Type::int(), false);
        let m = b.add_method(c, "go", vec![], Type::Void);
        b.mark_static(m);

        let mut mb = b.body(m);
        let o = mb.var("o", Type::Reference(c));
        let x = mb.var("x", Type::int());
        mb.new_obj(o, Type::Reference(c));
        mb.store_field(o, f, x);
        mb.load_field(x, o, f);
        mb.ret(None);
        mb.finish();

        let p = b.finish().unwrap();
        assert_eq!(p.var(o).store_fields.len(), 1);
        assert_eq!(p.var(o).load_fields.len(), 1);
        assert!(p.var(x).store_fields.is_empty());
    }
}
