//! Per-point dataflow facts
//!
//! [`CpFact`] maps variables to abstract values with the convention that
//! an absent key means UNDEF; the map is kept canonical (UNDEF is never
//! stored), so derived equality is the semantic equality the solvers'
//! changed-bit relies on. [`SetFact`] is the plain variable set used by
//! live-variable analysis.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::shared::models::VarId;

use super::value::Value;

/// Constant-propagation fact: variable → abstract value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpFact {
    map: FxHashMap<VarId, Value>,
}

impl CpFact {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value bound to `var`; absent means UNDEF
    #[inline]
    pub fn get(&self, var: VarId) -> Value {
        self.map.get(&var).copied().unwrap_or(Value::Undef)
    }

    /// Bind `var` to `value`, keeping the map canonical.
    /// Returns true if the binding changed.
    pub fn update(&mut self, var: VarId, value: Value) -> bool {
        let old = self.get(var);
        if value.is_undef() {
            self.map.remove(&var);
        } else {
            self.map.insert(var, value);
        }
        old != value
    }

    /// Drop the binding for `var` (≡ set to UNDEF)
    pub fn remove(&mut self, var: VarId) -> Value {
        self.map.remove(&var).unwrap_or(Value::Undef)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Replace this fact's contents with a copy of `other`
    pub fn copy_from(&mut self, other: &CpFact) {
        self.map.clone_from(&other.map);
    }

    /// Pointwise meet of `other` into `self`
    pub fn meet_with(&mut self, other: &CpFact) {
        for (&var, &value) in &other.map {
            let merged = self.get(var).meet(value);
            self.update(var, merged);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = VarId> + '_ {
        self.map.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VarId, Value)> + '_ {
        self.map.iter().map(|(&v, &val)| (v, val))
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Set fact over variables; meet is union
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetFact {
    set: FxHashSet<VarId>,
}

impl SetFact {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, var: VarId) -> bool {
        self.set.contains(&var)
    }

    pub fn add(&mut self, var: VarId) -> bool {
        self.set.insert(var)
    }

    pub fn remove(&mut self, var: VarId) -> bool {
        self.set.remove(&var)
    }

    /// Union `other` into `self`; returns true on growth
    pub fn union_with(&mut self, other: &SetFact) -> bool {
        let before = self.set.len();
        self.set.extend(&other.set);
        self.set.len() > before
    }

    pub fn copy_from(&mut self, other: &SetFact) {
        self.set.clone_from(&other.set);
    }

    pub fn clear(&mut self) {
        self.set.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = VarId> + '_ {
        self.set.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_is_undef() {
        let fact = CpFact::new();
        assert_eq!(fact.get(42), Value::Undef);
    }

    #[test]
    fn test_canonical_equality() {
        let mut a = CpFact::new();
        let mut b = CpFact::new();
        a.update(1, Value::Const(5));
        a.update(1, Value::Undef); // back to absent
        assert_eq!(a, b);

        a.update(2, Value::Nac);
        b.update(2, Value::Nac);
        assert_eq!(a, b);
    }

    #[test]
    fn test_update_reports_change() {
        let mut fact = CpFact::new();
        assert!(fact.update(1, Value::Const(3)));
        assert!(!fact.update(1, Value::Const(3)));
        assert!(fact.update(1, Value::Nac));
        assert!(!fact.update(2, Value::Undef)); // undef → undef is no change
    }

    #[test]
    fn test_meet_with() {
        let mut a = CpFact::new();
        a.update(1, Value::Const(3));
        a.update(2, Value::Const(4));
        let mut b = CpFact::new();
        b.update(1, Value::Const(3));
        b.update(2, Value::Const(9));
        b.update(3, Value::Const(1));

        a.meet_with(&b);
        assert_eq!(a.get(1), Value::Const(3));
        assert_eq!(a.get(2), Value::Nac);
        // 3 was UNDEF in a, so the meet keeps b's constant
        assert_eq!(a.get(3), Value::Const(1));
    }

    #[test]
    fn test_set_fact_union() {
        let mut a = SetFact::new();
        a.add(1);
        let mut b = SetFact::new();
        b.add(1);
        b.add(2);
        assert!(a.union_with(&b));
        assert!(!a.union_with(&b));
        assert_eq!(a.len(), 2);
    }
}
