//! Points-to set
//!
//! A sorted-vector set over `u32` object ids. Sets in this analysis only
//! ever grow, stay small on average, and are iterated far more often than
//! they are mutated, so a sorted vec beats a hash set on both memory and
//! iteration order (which is what makes the exposed results
//! deterministic).

use serde::{Deserialize, Serialize};

/// A monotonically growing set of abstract object ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointsToSet {
    elems: Vec<u32>,
}

impl PointsToSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton(obj: u32) -> Self {
        Self { elems: vec![obj] }
    }

    /// Insert an object; returns true if the set grew
    pub fn add(&mut self, obj: u32) -> bool {
        match self.elems.binary_search(&obj) {
            Ok(_) => false,
            Err(pos) => {
                self.elems.insert(pos, obj);
                true
            }
        }
    }

    #[inline]
    pub fn contains(&self, obj: u32) -> bool {
        self.elems.binary_search(&obj).is_ok()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Ascending iteration
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.elems.iter().copied()
    }

    /// Union `other` into `self`; returns true on growth
    pub fn union_with(&mut self, other: &PointsToSet) -> bool {
        let before = self.elems.len();
        let mut merged = Vec::with_capacity(before + other.elems.len());
        let (mut i, mut j) = (0, 0);
        while i < self.elems.len() && j < other.elems.len() {
            match self.elems[i].cmp(&other.elems[j]) {
                std::cmp::Ordering::Less => {
                    merged.push(self.elems[i]);
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    merged.push(other.elems[j]);
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    merged.push(self.elems[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        merged.extend_from_slice(&self.elems[i..]);
        merged.extend_from_slice(&other.elems[j..]);
        self.elems = merged;
        self.elems.len() > before
    }

    /// Elements of `self` not in `other`
    pub fn difference(&self, other: &PointsToSet) -> PointsToSet {
        PointsToSet { elems: self.iter().filter(|&e| !other.contains(e)).collect() }
    }
}

impl FromIterator<u32> for PointsToSet {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        let mut elems: Vec<u32> = iter.into_iter().collect();
        elems.sort_unstable();
        elems.dedup();
        Self { elems }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_contains() {
        let mut s = PointsToSet::new();
        assert!(s.add(5));
        assert!(s.add(3));
        assert!(!s.add(5));
        assert!(s.contains(3));
        assert!(!s.contains(4));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_iteration_is_sorted() {
        let s: PointsToSet = [9, 1, 5, 1].into_iter().collect();
        assert_eq!(s.iter().collect::<Vec<_>>(), vec![1, 5, 9]);
    }

    #[test]
    fn test_union_reports_growth() {
        let mut a: PointsToSet = [1, 2].into_iter().collect();
        let b: PointsToSet = [2, 3].into_iter().collect();
        assert!(a.union_with(&b));
        assert!(!a.union_with(&b));
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_difference() {
        let a: PointsToSet = [1, 2, 3].into_iter().collect();
        let b: PointsToSet = [2].into_iter().collect();
        let d = a.difference(&b);
        assert_eq!(d.iter().collect::<Vec<_>>(), vec![1, 3]);
        assert!(b.difference(&a).is_empty());
    }
}
