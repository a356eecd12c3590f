//! Abstract integer values
//!
//! Three-point lattice for constant propagation:
//!
//! ```text
//!          NAC            (not a constant, top)
//!       /   |   \
//!  ... -1   0   1 ...     (pairwise incomparable constants)
//!       \   |   /
//!         UNDEF           (no information, bottom)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// An abstract 32-bit integer value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    /// No information yet (bottom)
    Undef,
    /// A known constant
    Const(i32),
    /// Not a constant (top)
    Nac,
}

impl Value {
    #[inline]
    pub fn is_undef(&self) -> bool {
        matches!(self, Value::Undef)
    }

    #[inline]
    pub fn is_constant(&self) -> bool {
        matches!(self, Value::Const(_))
    }

    #[inline]
    pub fn is_nac(&self) -> bool {
        matches!(self, Value::Nac)
    }

    /// The constant payload, if this value is one
    #[inline]
    pub fn constant(&self) -> Option<i32> {
        match self {
            Value::Const(c) => Some(*c),
            _ => None,
        }
    }

    /// Lattice meet. NAC absorbs, UNDEF is neutral, equal constants are
    /// kept and differing constants collapse to NAC.
    pub fn meet(self, other: Value) -> Value {
        match (self, other) {
            (Value::Nac, _) | (_, Value::Nac) => Value::Nac,
            (Value::Undef, v) | (v, Value::Undef) => v,
            (Value::Const(a), Value::Const(b)) => {
                if a == b {
                    Value::Const(a)
                } else {
                    Value::Nac
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undef => write!(f, "UNDEF"),
            Value::Const(c) => write!(f, "{c}"),
            Value::Nac => write!(f, "NAC"),
        }
    }
}
