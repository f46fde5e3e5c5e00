//! Shannon-inequality terms: monotonicities and submodularities.

use std::fmt;

use crate::schema::AttrSet;

/// A monotonicity term `Y | X` over disjoint masks.
///
/// `h(X ⊕ Y) ≤ h(X) + h(Y | X)`; unconditional iff `X = ∅`. An
/// unconditional term in the demand multiset reads "materialize a relation
/// over Y".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Monotonicity {
    pub attrs_y: AttrSet,
    pub attrs_x: AttrSet,
}

impl Monotonicity {
    pub fn new(attrs_y: AttrSet, attrs_x: AttrSet) -> Monotonicity {
        debug_assert!(attrs_y.is_disjoint(attrs_x), "monotonicity masks overlap");
        Monotonicity { attrs_y, attrs_x }
    }

    pub fn unconditional(attrs_y: AttrSet) -> Monotonicity {
        Monotonicity {
            attrs_y,
            attrs_x: AttrSet::EMPTY,
        }
    }

    pub fn is_unconditional(&self) -> bool {
        self.attrs_x.is_empty()
    }
}

impl fmt::Display for Monotonicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.attrs_y, self.attrs_x)
    }
}

/// A submodularity term `Y ; Z | X` over pairwise-disjoint masks with
/// `Y ≠ ∅`, `Z ≠ ∅`.
///
/// `h(X ⊕ Y) + h(X ⊕ Z) ≥ h(X) + h(X ⊕ Y ⊕ Z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Submodularity {
    pub attrs_y: AttrSet,
    pub attrs_z: AttrSet,
    pub attrs_x: AttrSet,
}

impl Submodularity {
    pub fn new(attrs_y: AttrSet, attrs_z: AttrSet, attrs_x: AttrSet) -> Submodularity {
        debug_assert!(
            attrs_y.is_disjoint(attrs_z)
                && attrs_y.is_disjoint(attrs_x)
                && attrs_z.is_disjoint(attrs_x),
            "submodularity masks overlap"
        );
        Submodularity {
            attrs_y,
            attrs_z,
            attrs_x,
        }
    }
}

impl fmt::Display for Submodularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ; {} | {}", self.attrs_y, self.attrs_z, self.attrs_x)
    }
}
