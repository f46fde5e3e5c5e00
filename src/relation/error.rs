//! Relation Algebra Error Types

use thiserror::Error;

use crate::schema::AttrSet;

/// Operator precondition violations.
///
/// Every operator checks its mask preconditions up front; a violation means
/// the caller constructed an ill-formed rewrite and the run must abort.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AlgebraError {
    /// Two masks that must be disjoint overlap
    #[error("attribute masks must be disjoint: {left} overlaps {right}")]
    NotDisjoint { left: AttrSet, right: AttrSet },

    /// A mask that must be contained in another is not
    #[error("attributes {wanted} are not a subset of {have}")]
    NotSubset { wanted: AttrSet, have: AttrSet },

    /// An operand's attribute mask differs from the expected one
    #[error("attribute mask mismatch: expected {expected}, found {found}")]
    AttrMismatch { expected: AttrSet, found: AttrSet },

    /// A row carries values on the wrong positions for its table
    #[error("row carries values on {found}, relation requires exactly {expected}")]
    RowShapeMismatch { expected: AttrSet, found: AttrSet },

    /// Two masks that must cover a table's attributes do not
    #[error("masks {x} and {y} must partition table attributes {have}")]
    CoverMismatch { x: AttrSet, y: AttrSet, have: AttrSet },

    /// Two rows of different widths were combined
    #[error("row width mismatch: {left} vs {right}")]
    WidthMismatch { left: usize, right: usize },

    /// A bookkeeping entry that must exist is missing
    #[error("missing relation entry for {context}")]
    MissingEntry { context: String },
}

/// Result alias for relation algebra operations.
pub type AlgebraResult<T> = Result<T, AlgebraError>;
