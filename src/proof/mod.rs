//! # Proof State
//!
//! The bookkeeping side of the rewriting procedure: Shannon-inequality
//! terms, counted multisets of them, and the [`Subproblem`] node that the
//! case rewriters and the reset lemma transform.

pub mod multiset;
pub mod subproblem;
pub mod terms;

pub use multiset::Multiset;
pub use subproblem::{DictStack, Subproblem, TableStack};
pub use terms::{Monotonicity, Submodularity};
