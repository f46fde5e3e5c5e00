//! # Proof-Driven Rewrites
//!
//! The three case rewrites (condition, split, partition) and the reset
//! lemma. Each takes a subproblem by reference and produces fresh child
//! subproblems; parents are never mutated.

pub mod cases;
pub mod reset;

pub use cases::{
    apply_condition, apply_partition, apply_split, find_condition, find_partition, find_split,
};
pub use reset::apply_reset;
