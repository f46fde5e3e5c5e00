//! # Rewriting Engine
//!
//! Breadth-first expansion of the rewriting tree. The driver dequeues a
//! subproblem, checks whether it is a leaf (an unconditional demand whose
//! attributes match an output group of the original problem), and otherwise
//! applies the first matching case rewrite across its unconditional demands
//! in deterministic order. Leaves are collected and their witness tables
//! unioned per output group.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use panda::engine::{Engine, EngineLimits};
//!
//! let engine = Engine::new(EngineLimits::default());
//! let witness = engine.run(&subproblem)?;
//! for (group, table) in &witness {
//!     println!("{group}: {} rows", table.len());
//! }
//! ```

pub mod error;
pub mod limits;

pub use error::{EngineError, EngineResult};
pub use limits::EngineLimits;

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, VecDeque};

use tracing::{debug, info};

use crate::proof::{Monotonicity, Subproblem};
use crate::relation::{AlgebraError, Table};
use crate::rewrite::{
    apply_condition, apply_partition, apply_split, find_condition, find_partition, find_split,
};

/// The witness produced by a run: one relation per satisfied output group,
/// keyed by the unconditional monotonicity over that group.
pub type Witness = BTreeMap<Monotonicity, Table>;

/// Breadth-first driver over the rewriting tree.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    limits: EngineLimits,
}

impl Engine {
    pub fn new(limits: EngineLimits) -> Engine {
        Engine { limits }
    }

    /// Expand `initial` until every branch reaches a leaf, then union the
    /// leaf tables per output group.
    pub fn run(&self, initial: &Subproblem) -> EngineResult<Witness> {
        let leaves = self.collect_leaves(initial)?;
        info!(leaves = leaves.len(), "rewrite_tree_exhausted");

        let mut witness = Witness::new();
        for (leaf, mon) in leaves {
            let table = leaf
                .first_table(&mon)
                .ok_or_else(|| {
                    EngineError::from(AlgebraError::MissingEntry {
                        context: format!("tables[{mon}]"),
                    })
                })?
                .clone();
            match witness.entry(mon) {
                Entry::Vacant(slot) => {
                    slot.insert(table);
                }
                Entry::Occupied(mut slot) => {
                    slot.get_mut().absorb(table)?;
                }
            }
        }
        info!(groups = witness.len(), "witness_assembled");
        Ok(witness)
    }

    fn collect_leaves(
        &self,
        initial: &Subproblem,
    ) -> EngineResult<Vec<(Subproblem, Monotonicity)>> {
        let mut pending = VecDeque::new();
        pending.push_back(initial.clone());
        let mut leaves = Vec::new();
        let mut steps = 0usize;

        while let Some(current) = pending.pop_front() {
            self.limits.check_step(steps)?;
            steps += 1;

            if let Some(mon) = leaf_demand(initial, &current) {
                debug!(leaf = %mon, step = steps, "leaf_reached");
                leaves.push((current, mon));
                continue;
            }

            let children = self.expand(&current)?;
            debug!(step = steps, children = children.len(), pending = pending.len(),
                   shape = %current.shape(), "subproblem_expanded");
            pending.extend(children);
        }
        Ok(leaves)
    }

    /// Apply the first matching case across the unconditional demands.
    fn expand(&self, subproblem: &Subproblem) -> EngineResult<Vec<Subproblem>> {
        let demands = subproblem.unconditional_demands();
        if demands.is_empty() {
            return Err(EngineError::NoApplicableMonotonicity {
                shape: subproblem.shape(),
            });
        }

        for target in &demands {
            if let Some(witness) = find_condition(subproblem, target) {
                debug!(demand = %target, case = "condition", "case_selected");
                return apply_condition(subproblem, target, &witness, &self.limits);
            }
            if let Some(witness) = find_split(subproblem, target) {
                debug!(demand = %target, case = "split", "case_selected");
                return apply_split(subproblem, target, &witness);
            }
            if let Some(witness) = find_partition(subproblem, target) {
                debug!(demand = %target, case = "partition", "case_selected");
                return apply_partition(subproblem, target, &witness);
            }
        }

        Err(EngineError::NoApplicableCase {
            shape: subproblem.shape(),
            demands: demands
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// The leaf test: an unconditional demand whose attributes are an output
/// group of the *original* problem. Returns the first such demand in
/// deterministic order.
pub fn leaf_demand(original: &Subproblem, subproblem: &Subproblem) -> Option<Monotonicity> {
    subproblem
        .d
        .keys()
        .find(|mon| mon.is_unconditional() && original.z.contains(&mon.attrs_y))
        .copied()
}
