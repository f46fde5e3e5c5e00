//! The reset lemma.
//!
//! Eliminates an unconditional demand `W | ∅` that was added to `D` but
//! whose table was never materialized (its size would exceed the global
//! bound), rewriting the bookkeeping so the underlying Shannon inequality
//! still holds. Cases are tried in order:
//!
//! - **R0**: `W` is an owed output group; consume it from `Z`.
//! - **R1**: some demand `Y | W` conditions on `W`; consume it (and the
//!   most recent dictionary backing it) and recurse on `Y ⊕ W | ∅`.
//! - **R2**: a split witness `Y | X` with `Y ⊕ X = W`; consume it and
//!   recurse on `X | ∅`.
//! - **R3**: a partition witness `Y ; Z | X` with `Y ⊕ X = W`; consume
//!   it, grant the split witness `Z | X`, and recurse on `X ⊕ Y ⊕ Z | ∅`.
//!
//! Every step strictly shrinks `|M| + |S|` or, at equal witness count,
//! `|D|` plus the dictionary stacks, so the recursion is capped by the
//! subproblem's proof size; the ceiling turns an ill-posed input into
//! [`EngineError::Diverged`] instead of an infinite loop.

use tracing::debug;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::limits::EngineLimits;
use crate::proof::{Monotonicity, Subproblem};
use crate::relation::AlgebraError;

/// Eliminate the unconditional demand `target` from `subproblem`.
pub fn apply_reset(
    subproblem: &Subproblem,
    target: &Monotonicity,
    limits: &EngineLimits,
) -> EngineResult<Subproblem> {
    let ceiling = limits.reset_ceiling(subproblem);
    reset_step(subproblem.clone(), *target, 0, ceiling)
}

fn reset_step(
    mut subproblem: Subproblem,
    target: Monotonicity,
    depth: usize,
    ceiling: usize,
) -> EngineResult<Subproblem> {
    if depth >= ceiling {
        return Err(EngineError::Diverged {
            context: "reset depth",
            limit: ceiling,
        });
    }
    subproblem.d.decrement(&target);

    // R0: the demand is an owed output group.
    if subproblem.z.contains(&target.attrs_y) {
        debug!(demand = %target, depth, "reset_output_base");
        subproblem.z.decrement(&target.attrs_y);
        return Ok(subproblem);
    }

    // R1: a demand conditions on the target.
    let conditioned = subproblem
        .d
        .keys()
        .find(|mon| mon.attrs_x == target.attrs_y)
        .copied();
    if let Some(witness) = conditioned {
        debug!(demand = %target, witness = %witness, depth, "reset_condition_inductive");
        let joint = Monotonicity::unconditional(witness.attrs_y ^ witness.attrs_x);
        subproblem.d.decrement(&witness);
        subproblem.d.increment(joint);
        subproblem.pop_dict(&witness).ok_or_else(|| {
            EngineError::from(AlgebraError::MissingEntry {
                context: format!("dicts[{witness}]"),
            })
        })?;
        return reset_step(subproblem, joint, depth + 1, ceiling);
    }

    // R2: a split witness covers the target.
    let split = subproblem
        .m
        .keys()
        .find(|mon| mon.attrs_x ^ mon.attrs_y == target.attrs_y)
        .copied();
    if let Some(witness) = split {
        debug!(demand = %target, witness = %witness, depth, "reset_split_inductive");
        let mon_x = Monotonicity::unconditional(witness.attrs_x);
        subproblem.m.decrement(&witness);
        subproblem.d.increment(mon_x);
        return reset_step(subproblem, mon_x, depth + 1, ceiling);
    }

    // R3: a partition witness covers the target.
    let partition = subproblem
        .s
        .keys()
        .find(|sub| sub.attrs_x ^ sub.attrs_y == target.attrs_y)
        .copied();
    if let Some(witness) = partition {
        debug!(demand = %target, witness = %witness, depth, "reset_partition_inductive");
        let mon_xyz =
            Monotonicity::unconditional(witness.attrs_x ^ witness.attrs_y ^ witness.attrs_z);
        subproblem.s.decrement(&witness);
        subproblem.d.increment(mon_xyz);
        subproblem
            .m
            .increment(Monotonicity::new(witness.attrs_z, witness.attrs_x));
        return reset_step(subproblem, mon_xyz, depth + 1, ceiling);
    }

    Err(EngineError::ResetDeadEnd {
        target: target.to_string(),
        shape: subproblem.shape(),
    })
}
