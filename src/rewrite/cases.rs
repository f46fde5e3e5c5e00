//! Case matchers and rewriters.
//!
//! Given a subproblem and a chosen unconditional demand `W | ∅`, exactly one
//! of three rewrites applies:
//!
//! - **condition**: some demand `Y | W` conditions on `W`; the pair is
//!   replaced by the joint demand `Y ⊕ W | ∅`, materialized by joining the
//!   `W`-table against the `Y | W`-dictionary. If the product of their
//!   degree bounds exceeds the global bound the join is never computed and
//!   the reset lemma eliminates the joint demand instead.
//! - **split**: a split witness `Y | X` with `Y ⊕ X = W` lets the demand
//!   shrink to `X | ∅`, materialized by projection.
//! - **partition**: a partition witness `Y ; Z | X` with `Y ⊕ X = W`
//!   branches the tree: the `W`-table is degree-partitioned by `X`, and
//!   each part yields a child holding the part's `X`-projection and the
//!   extended dictionary `construction(part, X, Y)` freed by `Z`.
//!
//! Matchers take the first hit in deterministic multiset order; each
//! witness is consumed by its rewrite.

use tracing::debug;

use crate::engine::error::EngineResult;
use crate::engine::limits::EngineLimits;
use crate::proof::{Monotonicity, Submodularity, Subproblem};
use crate::relation::{AlgebraError, DictValue, Dictionary, Table};
use crate::rewrite::reset::apply_reset;

/// Find a demand `Y | W` conditioning on the target's attributes.
pub fn find_condition(subproblem: &Subproblem, target: &Monotonicity) -> Option<Monotonicity> {
    subproblem
        .d
        .keys()
        .find(|mon| mon.attrs_x == target.attrs_y)
        .copied()
}

/// Find a split witness `Y | X` in `M` with `Y ≠ ∅`, `X ≠ ∅` and
/// `Y ⊕ X = W`.
pub fn find_split(subproblem: &Subproblem, target: &Monotonicity) -> Option<Monotonicity> {
    subproblem
        .m
        .keys()
        .find(|mon| {
            !mon.attrs_y.is_empty()
                && !mon.attrs_x.is_empty()
                && mon.attrs_y ^ mon.attrs_x == target.attrs_y
        })
        .copied()
}

/// Find a partition witness `Y ; Z | X` in `S` with `Y ≠ ∅`, `X ≠ ∅` and
/// `Y ⊕ X = W`.
pub fn find_partition(subproblem: &Subproblem, target: &Monotonicity) -> Option<Submodularity> {
    subproblem
        .s
        .keys()
        .find(|sub| {
            !sub.attrs_y.is_empty()
                && !sub.attrs_x.is_empty()
                && sub.attrs_y ^ sub.attrs_x == target.attrs_y
        })
        .copied()
}

fn take_table(subproblem: &mut Subproblem, mon: &Monotonicity) -> EngineResult<(Table, f64)> {
    subproblem.pop_table(mon).ok_or_else(|| {
        AlgebraError::MissingEntry {
            context: format!("tables[{mon}]"),
        }
        .into()
    })
}

fn take_dict(subproblem: &mut Subproblem, mon: &Monotonicity) -> EngineResult<(DictValue, f64)> {
    subproblem.pop_dict(mon).ok_or_else(|| {
        AlgebraError::MissingEntry {
            context: format!("dicts[{mon}]"),
        }
        .into()
    })
}

/// Condition rewrite: consume `W | ∅` and the witness `Y | W`, demand
/// `Y ⊕ W | ∅` instead. Within the bound the joint table is materialized
/// (case 1.1); over the bound the joint demand is eliminated by the reset
/// lemma without computing the join (case 1.2).
pub fn apply_condition(
    subproblem: &Subproblem,
    target: &Monotonicity,
    witness: &Monotonicity,
    limits: &EngineLimits,
) -> EngineResult<Vec<Subproblem>> {
    let mut child = subproblem.clone();
    let (table_w, degree_w) = take_table(&mut child, target)?;
    let (dict_yw, degree_y_w) = take_dict(&mut child, witness)?;

    let joint = Monotonicity::unconditional(witness.attrs_y ^ witness.attrs_x);
    child.d.decrement(target);
    child.d.decrement(witness);
    child.d.increment(joint);

    let joint_degree = degree_w * degree_y_w;
    if joint_degree <= child.bound {
        debug!(demand = %target, witness = %witness, joint_degree, "condition_within_bound");
        let joined = dict_yw.join(&table_w)?;
        child.push_table(joint, joined, joint_degree);
        Ok(vec![child])
    } else {
        debug!(demand = %target, witness = %witness, joint_degree, bound = child.bound,
               "condition_exceeds_bound");
        let reset = apply_reset(&child, &joint, limits)?;
        Ok(vec![reset])
    }
}

/// Split rewrite: consume `X ⊕ Y | ∅` and the witness `Y | X` from `M`,
/// demand `X | ∅` instead, materialized by projecting the table onto `X`.
pub fn apply_split(
    subproblem: &Subproblem,
    target: &Monotonicity,
    witness: &Monotonicity,
) -> EngineResult<Vec<Subproblem>> {
    let mut child = subproblem.clone();
    let (table_xy, degree_xy) = take_table(&mut child, target)?;

    let mon_x = Monotonicity::unconditional(witness.attrs_x);
    child.d.decrement(target);
    child.m.decrement(witness);
    child.d.increment(mon_x);

    debug!(demand = %target, witness = %witness, "split_rewrite");
    child.push_table(mon_x, table_xy.project(witness.attrs_x)?, degree_xy);
    Ok(vec![child])
}

/// Partition rewrite: consume `X ⊕ Y | ∅` and the witness `Y ; Z | X` from
/// `S`; demand `X | ∅` and `Y | X ⊕ Z` instead. The table is
/// degree-partitioned by `X` and every non-empty part becomes one child.
pub fn apply_partition(
    subproblem: &Subproblem,
    target: &Monotonicity,
    witness: &Submodularity,
) -> EngineResult<Vec<Subproblem>> {
    let mut base = subproblem.clone();
    let (table_xy, _) = take_table(&mut base, target)?;

    let mon_x = Monotonicity::unconditional(witness.attrs_x);
    let mon_y_xz = Monotonicity::new(witness.attrs_y, witness.attrs_x ^ witness.attrs_z);
    base.d.decrement(target);
    base.s.decrement(witness);
    base.d.increment(mon_x);
    base.d.increment(mon_y_xz);

    let parts = table_xy.partition(witness.attrs_x)?;
    debug!(demand = %target, witness = %witness, parts = parts.len(), "partition_rewrite");

    let mut children = Vec::with_capacity(parts.len());
    for part in parts {
        let mut child = base.clone();

        let table_x = part.project(witness.attrs_x)?;
        let degree_x = table_x.len() as f64;
        child.push_table(mon_x, table_x, degree_x);

        let dict = Dictionary::construction(&part, witness.attrs_x, witness.attrs_y)?;
        let extended = dict.extend(witness.attrs_z)?;
        let degree_y_xz = extended.degree() as f64;
        child.push_dict(mon_y_xz, DictValue::Extended(extended), degree_y_xz);

        children.push(child);
    }
    Ok(children)
}
