//! Subproblem state: one node of the rewriting tree.
//!
//! A subproblem bundles the remaining output demands `Z`, the monotonicity
//! demands `D`, the materialized tables and dictionaries backing the
//! unconditional/conditional demands, the split witnesses `M`, the
//! partition witnesses `S`, and the global size bound `B`. Subproblems are
//! values: a rewrite clones its parent and edits the clone, so branches of
//! the tree never alias mutable state.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::proof::multiset::Multiset;
use crate::proof::terms::{Monotonicity, Submodularity};
use crate::relation::{DictValue, Table};
use crate::schema::AttrSet;

/// Materialized tables for an unconditional demand, with their degree
/// bounds; treated as a stack (push/pop at the back).
pub type TableStack = Vec<(Table, f64)>;

/// Materialized dictionaries for a conditional demand, with their degree
/// bounds; treated as a stack (push/pop at the back).
pub type DictStack = Vec<(DictValue, f64)>;

/// One node of the rewriting tree.
///
/// Invariants: for every unconditional `m ∈ D`, `tables[m]` holds exactly
/// `D[m]` entries; for every conditional `m ∈ D`, `dicts[m]` holds exactly
/// `D[m]` entries; an emptied stack loses its key.
#[derive(Debug, Clone)]
pub struct Subproblem {
    /// Output attribute groups still owed, with multiplicity.
    pub z: Multiset<AttrSet>,
    /// Monotonicity demands (conditional and unconditional).
    pub d: Multiset<Monotonicity>,
    /// Tables backing unconditional demands.
    pub tables: BTreeMap<Monotonicity, TableStack>,
    /// Dictionaries backing conditional demands.
    pub dicts: BTreeMap<Monotonicity, DictStack>,
    /// Split witnesses.
    pub m: Multiset<Monotonicity>,
    /// Partition witnesses.
    pub s: Multiset<Submodularity>,
    /// Global size bound.
    pub bound: f64,
}

impl Subproblem {
    pub fn new(
        z: Multiset<AttrSet>,
        d: Multiset<Monotonicity>,
        tables: BTreeMap<Monotonicity, TableStack>,
        dicts: BTreeMap<Monotonicity, DictStack>,
        m: Multiset<Monotonicity>,
        s: Multiset<Submodularity>,
        bound: f64,
    ) -> Subproblem {
        Subproblem {
            z,
            d,
            tables,
            dicts,
            m,
            s,
            bound,
        }
    }

    /// Push a table for `mon`, creating the stack if absent.
    pub fn push_table(&mut self, mon: Monotonicity, table: Table, degree: f64) {
        self.tables.entry(mon).or_default().push((table, degree));
    }

    /// Pop the most recent table for `mon`; the key disappears when its
    /// stack empties.
    pub fn pop_table(&mut self, mon: &Monotonicity) -> Option<(Table, f64)> {
        let stack = self.tables.get_mut(mon)?;
        let entry = stack.pop();
        if stack.is_empty() {
            self.tables.remove(mon);
        }
        entry
    }

    /// Push a dictionary for `mon`, creating the stack if absent.
    pub fn push_dict(&mut self, mon: Monotonicity, dict: DictValue, degree: f64) {
        self.dicts.entry(mon).or_default().push((dict, degree));
    }

    /// Pop the most recent dictionary for `mon`; the key disappears when
    /// its stack empties.
    pub fn pop_dict(&mut self, mon: &Monotonicity) -> Option<(DictValue, f64)> {
        let stack = self.dicts.get_mut(mon)?;
        let entry = stack.pop();
        if stack.is_empty() {
            self.dicts.remove(mon);
        }
        entry
    }

    /// The oldest table for `mon` (the entry witness assembly reads).
    pub fn first_table(&self, mon: &Monotonicity) -> Option<&Table> {
        self.tables.get(mon)?.first().map(|(table, _)| table)
    }

    /// Unconditional demands in deterministic (key) order.
    pub fn unconditional_demands(&self) -> Vec<Monotonicity> {
        self.d
            .keys()
            .filter(|mon| mon.is_unconditional())
            .copied()
            .collect()
    }

    /// Total proof size `|D| + |M| + |S|` (with multiplicity); the
    /// well-founded measure behind the reset recursion.
    pub fn proof_size(&self) -> usize {
        self.d.total() + self.m.total() + self.s.total()
    }

    /// Compact top-level shape, used in error context and log events.
    pub fn shape(&self) -> String {
        format!(
            "Z={} D={} M={} S={} B={}",
            self.z.total(),
            self.d.total(),
            self.m.total(),
            self.s.total(),
            self.bound
        )
    }
}

// Identity is the proof shape; materialized relations are payload carried
// along with it.
impl PartialEq for Subproblem {
    fn eq(&self, other: &Subproblem) -> bool {
        self.z == other.z
            && self.d == other.d
            && self.m == other.m
            && self.s == other.s
            && self.bound.to_bits() == other.bound.to_bits()
    }
}

impl Eq for Subproblem {}

impl Hash for Subproblem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.z.hash(state);
        self.d.hash(state);
        self.m.hash(state);
        self.s.hash(state);
        self.bound.to_bits().hash(state);
    }
}

impl fmt::Display for Subproblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "subproblem [{}]", self.shape())?;
        for (attrs, count) in self.z.iter() {
            writeln!(f, "  Z {attrs} x{count}")?;
        }
        for (mon, count) in self.d.iter() {
            writeln!(f, "  D {mon} x{count}")?;
        }
        for (mon, stack) in &self.tables {
            writeln!(f, "  T {mon} [{} tables]", stack.len())?;
        }
        for (mon, stack) in &self.dicts {
            writeln!(f, "  T' {mon} [{} dicts]", stack.len())?;
        }
        for (mon, count) in self.m.iter() {
            writeln!(f, "  M {mon} x{count}")?;
        }
        for (sub, count) in self.s.iter() {
            writeln!(f, "  S {sub} x{count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttrSet;

    fn mask(bits: &[usize]) -> AttrSet {
        bits.iter().fold(AttrSet::EMPTY, |m, &b| m | AttrSet::single(b))
    }

    fn empty() -> Subproblem {
        Subproblem::new(
            Multiset::new(),
            Multiset::new(),
            BTreeMap::new(),
            BTreeMap::new(),
            Multiset::new(),
            Multiset::new(),
            10.0,
        )
    }

    #[test]
    fn test_table_stack_is_lifo_and_drops_key() {
        let mut p = empty();
        let mon = Monotonicity::unconditional(mask(&[0]));
        let t1 = Table::new(mask(&[0]));
        let t2 = Table::new(mask(&[0]));
        p.push_table(mon, t1, 1.0);
        p.push_table(mon, t2, 2.0);

        let (_, degree) = p.pop_table(&mon).unwrap();
        assert_eq!(degree, 2.0);
        let (_, degree) = p.pop_table(&mon).unwrap();
        assert_eq!(degree, 1.0);
        assert!(p.pop_table(&mon).is_none());
        assert!(!p.tables.contains_key(&mon));
    }

    #[test]
    fn test_first_table_reads_oldest_entry() {
        let mut p = empty();
        let mon = Monotonicity::unconditional(mask(&[0]));
        let mut oldest = Table::new(mask(&[0]));
        oldest
            .insert(crate::relation::Row::new(vec![Some(crate::value::Value::Int(1))]))
            .unwrap();
        p.push_table(mon, oldest.clone(), 1.0);
        p.push_table(mon, Table::new(mask(&[0])), 0.0);
        assert_eq!(p.first_table(&mon), Some(&oldest));
    }

    #[test]
    fn test_unconditional_demands_are_filtered_and_ordered() {
        let mut p = empty();
        p.d.increment(Monotonicity::new(mask(&[2]), mask(&[1])));
        p.d.increment(Monotonicity::unconditional(mask(&[3])));
        p.d.increment(Monotonicity::unconditional(mask(&[0])));
        let demands = p.unconditional_demands();
        assert_eq!(
            demands,
            vec![
                Monotonicity::unconditional(mask(&[0])),
                Monotonicity::unconditional(mask(&[3])),
            ]
        );
    }

    #[test]
    fn test_identity_ignores_payload() {
        let mut a = empty();
        let mut b = empty();
        let mon = Monotonicity::unconditional(mask(&[0]));
        a.d.increment(mon);
        b.d.increment(mon);
        a.push_table(mon, Table::new(mask(&[0])), 1.0);
        assert_eq!(a, b);
    }
}
