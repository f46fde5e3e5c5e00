//! Rewrite Tests
//!
//! Structural-diff checks for the three case rewrites and the reset lemma:
//! each scenario compares the child subproblem against its parent by
//! per-key signed count differences and asserts the expected diff and no
//! other change.

use std::collections::BTreeMap;

use panda::engine::EngineLimits;
use panda::proof::{Monotonicity, Multiset, Submodularity, Subproblem};
use panda::relation::{DictValue, Dictionary, Row, Table};
use panda::rewrite::{apply_condition, apply_partition, apply_split, find_condition, find_partition, find_split};
use panda::schema::AttrSet;
use panda::value::Value;

fn attrs(bits: &[usize]) -> AttrSet {
    bits.iter().fold(AttrSet::EMPTY, |m, &b| m | AttrSet::single(b))
}

fn int_row(width: usize, cells: &[(usize, i64)]) -> Row {
    let mut data = vec![None; width];
    for &(i, v) in cells {
        data[i] = Some(Value::Int(v));
    }
    Row::new(data)
}

fn empty_subproblem(bound: f64) -> Subproblem {
    Subproblem::new(
        Multiset::new(),
        Multiset::new(),
        BTreeMap::new(),
        BTreeMap::new(),
        Multiset::new(),
        Multiset::new(),
        bound,
    )
}

/// Signed count differences between two multisets; zero entries dropped.
fn multiset_diff<T: Ord + Copy>(before: &Multiset<T>, after: &Multiset<T>) -> BTreeMap<T, i64> {
    let mut diff = BTreeMap::new();
    for (key, count) in before.iter() {
        diff.insert(*key, -(i64::from(count)));
    }
    for (key, count) in after.iter() {
        let entry = diff.entry(*key).or_insert(0);
        *entry += i64::from(count);
    }
    diff.retain(|_, v| *v != 0);
    diff
}

/// Signed stack-length differences between two table/dict maps.
fn stack_diff<V>(
    before: &BTreeMap<Monotonicity, Vec<V>>,
    after: &BTreeMap<Monotonicity, Vec<V>>,
) -> BTreeMap<Monotonicity, i64> {
    let mut diff = BTreeMap::new();
    for (key, stack) in before {
        diff.insert(*key, -(stack.len() as i64));
    }
    for (key, stack) in after {
        let entry = diff.entry(*key).or_insert(0);
        *entry += stack.len() as i64;
    }
    diff.retain(|_, v| *v != 0);
    diff
}

fn diff_of<T: Ord + Copy>(entries: &[(T, i64)]) -> BTreeMap<T, i64> {
    entries.iter().copied().collect()
}

/// A `W`-table of `n` distinct single-column rows (column `bit`).
fn key_table(bit: usize, n: i64) -> Table {
    Table::from_rows(attrs(&[bit]), (0..n).map(|i| int_row(3, &[(bit, i)]))).unwrap()
}

/// A plain dictionary `Y | W` mapping each of `n` keys (column `key_bit`)
/// to `per_key` values (column `val_bit`).
fn fanout_dict(key_bit: usize, val_bit: usize, n: i64, per_key: i64) -> Dictionary {
    let rows = (0..n).flat_map(|k| {
        (0..per_key).map(move |v| int_row(3, &[(key_bit, k), (val_bit, 100 + 10 * k + v)]))
    });
    let table = Table::from_rows(attrs(&[key_bit, val_bit]), rows).unwrap();
    Dictionary::construction(&table, attrs(&[key_bit]), attrs(&[val_bit])).unwrap()
}

/// Condition scenario fixture: demands `W|∅` and `Y|W` with the given
/// degrees and bound. W = {0}, Y = {1}.
fn condition_fixture(n_w: f64, n_y_w: f64, bound: f64) -> (Subproblem, Monotonicity, Monotonicity) {
    let w = attrs(&[0]);
    let y = attrs(&[1]);
    let mon_w = Monotonicity::unconditional(w);
    let mon_y_w = Monotonicity::new(y, w);

    let mut p = empty_subproblem(bound);
    p.d.increment(mon_w);
    p.d.increment(mon_y_w);
    p.push_table(mon_w, key_table(0, 3), n_w);
    p.push_dict(mon_y_w, DictValue::Plain(fanout_dict(0, 1, 3, 2)), n_y_w);
    (p, mon_w, mon_y_w)
}

#[test]
fn test_condition_within_bound() {
    let (p, mon_w, mon_y_w) = condition_fixture(2.0, 2.0, 5.0);
    let mon_yw = Monotonicity::unconditional(attrs(&[0, 1]));

    assert_eq!(find_condition(&p, &mon_w), Some(mon_y_w));
    let children = apply_condition(&p, &mon_w, &mon_y_w, &EngineLimits::default()).unwrap();
    assert_eq!(children.len(), 1);
    let child = &children[0];

    assert_eq!(
        multiset_diff(&p.d, &child.d),
        diff_of(&[(mon_w, -1), (mon_y_w, -1), (mon_yw, 1)])
    );
    assert_eq!(
        stack_diff(&p.tables, &child.tables),
        diff_of(&[(mon_w, -1), (mon_yw, 1)])
    );
    assert_eq!(stack_diff(&p.dicts, &child.dicts), diff_of(&[(mon_y_w, -1)]));
    assert!(multiset_diff(&p.z, &child.z).is_empty());
    assert!(multiset_diff(&p.m, &child.m).is_empty());
    assert!(multiset_diff(&p.s, &child.s).is_empty());

    // The materialized table is the join: 3 keys x 2 values each.
    let joined = child.first_table(&mon_yw).unwrap();
    assert_eq!(joined.attrs(), attrs(&[0, 1]));
    assert_eq!(joined.len(), 6);
    assert!(joined.contains(&int_row(3, &[(0, 1), (1, 110)])));
}

#[test]
fn test_condition_exceeds_bound_reset_output_base() {
    // 4 * 3 > 10 and Y⊕W is an owed output: reset case R0 consumes it.
    let (mut p, mon_w, mon_y_w) = condition_fixture(4.0, 3.0, 10.0);
    let attrs_yw = attrs(&[0, 1]);
    p.z.increment(attrs_yw);

    let children = apply_condition(&p, &mon_w, &mon_y_w, &EngineLimits::default()).unwrap();
    assert_eq!(children.len(), 1);
    let child = &children[0];

    assert_eq!(multiset_diff(&p.z, &child.z), diff_of(&[(attrs_yw, -1)]));
    assert_eq!(
        multiset_diff(&p.d, &child.d),
        diff_of(&[(mon_w, -1), (mon_y_w, -1)])
    );
    assert_eq!(
        stack_diff(&p.tables, &child.tables),
        diff_of(&[(mon_w, -1)])
    );
    assert_eq!(stack_diff(&p.dicts, &child.dicts), diff_of(&[(mon_y_w, -1)]));
    assert!(multiset_diff(&p.m, &child.m).is_empty());
    assert!(multiset_diff(&p.s, &child.s).is_empty());

    // The joint table was never materialized.
    assert!(child.first_table(&Monotonicity::unconditional(attrs_yw)).is_none());
}

#[test]
fn test_condition_exceeds_bound_reset_split_inductive() {
    // Y⊕W = A⊕B with (B|A) in M and A owed: R2 then R0.
    let a = attrs(&[1]);
    let b = attrs(&[0, 2]);
    let w = attrs(&[1, 2]);
    let y = attrs(&[0]);
    let mon_w = Monotonicity::unconditional(w);
    let mon_y_w = Monotonicity::new(y, w);
    let mon_b_a = Monotonicity::new(b, a);

    let mut p = empty_subproblem(10.0);
    p.d.increment(mon_w);
    p.d.increment(mon_y_w);
    p.m.increment(mon_b_a);
    p.z.increment(a);

    let table_w = Table::from_rows(
        attrs(&[1, 2]),
        (0..4).map(|i| int_row(3, &[(1, i), (2, 2 * i)])),
    )
    .unwrap();
    p.push_table(mon_w, table_w, 4.0);

    // Dictionary (Y|W): every W-row maps to 3 Y-values.
    let full_rows = (0..4).flat_map(|i| {
        (0..3).map(move |j| int_row(3, &[(0, j), (1, i), (2, 2 * i)]))
    });
    let full = Table::from_rows(attrs(&[0, 1, 2]), full_rows).unwrap();
    let dict_y_w = Dictionary::construction(&full, w, y).unwrap();
    p.push_dict(mon_y_w, DictValue::Plain(dict_y_w), 3.0);

    let children = apply_condition(&p, &mon_w, &mon_y_w, &EngineLimits::default()).unwrap();
    assert_eq!(children.len(), 1);
    let child = &children[0];

    assert_eq!(multiset_diff(&p.z, &child.z), diff_of(&[(a, -1)]));
    assert_eq!(
        multiset_diff(&p.d, &child.d),
        diff_of(&[(mon_w, -1), (mon_y_w, -1)])
    );
    assert_eq!(multiset_diff(&p.m, &child.m), diff_of(&[(mon_b_a, -1)]));
    assert!(multiset_diff(&p.s, &child.s).is_empty());
    assert_eq!(
        stack_diff(&p.tables, &child.tables),
        diff_of(&[(mon_w, -1)])
    );
    assert_eq!(stack_diff(&p.dicts, &child.dicts), diff_of(&[(mon_y_w, -1)]));
}

#[test]
fn test_split() {
    let x = attrs(&[0]);
    let y = attrs(&[1]);
    let mon_xy = Monotonicity::unconditional(attrs(&[0, 1]));
    let mon_y_x = Monotonicity::new(y, x);
    let mon_x = Monotonicity::unconditional(x);

    let mut p = empty_subproblem(10.0);
    p.d.increment(mon_xy);
    p.m.increment(mon_y_x);
    let table_xy = Table::from_rows(
        attrs(&[0, 1]),
        (0..4).map(|i| int_row(3, &[(0, i), (1, 2 * i)])),
    )
    .unwrap();
    p.push_table(mon_xy, table_xy.clone(), 4.0);

    assert_eq!(find_split(&p, &mon_xy), Some(mon_y_x));
    let children = apply_split(&p, &mon_xy, &mon_y_x).unwrap();
    assert_eq!(children.len(), 1);
    let child = &children[0];

    assert_eq!(
        multiset_diff(&p.d, &child.d),
        diff_of(&[(mon_xy, -1), (mon_x, 1)])
    );
    assert_eq!(multiset_diff(&p.m, &child.m), diff_of(&[(mon_y_x, -1)]));
    assert!(multiset_diff(&p.z, &child.z).is_empty());
    assert!(multiset_diff(&p.s, &child.s).is_empty());
    assert_eq!(
        stack_diff(&p.tables, &child.tables),
        diff_of(&[(mon_xy, -1), (mon_x, 1)])
    );

    assert_eq!(
        child.first_table(&mon_x).unwrap(),
        &table_xy.project(x).unwrap()
    );
}

#[test]
fn test_partition() {
    let x = attrs(&[0]);
    let y = attrs(&[1]);
    let z = attrs(&[2]);
    let mon_xy = Monotonicity::unconditional(attrs(&[0, 1]));
    let sub_yz_x = Submodularity::new(y, z, x);
    let mon_x = Monotonicity::unconditional(x);
    let mon_y_xz = Monotonicity::new(y, attrs(&[0, 2]));

    let mut p = empty_subproblem(10.0);
    p.d.increment(mon_xy);
    p.s.increment(sub_yz_x);
    // Two keys with degree 3 each: one bucket, split by parity.
    let table_xy = Table::from_rows(
        attrs(&[0, 1]),
        (0..2).flat_map(|i| (0..3).map(move |j| int_row(3, &[(0, i), (1, j)]))),
    )
    .unwrap();
    p.push_table(mon_xy, table_xy.clone(), 4.0);

    assert_eq!(find_partition(&p, &mon_xy), Some(sub_yz_x));
    let children = apply_partition(&p, &mon_xy, &sub_yz_x).unwrap();
    assert_eq!(children.len(), 2);

    for child in &children {
        assert_eq!(
            multiset_diff(&p.d, &child.d),
            diff_of(&[(mon_xy, -1), (mon_x, 1), (mon_y_xz, 1)])
        );
        assert_eq!(multiset_diff(&p.s, &child.s), diff_of(&[(sub_yz_x, -1)]));
        assert!(multiset_diff(&p.m, &child.m).is_empty());
        assert!(multiset_diff(&p.z, &child.z).is_empty());
        assert_eq!(
            stack_diff(&p.tables, &child.tables),
            diff_of(&[(mon_xy, -1), (mon_x, 1)])
        );
        assert_eq!(
            stack_diff(&p.dicts, &child.dicts),
            diff_of(&[(mon_y_xz, 1)])
        );

        // The dictionary is the extension of the part's construction: its
        // keys are exactly the child's X-table rows.
        let part_x = child.first_table(&mon_x).unwrap();
        let (dict_value, degree) = &child.dicts[&mon_y_xz][0];
        let DictValue::Extended(ext) = dict_value else {
            panic!("expected an extended dictionary");
        };
        assert_eq!(ext.attrs_z(), z);
        assert_eq!(ext.base().attrs_y(), y);
        assert_eq!(ext.base().len(), part_x.len());
        assert_eq!(*degree, ext.degree() as f64);
        for key in part_x.iter() {
            assert!(ext.base().get(key).is_some());
        }
    }

    // Across children, the partition covers the original table.
    let mut covered = 0usize;
    for child in &children {
        let (dict_value, _) = &child.dicts[&mon_y_xz][0];
        let dict = dict_value.dictionary();
        let keys = child.first_table(&mon_x).unwrap();
        covered += dict.join(keys).unwrap().len();
    }
    assert_eq!(covered, table_xy.len());
}
