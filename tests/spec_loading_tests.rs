//! Spec Loading Tests
//!
//! Boundary coverage: YAML documents plus CSV relations through the loader,
//! and the full pipeline from files to witness relations.

use std::fs;
use std::path::Path;

use panda::engine::{Engine, EngineLimits};
use panda::proof::{Monotonicity, Submodularity};
use panda::schema::AttrSet;
use panda::spec::{load_problem, SpecError};
use panda::value::DataType;

fn attrs(bits: &[usize]) -> AttrSet {
    bits.iter().fold(AttrSet::EMPTY, |m, &b| m | AttrSet::single(b))
}

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

const TRIANGLE_SPEC: &str = r#"
GlobalSchema: ["a:int", "b:double", "c:string", "d:int"]
OutputAttributes:
  - [a, b, c]
  - [b, c, d]
Tables:
  - [t1.csv, 3, 0.5]
  - [t2.csv, 3, 0.5]
  - [t3.csv, 3, 0.5]
M: []
S:
  - [[a], [c], [b], 1]
  - [[b], [c, d], [], 1]
"#;

fn write_triangle(dir: &Path) {
    write(dir, "triangle.yaml", TRIANGLE_SPEC);
    write(dir, "t1.csv", "a,b\n0,0.0\n1,2.0\n2,4.0\n");
    write(dir, "t2.csv", "b,c\n0.0,x\n2.0,y\n4.0,z\n");
    write(dir, "t3.csv", "c,d\nx,10\ny,20\nz,30\n");
}

#[test]
fn test_load_triangle_spec() {
    let dir = tempfile::tempdir().unwrap();
    write_triangle(dir.path());

    let problem = load_problem(dir.path(), "triangle.yaml", dir.path()).unwrap();
    let schema = &problem.schema;
    let p = &problem.subproblem;

    assert_eq!(schema.width(), 4);
    assert_eq!(schema.attr_type(1), DataType::Double);
    assert_eq!(schema.attr_type(2), DataType::Str);

    // Bound is the weighted product of the table constraints.
    assert!((p.bound - 3f64.powf(1.5)).abs() < 1e-9);

    // One table per input relation, D seeded from multiplicities.
    for mask in [attrs(&[0, 1]), attrs(&[1, 2]), attrs(&[2, 3])] {
        let mon = Monotonicity::unconditional(mask);
        assert_eq!(p.d.count(&mon), 1);
        assert_eq!(p.tables[&mon].len(), 1);
        assert_eq!(p.tables[&mon][0].0.len(), 3);
        assert_eq!(p.tables[&mon][0].1, 3.0);
    }
    assert!(p.dicts.is_empty());

    assert_eq!(p.z.count(&attrs(&[0, 1, 2])), 1);
    assert_eq!(p.z.count(&attrs(&[1, 2, 3])), 1);
    assert!(p.m.is_empty());
    assert_eq!(
        p.s.count(&Submodularity::new(attrs(&[0]), attrs(&[2]), attrs(&[1]))),
        1
    );
    assert_eq!(
        p.s.count(&Submodularity::new(attrs(&[1]), attrs(&[2, 3]), AttrSet::EMPTY)),
        1
    );
}

#[test]
fn test_pipeline_from_files_to_witness() {
    let dir = tempfile::tempdir().unwrap();
    write_triangle(dir.path());

    let problem = load_problem(dir.path(), "triangle.yaml", dir.path()).unwrap();
    let witness = Engine::new(EngineLimits::default())
        .run(&problem.subproblem)
        .unwrap();

    let mon_abc = Monotonicity::unconditional(attrs(&[0, 1, 2]));
    let abc = witness.get(&mon_abc).expect("ABC witness missing");
    assert_eq!(abc.len(), 3);
    for mon in witness.keys() {
        assert!(problem.subproblem.z.contains(&mon.attrs_y));
    }
}

#[test]
fn test_duplicate_output_groups_become_counts() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "spec.yaml",
        r#"
GlobalSchema: ["a:int", "b:int"]
OutputAttributes:
  - [a, b]
  - [b, a]
Tables:
  - [t.csv, 4, 1.0]
"#,
    );
    write(dir.path(), "t.csv", "a,b\n1,2\n");

    let problem = load_problem(dir.path(), "spec.yaml", dir.path()).unwrap();
    assert_eq!(problem.subproblem.z.count(&attrs(&[0, 1])), 2);
    assert_eq!(problem.subproblem.bound, 4.0);
}

#[test]
fn test_unknown_csv_column() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "spec.yaml",
        "GlobalSchema: [\"a:int\"]\nOutputAttributes: [[a]]\nTables: [[t.csv, 2, 1.0]]\n",
    );
    write(dir.path(), "t.csv", "a,zz\n1,2\n");

    let err = load_problem(dir.path(), "spec.yaml", dir.path()).unwrap_err();
    assert!(matches!(err, SpecError::UnknownColumn { column, .. } if column == "zz"));
}

#[test]
fn test_bad_typed_value() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "spec.yaml",
        "GlobalSchema: [\"a:int\"]\nOutputAttributes: [[a]]\nTables: [[t.csv, 2, 1.0]]\n",
    );
    write(dir.path(), "t.csv", "a\n1\nnot_a_number\n");

    let err = load_problem(dir.path(), "spec.yaml", dir.path()).unwrap_err();
    assert!(matches!(err, SpecError::BadValue { line: 3, .. }));
}

#[test]
fn test_malformed_schema_entry() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "spec.yaml",
        "GlobalSchema: [\"a\"]\nOutputAttributes: [[a]]\nTables: []\n",
    );

    let err = load_problem(dir.path(), "spec.yaml", dir.path()).unwrap_err();
    assert!(matches!(err, SpecError::BadSchemaEntry { .. }));
}

#[test]
fn test_unknown_output_column() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "spec.yaml",
        "GlobalSchema: [\"a:int\"]\nOutputAttributes: [[zz]]\nTables: []\n",
    );

    let err = load_problem(dir.path(), "spec.yaml", dir.path()).unwrap_err();
    assert!(matches!(err, SpecError::Schema(_)));
}

#[test]
fn test_overlapping_term_masks() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "spec.yaml",
        r#"
GlobalSchema: ["a:int", "b:int"]
OutputAttributes: [[a]]
Tables: []
M:
  - [[a], [a, b], 1]
"#,
    );

    let err = load_problem(dir.path(), "spec.yaml", dir.path()).unwrap_err();
    assert!(matches!(err, SpecError::OverlappingMasks { .. }));
}

#[test]
fn test_ragged_csv_row() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "spec.yaml",
        "GlobalSchema: [\"a:int\", \"b:int\"]\nOutputAttributes: [[a]]\nTables: [[t.csv, 2, 1.0]]\n",
    );
    write(dir.path(), "t.csv", "a,b\n1,2\n3\n");

    let err = load_problem(dir.path(), "spec.yaml", dir.path()).unwrap_err();
    assert!(matches!(err, SpecError::Csv(_)));
}

#[test]
fn test_oversized_schema_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let columns: Vec<String> = (0..65).map(|i| format!("\"c{i}:int\"")).collect();
    let spec = format!(
        "GlobalSchema: [{}]\nOutputAttributes: [[c0]]\nTables: []\n",
        columns.join(", ")
    );
    write(dir.path(), "spec.yaml", &spec);

    let err = load_problem(dir.path(), "spec.yaml", dir.path()).unwrap_err();
    assert!(matches!(err, SpecError::Schema(_)));
}
