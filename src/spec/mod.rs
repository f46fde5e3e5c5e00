//! # Problem Spec Loader
//!
//! The boundary between the YAML problem document plus its CSV relations
//! and the core engine. A spec document supplies:
//!
//! ```yaml
//! GlobalSchema: ["a:int", "b:double", "c:string"]
//! OutputAttributes:
//!   - [a, b]
//!   - [b, c]
//! Tables:
//!   - [r1.csv, 3, 0.5]
//!   - [r2.csv, 3, 0.5]
//! M:
//!   - [[a], [b], 1]
//! S:
//!   - [[a], [c], [b], 1]
//! ```
//!
//! `GlobalSchema` entries are `name:type` with types `int`, `double`,
//! `string`, `bool`; attribute `i` of the list is bit `i` of every mask.
//! Each `Tables` entry names a CSV file (its header resolved against the
//! global schema), a degree constraint and a weight; the global bound is
//! the product of `constraint^weight` over all tables. `M` rows are
//! `[Y, X, count]`, `S` rows are `[Y, Z, X, count]`.
//!
//! Loading produces the initial [`Subproblem`]: tables stacked under their
//! unconditional monotonicities, `D` seeded from the table multiplicities,
//! dictionaries empty, `Z`/`M`/`S` from the document.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::proof::{Monotonicity, Multiset, Submodularity, Subproblem};
use crate::relation::{AlgebraError, Row, Table};
use crate::schema::{AttrSet, Schema, SchemaError};
use crate::storage::csv::{read_csv, CsvError};
use crate::value::{DataType, ParseValueError, Value};

/// Boundary errors: anything wrong with the spec document or its CSVs.
#[derive(Debug, Error)]
pub enum SpecError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Schema construction failed
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// CSV reading failed
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// A schema entry is not `name:type`
    #[error("malformed schema entry {entry:?}, expected \"name:type\"")]
    BadSchemaEntry { entry: String },

    /// A CSV header column is not in the global schema
    #[error("{file}: column {column:?} not found in global schema")]
    UnknownColumn { file: String, column: String },

    /// A cell failed to parse as its declared column type
    #[error("{file}: row {line}, column {column:?}: {source}")]
    BadValue {
        file: String,
        line: usize,
        column: String,
        source: ParseValueError,
    },

    /// A monotonicity or submodularity term with overlapping masks
    #[error("term masks must be disjoint in {context}")]
    OverlappingMasks { context: String },

    /// A loaded table violated a relation invariant
    #[error("malformed table: {0}")]
    Malformed(#[from] AlgebraError),
}

/// Raw YAML document, keys as the spec format defines them.
#[derive(Debug, Deserialize)]
struct RawSpec {
    #[serde(rename = "GlobalSchema")]
    global_schema: Vec<String>,

    #[serde(rename = "OutputAttributes")]
    output_attributes: Vec<Vec<String>>,

    #[serde(rename = "Tables")]
    tables: Vec<(String, f64, f64)>,

    #[serde(rename = "M", default)]
    monotonicities: Vec<(Vec<String>, Vec<String>, u32)>,

    #[serde(rename = "S", default)]
    submodularities: Vec<(Vec<String>, Vec<String>, Vec<String>, u32)>,
}

/// A fully-loaded problem: the schema and the initial subproblem.
#[derive(Debug, Clone)]
pub struct Problem {
    pub schema: Schema,
    pub subproblem: Subproblem,
}

/// Load a problem: the YAML document `spec_file` under `spec_dir`, with its
/// CSV relations resolved against `tables_dir`.
pub fn load_problem(
    spec_dir: &Path,
    spec_file: &str,
    tables_dir: &Path,
) -> Result<Problem, SpecError> {
    let text = std::fs::read_to_string(spec_dir.join(spec_file))?;
    let raw: RawSpec = serde_yaml::from_str(&text)?;

    let schema = parse_schema(&raw.global_schema)?;

    let mut tables: BTreeMap<Monotonicity, Vec<(Table, f64)>> = BTreeMap::new();
    let mut bound = 1.0f64;
    for (file, constraint, weight) in &raw.tables {
        let (attrs, table) = load_table(&tables_dir.join(file), &schema)?;
        debug!(file = %file, rows = table.len(), constraint, weight, "table_loaded");
        let mon = Monotonicity::unconditional(attrs);
        tables.entry(mon).or_default().push((table, *constraint));
        bound *= constraint.powf(*weight);
    }

    let mut d = Multiset::new();
    for (&mon, stack) in &tables {
        d.increment_by(mon, stack.len() as u32);
    }

    let mut z = Multiset::new();
    for group in &raw.output_attributes {
        let mask = schema.mask_of(group.iter().map(String::as_str))?;
        z.increment(mask);
    }

    let mut m = Multiset::new();
    for (y_cols, x_cols, count) in &raw.monotonicities {
        let attrs_y = schema.mask_of(y_cols.iter().map(String::as_str))?;
        let attrs_x = schema.mask_of(x_cols.iter().map(String::as_str))?;
        if !attrs_y.is_disjoint(attrs_x) {
            return Err(SpecError::OverlappingMasks {
                context: format!("M entry {attrs_y} | {attrs_x}"),
            });
        }
        m.increment_by(Monotonicity::new(attrs_y, attrs_x), *count);
    }

    let mut s = Multiset::new();
    for (y_cols, z_cols, x_cols, count) in &raw.submodularities {
        let attrs_y = schema.mask_of(y_cols.iter().map(String::as_str))?;
        let attrs_z = schema.mask_of(z_cols.iter().map(String::as_str))?;
        let attrs_x = schema.mask_of(x_cols.iter().map(String::as_str))?;
        if !attrs_y.is_disjoint(attrs_z)
            || !attrs_y.is_disjoint(attrs_x)
            || !attrs_z.is_disjoint(attrs_x)
        {
            return Err(SpecError::OverlappingMasks {
                context: format!("S entry {attrs_y} ; {attrs_z} | {attrs_x}"),
            });
        }
        s.increment_by(Submodularity::new(attrs_y, attrs_z, attrs_x), *count);
    }

    info!(
        tables = raw.tables.len(),
        outputs = z.total(),
        bound,
        "spec_loaded"
    );

    let subproblem = Subproblem::new(z, d, tables, BTreeMap::new(), m, s, bound);
    Ok(Problem { schema, subproblem })
}

/// Parse `name:type` schema entries into a [`Schema`].
fn parse_schema(entries: &[String]) -> Result<Schema, SpecError> {
    let mut attrs = Vec::with_capacity(entries.len());
    for entry in entries {
        let (name, ty_name) = entry.split_once(':').ok_or_else(|| SpecError::BadSchemaEntry {
            entry: entry.clone(),
        })?;
        let ty = DataType::parse_name(ty_name.trim()).ok_or_else(|| SpecError::BadSchemaEntry {
            entry: entry.clone(),
        })?;
        attrs.push((name.trim().to_string(), ty));
    }
    Ok(Schema::new(attrs)?)
}

/// Load one CSV relation: resolve the header against the schema, parse
/// every cell by its column's declared type.
fn load_table(path: &Path, schema: &Schema) -> Result<(AttrSet, Table), SpecError> {
    let file_name = path.display().to_string();
    let (header, records) = read_csv(path)?;

    let mut columns = Vec::with_capacity(header.len());
    let mut attrs = AttrSet::EMPTY;
    for column in &header {
        let bit = schema
            .resolve(column)
            .map_err(|_| SpecError::UnknownColumn {
                file: file_name.clone(),
                column: column.clone(),
            })?;
        columns.push(bit);
        attrs |= AttrSet::single(bit);
    }

    let mut rows = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let mut cells: Vec<Option<Value>> = vec![None; schema.width()];
        for (&bit, text) in columns.iter().zip(record) {
            let value = schema.attr_type(bit).parse_text(text).map_err(|source| {
                SpecError::BadValue {
                    file: file_name.clone(),
                    line: i + 2,
                    column: schema.attr_name(bit).to_string(),
                    source,
                }
            })?;
            cells[bit] = Some(value);
        }
        rows.push(Row::new(cells));
    }

    let table = Table::from_rows(attrs, rows)?;
    Ok((attrs, table))
}
