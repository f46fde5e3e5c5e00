//! Tables: sets of rows over one attribute mask.
//!
//! Row storage is insertion-ordered ([`IndexSet`]) so that every iteration
//! the rewriting procedure performs, in particular the dyadic degree
//! partition, is reproducible across runs on the same input.

use indexmap::IndexMap;
use indexmap::IndexSet;

use crate::relation::error::{AlgebraError, AlgebraResult};
use crate::relation::row::Row;
use crate::schema::AttrSet;

/// A set of rows sharing one attribute mask.
///
/// Invariant: every row carries values exactly on `attrs`.
#[derive(Debug, Clone, Default)]
pub struct Table {
    attrs: AttrSet,
    rows: IndexSet<Row>,
}

impl Table {
    pub fn new(attrs: AttrSet) -> Table {
        Table {
            attrs,
            rows: IndexSet::new(),
        }
    }

    /// Build a table from rows, checking each row's presence mask.
    pub fn from_rows<I>(attrs: AttrSet, rows: I) -> AlgebraResult<Table>
    where
        I: IntoIterator<Item = Row>,
    {
        let mut table = Table::new(attrs);
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }

    pub fn attrs(&self) -> AttrSet {
        self.attrs
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, row: &Row) -> bool {
        self.rows.contains(row)
    }

    /// Iterate rows in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Insert a row; duplicates collapse. Returns whether the row was new.
    pub fn insert(&mut self, row: Row) -> AlgebraResult<bool> {
        let presence = row.presence();
        if presence != self.attrs {
            return Err(AlgebraError::RowShapeMismatch {
                expected: self.attrs,
                found: presence,
            });
        }
        Ok(self.rows.insert(row))
    }

    /// Project onto `attrs`; duplicates collapse. Requires
    /// `attrs ⊆ self.attrs`.
    pub fn project(&self, attrs: AttrSet) -> AlgebraResult<Table> {
        if !attrs.is_subset(self.attrs) {
            return Err(AlgebraError::NotSubset {
                wanted: attrs,
                have: self.attrs,
            });
        }
        let mut rows = IndexSet::with_capacity(self.rows.len());
        for row in &self.rows {
            rows.insert(row.mask(attrs));
        }
        Ok(Table { attrs, rows })
    }

    /// Absorb another table's rows in place. Requires equal masks.
    pub fn absorb(&mut self, other: Table) -> AlgebraResult<()> {
        if other.attrs != self.attrs {
            return Err(AlgebraError::AttrMismatch {
                expected: self.attrs,
                found: other.attrs,
            });
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Dyadic degree partition by the key mask `x`.
    ///
    /// Rows are grouped by their `x`-projection; a group of degree `d` lands
    /// in bucket `⌈log₂ d⌉`, and each bucket is split in two by position
    /// parity, so every output table restricted to any key has degree within
    /// a factor of two of any other row of its bucket. With
    /// `B = 2⌈log₂|T|⌉ + 1` buckets the output count is at most `2B`.
    ///
    /// Groups are expanded in ascending (stable row hash, first-insertion)
    /// key order, which pins down the parity split across runs.
    pub fn partition(&self, x: AttrSet) -> AlgebraResult<Vec<Table>> {
        if !x.is_subset(self.attrs) {
            return Err(AlgebraError::NotSubset {
                wanted: x,
                have: self.attrs,
            });
        }
        if self.rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut groups: IndexMap<Row, Vec<Row>> = IndexMap::new();
        for row in &self.rows {
            groups.entry(row.mask(x)).or_default().push(row.clone());
        }

        let bucket_count = 2 * log2_ceil(self.rows.len()) + 1;
        let mut ordered: Vec<(u64, usize, Vec<Row>)> = groups
            .into_iter()
            .enumerate()
            .map(|(i, (key, group))| (key.stable_hash(), i, group))
            .collect();
        ordered.sort_by_key(|&(hash, index, _)| (hash, index));

        let mut buckets: Vec<Vec<Row>> = vec![Vec::new(); bucket_count];
        for (_, _, group) in ordered {
            let bucket = log2_ceil(group.len());
            buckets[bucket].extend(group);
        }

        let mut parts = Vec::new();
        for bucket in buckets {
            let mut even = Table::new(self.attrs);
            let mut odd = Table::new(self.attrs);
            for (j, row) in bucket.into_iter().enumerate() {
                let target = if j % 2 == 0 { &mut even } else { &mut odd };
                target.rows.insert(row);
            }
            if !even.is_empty() {
                parts.push(even);
            }
            if !odd.is_empty() {
                parts.push(odd);
            }
        }
        Ok(parts)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Table) -> bool {
        self.attrs == other.attrs && self.rows == other.rows
    }
}

impl Eq for Table {}

/// `⌈log₂ n⌉` for `n ≥ 1`.
fn log2_ceil(n: usize) -> usize {
    debug_assert!(n > 0);
    (usize::BITS - (n - 1).leading_zeros()) as usize
}
