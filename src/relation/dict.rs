//! Dictionaries: key-indexed relations and the operators over them.
//!
//! A [`Dictionary`] maps X-rows to sets of Y-rows over disjoint masks; an
//! [`ExtendedDictionary`] additionally names a Z mask and represents the
//! conditional dependency of Y on X ⊕ Z without carrying any Z data. The
//! extension shares the backing map with its parent by reference count;
//! backing maps are read-only once a dictionary has been handed to any
//! subproblem.

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::relation::error::{AlgebraError, AlgebraResult};
use crate::relation::row::Row;
use crate::relation::table::Table;
use crate::schema::AttrSet;

/// Backing storage: X-row → set of Y-rows, insertion-ordered.
pub type DictMap = IndexMap<Row, IndexSet<Row>>;

/// A mapping from X-rows to sets of Y-rows.
///
/// Keys carry values exactly on `attrs_x`, values exactly on `attrs_y`;
/// the two masks are disjoint.
#[derive(Debug, Clone)]
pub struct Dictionary {
    map: Arc<DictMap>,
    attrs_x: AttrSet,
    attrs_y: AttrSet,
}

impl Dictionary {
    /// Index `table` by `x`: each row is split into its X- and Y-parts and
    /// grouped by the former. Requires `x ∩ y = ∅` and `x ⊕ y = table.attrs`.
    pub fn construction(table: &Table, x: AttrSet, y: AttrSet) -> AlgebraResult<Dictionary> {
        if !x.is_disjoint(y) {
            return Err(AlgebraError::NotDisjoint { left: x, right: y });
        }
        if x ^ y != table.attrs() {
            return Err(AlgebraError::CoverMismatch {
                x,
                y,
                have: table.attrs(),
            });
        }
        let mut map = DictMap::new();
        for row in table.iter() {
            map.entry(row.mask(x)).or_default().insert(row.mask(y));
        }
        Ok(Dictionary {
            map: Arc::new(map),
            attrs_x: x,
            attrs_y: y,
        })
    }

    pub fn attrs_x(&self) -> AttrSet {
        self.attrs_x
    }

    pub fn attrs_y(&self) -> AttrSet {
        self.attrs_y
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &Row) -> Option<&IndexSet<Row>> {
        self.map.get(key)
    }

    /// Maximum value-set size over all keys; 0 if empty.
    pub fn degree(&self) -> usize {
        self.map.values().map(IndexSet::len).max().unwrap_or(0)
    }

    /// The shared backing map, for aliasing checks.
    pub fn backing(&self) -> &Arc<DictMap> {
        &self.map
    }

    /// Extend by a free attribute set `z` disjoint from X ∪ Y. The backing
    /// map is shared, not copied.
    pub fn extend(&self, z: AttrSet) -> AlgebraResult<ExtendedDictionary> {
        if !z.is_disjoint(self.attrs_x | self.attrs_y) {
            return Err(AlgebraError::NotDisjoint {
                left: z,
                right: self.attrs_x | self.attrs_y,
            });
        }
        Ok(ExtendedDictionary {
            base: self.clone(),
            attrs_z: z,
        })
    }

    /// Join a table of X-rows: for every row that is a key, emit the merge
    /// with each of its Y-rows. Requires `table.attrs = attrs_x`.
    pub fn join(&self, table: &Table) -> AlgebraResult<Table> {
        if table.attrs() != self.attrs_x {
            return Err(AlgebraError::AttrMismatch {
                expected: self.attrs_x,
                found: table.attrs(),
            });
        }
        join_by_key(table, self, self.attrs_x)
    }
}

// Shared join loop: rows of `table` are matched by their projection onto
// `key_attrs` (the backing key mask) and merged with every Y-row found.
fn join_by_key(table: &Table, dict: &Dictionary, key_attrs: AttrSet) -> AlgebraResult<Table> {
    let mut joined = Table::new(table.attrs() ^ dict.attrs_y);
    for row in table.iter() {
        let key = if table.attrs() == key_attrs {
            row.clone()
        } else {
            row.mask(key_attrs)
        };
        if let Some(matches) = dict.get(&key) {
            for row_y in matches {
                let merged = Row::merge(row, row_y, table.attrs(), dict.attrs_y)?;
                joined.insert(merged)?;
            }
        }
    }
    Ok(joined)
}

/// A dictionary whose Y-side is conditioned on X ⊕ Z; carries no Z data.
#[derive(Debug, Clone)]
pub struct ExtendedDictionary {
    base: Dictionary,
    attrs_z: AttrSet,
}

impl ExtendedDictionary {
    pub fn attrs_z(&self) -> AttrSet {
        self.attrs_z
    }

    pub fn base(&self) -> &Dictionary {
        &self.base
    }

    pub fn degree(&self) -> usize {
        self.base.degree()
    }

    /// Join a table over the represented condition `X ⊕ Z`. The Z
    /// attributes are free: lookup uses only the X-projection of each row,
    /// so the result is the table extended by every matching Y-row.
    /// Requires `table.attrs = attrs_x ⊕ attrs_z`.
    pub fn join(&self, table: &Table) -> AlgebraResult<Table> {
        let expected = self.base.attrs_x ^ self.attrs_z;
        if table.attrs() != expected {
            return Err(AlgebraError::AttrMismatch {
                expected,
                found: table.attrs(),
            });
        }
        join_by_key(table, &self.base, self.base.attrs_x)
    }
}

/// The two dictionary shapes a subproblem can hold.
#[derive(Debug, Clone)]
pub enum DictValue {
    Plain(Dictionary),
    Extended(ExtendedDictionary),
}

impl DictValue {
    /// The plain X→Y view, whichever arm this is.
    pub fn dictionary(&self) -> &Dictionary {
        match self {
            DictValue::Plain(dict) => dict,
            DictValue::Extended(ext) => ext.base(),
        }
    }

    /// The condition mask this value represents: `X` for a plain
    /// dictionary, `X ⊕ Z` for an extended one.
    pub fn attrs_x(&self) -> AttrSet {
        match self {
            DictValue::Plain(dict) => dict.attrs_x(),
            DictValue::Extended(ext) => ext.base().attrs_x() ^ ext.attrs_z(),
        }
    }

    pub fn attrs_y(&self) -> AttrSet {
        self.dictionary().attrs_y()
    }

    pub fn degree(&self) -> usize {
        self.dictionary().degree()
    }

    /// Join a table over the represented condition mask.
    pub fn join(&self, table: &Table) -> AlgebraResult<Table> {
        match self {
            DictValue::Plain(dict) => dict.join(table),
            DictValue::Extended(ext) => ext.join(table),
        }
    }
}
