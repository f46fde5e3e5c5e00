//! Partial tuples over the global schema.
//!
//! A row is a fixed-width array of optional cells; position `i` carries a
//! value iff attribute `i` is present. Rows are immutable once built and
//! memoize their hash at construction, since every operator and container
//! in the engine keys on them.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::relation::error::{AlgebraError, AlgebraResult};
use crate::schema::AttrSet;
use crate::value::Value;

// Contribution of an absent position to the row hash.
const ABSENT_SEED: u64 = 0;

/// A partial tuple: one optional cell per schema position, hash cached.
#[derive(Clone)]
pub struct Row {
    cells: Arc<[Option<Value>]>,
    hash: u64,
}

impl Row {
    pub fn new(cells: Vec<Option<Value>>) -> Row {
        let hash = combined_hash(&cells);
        Row {
            cells: cells.into(),
            hash,
        }
    }

    /// Number of schema positions (present or not).
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// The cell at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    /// Mask of the positions that carry a value.
    pub fn presence(&self) -> AttrSet {
        let mut mask = AttrSet::EMPTY;
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.is_some() {
                mask |= AttrSet::single(i);
            }
        }
        mask
    }

    /// The memoized hash; stable across runs.
    pub fn stable_hash(&self) -> u64 {
        self.hash
    }

    /// A new row agreeing with `self` on `attrs` and absent elsewhere.
    pub fn mask(&self, attrs: AttrSet) -> Row {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, cell)| if attrs.contains(i) { cell.clone() } else { None })
            .collect();
        Row::new(cells)
    }

    /// Combine two rows over disjoint attribute sets: positions in
    /// `attrs_x` come from `x`, positions in `attrs_y` from `y`, all other
    /// positions are absent.
    pub fn merge(x: &Row, y: &Row, attrs_x: AttrSet, attrs_y: AttrSet) -> AlgebraResult<Row> {
        if !attrs_x.is_disjoint(attrs_y) {
            return Err(AlgebraError::NotDisjoint {
                left: attrs_x,
                right: attrs_y,
            });
        }
        if x.width() != y.width() {
            return Err(AlgebraError::WidthMismatch {
                left: x.width(),
                right: y.width(),
            });
        }
        let cells = (0..x.width())
            .map(|i| {
                if attrs_x.contains(i) {
                    x.cells[i].clone()
                } else if attrs_y.contains(i) {
                    y.cells[i].clone()
                } else {
                    None
                }
            })
            .collect();
        Ok(Row::new(cells))
    }
}

// Per-cell hashes folded with the boost-style combiner, using a fixed-key
// hasher so bucketing decisions reproduce across runs.
fn combined_hash(cells: &[Option<Value>]) -> u64 {
    let mut seed = cells.len() as u64;
    for cell in cells {
        let h = match cell {
            Some(value) => {
                let mut hasher = DefaultHasher::new();
                value.hash(&mut hasher);
                hasher.finish()
            }
            None => ABSENT_SEED,
        };
        seed ^= h
            .wrapping_add(0x9e37_79b9)
            .wrapping_add(seed << 6)
            .wrapping_add(seed >> 2);
    }
    seed
}

impl PartialEq for Row {
    fn eq(&self, other: &Row) -> bool {
        self.hash == other.hash && self.cells == other.cells
    }
}

impl Eq for Row {}

impl Hash for Row {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for cell in self.cells.iter() {
            match cell {
                Some(value) => list.entry(&format_args!("{value}")),
                None => list.entry(&format_args!("_")),
            };
        }
        list.finish()
    }
}
