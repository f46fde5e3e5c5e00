//! # Attribute Schema Module
//!
//! The global attribute schema fixes, once per problem, the set of columns
//! every relation in a run is defined over. Attribute sets are bitmasks over
//! that schema, so set algebra (union, intersection, symmetric difference)
//! is single-word arithmetic.
//!
//! ## Example
//!
//! ```
//! use panda::schema::{AttrSet, DataType, Schema};
//!
//! let schema = Schema::new(vec![
//!     ("a".to_string(), DataType::Int),
//!     ("b".to_string(), DataType::Double),
//!     ("c".to_string(), DataType::Str),
//! ]).unwrap();
//!
//! let ab = schema.mask_of(["a", "b"]).unwrap();
//! let bc = schema.mask_of(["b", "c"]).unwrap();
//! assert_eq!(ab & bc, schema.mask_of(["b"]).unwrap());
//! assert_eq!(schema.names(ab), vec!["a", "b"]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use crate::value::DataType;

/// Schema construction errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// More attributes than the mask width can address
    #[error("schema has {0} attributes, maximum supported width is {max}", max = AttrSet::MAX_WIDTH)]
    TooWide(usize),

    /// The same attribute name declared twice
    #[error("duplicate attribute name: {0}")]
    DuplicateAttribute(String),

    /// A referenced attribute is not part of the schema
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
}

/// A set of attributes of the global schema, stored as a bitmask.
///
/// Bit `i` corresponds to attribute `i` of the [`Schema`] the set was built
/// against. The empty set is [`AttrSet::EMPTY`]; union, intersection and
/// symmetric difference are the `|`, `&` and `^` operators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttrSet(u64);

impl AttrSet {
    /// The empty attribute set.
    pub const EMPTY: AttrSet = AttrSet(0);

    /// Maximum addressable schema width.
    pub const MAX_WIDTH: usize = u64::BITS as usize;

    /// The singleton set containing attribute `bit`.
    ///
    /// # Panics
    /// Panics if `bit >= MAX_WIDTH`; schema construction rejects wider
    /// schemas before any mask is built.
    pub fn single(bit: usize) -> AttrSet {
        assert!(bit < Self::MAX_WIDTH, "attribute index out of range");
        AttrSet(1 << bit)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether attribute `bit` is in the set.
    pub fn contains(self, bit: usize) -> bool {
        bit < Self::MAX_WIDTH && self.0 & (1 << bit) != 0
    }

    /// Number of attributes in the set.
    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_disjoint(self, other: AttrSet) -> bool {
        self.0 & other.0 == 0
    }

    pub fn is_subset(self, other: AttrSet) -> bool {
        self.0 & !other.0 == 0
    }

    /// Iterate the set bits in ascending index order.
    pub fn bits(self) -> impl Iterator<Item = usize> {
        (0..Self::MAX_WIDTH).filter(move |&i| self.0 & (1 << i) != 0)
    }
}

impl BitOr for AttrSet {
    type Output = AttrSet;
    fn bitor(self, rhs: AttrSet) -> AttrSet {
        AttrSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for AttrSet {
    fn bitor_assign(&mut self, rhs: AttrSet) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for AttrSet {
    type Output = AttrSet;
    fn bitand(self, rhs: AttrSet) -> AttrSet {
        AttrSet(self.0 & rhs.0)
    }
}

impl BitAndAssign for AttrSet {
    fn bitand_assign(&mut self, rhs: AttrSet) {
        self.0 &= rhs.0;
    }
}

impl BitXor for AttrSet {
    type Output = AttrSet;
    fn bitxor(self, rhs: AttrSet) -> AttrSet {
        AttrSet(self.0 ^ rhs.0)
    }
}

impl BitXorAssign for AttrSet {
    fn bitxor_assign(&mut self, rhs: AttrSet) {
        self.0 ^= rhs.0;
    }
}

impl fmt::Display for AttrSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for bit in self.bits() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{bit}")?;
            first = false;
        }
        write!(f, "}}")
    }
}

/// The global attribute schema: an ordered list of named, typed columns.
///
/// Position `i` in the list is attribute bit `i` in every [`AttrSet`] of the
/// problem. A schema wider than [`AttrSet::MAX_WIDTH`] is rejected at
/// construction.
#[derive(Debug, Clone)]
pub struct Schema {
    attrs: Vec<(String, DataType)>,
    by_name: HashMap<String, usize>,
}

impl Schema {
    pub fn new(attrs: Vec<(String, DataType)>) -> Result<Schema, SchemaError> {
        if attrs.len() > AttrSet::MAX_WIDTH {
            return Err(SchemaError::TooWide(attrs.len()));
        }
        let mut by_name = HashMap::with_capacity(attrs.len());
        for (i, (name, _)) in attrs.iter().enumerate() {
            if by_name.insert(name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateAttribute(name.clone()));
            }
        }
        Ok(Schema { attrs, by_name })
    }

    /// Number of attributes in the schema.
    pub fn width(&self) -> usize {
        self.attrs.len()
    }

    /// Bit index of a named attribute.
    pub fn resolve(&self, name: &str) -> Result<usize, SchemaError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownAttribute(name.to_string()))
    }

    /// Build the mask selecting the given attribute names.
    pub fn mask_of<'a, I>(&self, names: I) -> Result<AttrSet, SchemaError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut mask = AttrSet::EMPTY;
        for name in names {
            mask |= AttrSet::single(self.resolve(name)?);
        }
        Ok(mask)
    }

    pub fn attr_name(&self, bit: usize) -> &str {
        &self.attrs[bit].0
    }

    pub fn attr_type(&self, bit: usize) -> DataType {
        self.attrs[bit].1
    }

    /// Attribute names selected by `mask`, in bit order.
    pub fn names(&self, mask: AttrSet) -> Vec<&str> {
        mask.bits()
            .filter(|&b| b < self.width())
            .map(|b| self.attr_name(b))
            .collect()
    }
}
