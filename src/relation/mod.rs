//! # Relation Algebra
//!
//! Tables, dictionaries and the operators the rewriting procedure is built
//! from: projection, dictionary construction, extension by free attributes,
//! join of a relation against a dictionary, and the dyadic degree
//! partition.
//!
//! All operators are value-producing: inputs are never mutated, and every
//! precondition (mask disjointness, subset and coverage requirements) is
//! checked up front, failing with [`AlgebraError`].

pub mod dict;
pub mod error;
pub mod row;
pub mod table;

pub use dict::{DictMap, DictValue, Dictionary, ExtendedDictionary};
pub use error::{AlgebraError, AlgebraResult};
pub use row::Row;
pub use table::Table;
