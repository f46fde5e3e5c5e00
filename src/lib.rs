//! # PANDA Degree-Feasible Witness Engine
//!
//! Produces, for a conjunctive query under information-theoretic degree
//! constraints, one concrete relation per output attribute group whose size
//! is compatible with the proven bound. The procedure is driven by a
//! Shannon-inequality proof: the spec document supplies monotonicity and
//! submodularity multiplicities, and the engine rewrites a tree of
//! subproblems until every branch bottoms out in an output group.
//!
//! ## Pipeline Architecture
//!
//! ```text
//! YAML spec + CSV relations
//!     ↓
//! [Spec Loader]       → Schema + initial Subproblem (Z, D, tables, M, S, B)
//!     ↓
//! [Engine]            → breadth-first rewriting tree
//!     ↓  per node: condition | split | partition  (reset lemma on overflow)
//! Leaves              → subproblems demanding an output group
//!     ↓
//! [Witness assembly]  → one relation per output group, unioned over leaves
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use panda::engine::{Engine, EngineLimits};
//! use panda::spec::load_problem;
//!
//! let problem = load_problem(spec_dir, "query.yaml", tables_dir)?;
//! let engine = Engine::new(EngineLimits::default());
//! let witness = engine.run(&problem.subproblem)?;
//! for (group, table) in &witness {
//!     println!("{group}: {} rows", table.len());
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `schema` | Attribute bitmasks and the typed global schema |
//! | `value` | Cell values with type-aware equality and hashing |
//! | `relation` | Tables, dictionaries, and the algebra operators |
//! | `proof` | Shannon terms, multisets, subproblem state |
//! | `rewrite` | Case matchers/rewriters and the reset lemma |
//! | `engine` | Breadth-first driver, limits, witness assembly |
//! | `spec` | YAML/CSV boundary: document → initial subproblem |
//! | `storage` | CSV reader/writer |
//! | `config` | TOML + environment configuration |

pub mod config;
pub mod engine;
pub mod proof;
pub mod relation;
pub mod rewrite;
pub mod schema;
pub mod spec;
pub mod storage;
pub mod value;

// Re-export the types most callers need
pub use crate::config::Config;
pub use crate::engine::{Engine, EngineError, EngineLimits, Witness};
pub use crate::proof::{Monotonicity, Multiset, Submodularity, Subproblem};
pub use crate::relation::{
    AlgebraError, DictValue, Dictionary, ExtendedDictionary, Row, Table,
};
pub use crate::schema::{AttrSet, Schema, SchemaError};
pub use crate::spec::{load_problem, Problem, SpecError};
pub use crate::value::{DataType, Value};
