//! Engine Error Types
//!
//! Nothing here is recoverable: every variant aborts the invocation, and
//! each carries the top-level shape of the offending subproblem so the
//! caller can report which node of the tree failed.

use thiserror::Error;

use crate::relation::AlgebraError;

/// Fatal errors raised by the rewriting engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// An algebra operator precondition failed mid-rewrite.
    #[error("algebra violation: {0}")]
    Algebra(#[from] AlgebraError),

    /// A non-leaf subproblem has no unconditional demand to rewrite.
    #[error("no unconditional monotonicity in subproblem [{shape}]")]
    NoApplicableMonotonicity { shape: String },

    /// No case (condition, split, partition) applies to any unconditional
    /// demand of the subproblem.
    #[error("no case applies to unconditional monotonicities [{demands}] in subproblem [{shape}]")]
    NoApplicableCase { shape: String, demands: String },

    /// The reset lemma ran out of cases while eliminating a demand.
    #[error("reset lemma has no case for {target} in subproblem [{shape}]")]
    ResetDeadEnd { target: String, shape: String },

    /// A safety ceiling was exceeded.
    #[error("{context} ceiling of {limit} exceeded")]
    Diverged { context: &'static str, limit: usize },
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
