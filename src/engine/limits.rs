//! Safety ceilings for the rewriting loop.
//!
//! Termination of the procedure rests on the input encoding a well-formed
//! Shannon proof; an ill-posed input could expand or reset forever. The
//! engine checks these limits cooperatively and fails with
//! [`EngineError::Diverged`] instead of looping.

use crate::config::LimitsConfig;
use crate::engine::error::{EngineError, EngineResult};
use crate::proof::Subproblem;

/// Default driver step ceiling.
pub const DEFAULT_MAX_STEPS: usize = 1 << 20;

/// Configurable ceilings; `None` means unlimited for `max_steps` and
/// "derived per invocation" for `max_reset_depth`.
#[derive(Debug, Clone)]
pub struct EngineLimits {
    /// Maximum subproblems the driver may dequeue in one run.
    pub max_steps: Option<usize>,

    /// Maximum recursion depth of one reset-lemma invocation. When unset,
    /// each invocation is capped at the subproblem's `|D|+|M|+|S|` + 1,
    /// which the well-founded measure of the lemma cannot exceed.
    pub max_reset_depth: Option<usize>,
}

impl Default for EngineLimits {
    fn default() -> EngineLimits {
        EngineLimits {
            max_steps: Some(DEFAULT_MAX_STEPS),
            max_reset_depth: None,
        }
    }
}

impl EngineLimits {
    pub fn unlimited() -> EngineLimits {
        EngineLimits {
            max_steps: None,
            max_reset_depth: None,
        }
    }

    pub fn from_config(config: &LimitsConfig) -> EngineLimits {
        EngineLimits {
            max_steps: (config.max_steps > 0).then_some(config.max_steps as usize),
            max_reset_depth: (config.max_reset_depth > 0)
                .then_some(config.max_reset_depth as usize),
        }
    }

    /// Check the driver step count before expanding another subproblem.
    pub fn check_step(&self, steps_taken: usize) -> EngineResult<()> {
        match self.max_steps {
            Some(limit) if steps_taken >= limit => Err(EngineError::Diverged {
                context: "driver step",
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// Recursion ceiling for one reset-lemma invocation on `subproblem`.
    pub fn reset_ceiling(&self, subproblem: &Subproblem) -> usize {
        self.max_reset_depth
            .unwrap_or_else(|| subproblem.proof_size() + 1)
    }
}
