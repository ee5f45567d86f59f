//! Error types for environment operations.

use thiserror::Error;

use crate::core::types::Action;

/// Errors raised by the episode controller and the grid simulator.
///
/// Every variant is episode-fatal: the caller must `reset()` before stepping
/// again. Soft outcomes (empty cell, unknown subtask, repeated attempt) are
/// never errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    /// `step()` was called before the first `reset()`.
    #[error("environment has never been reset")]
    NotReset,

    /// `step()` was called after the episode reported `done`.
    #[error("episode has already terminated; reset before stepping")]
    Terminated,

    /// The action is not in the active game's legal action set.
    #[error("illegal action {action} for this game")]
    IllegalAction { action: Action },

    /// The graph dataset holds no instances.
    #[error("graph dataset is empty")]
    EmptyStore,

    /// The store was validated against another game's subtask id space.
    #[error("graph store validated for {found} subtask kinds, game has {expected}")]
    StoreMismatch { expected: usize, found: usize },

    /// The grid could not be generated with the configured budgets.
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Fatal configuration errors from procedural grid generation.
///
/// No partial grid is produced and the budget is never reduced automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error(
        "cannot place {requested} blocks without inaccessible regions (placed {placed}); decrease the block budget"
    )]
    BlockBudget { requested: usize, placed: usize },

    #[error(
        "cannot place {requested} water cells without inaccessible regions (placed {placed}); decrease the water or block budget"
    )]
    WaterBudget { requested: usize, placed: usize },

    #[error("grid has too few free cells: needed {needed}, available {available}")]
    OutOfCells { needed: usize, available: usize },
}
