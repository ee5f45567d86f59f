//! Subtask graph execution environment.
//!
//! An agent moves on a procedurally generated grid and interacts with items.
//! Certain (action, item) pairs complete subtasks whose availability is
//! governed by a layered AND/OR dependency graph. The crate is split into:
//!
//! - **[`core`]**: Pure, deterministic logic (eligibility, completion
//!   bookkeeping, grid generation and simulation). No I/O.
//! - **[`games`]**: Static per-game catalogs behind a closed [`games::GameKind`].
//! - **[`io`]**: TOML configuration and validated graph datasets.
//!
//! [`env::SubtaskEnv`] ties them together behind a reset/step interface and
//! [`rollout`] drives it with a random agent.

pub mod core;
pub mod env;
pub mod error;
pub mod exit_codes;
pub mod games;
pub mod io;
pub mod logging;
pub mod rollout;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
