//! Deterministic, pure logic for subtask graphs and the grid world.
//!
//! Core modules are free of I/O side effects. Randomness is only consumed
//! through a caller-supplied [`rand::Rng`], so every result is reproducible
//! from the RNG state and the inputs.

pub mod completion;
pub mod eligibility;
pub mod generate;
pub mod graph;
pub mod grid;
pub mod invariants;
pub mod simulator;
pub mod status;
pub mod types;
