//! Stable exit codes for `sge` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid config, dataset or arguments.
pub const INVALID: i32 = 1;
/// An episode could not be generated (block/water budget or grid too small).
pub const FAILED: i32 = 2;
