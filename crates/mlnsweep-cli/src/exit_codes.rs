//! Exit codes of the `mlnsweep` binary.
//! Scripts that drive sweeps rely on these; keep them stable.

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_COMMAND_FAILED: i32 = 1; // At least one solver run did not succeed
pub const EXIT_CONFIG_ERROR: i32 = 2; // Bad config, evidence or filesystem setup
