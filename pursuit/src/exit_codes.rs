//! Stable exit codes for pursuit CLI commands.

/// Command succeeded, or a run reached any terminal state.
pub const OK: i32 = 0;
/// Setup failed (missing model, invalid config or layout) before the loop started.
pub const INVALID: i32 = 1;
