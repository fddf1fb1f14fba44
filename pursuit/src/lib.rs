//! Objective pursuit loop.
//!
//! Given a high-level objective, the loop repeatedly generates candidate tasks,
//! ranks them, executes one, records insights and checks whether the objective is
//! met, while an operator can inject tasks or stop the run from stdin.
//!
//! - **[`core`]**: Pure, deterministic logic (task grammar, operator lines, ranking
//!   fallback, response parsing). No I/O.
//! - **[`io`]**: Side-effecting operations (queue and insight files, run log,
//!   configuration, model and search commands, operator input thread).
//! - **[`agents`]**: Collaborator seams and their prompt-driven implementation.
//!
//! Orchestration modules ([`dispatch`], [`looping`], [`run`]) tie core logic and
//! I/O together to implement the CLI commands.

pub mod agents;
pub mod core;
pub mod dispatch;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
