//! I/O helpers for pursuit commands.

pub mod actuators;
pub mod atomic;
pub mod config;
pub mod init;
pub mod input;
pub mod insight_log;
pub mod model;
pub mod process;
pub mod prompt;
pub mod queue_store;
pub mod run_log;
pub mod run_state;
pub mod workspace;
