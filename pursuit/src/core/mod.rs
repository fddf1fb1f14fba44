//! Deterministic, pure logic shared by the pursuit loop.
//!
//! Core modules must be free of I/O side effects. They operate on strings and
//! small value types so every rule here is testable in isolation.

pub mod budget;
pub mod operator;
pub mod ranking;
pub mod response;
pub mod task;
pub mod types;
