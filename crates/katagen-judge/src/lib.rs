//! Sandboxed judge for generated problems.
//!
//! Each judged request gets an ephemeral temp-dir workspace; the language
//! toolchain runs inside it and the workspace is destroyed afterwards.
//! Pass/fail over identical inputs is deterministic for a fixed toolchain.

pub mod judge;
pub mod sandbox;
pub mod verdict;

pub use judge::SandboxJudge;
pub use sandbox::{ExecutionResult, Sandbox};
