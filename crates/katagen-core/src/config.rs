//! Pipeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for a generation run. `Default` carries the production values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Total attempts allowed per slot for retriable failures.
    #[serde(default = "default_max_attempts")]
    pub max_attempts_per_slot: u32,

    /// Fixed at 8 in v1.
    #[serde(default = "default_test_case_count")]
    pub test_case_count: u32,

    /// Whether a hard slot that exhausts quality retries may be downgraded
    /// to medium (only when the spec did not explicitly request hard).
    #[serde(default = "default_true")]
    pub soft_fallback_enabled: bool,

    /// Timeout per judge call.
    #[serde(default = "default_judge_timeout_ms")]
    pub judge_timeout_ms: u64,

    /// Timeout per LLM call. A timeout here is a transport failure, not a
    /// content failure.
    #[serde(default = "default_llm_timeout_ms")]
    pub llm_timeout_ms: u64,

    /// Debug switch: when set, progress events may carry test-suite text.
    #[serde(default)]
    pub trace_test_suites: bool,

    /// Byte budget for judge stdout/stderr snippets forwarded to repair
    /// prompts and progress events.
    #[serde(default = "default_judge_output_budget")]
    pub judge_output_budget: usize,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_test_case_count() -> u32 {
    8
}

fn default_true() -> bool {
    true
}

fn default_judge_timeout_ms() -> u64 {
    90_000
}

fn default_llm_timeout_ms() -> u64 {
    60_000
}

fn default_judge_output_budget() -> usize {
    2_048
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts_per_slot: default_max_attempts(),
            test_case_count: default_test_case_count(),
            soft_fallback_enabled: true,
            judge_timeout_ms: default_judge_timeout_ms(),
            llm_timeout_ms: default_llm_timeout_ms(),
            trace_test_suites: false,
            judge_output_budget: default_judge_output_budget(),
        }
    }
}

impl GenerationConfig {
    pub fn judge_timeout(&self) -> Duration {
        Duration::from_millis(self.judge_timeout_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }
}
