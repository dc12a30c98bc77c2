//! Mechanical, deterministic source edits.
//!
//! Each rewrite is a pure function `source → {source, changed, detail}`,
//! idempotent, and cheaper than an LLM round-trip. Rewrites run *before*
//! obligation checks within one attempt, so an obligation failure after
//! rewrites is reported as-is.

pub mod java;

/// Result of one rewrite application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub source: String,
    pub changed: bool,
    pub detail: String,
}

impl RewriteOutcome {
    pub(crate) fn unchanged(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            changed: false,
            detail: String::new(),
        }
    }

    pub(crate) fn changed(source: String, detail: impl Into<String>) -> Self {
        Self {
            source,
            changed: true,
            detail: detail.into(),
        }
    }
}

/// Rewrite record ids surfaced through progress events.
pub mod ids {
    pub const JAVA_DEMOTE_EXTRA_PUBLIC_TYPES: &str = "java.demote_extra_public_types";
    pub const JAVA_PROMOTE_PUBLIC_TYPE: &str = "java.promote_public_type";
    pub const JAVA_RENAME_TEST_CLASS: &str = "java.rename_test_class";
    pub const JAVA_SANITIZE_STRING_WHITESPACE: &str = "java.sanitize_string_whitespace";
    pub const JAVA_REBUILD_STDIN_TESTS: &str = "java.rebuild_stdin_tests";
    pub const SLOT_REPLACE_CONSTRAINTS: &str = "slot.replace_constraints";
    pub const SLOT_NORMALIZE_SAMPLES: &str = "slot.normalize_samples";
    pub const SLOT_SYNTHESIZE_STARTER: &str = "slot.synthesize_starter";
}
