//! Structural obligations over generated drafts.
//!
//! Every obligation is a pure function of source text. Evaluation order is
//! deterministic and the first violation stops the check with a typed
//! [`ObligationViolation`]; violations surface as contract failures.

pub mod cpp;
pub mod java;
pub mod python;
pub mod sql;

use thiserror::Error;

use crate::types::{GeneratedProblemDraft, Language, ObligationResult, ProblemSlot};

/// Obligation identifiers.
pub mod ids {
    pub const JAVA_SINGLE_PUBLIC_TYPE: &str = "java.single_public_type_per_unit";
    pub const JAVA_WORKSPACE_PATHS_MATCH: &str = "java.workspace_paths_match";
    pub const JAVA_PRIMARY_TYPE_MATCHES_TARGET: &str = "java.primary_type_matches_target";
    pub const JAVA_TEST_CLASS_MATCHES_TARGET: &str = "java.test_class_matches_target";
    pub const JAVA_NO_WHILE_FALSE: &str = "java.no_while_false";
    pub const JAVA_STDOUT_SOLUTION_PRINTS: &str = "java.stdout_solution_prints";
    pub const JAVA_STDOUT_TESTS_CAPTURE: &str = "java.stdout_tests_capture";
    pub const JAVA_STDIN_TESTS_PROVIDE: &str = "java.stdin_tests_provide";
    pub const JAVA_STDIN_REQUIRES_MAIN: &str = "java.stdin_requires_main";
    pub const JAVA_STDIN_DISALLOWED_FOR_STRUCTURAL: &str =
        "java.stdin_disallowed_for_structural_topics";
    pub const JAVA_TOPIC_POLYMORPHISM: &str = "java.structural_topic.polymorphism";
    pub const JAVA_TOPIC_INHERITANCE: &str = "java.structural_topic.inheritance";
    pub const JAVA_TOPIC_ABSTRACTION: &str = "java.structural_topic.abstraction";
    pub const JAVA_TOPIC_ENCAPSULATION: &str = "java.structural_topic.encapsulation";
    pub const JAVA_TOPIC_COMPOSITION: &str = "java.structural_topic.composition";

    pub const PYTHON_REFERENCE_DEFINES_SOLVE: &str = "python.reference_defines_solve";
    pub const PYTHON_NO_DISALLOWED_IMPORTS: &str = "python.no_disallowed_imports";
    pub const PYTHON_NO_EVAL_EXEC: &str = "python.no_eval_exec";
    pub const PYTHON_EIGHT_TEST_CASES: &str = "python.eight_test_cases";
    pub const PYTHON_RETURN_STYLE_ASSERTS_SOLVE: &str = "python.return_style_asserts_solve";
    pub const PYTHON_STDOUT_STYLE_USES_CAPSYS: &str = "python.stdout_style_uses_capsys";
    pub const PYTHON_STDOUT_SOLUTION_PRINTS: &str = "python.stdout_solution_prints";

    pub const CPP_REFERENCE_DEFINES_SOLVE: &str = "cpp.reference_defines_solve";
    pub const CPP_TEST_INCLUDES_SOLUTION: &str = "cpp.test_includes_solution";
    pub const CPP_TEST_DEFINES_MAIN: &str = "cpp.test_defines_main";
    pub const CPP_RUN_TEST_MACRO_CASES: &str = "cpp.run_test_macro_cases";
    pub const CPP_STDOUT_CAPTURE: &str = "cpp.stdout_capture";

    pub const SQL_TEST_DOCUMENT_SHAPE: &str = "sql.test_document_shape";
    pub const SQL_REFERENCE_NON_EMPTY: &str = "sql.reference_non_empty";

    pub const TESTS_REJECT_BASELINES: &str = "tests.reject_baselines";
    pub const RETRY_SUBSTANTIVE_CHANGE: &str = "retry.substantive_change_required";
    pub const SLOT_PARSE_JSON: &str = "slot.parse_json";
    pub const SLOT_CONSTRAINTS_MATCH: &str = "slot.constraints_match";
    pub const SLOT_REFERENCE_PRESENT: &str = "slot.reference_present";
    pub const SLOT_TEST_SUITE_SHAPE: &str = "slot.test_suite_shape";
}

/// A violated obligation; fails the slot as a contract error carrying the
/// obligation id.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("obligation {id} violated: {message}")]
pub struct ObligationViolation {
    pub id: String,
    pub message: String,
}

impl ObligationViolation {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// Accumulates passed obligations; the first failed one aborts evaluation.
#[derive(Debug, Default)]
pub(crate) struct ObligationLog {
    results: Vec<ObligationResult>,
}

impl ObligationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pass, or stop with a violation.
    pub fn require<F>(&mut self, id: &str, ok: bool, message: F) -> Result<(), ObligationViolation>
    where
        F: FnOnce() -> String,
    {
        if ok {
            self.results.push(ObligationResult::ok(id));
            Ok(())
        } else {
            Err(ObligationViolation::new(id, message()))
        }
    }

    pub fn finish(self) -> Vec<ObligationResult> {
        self.results
    }
}

/// OOP topics that demand structural shape from a Java reference.
pub const STRUCTURAL_TOPICS: &[&str] = &[
    "encapsulation",
    "inheritance",
    "polymorphism",
    "abstraction",
    "composition",
];

pub(crate) fn structural_topics_of(slot: &ProblemSlot) -> Vec<String> {
    slot.topics
        .iter()
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| STRUCTURAL_TOPICS.contains(&t.as_str()))
        .collect()
}

/// Verify every applicable obligation for the draft. Returns the passed
/// obligations in evaluation order, or the first violation.
pub fn check_draft(
    draft: &GeneratedProblemDraft,
    slot: &ProblemSlot,
) -> Result<Vec<ObligationResult>, ObligationViolation> {
    match slot.language {
        Language::Java => java::check(draft, slot),
        Language::Python => python::check(draft, slot),
        Language::Cpp => cpp::check(draft, slot),
        Language::Sql => sql::check(draft, slot),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_stops_on_first_violation() {
        let mut log = ObligationLog::new();
        log.require("a", true, || unreachable!()).unwrap();
        let err = log.require("b", false, || "broken".to_string()).unwrap_err();
        assert_eq!(err.id, "b");
        assert_eq!(err.message, "broken");
    }

    #[test]
    fn structural_topic_matching_is_case_insensitive() {
        let slot = ProblemSlot {
            index: 0,
            language: Language::Java,
            difficulty: crate::types::Difficulty::Hard,
            topics: vec!["Polymorphism".to_string(), "loops".to_string()],
            problem_style: crate::types::ProblemStyle::Return,
            constraints: String::new(),
            test_case_count: 8,
        };
        assert_eq!(structural_topics_of(&slot), vec!["polymorphism"]);
    }
}
