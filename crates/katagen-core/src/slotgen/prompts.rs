//! Prompt templates for slot generation and the targeted repair variants.
//!
//! Prompts are deterministic functions of the slot and the repair input;
//! the LLM's creativity is the only variable.

use super::RepairInput;
use crate::error::FailureKind;
use crate::types::{Language, ProblemSlot, ProblemStyle};

/// System prompt for a full draft generation attempt.
pub fn generation_system(slot: &ProblemSlot) -> String {
    let language = language_blurb(slot.language);
    let style = style_blurb(slot);
    format!(
        "You author practice programming problems. Produce ONE {language} problem as a single \
JSON object with the fields: title, description, starter_code, reference_solution, test_suite, \
constraints, sample_inputs, sample_outputs. {style} \
The test suite must contain exactly {count} deterministic test cases named test_case_1 through \
test_case_{count}, strong enough that an empty or constant-returning solution fails every case. \
No randomness, no file or network I/O, no approximate comparisons. \
Respond with the JSON object only.",
        count = slot.test_case_count,
    )
}

/// User prompt for a full draft generation attempt, including the repair
/// context when this attempt retries a failure.
pub fn generation_user(slot: &ProblemSlot, repair: Option<&RepairInput>) -> String {
    let mut prompt = format!(
        "Create a {difficulty} {language} problem about {topics}.\n\
Problem style: {style}.\nConstraints (copy verbatim into the constraints field): {constraints}\n",
        difficulty = slot.difficulty,
        language = slot.language,
        topics = slot.topics.join(" and "),
        style = style_name(slot.problem_style),
        constraints = slot.constraints,
    );
    if let Some(repair) = repair {
        prompt.push_str("\n--- previous attempt failed ---\n");
        prompt.push_str(&repair_blurb(repair));
        prompt.push_str(
            "\nProduce a substantively different draft that fixes the failure. \
Do not repeat the previous output.\n",
        );
    }
    prompt
}

/// System prompt for the targeted reference-solution repair path.
pub const REFERENCE_REPAIR_SYSTEM: &str = "You fix reference solutions for generated practice \
problems. The problem, its starter code, and its test suite are FIXED. Rewrite ONLY the \
reference solution so the existing test suite passes. Respond with a single JSON object: \
{\"reference_solution\": \"...\"} and nothing else.";

/// User prompt for the targeted reference-solution repair path.
pub fn reference_repair_user(
    title: &str,
    description: &str,
    reference_solution: &str,
    test_suite: &str,
    judge_stdout: &str,
    judge_stderr: &str,
) -> String {
    serde_json::json!({
        "title": title,
        "description": description,
        "failing_reference_solution": reference_solution,
        "test_suite": test_suite,
        "judge_stdout": judge_stdout,
        "judge_stderr": judge_stderr,
    })
    .to_string()
}

fn repair_blurb(repair: &RepairInput) -> String {
    let mut blurb = match repair.kind {
        FailureKind::Contract => {
            "The draft violated a structural contract.".to_string()
        }
        FailureKind::Execution => {
            "The reference solution failed its own test suite in the judge.".to_string()
        }
        FailureKind::Quality => {
            "The tests were too weak: a trivial baseline solution passed them. \
Write tests that reject constant and empty solutions."
                .to_string()
        }
        FailureKind::Fatal => String::new(),
    };
    if let Some(message) = &repair.error_message {
        blurb.push_str(&format!("\nFailure detail: {message}"));
    }
    if let Some(stdout) = &repair.judge_stdout {
        if !stdout.is_empty() {
            blurb.push_str(&format!("\nJudge stdout:\n{stdout}"));
        }
    }
    if let Some(stderr) = &repair.judge_stderr {
        if !stderr.is_empty() {
            blurb.push_str(&format!("\nJudge stderr:\n{stderr}"));
        }
    }
    blurb
}

fn language_blurb(language: Language) -> &'static str {
    match language {
        Language::Java => "Java (single public class per compilation unit, JUnit 5 tests)",
        Language::Python => "Python (pytest tests, function-level problems around solve(...))",
        Language::Cpp => {
            "C++ (tests #include \"solution.cpp\", define main, and use the RUN_TEST(name, ...) macro)"
        }
        Language::Sql => {
            "SQL (the test suite is a JSON document with schema_sql and ordered expected-row cases)"
        }
    }
}

fn style_name(style: ProblemStyle) -> &'static str {
    match style {
        ProblemStyle::Return => "return",
        ProblemStyle::Stdout => "stdout",
        ProblemStyle::Mixed => "mixed",
    }
}

fn style_blurb(slot: &ProblemSlot) -> &'static str {
    match (slot.language, slot.problem_style) {
        (Language::Python, ProblemStyle::Stdout) => {
            "The solution prints to stdout; every test takes capsys and asserts on readouterr()."
        }
        (Language::Python, ProblemStyle::Return) => {
            "The solution returns values; tests assert solve(...) == expected."
        }
        (Language::Java, ProblemStyle::Stdout | ProblemStyle::Mixed) => {
            "The solution prints via System.out; tests capture stdout with System.setOut and assert on it."
        }
        (Language::Cpp, ProblemStyle::Stdout | ProblemStyle::Mixed) => {
            "The solution writes std::cout; tests capture it by redirecting the stream buffer."
        }
        _ => "Tests assert on returned values.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Difficulty;

    fn slot() -> ProblemSlot {
        ProblemSlot {
            index: 0,
            language: Language::Java,
            difficulty: Difficulty::Hard,
            topics: vec!["polymorphism".to_string(), "collections".to_string()],
            problem_style: ProblemStyle::Return,
            constraints: "Use Java 17. No external libraries.".to_string(),
            test_case_count: 8,
        }
    }

    #[test]
    fn user_prompt_names_topics_and_constraints() {
        let prompt = generation_user(&slot(), None);
        assert!(prompt.contains("polymorphism and collections"));
        assert!(prompt.contains("Use Java 17. No external libraries."));
        assert!(prompt.contains("hard"));
    }

    #[test]
    fn system_prompt_pins_case_count() {
        let prompt = generation_system(&slot());
        assert!(prompt.contains("test_case_8"));
        assert!(prompt.contains("exactly 8"));
    }

    #[test]
    fn repair_prompt_carries_judge_output() {
        let repair = RepairInput {
            kind: FailureKind::Execution,
            previous_draft: None,
            error_message: Some("reference failed 3 tests".to_string()),
            judge_stdout: Some("expected 6 but was 5".to_string()),
            judge_stderr: None,
        };
        let prompt = generation_user(&slot(), Some(&repair));
        assert!(prompt.contains("previous attempt failed"));
        assert!(prompt.contains("expected 6 but was 5"));
        assert!(prompt.contains("substantively different"));
    }

    #[test]
    fn quality_repair_flags_weak_tests() {
        let repair = RepairInput {
            kind: FailureKind::Quality,
            previous_draft: None,
            error_message: None,
            judge_stdout: None,
            judge_stderr: None,
        };
        let prompt = generation_user(&slot(), Some(&repair));
        assert!(prompt.contains("too weak"));
    }
}
