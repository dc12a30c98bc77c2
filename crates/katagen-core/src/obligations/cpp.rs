//! C++ obligations: test harness shape (`RUN_TEST` macro cases, solution
//! include, `main`), `solve` presence, stdout capture.

use lazy_static::lazy_static;
use regex::Regex;

use super::{ids, ObligationLog, ObligationViolation};
use crate::scan::cpp::CppScan;
use crate::types::{GeneratedProblemDraft, ObligationResult, ProblemSlot};

lazy_static! {
    static ref INCLUDE_SOLUTION_RE: Regex =
        Regex::new(r#"#\s*include\s+"solution\.cpp""#).expect("static regex");
    static ref MAIN_RE: Regex = Regex::new(r"\bint\s+main\s*\(").expect("static regex");
    static ref RUN_TEST_RE: Regex =
        Regex::new(r#"RUN_TEST\s*\(\s*"(test_case_\d+)""#).expect("static regex");
    static ref COUT_CAPTURE_RE: Regex =
        Regex::new(r"cout\s*\.\s*rdbuf\s*\(|\brdbuf\s*\(").expect("static regex");
}

pub fn check(
    draft: &GeneratedProblemDraft,
    slot: &ProblemSlot,
) -> Result<Vec<ObligationResult>, ObligationViolation> {
    let mut log = ObligationLog::new();

    let reference = draft.reference_text();
    let ref_scan = CppScan::new(&reference);
    let test_scan = CppScan::new(&draft.test_suite);

    log.require(
        ids::CPP_REFERENCE_DEFINES_SOLVE,
        ref_scan.solve_signature().is_some(),
        || "reference must define a top-level solve(...) function".to_string(),
    )?;

    // The include and the RUN_TEST names live in preprocessor lines and
    // string literals, so these two checks read the raw suite text.
    log.require(
        ids::CPP_TEST_INCLUDES_SOLUTION,
        INCLUDE_SOLUTION_RE.is_match(&draft.test_suite),
        || "test file must #include \"solution.cpp\"".to_string(),
    )?;

    log.require(
        ids::CPP_TEST_DEFINES_MAIN,
        MAIN_RE.is_match(test_scan.masked()),
        || "test file must define int main(...)".to_string(),
    )?;

    let mut names: Vec<String> = RUN_TEST_RE
        .captures_iter(&draft.test_suite)
        .map(|c| c[1].to_string())
        .collect();
    names.dedup();
    let expected: Vec<String> = (1..=slot.test_case_count)
        .map(|n| format!("test_case_{n}"))
        .collect();
    log.require(ids::CPP_RUN_TEST_MACRO_CASES, names == expected, || {
        format!(
            "test file must contain exactly {} RUN_TEST entries named test_case_1..test_case_{}, found {}",
            slot.test_case_count,
            slot.test_case_count,
            names.len()
        )
    })?;

    if slot.problem_style.expects_stdout() {
        log.require(
            ids::CPP_STDOUT_CAPTURE,
            COUT_CAPTURE_RE.is_match(test_scan.masked()),
            || "stdout-style tests must capture std::cout via rdbuf redirection".to_string(),
        )?;
    }

    Ok(log.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, Language, ProblemStyle};

    fn slot(style: ProblemStyle) -> ProblemSlot {
        ProblemSlot {
            index: 0,
            language: Language::Cpp,
            difficulty: Difficulty::Easy,
            topics: vec!["arrays".to_string()],
            problem_style: style,
            constraints: "c".to_string(),
            test_case_count: 8,
        }
    }

    fn draft(reference: &str, tests: &str) -> GeneratedProblemDraft {
        GeneratedProblemDraft {
            id: "p".into(),
            title: "t".into(),
            description: "d".into(),
            language: Language::Cpp,
            difficulty: Difficulty::Easy,
            topic_tag: "arrays".into(),
            constraints: "c".into(),
            starter_code: "int solve(int a, int b);".to_string(),
            test_suite: tests.to_string(),
            reference_solution: Some(reference.to_string()),
            reference_workspace: None,
            workspace: None,
            sample_inputs: vec!["1 2".into()],
            sample_outputs: vec!["3".into()],
        }
    }

    fn valid_suite(capture: bool) -> String {
        let mut suite = String::from("#include \"solution.cpp\"\n#include <iostream>\n#include <sstream>\n\n");
        suite.push_str("#define RUN_TEST(name, ...) run_case(name, __VA_ARGS__)\n\n");
        if capture {
            suite.push_str("std::ostringstream captured;\nauto* old_buf = std::cout.rdbuf(captured.rdbuf());\n\n");
        }
        suite.push_str("int main() {\n");
        for n in 1..=8 {
            suite.push_str(&format!("    RUN_TEST(\"test_case_{n}\", {n}, {n});\n"));
        }
        suite.push_str("    return failures;\n}\n");
        suite
    }

    #[test]
    fn accepts_valid_return_style_suite() {
        let d = draft("int solve(int a, int b) { return a + b; }", &valid_suite(false));
        let results = check(&d, &slot(ProblemStyle::Return)).unwrap();
        assert!(results.iter().any(|r| r.id == ids::CPP_RUN_TEST_MACRO_CASES && r.ok));
    }

    #[test]
    fn missing_include_is_rejected() {
        let suite = valid_suite(false).replace("#include \"solution.cpp\"\n", "");
        let d = draft("int solve(int a, int b) { return a + b; }", &suite);
        let err = check(&d, &slot(ProblemStyle::Return)).unwrap_err();
        assert_eq!(err.id, ids::CPP_TEST_INCLUDES_SOLUTION);
    }

    #[test]
    fn seven_cases_are_rejected() {
        let suite = valid_suite(false).replace("    RUN_TEST(\"test_case_8\", 8, 8);\n", "");
        let d = draft("int solve(int a, int b) { return a + b; }", &suite);
        let err = check(&d, &slot(ProblemStyle::Return)).unwrap_err();
        assert_eq!(err.id, ids::CPP_RUN_TEST_MACRO_CASES);
    }

    #[test]
    fn stdout_style_requires_capture() {
        let d = draft(
            "void solve(int n) { std::cout << n; }",
            &valid_suite(false),
        );
        let err = check(&d, &slot(ProblemStyle::Stdout)).unwrap_err();
        assert_eq!(err.id, ids::CPP_STDOUT_CAPTURE);
        let d = draft("void solve(int n) { std::cout << n; }", &valid_suite(true));
        assert!(check(&d, &slot(ProblemStyle::Stdout)).is_ok());
    }

    #[test]
    fn missing_solve_is_rejected() {
        let d = draft("int add(int a, int b) { return a + b; }", &valid_suite(false));
        let err = check(&d, &slot(ProblemStyle::Return)).unwrap_err();
        assert_eq!(err.id, ids::CPP_REFERENCE_DEFINES_SOLVE);
    }
}
