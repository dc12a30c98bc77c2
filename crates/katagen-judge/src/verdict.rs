//! Parsing judge tool output into per-test verdicts.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // pytest -q verbose lines: "test_solution.py::test_case_3 FAILED"
    static ref PYTEST_CASE_RE: Regex =
        Regex::new(r"::(test_case_\d+)(?:\[[^\]]*\])?\s+(PASSED|FAILED|ERROR)").expect("static regex");
    // JUnit console tree lines: "├─ test_case_3() ✔" / "✘"
    static ref JUNIT_CASE_RE: Regex =
        Regex::new(r"(test_case_\d+)\(\)\s*(✔|✘)").expect("static regex");
    // Harness lines from the C++ RUN_TEST macro: "[PASS] test_case_3"
    static ref HARNESS_CASE_RE: Regex =
        Regex::new(r"\[(PASS|FAIL)\]\s+(test_case_\d+)").expect("static regex");
}

/// Split tool output into (passed, failed) test-name lists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CaseVerdicts {
    pub passed: Vec<String>,
    pub failed: Vec<String>,
}

pub fn parse_pytest(output: &str) -> CaseVerdicts {
    let mut verdicts = CaseVerdicts::default();
    for caps in PYTEST_CASE_RE.captures_iter(output) {
        let name = caps[1].to_string();
        if &caps[2] == "PASSED" {
            push_unique(&mut verdicts.passed, name);
        } else {
            push_unique(&mut verdicts.failed, name);
        }
    }
    verdicts
}

pub fn parse_junit(output: &str) -> CaseVerdicts {
    let mut verdicts = CaseVerdicts::default();
    for caps in JUNIT_CASE_RE.captures_iter(output) {
        let name = caps[1].to_string();
        if &caps[2] == "✔" {
            push_unique(&mut verdicts.passed, name);
        } else {
            push_unique(&mut verdicts.failed, name);
        }
    }
    verdicts
}

pub fn parse_harness(output: &str) -> CaseVerdicts {
    let mut verdicts = CaseVerdicts::default();
    for caps in HARNESS_CASE_RE.captures_iter(output) {
        let name = caps[2].to_string();
        if &caps[1] == "PASS" {
            push_unique(&mut verdicts.passed, name);
        } else {
            push_unique(&mut verdicts.failed, name);
        }
    }
    verdicts
}

fn push_unique(list: &mut Vec<String>, name: String) {
    if !list.contains(&name) {
        list.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pytest_verbose_lines() {
        let output = "test_solution.py::test_case_1 PASSED\ntest_solution.py::test_case_2 FAILED\n1 failed, 1 passed in 0.02s\n";
        let verdicts = parse_pytest(output);
        assert_eq!(verdicts.passed, vec!["test_case_1"]);
        assert_eq!(verdicts.failed, vec!["test_case_2"]);
    }

    #[test]
    fn parses_junit_tree_lines() {
        let output = "├─ DoublerTest ✔\n│  ├─ test_case_1() ✔\n│  └─ test_case_2() ✘ expected 6 but was 5\n";
        let verdicts = parse_junit(output);
        assert_eq!(verdicts.passed, vec!["test_case_1"]);
        assert_eq!(verdicts.failed, vec!["test_case_2"]);
    }

    #[test]
    fn parses_harness_lines() {
        let output = "[PASS] test_case_1\n[FAIL] test_case_2\n[PASS] test_case_3\n";
        let verdicts = parse_harness(output);
        assert_eq!(verdicts.passed.len(), 2);
        assert_eq!(verdicts.failed, vec!["test_case_2"]);
    }

    #[test]
    fn duplicate_lines_are_collapsed() {
        let output = "[FAIL] test_case_1\n[FAIL] test_case_1\n";
        let verdicts = parse_harness(output);
        assert_eq!(verdicts.failed.len(), 1);
    }
}
