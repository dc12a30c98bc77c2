//! Python obligations: pytest suite shape, disallowed imports, and the
//! style-specific test patterns.

use super::{ids, ObligationLog, ObligationViolation};
use crate::scan::python::PythonScan;
use crate::types::{GeneratedProblemDraft, ObligationResult, ProblemSlot, ProblemStyle};

pub fn check(
    draft: &GeneratedProblemDraft,
    slot: &ProblemSlot,
) -> Result<Vec<ObligationResult>, ObligationViolation> {
    let mut log = ObligationLog::new();

    let reference = draft.reference_text();
    let ref_scan = PythonScan::new(&reference);
    let test_scan = PythonScan::new(&draft.test_suite);

    if matches!(slot.problem_style, ProblemStyle::Return | ProblemStyle::Mixed) {
        log.require(
            ids::PYTHON_REFERENCE_DEFINES_SOLVE,
            ref_scan.defines_solve(),
            || "return-style reference must define solve(...)".to_string(),
        )?;
    }

    let mut banned = ref_scan.disallowed_imports();
    for module in test_scan.disallowed_imports() {
        if !banned.contains(&module) {
            banned.push(module);
        }
    }
    log.require(ids::PYTHON_NO_DISALLOWED_IMPORTS, banned.is_empty(), || {
        format!("disallowed module import(s): {}", banned.join(", "))
    })?;

    log.require(
        ids::PYTHON_NO_EVAL_EXEC,
        !ref_scan.uses_eval_exec() && !test_scan.uses_eval_exec(),
        || "eval/exec are not allowed".to_string(),
    )?;

    let functions = test_scan.test_functions();
    let expected: Vec<String> = (1..=slot.test_case_count)
        .map(|n| format!("test_case_{n}"))
        .collect();
    let names: Vec<&str> = functions.iter().map(|(name, _)| name.as_str()).collect();
    log.require(
        ids::PYTHON_EIGHT_TEST_CASES,
        names == expected.iter().map(String::as_str).collect::<Vec<_>>(),
        || {
            format!(
                "test suite must define exactly {} functions test_case_1..test_case_{}, found: {}",
                slot.test_case_count,
                slot.test_case_count,
                if names.is_empty() {
                    "<none>".to_string()
                } else {
                    names.join(", ")
                }
            )
        },
    )?;

    if matches!(slot.problem_style, ProblemStyle::Return | ProblemStyle::Mixed) {
        let masked = test_scan.masked();
        log.require(
            ids::PYTHON_RETURN_STYLE_ASSERTS_SOLVE,
            masked.contains("assert") && masked.contains("solve("),
            || "return-style tests must assert on solve(...) results".to_string(),
        )?;
    }

    if slot.problem_style.expects_stdout() {
        log.require(
            ids::PYTHON_STDOUT_SOLUTION_PRINTS,
            ref_scan.writes_stdout(),
            || "stdout-style reference never prints".to_string(),
        )?;
        let capsys = functions.iter().all(|(_, params)| params.contains("capsys"))
            && test_scan.masked().contains("readouterr");
        log.require(ids::PYTHON_STDOUT_STYLE_USES_CAPSYS, capsys, || {
            "stdout-style tests must take capsys and assert on readouterr()".to_string()
        })?;
    }

    Ok(log.finish())
}
