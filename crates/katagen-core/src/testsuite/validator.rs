//! Shape checks on a generated test suite: case counts, required
//! framework imports, forbidden constructs (I/O, randomness, approximate
//! matchers). Structure-level rules live with the obligations; this pass
//! only decides whether the suite is worth handing to the obligation
//! checker or needs the one-shot repairer first.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::scan::cpp::CppScan;
use crate::scan::java::JavaScan;
use crate::scan::python::PythonScan;
use crate::types::{Language, ProblemSlot};

/// A failed shape check. `code` is a stable machine-readable tag fed to
/// the repair prompt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct TestSuiteIssue {
    pub code: String,
    pub message: String,
}

impl TestSuiteIssue {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

lazy_static! {
    static ref JAVA_TEST_ANNOTATION_RE: Regex = Regex::new(r"@Test\b").expect("static regex");
    static ref JAVA_RANDOM_RE: Regex =
        Regex::new(r"Math\s*\.\s*random|new\s+Random\s*\(|ThreadLocalRandom").expect("static regex");
    static ref JAVA_FILE_IO_RE: Regex =
        Regex::new(r"new\s+File\s*\(|FileReader|FileWriter|Files\s*\.").expect("static regex");
    static ref JAVA_APPROX_RE: Regex =
        Regex::new(r"assertTrue\s*\(\s*Math\s*\.\s*abs").expect("static regex");
    static ref PY_RANDOM_RE: Regex =
        Regex::new(r"(?m)^\s*(?:import|from)\s+random\b|\brandom\s*\.").expect("static regex");
    static ref PY_APPROX_RE: Regex = Regex::new(r"pytest\s*\.\s*approx").expect("static regex");
    static ref PY_FILE_IO_RE: Regex = Regex::new(r"\bopen\s*\(\s*['\x22]").expect("static regex");
    static ref PY_STDIN_RE: Regex = Regex::new(r"\binput\s*\(").expect("static regex");
    static ref CPP_RANDOM_RE: Regex =
        Regex::new(r"\brand\s*\(|\bsrand\s*\(|std\s*::\s*mt19937").expect("static regex");
    static ref CPP_FILE_IO_RE: Regex =
        Regex::new(r"\bfstream\b|\bifstream\b|\bofstream\b|\bfopen\s*\(").expect("static regex");
    static ref RUN_TEST_RE: Regex =
        Regex::new(r#"RUN_TEST\s*\(\s*"(test_case_\d+)""#).expect("static regex");
}

/// Validate a test suite's shape for a slot. Returns the first issue found.
pub fn validate_test_suite(test_suite: &str, slot: &ProblemSlot) -> Result<(), TestSuiteIssue> {
    if test_suite.trim().is_empty() {
        return Err(TestSuiteIssue::new("tests.empty", "test suite is empty"));
    }
    match slot.language {
        Language::Java => validate_java(test_suite, slot),
        Language::Python => validate_python(test_suite, slot),
        Language::Cpp => validate_cpp(test_suite, slot),
        Language::Sql => validate_sql(test_suite, slot),
    }
}

fn validate_java(test_suite: &str, slot: &ProblemSlot) -> Result<(), TestSuiteIssue> {
    if !test_suite.contains("org.junit") {
        return Err(TestSuiteIssue::new(
            "tests.missing_framework_import",
            "Java test suite must import org.junit",
        ));
    }
    let scan = JavaScan::new(test_suite);
    let count = JAVA_TEST_ANNOTATION_RE.find_iter(scan.masked()).count() as u32;
    if count != slot.test_case_count {
        return Err(TestSuiteIssue::new(
            "tests.wrong_case_count",
            format!(
                "expected {} @Test methods, found {count}",
                slot.test_case_count
            ),
        ));
    }
    if JAVA_RANDOM_RE.is_match(scan.masked()) {
        return Err(TestSuiteIssue::new(
            "tests.randomness",
            "tests must be deterministic; randomness is not allowed",
        ));
    }
    if JAVA_FILE_IO_RE.is_match(scan.masked()) {
        return Err(TestSuiteIssue::new(
            "tests.disallowed_io",
            "tests must not touch the filesystem",
        ));
    }
    if JAVA_APPROX_RE.is_match(scan.masked()) {
        return Err(TestSuiteIssue::new(
            "tests.approximate_matcher",
            "tests must assert exact values, not tolerance windows",
        ));
    }
    Ok(())
}

fn validate_python(test_suite: &str, slot: &ProblemSlot) -> Result<(), TestSuiteIssue> {
    let scan = PythonScan::new(test_suite);
    let count = scan.test_functions().len() as u32;
    if count != slot.test_case_count {
        return Err(TestSuiteIssue::new(
            "tests.wrong_case_count",
            format!(
                "expected {} test_case_N functions, found {count}",
                slot.test_case_count
            ),
        ));
    }
    if PY_RANDOM_RE.is_match(scan.masked()) {
        return Err(TestSuiteIssue::new(
            "tests.randomness",
            "tests must be deterministic; the random module is not allowed",
        ));
    }
    if PY_APPROX_RE.is_match(scan.masked()) {
        return Err(TestSuiteIssue::new(
            "tests.approximate_matcher",
            "tests must assert exact values; pytest.approx is not allowed",
        ));
    }
    if PY_FILE_IO_RE.is_match(scan.masked()) {
        return Err(TestSuiteIssue::new(
            "tests.disallowed_io",
            "tests must not open files",
        ));
    }
    if PY_STDIN_RE.is_match(scan.masked()) {
        return Err(TestSuiteIssue::new(
            "tests.disallowed_io",
            "tests must not read stdin directly; feed inputs through monkeypatch or arguments",
        ));
    }
    Ok(())
}

fn validate_cpp(test_suite: &str, slot: &ProblemSlot) -> Result<(), TestSuiteIssue> {
    if !test_suite.contains("#include \"solution.cpp\"") {
        return Err(TestSuiteIssue::new(
            "tests.missing_framework_import",
            "C++ test file must #include \"solution.cpp\"",
        ));
    }
    let count = RUN_TEST_RE.find_iter(test_suite).count() as u32;
    if count != slot.test_case_count {
        return Err(TestSuiteIssue::new(
            "tests.wrong_case_count",
            format!(
                "expected {} RUN_TEST cases, found {count}",
                slot.test_case_count
            ),
        ));
    }
    let scan = CppScan::new(test_suite);
    if CPP_RANDOM_RE.is_match(scan.masked()) {
        return Err(TestSuiteIssue::new(
            "tests.randomness",
            "tests must be deterministic; randomness is not allowed",
        ));
    }
    if CPP_FILE_IO_RE.is_match(scan.masked()) {
        return Err(TestSuiteIssue::new(
            "tests.disallowed_io",
            "tests must not touch the filesystem",
        ));
    }
    Ok(())
}

fn validate_sql(test_suite: &str, slot: &ProblemSlot) -> Result<(), TestSuiteIssue> {
    let value: serde_json::Value = serde_json::from_str(test_suite).map_err(|e| {
        TestSuiteIssue::new(
            "tests.invalid_document",
            format!("SQL test suite must be a JSON document: {e}"),
        )
    })?;
    let cases = value
        .get("cases")
        .and_then(|c| c.as_array())
        .map(|c| c.len() as u32)
        .unwrap_or(0);
    if cases != slot.test_case_count {
        return Err(TestSuiteIssue::new(
            "tests.wrong_case_count",
            format!("expected {} SQL cases, found {cases}", slot.test_case_count),
        ));
    }
    if value.get("schema_sql").and_then(|s| s.as_str()).map(str::trim).unwrap_or("").is_empty() {
        return Err(TestSuiteIssue::new(
            "tests.invalid_document",
            "SQL test suite must carry a non-empty schema_sql",
        ));
    }
    Ok(())
}
