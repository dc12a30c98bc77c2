//! The sandbox-backed `JudgeAdapter`: lay files out per language, run the
//! toolchain, map tool output to a `JudgeResult`.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use katagen_core::error::CollaboratorError;
use katagen_core::external::{JudgeAdapter, JudgeRequest, JudgeResult};
use katagen_core::scan::java::JavaScan;
use katagen_core::types::Language;

use crate::sandbox::{ExecutionResult, Sandbox};
use crate::verdict::{parse_harness, parse_junit, parse_pytest, CaseVerdicts};

const DEFAULT_PROCESS_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_JUNIT_JAR: &str = "/opt/katagen/junit-platform-console-standalone.jar";

/// Judge that executes submissions in ephemeral sandboxes with the local
/// toolchains (javac/java, python, g++, sqlite3).
pub struct SandboxJudge {
    process_timeout: Duration,
    junit_jar: String,
}

impl SandboxJudge {
    pub fn new() -> Self {
        Self {
            process_timeout: DEFAULT_PROCESS_TIMEOUT,
            junit_jar: std::env::var("KATAGEN_JUNIT_JAR")
                .unwrap_or_else(|_| DEFAULT_JUNIT_JAR.to_string()),
        }
    }

    pub fn with_process_timeout(mut self, timeout: Duration) -> Self {
        self.process_timeout = timeout;
        self
    }

    async fn judge_inner(&self, request: JudgeRequest) -> std::io::Result<JudgeResult> {
        match request {
            JudgeRequest::Code {
                language,
                code,
                test_suite,
            } => {
                let files = single_file_layout(language, &code);
                self.run_suite(language, files, &test_suite).await
            }
            JudgeRequest::Files {
                language,
                files,
                test_suite,
            } => {
                let files = files.into_iter().collect();
                self.run_suite(language, files, &test_suite).await
            }
            JudgeRequest::Run {
                language,
                code,
                stdin,
            } => self.run_program(language, &code, &stdin).await,
        }
    }

    async fn run_suite(
        &self,
        language: Language,
        solution_files: Vec<(String, String)>,
        test_suite: &str,
    ) -> std::io::Result<JudgeResult> {
        match language {
            Language::Java => self.run_java_suite(solution_files, test_suite).await,
            Language::Python => self.run_python_suite(solution_files, test_suite).await,
            Language::Cpp => self.run_cpp_suite(solution_files, test_suite).await,
            Language::Sql => self.run_sql_suite(solution_files, test_suite).await,
        }
    }

    async fn run_java_suite(
        &self,
        solution_files: Vec<(String, String)>,
        test_suite: &str,
    ) -> std::io::Result<JudgeResult> {
        let sandbox = Sandbox::new()?;
        let mut files: Vec<(PathBuf, &str)> = solution_files
            .iter()
            .map(|(path, content)| (PathBuf::from(path), content.as_str()))
            .collect();
        let test_file = JavaScan::new(test_suite)
            .primary_public_type()
            .map(|t| format!("{}.java", t.name))
            .unwrap_or_else(|| "SuiteTest.java".to_string());
        files.push((PathBuf::from(&test_file), test_suite));
        sandbox.prepare(&files)?;

        let compile = sandbox
            .run(
                "sh",
                &[
                    "-c".to_string(),
                    format!("javac -cp .:{} *.java", self.junit_jar),
                ],
                None,
                self.process_timeout,
            )
            .await?;
        if !compile.success {
            return Ok(compile_failure(compile));
        }

        let run = sandbox
            .run(
                "java",
                &[
                    "-jar".to_string(),
                    self.junit_jar.clone(),
                    "--class-path".to_string(),
                    ".".to_string(),
                    "--scan-class-path".to_string(),
                    "--details".to_string(),
                    "tree".to_string(),
                    "--disable-ansi-colors".to_string(),
                ],
                None,
                self.process_timeout,
            )
            .await?;
        let verdicts = parse_junit(&run.stdout);
        Ok(suite_result(run, verdicts))
    }

    async fn run_python_suite(
        &self,
        solution_files: Vec<(String, String)>,
        test_suite: &str,
    ) -> std::io::Result<JudgeResult> {
        let sandbox = Sandbox::new()?;
        let mut files: Vec<(PathBuf, &str)> = solution_files
            .iter()
            .map(|(path, content)| (PathBuf::from(path), content.as_str()))
            .collect();
        // Suites that do not import the solution module get the symbols
        // star-imported so bare solve(...) calls resolve.
        let suite = if test_suite.contains("import solution") || test_suite.contains("from solution")
        {
            test_suite.to_string()
        } else {
            format!("from solution import *\n\n{test_suite}")
        };
        files.push((PathBuf::from("test_solution.py"), suite.as_str()));
        sandbox.prepare(&files)?;

        let run = sandbox
            .run(
                "python3",
                &[
                    "-m".to_string(),
                    "pytest".to_string(),
                    "-v".to_string(),
                    "--no-header".to_string(),
                    "-p".to_string(),
                    "no:cacheprovider".to_string(),
                    "test_solution.py".to_string(),
                ],
                None,
                self.process_timeout,
            )
            .await?;
        let verdicts = parse_pytest(&run.stdout);
        Ok(suite_result(run, verdicts))
    }

    async fn run_cpp_suite(
        &self,
        solution_files: Vec<(String, String)>,
        test_suite: &str,
    ) -> std::io::Result<JudgeResult> {
        let sandbox = Sandbox::new()?;
        let mut files: Vec<(PathBuf, &str)> = solution_files
            .iter()
            .map(|(path, content)| (PathBuf::from(path), content.as_str()))
            .collect();
        files.push((PathBuf::from("tests.cpp"), test_suite));
        sandbox.prepare(&files)?;

        let compile = sandbox
            .run(
                "g++",
                &[
                    "-std=c++17".to_string(),
                    "-O0".to_string(),
                    "tests.cpp".to_string(),
                    "-o".to_string(),
                    "tests".to_string(),
                ],
                None,
                self.process_timeout,
            )
            .await?;
        if !compile.success {
            return Ok(compile_failure(compile));
        }

        let run = sandbox
            .run("./tests", &[], None, self.process_timeout)
            .await?;
        let verdicts = parse_harness(&run.stdout);
        Ok(suite_result(run, verdicts))
    }

    async fn run_sql_suite(
        &self,
        solution_files: Vec<(String, String)>,
        test_suite: &str,
    ) -> std::io::Result<JudgeResult> {
        let submission = solution_files
            .first()
            .map(|(_, content)| content.clone())
            .unwrap_or_default();
        let document: Value = match serde_json::from_str(test_suite) {
            Ok(value) => value,
            Err(e) => {
                return Ok(JudgeResult {
                    success: false,
                    passed_tests: vec![],
                    failed_tests: vec![],
                    stdout: String::new(),
                    stderr: format!("invalid SQL test document: {e}"),
                    execution_time_ms: 0,
                    exit_code: 1,
                    timed_out: false,
                });
            }
        };
        let schema = document
            .get("schema_sql")
            .and_then(|s| s.as_str())
            .unwrap_or_default();
        let empty = Vec::new();
        let cases = document
            .get("cases")
            .and_then(|c| c.as_array())
            .unwrap_or(&empty);

        let sandbox = Sandbox::new()?;
        let mut passed = Vec::new();
        let mut failed = Vec::new();
        let mut stdout = String::new();
        let mut total_ms = 0u64;

        for case in cases {
            let name = case
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or("unnamed")
                .to_string();
            let query = case
                .get("query")
                .and_then(|q| q.as_str())
                .unwrap_or(&submission);
            let script = format!("{schema}\n.mode json\n{query}\n");
            let run = sandbox
                .run("sqlite3", &[":memory:".to_string()], Some(&script), self.process_timeout)
                .await?;
            total_ms += run.duration.as_millis() as u64;
            let expected = case
                .get("expected_rows")
                .cloned()
                .unwrap_or(Value::Array(vec![]));
            let ok = run.success && rows_match(&run.stdout, &expected);
            stdout.push_str(&format!(
                "[{}] {}\n",
                if ok { "PASS" } else { "FAIL" },
                name
            ));
            if ok {
                passed.push(name);
            } else {
                failed.push(name);
            }
        }

        Ok(JudgeResult {
            success: failed.is_empty() && !cases.is_empty(),
            passed_tests: passed,
            failed_tests: failed,
            stdout,
            stderr: String::new(),
            execution_time_ms: total_ms,
            exit_code: 0,
            timed_out: false,
        })
    }

    async fn run_program(
        &self,
        language: Language,
        code: &str,
        stdin: &str,
    ) -> std::io::Result<JudgeResult> {
        let sandbox = Sandbox::new()?;
        let run = match language {
            Language::Java => {
                let class = JavaScan::new(code)
                    .primary_public_type()
                    .map(|t| t.name)
                    .unwrap_or_else(|| "Main".to_string());
                sandbox.prepare(&[(PathBuf::from(format!("{class}.java")), code)])?;
                let compile = sandbox
                    .run(
                        "sh",
                        &["-c".to_string(), "javac *.java".to_string()],
                        None,
                        self.process_timeout,
                    )
                    .await?;
                if !compile.success {
                    return Ok(compile_failure(compile));
                }
                sandbox
                    .run("java", &[class], Some(stdin), self.process_timeout)
                    .await?
            }
            Language::Python => {
                sandbox.prepare(&[(PathBuf::from("solution.py"), code)])?;
                sandbox
                    .run(
                        "python3",
                        &["solution.py".to_string()],
                        Some(stdin),
                        self.process_timeout,
                    )
                    .await?
            }
            Language::Cpp => {
                sandbox.prepare(&[(PathBuf::from("solution.cpp"), code)])?;
                let compile = sandbox
                    .run(
                        "g++",
                        &[
                            "-std=c++17".to_string(),
                            "solution.cpp".to_string(),
                            "-o".to_string(),
                            "solution".to_string(),
                        ],
                        None,
                        self.process_timeout,
                    )
                    .await?;
                if !compile.success {
                    return Ok(compile_failure(compile));
                }
                sandbox
                    .run("./solution", &[], Some(stdin), self.process_timeout)
                    .await?
            }
            Language::Sql => {
                sandbox
                    .run(
                        "sqlite3",
                        &[":memory:".to_string()],
                        Some(code),
                        self.process_timeout,
                    )
                    .await?
            }
        };
        Ok(JudgeResult {
            success: run.success,
            passed_tests: vec![],
            failed_tests: vec![],
            stdout: run.stdout,
            stderr: run.stderr,
            execution_time_ms: run.duration.as_millis() as u64,
            exit_code: run.exit_code,
            timed_out: run.timed_out,
        })
    }
}

impl Default for SandboxJudge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JudgeAdapter for SandboxJudge {
    async fn judge(&self, request: JudgeRequest) -> Result<JudgeResult, CollaboratorError> {
        debug!("judging request");
        self.judge_inner(request)
            .await
            .map_err(|e| CollaboratorError::Transport(format!("sandbox failure: {e}")))
    }
}

fn single_file_layout(language: Language, code: &str) -> Vec<(String, String)> {
    let path = match language {
        Language::Java => {
            let class = JavaScan::new(code)
                .primary_public_type()
                .map(|t| t.name)
                .unwrap_or_else(|| "Solution".to_string());
            format!("{class}.java")
        }
        Language::Python => "solution.py".to_string(),
        Language::Cpp => "solution.cpp".to_string(),
        Language::Sql => "submission.sql".to_string(),
    };
    vec![(path, code.to_string())]
}

fn compile_failure(result: ExecutionResult) -> JudgeResult {
    JudgeResult {
        success: false,
        passed_tests: vec![],
        failed_tests: vec![],
        stdout: result.stdout,
        stderr: result.stderr,
        execution_time_ms: result.duration.as_millis() as u64,
        exit_code: result.exit_code,
        timed_out: result.timed_out,
    }
}

fn suite_result(run: ExecutionResult, verdicts: CaseVerdicts) -> JudgeResult {
    JudgeResult {
        success: run.success && verdicts.failed.is_empty() && !run.timed_out,
        passed_tests: verdicts.passed,
        failed_tests: verdicts.failed,
        stdout: run.stdout,
        stderr: run.stderr,
        execution_time_ms: run.duration.as_millis() as u64,
        exit_code: run.exit_code,
        timed_out: run.timed_out,
    }
}

/// Compare `sqlite3 .mode json` output with the expected row values. Each
/// expected row is an array of values matched against the result row's
/// values in column order.
fn rows_match(stdout: &str, expected: &Value) -> bool {
    let Some(expected_rows) = expected.as_array() else {
        return false;
    };
    let trimmed = stdout.trim();
    let actual: Vec<Value> = if trimmed.is_empty() {
        Vec::new()
    } else {
        match serde_json::from_str::<Value>(trimmed) {
            Ok(Value::Array(rows)) => rows,
            _ => return false,
        }
    };
    if actual.len() != expected_rows.len() {
        return false;
    }
    actual.iter().zip(expected_rows).all(|(row, expected_row)| {
        let Some(object) = row.as_object() else {
            return false;
        };
        let Some(expected_values) = expected_row.as_array() else {
            return false;
        };
        let values: Vec<&Value> = object.values().collect();
        values.len() == expected_values.len()
            && values
                .iter()
                .zip(expected_values)
                .all(|(a, b)| values_equal(a, b))
    })
}

fn values_equal(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    // sqlite emits numbers; expectations may carry them as strings.
    match (a, b) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn java_layout_names_file_after_public_class() {
        let files = single_file_layout(Language::Java, "public class Billing {}");
        assert_eq!(files[0].0, "Billing.java");
    }

    #[test]
    fn rows_match_compares_values_in_order() {
        let stdout = r#"[{"id":1,"name":"a"},{"id":2,"name":"b"}]"#;
        let expected = serde_json::json!([[1, "a"], [2, "b"]]);
        assert!(rows_match(stdout, &expected));
        let wrong = serde_json::json!([[2, "a"], [2, "b"]]);
        assert!(!rows_match(stdout, &wrong));
    }

    #[test]
    fn rows_match_handles_empty_results() {
        assert!(rows_match("", &serde_json::json!([])));
        assert!(!rows_match("", &serde_json::json!([[1]])));
    }

    #[test]
    fn numeric_string_expectations_match() {
        let stdout = r#"[{"total":42}]"#;
        let expected = serde_json::json!([["42"]]);
        assert!(rows_match(stdout, &expected));
    }
}
