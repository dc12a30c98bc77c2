//! Scripted collaborators and draft builders shared by the pipeline
//! scenario tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use katagen_core::error::CollaboratorError;
use katagen_core::external::{
    CompletionRequest, CompletionResponse, JudgeAdapter, JudgeRequest, JudgeResult, LlmClient,
};

/// Replays queued LLM responses in order.
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CollaboratorError> {
        self.calls.lock().push(request);
        let text = self
            .responses
            .lock()
            .pop_front()
            .ok_or_else(|| CollaboratorError::Transport("scripted responses exhausted".into()))?;
        Ok(CompletionResponse { text })
    }
}

/// Judge whose verdict is a pure function of the request.
pub struct FnJudge<F>
where
    F: Fn(&JudgeRequest) -> JudgeResult + Send + Sync,
{
    verdict: F,
    pub requests: Mutex<Vec<JudgeRequest>>,
}

impl<F> FnJudge<F>
where
    F: Fn(&JudgeRequest) -> JudgeResult + Send + Sync,
{
    pub fn new(verdict: F) -> Self {
        Self {
            verdict,
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<F> JudgeAdapter for FnJudge<F>
where
    F: Fn(&JudgeRequest) -> JudgeResult + Send + Sync,
{
    async fn judge(&self, request: JudgeRequest) -> Result<JudgeResult, CollaboratorError> {
        let result = (self.verdict)(&request);
        self.requests.lock().push(request);
        Ok(result)
    }
}

pub fn passing() -> JudgeResult {
    JudgeResult {
        success: true,
        passed_tests: (1..=8).map(|n| format!("test_case_{n}")).collect(),
        failed_tests: vec![],
        stdout: String::new(),
        stderr: String::new(),
        execution_time_ms: 10,
        exit_code: 0,
        timed_out: false,
    }
}

pub fn failing() -> JudgeResult {
    JudgeResult {
        success: false,
        passed_tests: vec![],
        failed_tests: (1..=8).map(|n| format!("test_case_{n}")).collect(),
        stdout: "assertion failed".to_string(),
        stderr: String::new(),
        execution_time_ms: 10,
        exit_code: 1,
        timed_out: false,
    }
}

/// The submitted code for `Code` requests, empty otherwise.
pub fn request_code(request: &JudgeRequest) -> &str {
    match request {
        JudgeRequest::Code { code, .. } => code,
        _ => "",
    }
}

/// A valid Python stdout-style draft response: reference prints upper-case
/// input, tests use capsys.
pub fn python_stdout_draft(seq: usize, constraints: &str) -> String {
    let mut suite = String::new();
    for n in 1..=8 {
        suite.push_str(&format!(
            "def test_case_{n}(capsys):\n    solve(\"w{seq}{n}\")\n    assert capsys.readouterr().out == \"W{seq}{n}\\n\"\n\n"
        ));
    }
    serde_json::json!({
        "title": format!("Shout it {seq}"),
        "description": "Print the upper-cased input string.",
        "starter_code": "def solve(text):\n    pass\n",
        "reference_solution": format!("def solve(text):\n    # IMPL {seq}\n    print(text.upper())\n"),
        "test_suite": suite,
        "constraints": constraints,
        "sample_inputs": ["hello"],
        "sample_outputs": ["HELLO"],
    })
    .to_string()
}

/// A Java polymorphism draft. `weak_tests` stamps the suite so a scripted
/// judge can let baselines pass against it.
pub fn java_poly_draft(seq: usize, constraints: &str, weak_tests: bool) -> String {
    let marker = if weak_tests { "weak" } else { "strong" };
    let reference = format!(
        r#"interface Rate {{
    double apply(double amount);
}}

class FlatRate implements Rate {{
    public double apply(double amount) {{ return amount + 5.0; }}
}}

class TieredRate implements Rate {{
    public double apply(double amount) {{ return amount * 1.1; }}
}}

public class Billing {{
    // IMPL {seq}
    public double total(Rate rate, double amount) {{
        return rate.apply(amount);
    }}
}}
"#
    );
    let mut suite = format!(
        "import org.junit.jupiter.api.Test;\nimport static org.junit.jupiter.api.Assertions.assertEquals;\n\n// suite: {marker} {seq}\npublic class BillingTest {{\n"
    );
    for n in 1..=8 {
        suite.push_str(&format!(
            "    @Test\n    public void test_case_{n}() {{\n        Rate rate = new FlatRate();\n        Rate tiered = new TieredRate();\n        Billing billing = new Billing();\n        assertEquals({n}.0 + 5.0, billing.total(rate, {n}.0), 0);\n        assertEquals({n}.0 * 1.1, billing.total(tiered, {n}.0), 0);\n    }}\n"
        ));
    }
    suite.push_str("}\n");
    serde_json::json!({
        "title": format!("Billing rates {seq}"),
        "description": "Compute totals through a Rate strategy.",
        "starter_code": "public class Billing {\n    public double total(Rate rate, double amount) {\n        return 0;\n    }\n}\n",
        "reference_solution": reference,
        "test_suite": suite,
        "constraints": constraints,
        "sample_inputs": ["10"],
        "sample_outputs": ["15"],
    })
    .to_string()
}

/// A Java draft with no interface or abstract base, violating the
/// polymorphism obligation.
pub fn java_flat_draft(seq: usize, constraints: &str) -> String {
    let mut suite = String::from(
        "import org.junit.jupiter.api.Test;\nimport static org.junit.jupiter.api.Assertions.assertEquals;\n\npublic class BillingTest {\n",
    );
    for n in 1..=8 {
        suite.push_str(&format!(
            "    @Test\n    public void test_case_{n}() {{ assertEquals({n}, new Billing().solve(\"basic\", {n})); }}\n"
        ));
    }
    suite.push_str("}\n");
    serde_json::json!({
        "title": format!("Billing {seq}"),
        "description": "Flat billing with no abstraction.",
        "starter_code": "public class Billing {\n    public int solve(String kind, int amount) {\n        return 0;\n    }\n}\n",
        "reference_solution": format!("public class Billing {{\n    // IMPL {seq}\n    public int solve(String kind, int amount) {{\n        return amount;\n    }}\n}}\n"),
        "test_suite": suite,
        "constraints": constraints,
        "sample_inputs": ["basic 3"],
        "sample_outputs": ["3"],
    })
    .to_string()
}

/// A C++ stdout draft whose starter is only an include and a comment, so
/// the generator must synthesize the scaffold from the reference.
pub fn cpp_stdout_draft(seq: usize, constraints: &str) -> String {
    let mut suite = String::from(
        "#include \"solution.cpp\"\n#include <iostream>\n#include <sstream>\n#include <string>\n\nint failures = 0;\n\n#define RUN_TEST(name, a, b, expected) run_case(name, a, b, expected)\n\nvoid run_case(const std::string& name, int a, int b, const std::string& expected) {\n    std::ostringstream captured;\n    auto* old_buf = std::cout.rdbuf(captured.rdbuf());\n    solve(a, b);\n    std::cout.rdbuf(old_buf);\n    if (captured.str() == expected) {\n        std::cout << \"[PASS] \" << name << \"\\n\";\n    } else {\n        std::cout << \"[FAIL] \" << name << \"\\n\";\n        failures++;\n    }\n}\n\nint main() {\n",
    );
    for n in 1..=8 {
        suite.push_str(&format!(
            "    RUN_TEST(\"test_case_{n}\", {n}, {n}, \"{}\\n\");\n",
            2 * n
        ));
    }
    suite.push_str("    return failures;\n}\n");
    serde_json::json!({
        "title": format!("Sum printer {seq}"),
        "description": "Print the sum of two integers.",
        "starter_code": "#include <iostream>\n// write solve below\n",
        "reference_solution": format!("#include <iostream>\n\nvoid solve(int a, int b) {{\n    // IMPL {seq}\n    std::cout << a + b << \"\\n\";\n}}\n"),
        "test_suite": suite,
        "constraints": constraints,
        "sample_inputs": ["1 2"],
        "sample_outputs": ["3"],
    })
    .to_string()
}
