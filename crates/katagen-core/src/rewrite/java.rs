//! Java source rewrites: public-type demotion/promotion, test class
//! renaming, string-literal whitespace sanitizing, and the deterministic
//! stdin-driven JUnit suite builder.

use lazy_static::lazy_static;
use regex::Regex;

use super::RewriteOutcome;
use crate::scan::java::{JavaScan, TypeDecl, TypeKind};

/// Demote every top-level public type except one.
///
/// The survivor is `keep_name` when it names an existing public type,
/// otherwise the first non-interface public type, otherwise the first
/// public type declared. With zero or one public type this is a no-op.
pub fn demote_extra_public_types(source: &str, keep_name: Option<&str>) -> RewriteOutcome {
    let scan = JavaScan::new(source);
    let types = scan.top_level_types();
    let publics: Vec<&TypeDecl> = types.iter().filter(|t| t.is_public()).collect();
    if publics.len() <= 1 {
        return RewriteOutcome::unchanged(source);
    }

    let kept = select_kept(&publics, keep_name);
    let mut demoted: Vec<(usize, String)> = publics
        .iter()
        .filter(|t| t.name != kept)
        .filter_map(|t| t.public_at.map(|at| (at, t.name.clone())))
        .collect();
    // Highest start first so earlier offsets stay valid while editing.
    demoted.sort_by(|a, b| b.0.cmp(&a.0));

    let mut edited = source.to_string();
    let mut names = Vec::new();
    for (at, name) in &demoted {
        let at = *at;
        let mut end = at + "public".len();
        let bytes = edited.as_bytes();
        while end < bytes.len() && (bytes[end] == b' ' || bytes[end] == b'\t') {
            end += 1;
        }
        edited.replace_range(at..end, "");
        names.push(name.clone());
    }
    names.reverse();
    RewriteOutcome::changed(
        edited,
        format!("kept {kept} public, demoted {}", names.join(", ")),
    )
}

/// Promote one top-level type to public when none is.
///
/// Picks `keep_name` when it names a declared type, otherwise the first
/// non-interface type, otherwise the first declared. No-op when a public
/// type already exists or no type is declared.
pub fn promote_type_to_public(source: &str, keep_name: Option<&str>) -> RewriteOutcome {
    let scan = JavaScan::new(source);
    let types = scan.top_level_types();
    if types.is_empty() || types.iter().any(|t| t.is_public()) {
        return RewriteOutcome::unchanged(source);
    }

    let chosen = keep_name
        .and_then(|name| types.iter().find(|t| t.name == name))
        .or_else(|| types.iter().find(|t| t.kind != TypeKind::Interface))
        .unwrap_or(&types[0]);

    let mut edited = source.to_string();
    edited.insert_str(chosen.keyword_at, "public ");
    RewriteOutcome::changed(edited, format!("promoted {} to public", chosen.name))
}

/// Rename the first top-level public class to `new_name`, including its
/// explicit constructors. Idempotent: renaming to the current name is a
/// no-op.
pub fn rename_public_class(source: &str, new_name: &str) -> RewriteOutcome {
    let scan = JavaScan::new(source);
    let Some(decl) = scan
        .top_level_types()
        .into_iter()
        .find(|t| t.is_public() && t.kind == TypeKind::Class)
    else {
        return RewriteOutcome::unchanged(source);
    };
    if decl.name == new_name {
        return RewriteOutcome::unchanged(source);
    }

    let old_name = decl.name.clone();
    let body = scan.body_span(&decl);
    let name_start = decl.name_end - old_name.len();

    let mut edited = source.to_string();
    // Constructors first (inside the body, offsets above the declaration),
    // then the declaration itself.
    if let Some((start, end)) = body {
        let ctor_re = Regex::new(&format!(r"(^|[^\w.$]){}\s*\(", regex::escape(&old_name)))
            .expect("constructor regex");
        let masked_body = scan.masked()[start..end].to_string();
        let mut ctor_starts: Vec<usize> = ctor_re
            .captures_iter(&masked_body)
            .filter_map(|caps| {
                let prefix = caps.get(1).expect("group 1");
                let at = start + prefix.end();
                // `new Name(` is an instantiation, not a constructor.
                let before = masked_body[..prefix.start()].trim_end();
                if before.ends_with("new") {
                    None
                } else {
                    Some(at)
                }
            })
            .collect();
        ctor_starts.sort_unstable_by(|a, b| b.cmp(a));
        for at in ctor_starts {
            edited.replace_range(at..at + old_name.len(), new_name);
        }
    }
    edited.replace_range(name_start..decl.name_end, new_name);

    RewriteOutcome::changed(edited, format!("renamed {old_name} to {new_name}"))
}

/// Trim leading and trailing raw spaces/tabs from every Java string
/// literal, except literals that are entirely whitespace. Backslash
/// escapes are left uninterpreted.
pub fn sanitize_string_literal_whitespace(source: &str) -> RewriteOutcome {
    let scan = JavaScan::new(source);
    let mut spans = scan.string_literal_spans();
    spans.sort_unstable_by(|a, b| b.0.cmp(&a.0));

    let mut edited = source.to_string();
    let mut trimmed_count = 0usize;
    for (start, end) in spans {
        let literal = &edited[start..end];
        let trimmed = literal.trim_matches([' ', '\t']);
        if trimmed.is_empty() || trimmed == literal {
            continue;
        }
        let replacement = trimmed.to_string();
        edited.replace_range(start..end, &replacement);
        trimmed_count += 1;
    }
    if trimmed_count == 0 {
        RewriteOutcome::unchanged(source)
    } else {
        RewriteOutcome::changed(
            edited,
            format!("trimmed boundary whitespace in {trimmed_count} literal(s)"),
        )
    }
}

/// One captured sample for the stdin-driven suite builder.
#[derive(Debug, Clone)]
pub struct StdinCase {
    pub input: String,
    pub expected_stdout: String,
}

/// Build a deterministic JUnit class that feeds each sample to stdin via
/// `System.setIn` and compares captured stdout. The class is named
/// `<class_name>Test`.
pub fn build_stdin_test_suite(class_name: &str, cases: &[StdinCase]) -> String {
    let mut out = String::new();
    out.push_str("import org.junit.jupiter.api.AfterEach;\n");
    out.push_str("import org.junit.jupiter.api.BeforeEach;\n");
    out.push_str("import org.junit.jupiter.api.Test;\n");
    out.push_str("import static org.junit.jupiter.api.Assertions.assertEquals;\n\n");
    out.push_str("import java.io.ByteArrayInputStream;\n");
    out.push_str("import java.io.ByteArrayOutputStream;\n");
    out.push_str("import java.io.InputStream;\n");
    out.push_str("import java.io.PrintStream;\n");
    out.push_str("import java.nio.charset.StandardCharsets;\n\n");
    out.push_str(&format!("public class {class_name}Test {{\n"));
    out.push_str("    private InputStream originalIn;\n");
    out.push_str("    private PrintStream originalOut;\n");
    out.push_str("    private ByteArrayOutputStream captured;\n\n");
    out.push_str("    @BeforeEach\n    public void setUp() {\n");
    out.push_str("        originalIn = System.in;\n");
    out.push_str("        originalOut = System.out;\n");
    out.push_str("        captured = new ByteArrayOutputStream();\n");
    out.push_str("        System.setOut(new PrintStream(captured, true, StandardCharsets.UTF_8));\n");
    out.push_str("    }\n\n");
    out.push_str("    @AfterEach\n    public void tearDown() {\n");
    out.push_str("        System.setIn(originalIn);\n");
    out.push_str("        System.setOut(originalOut);\n");
    out.push_str("    }\n");
    for (i, case) in cases.iter().enumerate() {
        out.push_str(&format!(
            "\n    @Test\n    public void test_case_{}() throws Exception {{\n",
            i + 1
        ));
        out.push_str(&format!(
            "        System.setIn(new ByteArrayInputStream({}.getBytes(StandardCharsets.UTF_8)));\n",
            java_string_literal(&case.input)
        ));
        out.push_str(&format!(
            "        {class_name}.main(new String[0]);\n"
        ));
        out.push_str(&format!(
            "        assertEquals({}, captured.toString(StandardCharsets.UTF_8).trim());\n",
            java_string_literal(case.expected_stdout.trim())
        ));
        out.push_str("    }\n");
    }
    out.push_str("}\n");
    out
}

lazy_static! {
    static ref NEEDS_ESCAPE: Regex = Regex::new(r#"[\\"\n\r\t]"#).expect("static regex");
}

fn java_string_literal(text: &str) -> String {
    if !NEEDS_ESCAPE.is_match(text) {
        return format!("\"{text}\"");
    }
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('"');
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            other => escaped.push(other),
        }
    }
    escaped.push('"');
    escaped
}

fn select_kept(publics: &[&TypeDecl], keep_name: Option<&str>) -> String {
    if let Some(name) = keep_name {
        if let Some(t) = publics.iter().find(|t| t.name == name) {
            return t.name.clone();
        }
    }
    publics
        .iter()
        .find(|t| t.kind != TypeKind::Interface)
        .unwrap_or(&publics[0])
        .name
        .clone()
}
