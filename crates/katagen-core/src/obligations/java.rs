//! Java obligations: compilation-unit shape, stdin/stdout conformance,
//! and the structural OOP topic checks.

use std::collections::BTreeSet;

use regex::Regex;

use super::{ids, structural_topics_of, ObligationLog, ObligationViolation};
use crate::scan::java::{JavaScan, TypeDecl, TypeKind, Visibility};
use crate::types::{GeneratedProblemDraft, ObligationResult, ProblemSlot};

pub fn check(
    draft: &GeneratedProblemDraft,
    slot: &ProblemSlot,
) -> Result<Vec<ObligationResult>, ObligationViolation> {
    let mut log = ObligationLog::new();

    // Workspace-shaped drafts must pair starter and reference file sets.
    if draft.reference_workspace.is_some() || draft.workspace.is_some() {
        let ref_paths: BTreeSet<&String> = draft
            .reference_workspace
            .as_ref()
            .map(|ws| ws.keys().collect())
            .unwrap_or_default();
        let starter_paths: BTreeSet<&String> = draft
            .workspace
            .as_ref()
            .map(|ws| ws.keys().collect())
            .unwrap_or_default();
        log.require(ids::JAVA_WORKSPACE_PATHS_MATCH, ref_paths == starter_paths, || {
            "reference_workspace and workspace must share the same file-path set".to_string()
        })?;
    }

    // At most one top-level public type per compilation unit.
    let mut units: Vec<(String, &str)> = vec![("starter_code".to_string(), draft.starter_code.as_str())];
    if let Some(ws) = &draft.workspace {
        for (path, content) in ws {
            units.push((format!("workspace:{path}"), content.as_str()));
        }
    }
    for (path, content) in draft.reference_units() {
        units.push((path.to_string(), content));
    }
    for (unit_name, content) in &units {
        let publics = JavaScan::new(content).public_type_names();
        log.require(ids::JAVA_SINGLE_PUBLIC_TYPE, publics.len() <= 1, || {
            format!(
                "unit {unit_name} declares {} top-level public types: {}",
                publics.len(),
                publics.join(", ")
            )
        })?;
    }

    let starter_scan = JavaScan::new(&draft.starter_code);
    let target = starter_scan
        .primary_public_type()
        .map(|t| t.name)
        .or_else(|| {
            draft.workspace.as_ref().and_then(|ws| {
                ws.values()
                    .find_map(|content| JavaScan::new(content).primary_public_type())
                    .map(|t| t.name)
            })
        })
        .unwrap_or_default();

    let reference_text = draft.reference_text();
    let ref_scan = JavaScan::new(&reference_text);
    let ref_primary = ref_scan.primary_public_type().map(|t| t.name);

    log.require(
        ids::JAVA_PRIMARY_TYPE_MATCHES_TARGET,
        !target.is_empty() && ref_primary.as_deref() == Some(target.as_str()),
        || {
            format!(
                "reference primary public type {:?} does not match starter target {:?}",
                ref_primary.as_deref().unwrap_or("<none>"),
                target
            )
        },
    )?;

    let test_scan = JavaScan::new(&draft.test_suite);
    let expected_test_class = format!("{target}Test");
    let test_class = test_scan.primary_public_type().map(|t| t.name);
    log.require(
        ids::JAVA_TEST_CLASS_MATCHES_TARGET,
        test_class.as_deref() == Some(expected_test_class.as_str()),
        || {
            format!(
                "test suite class {:?} must be named {expected_test_class}",
                test_class.as_deref().unwrap_or("<none>")
            )
        },
    )?;

    log.require(ids::JAVA_NO_WHILE_FALSE, !ref_scan.has_while_false(), || {
        "reference contains while(false), an unreachable-statement compile error".to_string()
    })?;

    if slot.problem_style.expects_stdout() {
        log.require(
            ids::JAVA_STDOUT_SOLUTION_PRINTS,
            ref_scan.writes_stdout(),
            || "stdout-style reference never calls System.out.print*".to_string(),
        )?;
        log.require(
            ids::JAVA_STDOUT_TESTS_CAPTURE,
            test_scan.masked().contains("System.setOut")
                && test_scan.masked().contains("assert"),
            || "stdout-style tests must capture System.out and assert on it".to_string(),
        )?;
    }

    let structural = structural_topics_of(slot);
    if ref_scan.reads_stdin() {
        log.require(
            ids::JAVA_STDIN_DISALLOWED_FOR_STRUCTURAL,
            structural.is_empty(),
            || {
                format!(
                    "stdin reads are incompatible with structural topic(s): {}",
                    structural.join(", ")
                )
            },
        )?;
        log.require(
            ids::JAVA_STDIN_TESTS_PROVIDE,
            test_scan.masked().contains("System.setIn")
                && test_scan.masked().contains("ByteArrayInputStream"),
            || "stdin-reading reference requires tests that set System.in".to_string(),
        )?;
        log.require(ids::JAVA_STDIN_REQUIRES_MAIN, ref_scan.has_main(), || {
            "stdin-reading reference must define public static void main(String[] args)"
                .to_string()
        })?;
    }

    let types = ref_scan.top_level_types();
    for topic in &structural {
        match topic.as_str() {
            "polymorphism" => check_polymorphism(&mut log, &types, &test_scan)?,
            "inheritance" => check_inheritance(&mut log, &ref_scan, &types, &test_scan)?,
            "abstraction" => check_abstraction(&mut log, &types, &test_scan)?,
            "encapsulation" => check_encapsulation(&mut log, &ref_scan, &types, &test_scan)?,
            "composition" => check_composition(&mut log, &ref_scan, &types, &test_scan)?,
            _ => {}
        }
    }

    Ok(log.finish())
}

fn is_base(t: &TypeDecl) -> bool {
    t.kind == TypeKind::Interface || (t.kind == TypeKind::Class && t.is_abstract)
}

fn is_concrete_class(t: &TypeDecl) -> bool {
    t.kind == TypeKind::Class && !t.is_abstract
}

fn implementations_of<'a>(types: &'a [TypeDecl], base: &TypeDecl) -> Vec<&'a TypeDecl> {
    types
        .iter()
        .filter(|t| is_concrete_class(t))
        .filter(|t| {
            t.extends.as_deref() == Some(base.name.as_str())
                || t.implements.iter().any(|i| i == &base.name)
        })
        .collect()
}

fn mentions(masked: &str, name: &str) -> bool {
    Regex::new(&format!(r"\b{}\b", regex::escape(name)))
        .map(|re| re.is_match(masked))
        .unwrap_or(false)
}

/// `Base x = new Impl(...)` for any of the given concrete names, also
/// matching `var` declarations.
fn dispatch_assignment(masked: &str, base: &str, impls: &[&TypeDecl]) -> bool {
    let alternatives = impls
        .iter()
        .map(|t| regex::escape(&t.name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"\b{}\s+\w+\s*=\s*new\s+(?:{})\s*\(",
        regex::escape(base),
        alternatives
    ))
    .map(|re| re.is_match(masked))
    .unwrap_or(false)
}

fn check_polymorphism(
    log: &mut ObligationLog,
    types: &[TypeDecl],
    test_scan: &JavaScan<'_>,
) -> Result<(), ObligationViolation> {
    let found = types
        .iter()
        .filter(|t| is_base(t))
        .map(|base| (base, implementations_of(types, base)))
        .find(|(_, impls)| impls.len() >= 2);
    let Some((base, impls)) = found else {
        return log.require(ids::JAVA_TOPIC_POLYMORPHISM, false, || {
            "reference needs an interface or abstract base with at least two concrete implementations".to_string()
        });
    };
    let masked = test_scan.masked();
    let mentioned = mentions(masked, &base.name)
        && impls.iter().filter(|t| mentions(masked, &t.name)).count() >= 2;
    log.require(
        ids::JAVA_TOPIC_POLYMORPHISM,
        mentioned && dispatch_assignment(masked, &base.name, &impls),
        || {
            format!(
                "tests must mention {} and two implementations, and assign a concrete instance to a {}-typed variable",
                base.name, base.name
            )
        },
    )
}

fn check_inheritance(
    log: &mut ObligationLog,
    ref_scan: &JavaScan<'_>,
    types: &[TypeDecl],
    test_scan: &JavaScan<'_>,
) -> Result<(), ObligationViolation> {
    let pair = types
        .iter()
        .filter(|t| t.kind == TypeKind::Class)
        .filter_map(|sub| {
            sub.extends
                .as_deref()
                .filter(|base| *base != "Object")
                .map(|base| (base.to_string(), sub))
        })
        .find(|(_, sub)| ref_scan.body_has_override(sub));
    let Some((base, sub)) = pair else {
        return log.require(ids::JAVA_TOPIC_INHERITANCE, false, || {
            "reference needs a non-Object extends pair with an @Override method in the subclass"
                .to_string()
        });
    };
    let masked = test_scan.masked();
    let assignment = Regex::new(&format!(
        r"\b{}\s+(\w+)\s*=\s*new\s+{}\s*\(",
        regex::escape(&base),
        regex::escape(&sub.name)
    ))
    .ok()
    .and_then(|re| re.captures(masked).map(|c| c[1].to_string()));
    let exercised = assignment
        .as_deref()
        .map(|var| {
            Regex::new(&format!(r"\b{}\s*\.\s*\w+\s*\(", regex::escape(var)))
                .map(|re| re.is_match(masked))
                .unwrap_or(false)
        })
        .unwrap_or(false);
    log.require(ids::JAVA_TOPIC_INHERITANCE, exercised, || {
        format!(
            "tests must call an overridden method through a {base}-typed reference assigned a new {}",
            sub.name
        )
    })
}

fn check_abstraction(
    log: &mut ObligationLog,
    types: &[TypeDecl],
    test_scan: &JavaScan<'_>,
) -> Result<(), ObligationViolation> {
    let found = types
        .iter()
        .filter(|t| is_base(t))
        .map(|base| (base, implementations_of(types, base)))
        .find(|(_, impls)| !impls.is_empty());
    let Some((base, impls)) = found else {
        return log.require(ids::JAVA_TOPIC_ABSTRACTION, false, || {
            "reference needs an interface or abstract class with at least one implementation"
                .to_string()
        });
    };
    let masked = test_scan.masked();
    log.require(
        ids::JAVA_TOPIC_ABSTRACTION,
        mentions(masked, &base.name) && mentions(masked, &impls[0].name),
        || {
            format!(
                "tests must mention both {} and an implementation such as {}",
                base.name, impls[0].name
            )
        },
    )
}

fn primary_domain_class<'a>(types: &'a [TypeDecl]) -> Option<&'a TypeDecl> {
    let candidates = || {
        types
            .iter()
            .filter(|t| t.kind == TypeKind::Class && t.name != "Main")
    };
    candidates()
        .find(|t| t.is_public())
        .or_else(|| candidates().next())
}

fn check_encapsulation(
    log: &mut ObligationLog,
    ref_scan: &JavaScan<'_>,
    types: &[TypeDecl],
    test_scan: &JavaScan<'_>,
) -> Result<(), ObligationViolation> {
    let Some(primary) = primary_domain_class(types) else {
        return log.require(ids::JAVA_TOPIC_ENCAPSULATION, false, || {
            "reference has no non-Main class to encapsulate".to_string()
        });
    };
    let fields = ref_scan.fields_of(primary);
    let private_count = fields
        .iter()
        .filter(|f| f.visibility == Visibility::Private)
        .count();
    let public_count = fields
        .iter()
        .filter(|f| f.visibility == Visibility::Public)
        .count();
    log.require(
        ids::JAVA_TOPIC_ENCAPSULATION,
        private_count >= 1 && public_count == 0 && distinct_instance_calls(test_scan, &primary.name) >= 2,
        || {
            format!(
                "{} needs at least one private field, no public fields, and tests calling two distinct methods on one instance",
                primary.name
            )
        },
    )
}

/// Count distinct method names called on an instance of `class_name` in the
/// test suite.
fn distinct_instance_calls(test_scan: &JavaScan<'_>, class_name: &str) -> usize {
    let masked = test_scan.masked();
    let escaped = regex::escape(class_name);
    let decl_re = Regex::new(&format!(
        r"\b(?:{escaped}|var)\s+(\w+)\s*=\s*new\s+{escaped}\s*\("
    ));
    let Ok(decl_re) = decl_re else {
        return 0;
    };
    let mut best = 0usize;
    for caps in decl_re.captures_iter(masked) {
        let var = regex::escape(&caps[1]);
        let Ok(call_re) = Regex::new(&format!(r"\b{var}\s*\.\s*(\w+)\s*\(")) else {
            continue;
        };
        let methods: BTreeSet<String> = call_re
            .captures_iter(masked)
            .map(|c| c[1].to_string())
            .collect();
        best = best.max(methods.len());
    }
    best
}

fn check_composition(
    log: &mut ObligationLog,
    ref_scan: &JavaScan<'_>,
    types: &[TypeDecl],
    test_scan: &JavaScan<'_>,
) -> Result<(), ObligationViolation> {
    let Some(primary) = primary_domain_class(types) else {
        return log.require(ids::JAVA_TOPIC_COMPOSITION, false, || {
            "reference has no non-Main class to compose".to_string()
        });
    };
    let declared: BTreeSet<&str> = types
        .iter()
        .filter(|t| t.name != primary.name)
        .map(|t| t.name.as_str())
        .collect();
    let component = ref_scan
        .fields_of(primary)
        .into_iter()
        .filter(|f| {
            matches!(f.visibility, Visibility::Private | Visibility::Protected)
        })
        .find(|f| declared.contains(f.type_name.as_str()));
    let Some(component) = component else {
        return log.require(ids::JAVA_TOPIC_COMPOSITION, false, || {
            format!(
                "{} needs a private or protected field whose type is another declared type",
                primary.name
            )
        });
    };
    let masked = test_scan.masked();
    log.require(
        ids::JAVA_TOPIC_COMPOSITION,
        mentions(masked, &primary.name) && mentions(masked, &component.type_name),
        || {
            format!(
                "tests must mention both {} and its component {}",
                primary.name, component.type_name
            )
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, Language, ProblemStyle};

    fn slot(topics: &[&str], style: ProblemStyle) -> ProblemSlot {
        ProblemSlot {
            index: 0,
            language: Language::Java,
            difficulty: Difficulty::Medium,
            topics: topics.iter().map(|s| s.to_string()).collect(),
            problem_style: style,
            constraints: "c".to_string(),
            test_case_count: 8,
        }
    }

    fn draft(starter: &str, reference: &str, tests: &str) -> GeneratedProblemDraft {
        GeneratedProblemDraft {
            id: "p".into(),
            title: "t".into(),
            description: "d".into(),
            language: Language::Java,
            difficulty: Difficulty::Medium,
            topic_tag: "topic".into(),
            constraints: "c".into(),
            starter_code: starter.to_string(),
            test_suite: tests.to_string(),
            reference_solution: Some(reference.to_string()),
            reference_workspace: None,
            workspace: None,
            sample_inputs: vec!["1".into()],
            sample_outputs: vec!["1".into()],
        }
    }

    const POLY_REFERENCE: &str = r#"
interface Shape { double area(); }
class Circle implements Shape { public double area() { return 3.14; } }
class Square implements Shape { public double area() { return 4.0; } }
public class Geometry {
    public double total(Shape[] shapes) {
        double sum = 0;
        for (Shape s : shapes) sum += s.area();
        return sum;
    }
}
"#;

    const POLY_TESTS: &str = r#"
import org.junit.jupiter.api.Test;
import static org.junit.jupiter.api.Assertions.assertEquals;

public class GeometryTest {
    @Test
    public void test_case_1() {
        Shape s = new Circle();
        assertEquals(3.14, s.area(), 0);
        Shape q = new Square();
        assertEquals(4.0, q.area(), 0);
    }
}
"#;

    #[test]
    fn polymorphism_accepts_proper_shape() {
        let d = draft("public class Geometry {}", POLY_REFERENCE, POLY_TESTS);
        let results = check(&d, &slot(&["polymorphism"], ProblemStyle::Return)).unwrap();
        assert!(results
            .iter()
            .any(|r| r.id == ids::JAVA_TOPIC_POLYMORPHISM && r.ok));
    }

    #[test]
    fn polymorphism_rejects_missing_base() {
        let reference = "public class Billing { public int solve(String a, int b) { return b; } }";
        let tests = "public class BillingTest { }";
        let d = draft("public class Billing {}", reference, tests);
        let err = check(&d, &slot(&["polymorphism"], ProblemStyle::Return)).unwrap_err();
        assert_eq!(err.id, ids::JAVA_TOPIC_POLYMORPHISM);
    }

    #[test]
    fn single_public_type_violation_names_unit() {
        let reference = "public class Billing {}\npublic class Main {}";
        let d = draft("public class Billing {}", reference, "public class BillingTest {}");
        let err = check(&d, &slot(&[], ProblemStyle::Return)).unwrap_err();
        assert_eq!(err.id, ids::JAVA_SINGLE_PUBLIC_TYPE);
    }

    #[test]
    fn test_class_name_must_match_target() {
        let d = draft(
            "public class Billing {}",
            "public class Billing {}",
            "public class WrongTest {}",
        );
        let err = check(&d, &slot(&[], ProblemStyle::Return)).unwrap_err();
        assert_eq!(err.id, ids::JAVA_TEST_CLASS_MATCHES_TARGET);
    }

    #[test]
    fn while_false_is_rejected() {
        let d = draft(
            "public class Billing {}",
            "public class Billing { void m() { while(false) {} } }",
            "public class BillingTest {}",
        );
        let err = check(&d, &slot(&[], ProblemStyle::Return)).unwrap_err();
        assert_eq!(err.id, ids::JAVA_NO_WHILE_FALSE);
    }

    #[test]
    fn stdin_with_structural_topic_is_rejected() {
        let reference = r#"
public class Reader {
    public static void main(String[] args) {
        java.util.Scanner sc = new java.util.Scanner(System.in);
        System.out.println(sc.nextInt());
    }
}
"#;
        let d = draft("public class Reader {}", reference, "public class ReaderTest {}");
        let err = check(&d, &slot(&["encapsulation"], ProblemStyle::Return)).unwrap_err();
        assert_eq!(err.id, ids::JAVA_STDIN_DISALLOWED_FOR_STRUCTURAL);
    }

    #[test]
    fn stdout_style_requires_printing_reference() {
        let d = draft(
            "public class Billing {}",
            "public class Billing { int solve() { return 1; } }",
            "public class BillingTest {}",
        );
        let err = check(&d, &slot(&[], ProblemStyle::Stdout)).unwrap_err();
        assert_eq!(err.id, ids::JAVA_STDOUT_SOLUTION_PRINTS);
    }

    #[test]
    fn encapsulation_requires_private_fields_and_method_calls() {
        let reference = r#"
public class Account {
    private double balance;
    public void deposit(double amount) { balance += amount; }
    public double getBalance() { return balance; }
}
"#;
        let tests = r#"
public class AccountTest {
    @Test
    public void test_case_1() {
        Account account = new Account();
        account.deposit(10.0);
        assertEquals(10.0, account.getBalance(), 0);
    }
}
"#;
        let d = draft("public class Account {}", reference, tests);
        let results = check(&d, &slot(&["encapsulation"], ProblemStyle::Return)).unwrap();
        assert!(results
            .iter()
            .any(|r| r.id == ids::JAVA_TOPIC_ENCAPSULATION && r.ok));
    }

    #[test]
    fn encapsulation_rejects_public_field() {
        let reference = r#"
public class Account {
    private double balance;
    public int visible;
    public void deposit(double a) { balance += a; }
    public double getBalance() { return balance; }
}
"#;
        let tests = r#"
public class AccountTest {
    void t() { Account a = new Account(); a.deposit(1.0); a.getBalance(); }
}
"#;
        let d = draft("public class Account {}", reference, tests);
        let err = check(&d, &slot(&["encapsulation"], ProblemStyle::Return)).unwrap_err();
        assert_eq!(err.id, ids::JAVA_TOPIC_ENCAPSULATION);
    }

    #[test]
    fn inheritance_checks_override_and_base_typed_call() {
        let reference = r#"
class Animal {
    public String speak() { return "..."; }
}
public class Dog extends Animal {
    @Override
    public String speak() { return "woof"; }
}
"#;
        let tests = r#"
public class DogTest {
    @Test
    public void test_case_1() {
        Animal pet = new Dog();
        assertEquals("woof", pet.speak());
    }
}
"#;
        let d = draft("public class Dog {}", reference, tests);
        let results = check(&d, &slot(&["inheritance"], ProblemStyle::Return)).unwrap();
        assert!(results
            .iter()
            .any(|r| r.id == ids::JAVA_TOPIC_INHERITANCE && r.ok));
    }

    #[test]
    fn composition_requires_component_field() {
        let reference = r#"
class Engine {
    public int power() { return 120; }
}
public class Car {
    private Engine engine = new Engine();
    public int power() { return engine.power(); }
}
"#;
        let tests = r#"
public class CarTest {
    @Test
    public void test_case_1() {
        Car car = new Car();
        assertEquals(120, car.power());
        Engine spare = new Engine();
        assertEquals(120, spare.power());
    }
}
"#;
        let d = draft("public class Car {}", reference, tests);
        let results = check(&d, &slot(&["composition"], ProblemStyle::Return)).unwrap();
        assert!(results
            .iter()
            .any(|r| r.id == ids::JAVA_TOPIC_COMPOSITION && r.ok));
    }

    #[test]
    fn workspace_path_sets_must_match() {
        let mut d = draft("public class A {}", "public class A {}", "public class ATest {}");
        d.reference_solution = None;
        let mut ref_ws = std::collections::BTreeMap::new();
        ref_ws.insert("A.java".to_string(), "public class A {}".to_string());
        ref_ws.insert("B.java".to_string(), "class B {}".to_string());
        let mut starter_ws = std::collections::BTreeMap::new();
        starter_ws.insert("A.java".to_string(), "public class A {}".to_string());
        d.reference_workspace = Some(ref_ws);
        d.workspace = Some(starter_ws);
        let err = check(&d, &slot(&[], ProblemStyle::Return)).unwrap_err();
        assert_eq!(err.id, ids::JAVA_WORKSPACE_PATHS_MATCH);
    }
}
