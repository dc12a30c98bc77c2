//! Java queries over masked source: top-level type enumeration, stdin and
//! stdout detection, field extraction for the structural-topic checks.

use lazy_static::lazy_static;
use regex::Regex;

use super::{brace_depths, c_family_classes, mask_with, string_spans};

/// Kind of a top-level type declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
}

/// A top-level type declaration found at brace depth 0.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: String,
    pub kind: TypeKind,
    pub is_abstract: bool,
    /// Byte offset of the `public` modifier, when present.
    pub public_at: Option<usize>,
    /// Byte offset of the `class`/`interface`/`enum`/`record` keyword.
    pub keyword_at: usize,
    /// Byte offset just past the type name.
    pub name_end: usize,
    /// Superclass name (classes) or first extended interface (interfaces).
    pub extends: Option<String>,
    pub implements: Vec<String>,
}

impl TypeDecl {
    pub fn is_public(&self) -> bool {
        self.public_at.is_some()
    }
}

/// Visibility of a member declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// A field declaration directly inside a type body.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub visibility: Visibility,
    /// Base type name, generics and array brackets stripped.
    pub type_name: String,
    pub name: String,
}

lazy_static! {
    static ref TYPE_RE: Regex = Regex::new(
        r"((?:\b(?:public|protected|private|abstract|final|sealed|non-sealed|strictfp|static)\s+)*)\b(class|interface|enum|record)\s+([A-Za-z_$][A-Za-z0-9_$]*)"
    )
    .expect("static regex");
    static ref PUBLIC_RE: Regex = Regex::new(r"\bpublic\b").expect("static regex");
    static ref ABSTRACT_RE: Regex = Regex::new(r"\babstract\b").expect("static regex");
    static ref EXTENDS_RE: Regex =
        Regex::new(r"\bextends\s+([A-Za-z_$][\w$.]*)").expect("static regex");
    static ref IMPLEMENTS_RE: Regex =
        Regex::new(r"\bimplements\s+([A-Za-z_$][\w$.,\s]*)").expect("static regex");
    static ref GENERIC_RE: Regex = Regex::new(r"<[^<>]*>").expect("static regex");
    static ref STDOUT_RE: Regex =
        Regex::new(r"System\s*\.\s*out\s*\.\s*print").expect("static regex");
    static ref WHILE_FALSE_RE: Regex =
        Regex::new(r"while\s*\(\s*false\s*\)").expect("static regex");
    static ref MAIN_RE: Regex = Regex::new(
        r"(?:public\s+static|static\s+public)\s+void\s+main\s*\(\s*(?:final\s+)?String\s*(?:\[\s*\]\s*[A-Za-z_$][\w$]*|\.\.\.\s*[A-Za-z_$][\w$]*)\s*\)"
    )
    .expect("static regex");
    static ref FIELD_RE: Regex = Regex::new(
        r"\b(public|protected|private)\s+((?:static\s+|final\s+|transient\s+|volatile\s+)*)([A-Za-z_$][\w$]*)((?:\s*<[^;{}()]*>)?(?:\s*\[\s*\])*)\s+([A-Za-z_$][\w$]*)\s*[=;]"
    )
    .expect("static regex");
}

/// One scanned Java compilation unit. Masking happens once at
/// construction; all queries run over the masked copy.
#[derive(Debug)]
pub struct JavaScan<'a> {
    source: &'a str,
    masked: String,
    depths: Vec<i32>,
}

impl<'a> JavaScan<'a> {
    pub fn new(source: &'a str) -> Self {
        let classes = c_family_classes(source);
        let masked = mask_with(source, &classes);
        let depths = brace_depths(&masked);
        Self {
            source,
            masked,
            depths,
        }
    }

    /// The comment/string-blanked copy of the source.
    pub fn masked(&self) -> &str {
        &self.masked
    }

    /// Top-level type declarations, in source order.
    pub fn top_level_types(&self) -> Vec<TypeDecl> {
        let mut types = Vec::new();
        for caps in TYPE_RE.captures_iter(&self.masked) {
            let mods = caps.get(1).expect("group 1");
            let keyword = caps.get(2).expect("group 2");
            let name = caps.get(3).expect("group 3");
            if self.depths.get(keyword.start()).copied().unwrap_or(0) != 0 {
                continue;
            }
            let kind = match keyword.as_str() {
                "class" => TypeKind::Class,
                "interface" => TypeKind::Interface,
                "enum" => TypeKind::Enum,
                _ => TypeKind::Record,
            };
            let mods_text = mods.as_str();
            let public_at = PUBLIC_RE.find(mods_text).map(|m| mods.start() + m.start());
            let is_abstract = ABSTRACT_RE.is_match(mods_text);
            let (extends, implements) = self.parse_header(name.end());
            types.push(TypeDecl {
                name: name.as_str().to_string(),
                kind,
                is_abstract,
                public_at,
                keyword_at: keyword.start(),
                name_end: name.end(),
                extends,
                implements,
            });
        }
        types
    }

    /// Top-level `public` type names, in source order.
    pub fn public_type_names(&self) -> Vec<String> {
        self.top_level_types()
            .into_iter()
            .filter(|t| t.is_public())
            .map(|t| t.name)
            .collect()
    }

    /// The first top-level public type, if any.
    pub fn primary_public_type(&self) -> Option<TypeDecl> {
        self.top_level_types().into_iter().find(|t| t.is_public())
    }

    /// Whether the unit reads stdin (`System.in`, including through a
    /// `Scanner` or reader wrapped around it).
    pub fn reads_stdin(&self) -> bool {
        self.masked.contains("System.in")
    }

    /// Whether the unit calls a `System.out.print*` method.
    pub fn writes_stdout(&self) -> bool {
        STDOUT_RE.is_match(&self.masked)
    }

    /// `while(false)` anywhere, an unreachable-statement compile error.
    pub fn has_while_false(&self) -> bool {
        WHILE_FALSE_RE.is_match(&self.masked)
    }

    /// A `public static void main(String[] args)` entry point.
    pub fn has_main(&self) -> bool {
        MAIN_RE.is_match(&self.masked)
    }

    /// Byte span (start, end) of a type's body in the source, brackets
    /// exclusive: the content between the opening `{` and its match.
    pub fn body_span(&self, decl: &TypeDecl) -> Option<(usize, usize)> {
        let bytes = self.masked.as_bytes();
        let open = bytes[decl.name_end..]
            .iter()
            .position(|&b| b == b'{')
            .map(|p| decl.name_end + p)?;
        let mut depth = 0i32;
        for (i, &b) in bytes.iter().enumerate().skip(open) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some((open + 1, i));
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Field declarations directly inside a type's body (nested types'
    /// fields are excluded by depth).
    pub fn fields_of(&self, decl: &TypeDecl) -> Vec<FieldDecl> {
        let Some((start, end)) = self.body_span(decl) else {
            return Vec::new();
        };
        let body_depth = self.depths.get(start).copied().unwrap_or(1);
        let mut fields = Vec::new();
        for caps in FIELD_RE.captures_iter(&self.masked[start..end]) {
            let vis_match = caps.get(1).expect("group 1");
            if self
                .depths
                .get(start + vis_match.start())
                .copied()
                .unwrap_or(0)
                != body_depth
            {
                continue;
            }
            let visibility = match vis_match.as_str() {
                "public" => Visibility::Public,
                "protected" => Visibility::Protected,
                _ => Visibility::Private,
            };
            fields.push(FieldDecl {
                visibility,
                type_name: caps.get(3).expect("group 3").as_str().to_string(),
                name: caps.get(5).expect("group 5").as_str().to_string(),
            });
        }
        fields
    }

    /// Whether a type's body contains an `@Override` annotation.
    pub fn body_has_override(&self, decl: &TypeDecl) -> bool {
        // Annotations survive masking; only comments and literals blank out.
        self.body_span(decl)
            .map(|(start, end)| self.masked[start..end].contains("@Override"))
            .unwrap_or(false)
    }

    /// String literal content spans of the original source.
    pub fn string_literal_spans(&self) -> Vec<(usize, usize)> {
        string_spans(&c_family_classes(self.source))
    }

    fn parse_header(&self, name_end: usize) -> (Option<String>, Vec<String>) {
        let bytes = self.masked.as_bytes();
        let header_end = bytes[name_end..]
            .iter()
            .position(|&b| b == b'{' || b == b';')
            .map(|p| name_end + p)
            .unwrap_or(self.masked.len());
        let header = GENERIC_RE.replace_all(&self.masked[name_end..header_end], " ");
        let extends = EXTENDS_RE
            .captures(&header)
            .map(|c| c.get(1).expect("group 1").as_str().to_string());
        let implements = IMPLEMENTS_RE
            .captures(&header)
            .map(|c| {
                c.get(1)
                    .expect("group 1")
                    .as_str()
                    .split(',')
                    .map(|s| s.trim().trim_end_matches('.').to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        (extends, implements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_top_level_types() {
        let src = "public class Billing {}\ninterface Rate {}\npublic enum Kind { A }";
        let scan = JavaScan::new(src);
        let types = scan.top_level_types();
        assert_eq!(types.len(), 3);
        assert_eq!(types[0].name, "Billing");
        assert_eq!(types[0].kind, TypeKind::Class);
        assert!(types[0].is_public());
        assert_eq!(types[1].name, "Rate");
        assert!(!types[1].is_public());
        assert_eq!(types[2].kind, TypeKind::Enum);
    }

    #[test]
    fn nested_types_are_not_top_level() {
        let src = "public class Outer { class Inner {} static class Nested {} }";
        let scan = JavaScan::new(src);
        let types = scan.top_level_types();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].name, "Outer");
    }

    #[test]
    fn type_in_string_literal_is_ignored() {
        let src = "public class A { String s = \"public class B {}\"; }";
        let scan = JavaScan::new(src);
        assert_eq!(scan.top_level_types().len(), 1);
    }

    #[test]
    fn type_in_comment_is_ignored() {
        let src = "// public class Ghost {}\npublic class Real {}";
        let scan = JavaScan::new(src);
        let types = scan.top_level_types();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].name, "Real");
    }

    #[test]
    fn detects_extends_and_implements() {
        let src = "abstract class Shape {}\nclass Circle extends Shape implements Area, Printable {}";
        let scan = JavaScan::new(src);
        let types = scan.top_level_types();
        assert!(types[0].is_abstract);
        assert_eq!(types[1].extends.as_deref(), Some("Shape"));
        assert_eq!(types[1].implements, vec!["Area", "Printable"]);
    }

    #[test]
    fn generic_header_does_not_confuse_implements() {
        let src = "public class Box implements Comparable<Box> {}";
        let scan = JavaScan::new(src);
        let types = scan.top_level_types();
        assert_eq!(types[0].implements, vec!["Comparable"]);
    }

    #[test]
    fn stdin_detection_ignores_strings() {
        let scan = JavaScan::new("class A { String s = \"System.in\"; }");
        assert!(!scan.reads_stdin());
        let scan = JavaScan::new("class A { void m() { new java.util.Scanner(System.in); } }");
        assert!(scan.reads_stdin());
    }

    #[test]
    fn stdout_and_while_false_detection() {
        let scan = JavaScan::new("class A { void m() { System.out.println(1); while(false) {} } }");
        assert!(scan.writes_stdout());
        assert!(scan.has_while_false());
        let scan = JavaScan::new("class A { // while(false)\n }");
        assert!(!scan.has_while_false());
    }

    #[test]
    fn main_detection() {
        let scan = JavaScan::new("class A { public static void main(String[] args) {} }");
        assert!(scan.has_main());
        let scan = JavaScan::new("class A { public static void main(String... args) {} }");
        assert!(scan.has_main());
        let scan = JavaScan::new("class A { void main(String[] args) {} }");
        assert!(!scan.has_main());
    }

    #[test]
    fn fields_of_primary_class() {
        let src = r#"
public class Account {
    private double balance;
    private final String owner = "x";
    public int visible;
    public double getBalance() { return balance; }
}
"#;
        let scan = JavaScan::new(src);
        let decl = scan.primary_public_type().unwrap();
        let fields = scan.fields_of(&decl);
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].visibility, Visibility::Private);
        assert_eq!(fields[0].type_name, "double");
        assert_eq!(fields[2].visibility, Visibility::Public);
    }

    #[test]
    fn nested_class_fields_are_excluded() {
        let src = "public class A { private int x; static class B { private int hidden; } }";
        let scan = JavaScan::new(src);
        let decl = scan.primary_public_type().unwrap();
        let fields = scan.fields_of(&decl);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "x");
    }

    #[test]
    fn enumeration_invariant_under_string_insertion() {
        let plain = "public class A {}\nclass B {}";
        let with_string = "public class A { String s = \"class Foo {}\"; }\nclass B {}";
        let names = |src: &str| {
            JavaScan::new(src)
                .top_level_types()
                .into_iter()
                .map(|t| t.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(plain), names(with_string));
    }
}
