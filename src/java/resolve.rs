//! Type identity queries over a compilation unit.
//!
//! tree-sitter gives syntax only, so types are resolved the way a reader of a
//! single file would: imports, the unit's own declarations, `java.lang`, and a
//! small supertype table for the framework types the migration cares about.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use tree_sitter::Node;

use crate::config::TypeHierarchy;
use crate::java::{
    declaration_path, descendants, enclosing, find_all, named_children, statements, type_path,
    JavaUnit, TYPE_DECLARATION_KINDS,
};

/// A resolved, fully-qualified type name without type arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRef(String);

impl TypeRef {
    pub fn new(qualified: impl Into<String>) -> Self {
        Self(qualified.into())
    }

    pub fn qualified_name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Narrow type-query capability the migration core depends on.
pub trait TypeResolver {
    /// Resolve a type as written in source (`List<String>`, `Mock`,
    /// `org.jmock.Mockery`).
    fn resolve_type_name(&self, written: &str) -> Option<TypeRef>;

    /// Declared type of a field or local variable declaration.
    fn declared_type(&self, unit: &JavaUnit, declaration: Node<'_>) -> Option<TypeRef>;

    /// Static type of a method-call receiver (`context`, `this.context`).
    fn receiver_type(&self, unit: &JavaUnit, receiver: Node<'_>) -> Option<TypeRef>;

    /// Type path of the class declaring the field `reference` names
    /// (`context`, `this.context`). `None` for locals, parameters and
    /// anything that is not a field of this unit.
    fn field_owner(&self, unit: &JavaUnit, reference: Node<'_>) -> Option<String>;

    /// True if `ty` is `qualified` or one of its supertypes is.
    fn is_of_type(&self, ty: &TypeRef, qualified: &str) -> bool;
}

/// Supertype relations known without configuration.
const BUILTIN_SUPERTYPES: &[(&str, &str)] = &[
    (
        "org.jmock.integration.junit4.JUnitRuleMockery",
        "org.jmock.integration.junit4.JUnit4Mockery",
    ),
    ("org.jmock.integration.junit4.JUnit4Mockery", "org.jmock.Mockery"),
    ("org.jmock.junit5.JUnit5Mockery", "org.jmock.Mockery"),
    ("org.mockito.junit.MockitoRule", "org.junit.rules.MethodRule"),
    ("org.mockito.junit.MockitoTestRule", "org.junit.rules.TestRule"),
];

/// Types reachable through a wildcard import that resolution recognises.
const KNOWN_TYPES: &[&str] = &[
    "org.jmock.Expectations",
    "org.jmock.Mockery",
    "org.jmock.auto.Mock",
    "org.jmock.integration.junit4.JUnit4Mockery",
    "org.jmock.integration.junit4.JUnitRuleMockery",
    "org.junit.Rule",
    "org.junit.Test",
    "org.junit.runner.RunWith",
    "org.junit.jupiter.api.Test",
    "org.junit.jupiter.api.extension.ExtendWith",
    "org.mockito.Mock",
    "org.mockito.junit.MockitoJUnitRunner",
    "org.mockito.junit.MockitoRule",
    "org.mockito.junit.MockitoTestRule",
    "org.mockito.junit.jupiter.MockitoExtension",
    "org.mockito.runners.MockitoJUnitRunner",
];

const JAVA_LANG: &[&str] = &[
    "Boolean", "Byte", "Character", "Class", "Double", "Enum", "Exception", "Float",
    "Integer", "Iterable", "Long", "Number", "Object", "Runnable", "RuntimeException",
    "Short", "String", "StringBuilder", "System", "Thread", "Throwable", "Void",
];

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "double", "float", "int", "long", "short", "void",
];

/// Symbols of one compilation unit, captured before any rewrite so that
/// resolution keeps working after declarations are removed.
#[derive(Debug, Clone, Default)]
pub struct UnitSymbols {
    package: Option<String>,
    /// simple name -> qualified name, from single-type imports.
    imports: HashMap<String, String>,
    /// Packages imported with `.*`.
    wildcards: Vec<String>,
    /// simple name -> qualified name, for types declared in this unit.
    declared: HashMap<String, String>,
    /// type path -> field name -> written type.
    fields: HashMap<String, HashMap<String, String>>,
    supertypes: BTreeMap<String, Vec<String>>,
}

impl UnitSymbols {
    pub fn build(unit: &JavaUnit, hierarchy: &TypeHierarchy) -> Self {
        let mut symbols = UnitSymbols {
            supertypes: hierarchy.supertypes.clone(),
            ..Default::default()
        };
        for (sub, sup) in BUILTIN_SUPERTYPES {
            symbols
                .supertypes
                .entry(sub.to_string())
                .or_default()
                .push(sup.to_string());
        }

        let root = unit.root();
        if let Some(package) = find_all(root, "package_declaration").first() {
            symbols.package = named_children(*package)
                .into_iter()
                .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
                .map(|n| unit.text(n).to_string());
        }

        for import in find_all(root, "import_declaration") {
            let text = unit.text(import);
            if text.contains(" static ") || text.starts_with("import static") {
                continue;
            }
            let Some(path) = named_children(import)
                .into_iter()
                .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
                .map(|n| unit.text(n).to_string())
            else {
                continue;
            };
            if named_children(import).iter().any(|n| n.kind() == "asterisk") {
                symbols.wildcards.push(path);
            } else {
                let simple = crate::java::simple_name(&path).to_string();
                symbols.imports.insert(simple, path);
            }
        }

        for kind in TYPE_DECLARATION_KINDS {
            for decl in find_all(root, kind) {
                let path = declaration_path(unit, decl);
                let qualified = match &symbols.package {
                    Some(pkg) => format!("{pkg}.{path}"),
                    None => path.clone(),
                };
                if let Some(name) = decl.child_by_field_name("name") {
                    symbols
                        .declared
                        .entry(unit.text(name).to_string())
                        .or_insert(qualified);
                }
            }
        }

        for field in find_all(root, "field_declaration") {
            let Some(ty) = field.child_by_field_name("type") else {
                continue;
            };
            let written = unit.text(ty).to_string();
            let owner = type_path(unit, field);
            let table = symbols.fields.entry(owner).or_default();
            for declarator in named_children(field)
                .into_iter()
                .filter(|n| n.kind() == "variable_declarator")
            {
                if let Some(name) = declarator.child_by_field_name("name") {
                    table.insert(unit.text(name).to_string(), written.clone());
                }
            }
        }

        symbols
    }

    /// True if the unit refers to `qualified` through an import or any type
    /// reference.
    pub fn uses_type(&self, unit: &JavaUnit, qualified: &str) -> bool {
        if self.imports.values().any(|q| q == qualified) {
            return true;
        }
        descendants(unit.root())
            .into_iter()
            .filter(|n| matches!(n.kind(), "type_identifier" | "scoped_type_identifier"))
            .filter_map(|n| self.resolve_type_name(unit.text(n)))
            .any(|ty| ty.qualified_name() == qualified)
    }

    /// The field `name` visible from type path `owner`, searching enclosing
    /// types outward: declaring type path and written type.
    fn field_in_scope(&self, owner: &str, name: &str) -> Option<(String, &str)> {
        let mut scope = owner.to_string();
        loop {
            if let Some(ty) = self.fields.get(&scope).and_then(|t| t.get(name)) {
                return Some((scope, ty));
            }
            match scope.rfind('.') {
                Some(i) => scope.truncate(i),
                None if !scope.is_empty() => scope.clear(),
                None => return None,
            }
        }
    }

    /// Field named by a bare identifier or by `this.<name>`, without
    /// checking for shadowing locals.
    fn field_of(&self, unit: &JavaUnit, reference: Node<'_>) -> Option<(String, &str)> {
        match reference.kind() {
            "identifier" => self.field_in_scope(&type_path(unit, reference), unit.text(reference)),
            "field_access" => {
                let object = reference.child_by_field_name("object")?;
                let field = reference.child_by_field_name("field")?;
                if object.kind() != "this" {
                    return None;
                }
                let owner = enclosing(reference, TYPE_DECLARATION_KINDS)
                    .map(|decl| declaration_path(unit, decl))
                    .unwrap_or_default();
                self.field_in_scope(&owner, unit.text(field))
            }
            _ => None,
        }
    }

    /// Written type of a local variable or parameter `name` in scope at `at`.
    fn local_type<'u>(&self, unit: &'u JavaUnit, at: Node<'_>, name: &str) -> Option<&'u str> {
        let mut current = at.parent();
        while let Some(scope) = current {
            match scope.kind() {
                "block" => {
                    for stmt in statements(scope) {
                        if stmt.start_byte() >= at.start_byte() {
                            break;
                        }
                        if stmt.kind() == "local_variable_declaration"
                            && declares(unit, stmt, name)
                        {
                            return stmt.child_by_field_name("type").map(|t| unit.text(t));
                        }
                    }
                }
                "method_declaration" | "constructor_declaration" | "lambda_expression" => {
                    let params = scope.child_by_field_name("parameters");
                    for param in params.map(named_children).unwrap_or_default() {
                        let matches = param
                            .child_by_field_name("name")
                            .is_some_and(|n| unit.text(n) == name);
                        if matches {
                            return param.child_by_field_name("type").map(|t| unit.text(t));
                        }
                    }
                    if scope.kind() != "lambda_expression" {
                        return None;
                    }
                }
                kind if TYPE_DECLARATION_KINDS.contains(&kind) => return None,
                _ => {}
            }
            current = scope.parent();
        }
        None
    }

    fn supertypes_of(&self, qualified: &str) -> &[String] {
        self.supertypes
            .get(qualified)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn declares(unit: &JavaUnit, declaration: Node<'_>, name: &str) -> bool {
    named_children(declaration)
        .into_iter()
        .filter(|n| n.kind() == "variable_declarator")
        .filter_map(|d| d.child_by_field_name("name"))
        .any(|n| unit.text(n) == name)
}

/// Drop type arguments, array brackets and annotations from written type text.
fn erase(written: &str) -> String {
    let mut out = String::with_capacity(written.len());
    let mut depth = 0usize;
    for c in written.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 && !c.is_whitespace() && c != '[' && c != ']' => out.push(c),
            _ => {}
        }
    }
    out.trim_start_matches(|c: char| c == '@').to_string()
}

impl TypeResolver for UnitSymbols {
    fn resolve_type_name(&self, written: &str) -> Option<TypeRef> {
        let name = erase(written);
        if name.is_empty() || name == "var" {
            return None;
        }
        if PRIMITIVES.contains(&name.as_str()) {
            return Some(TypeRef::new(name));
        }

        if let Some((head, rest)) = name.split_once('.') {
            // `Outer.Inner` through an imported or declared outer type.
            if let Some(outer) = self.imports.get(head).or_else(|| self.declared.get(head)) {
                return Some(TypeRef::new(format!("{outer}.{rest}")));
            }
            return Some(TypeRef::new(name));
        }

        if let Some(q) = self.imports.get(&name) {
            return Some(TypeRef::new(q.clone()));
        }
        if let Some(q) = self.declared.get(&name) {
            return Some(TypeRef::new(q.clone()));
        }
        if JAVA_LANG.contains(&name.as_str()) {
            return Some(TypeRef::new(format!("java.lang.{name}")));
        }
        let via_wildcard = KNOWN_TYPES.iter().find(|known| {
            crate::java::simple_name(known) == name
                && self.wildcards.iter().any(|pkg| {
                    known
                        .strip_prefix(pkg.as_str())
                        .and_then(|rest| rest.strip_prefix('.'))
                        == Some(name.as_str())
                })
        });
        if let Some(known) = via_wildcard {
            return Some(TypeRef::new(*known));
        }
        if !self.wildcards.is_empty() {
            // Could live in any wildcard package or the current one.
            return None;
        }
        match &self.package {
            Some(pkg) => Some(TypeRef::new(format!("{pkg}.{name}"))),
            None => Some(TypeRef::new(name)),
        }
    }

    fn declared_type(&self, unit: &JavaUnit, declaration: Node<'_>) -> Option<TypeRef> {
        let ty = declaration.child_by_field_name("type")?;
        self.resolve_type_name(unit.text(ty))
    }

    fn receiver_type(&self, unit: &JavaUnit, receiver: Node<'_>) -> Option<TypeRef> {
        match receiver.kind() {
            "identifier" => {
                let name = unit.text(receiver);
                if let Some(local) = self.local_type(unit, receiver, name) {
                    return self.resolve_type_name(local);
                }
                let (_, written) = self.field_of(unit, receiver)?;
                self.resolve_type_name(written)
            }
            "field_access" => {
                let (_, written) = self.field_of(unit, receiver)?;
                self.resolve_type_name(written)
            }
            "parenthesized_expression" => {
                let inner = named_children(receiver).into_iter().next()?;
                self.receiver_type(unit, inner)
            }
            _ => None,
        }
    }

    fn field_owner(&self, unit: &JavaUnit, reference: Node<'_>) -> Option<String> {
        if reference.kind() == "identifier"
            && self.local_type(unit, reference, unit.text(reference)).is_some()
        {
            return None;
        }
        self.field_of(unit, reference).map(|(owner, _)| owner)
    }

    fn is_of_type(&self, ty: &TypeRef, qualified: &str) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([ty.qualified_name().to_string()]);
        while let Some(current) = queue.pop_front() {
            if current == qualified {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            queue.extend(self.supertypes_of(&current).iter().cloned());
        }
        false
    }
}
