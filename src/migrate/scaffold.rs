//! Class-level scaffold: rule fields, the extension annotation and mock
//! field declarations.

use std::collections::{BTreeMap, BTreeSet};

use tree_sitter::Node;

use crate::java::splice::{add_annotation, has_annotation, remove_field, replace_node};
use crate::java::{
    annotation_name, annotations, child_of_kind, declaration_path, find_all, line_of,
    named_children, simple_name, ImportRequests, JavaUnit, TextEdit, TextRange, TypeResolver,
};
use crate::migrate::names::{
    EXTEND_WITH, EXTEND_WITH_MOCKITO, JMOCK_MOCK, JMOCK_RULE_IMPORTS, JUNIT_RULE_MOCKERY, MOCKERY,
    MOCKITO_EXTENSION, MOCKITO_MOCK, MOCKITO_RULE, MOCKITO_RULE_IMPORTS, MOCKITO_RUNNERS,
    MOCKITO_TEST_RULE, RUN_WITH,
};
use crate::migrate::retention::is_kept;
use crate::migrate::{Diagnostic, DiagnosticKind, Severity};

/// What the scaffold pass found on one class.
#[derive(Debug)]
pub struct ScaffoldDecision<'t> {
    /// Type path of the class (`A`, `A.Inner`).
    pub class_path: String,
    /// `JUnitRuleMockery` fields.
    pub jmock_fields: Vec<Node<'t>>,
    /// `MockitoRule` / `MockitoTestRule` fields.
    pub rule_fields: Vec<Node<'t>>,
    /// Fields initialized with `<mockery>.mock(T.class)`.
    pub mock_fields: Vec<Node<'t>>,
    /// JMock `@Mock` annotations to swap.
    pub jmock_mock_annotations: Vec<Node<'t>>,
    /// The class already carries the extension or the Mockito runner.
    pub has_extension: bool,
}

impl ScaffoldDecision<'_> {
    pub fn retires_rules(&self) -> bool {
        !self.jmock_fields.is_empty() || !self.rule_fields.is_empty()
    }

    pub fn needs_extension(&self) -> bool {
        self.retires_rules() && !self.has_extension
    }
}

/// Result of rewriting every class of a unit.
#[derive(Debug, Default)]
pub struct ScaffoldRewrite {
    pub edits: Vec<TextEdit>,
    /// Type paths of classes whose rule fields were removed.
    pub retired_classes: BTreeSet<String>,
    pub annotations_added: usize,
}

/// Inspect one class declaration.
pub fn decide<'t>(
    unit: &JavaUnit,
    resolver: &dyn TypeResolver,
    class: Node<'t>,
    diagnostics: &mut Vec<Diagnostic>,
) -> ScaffoldDecision<'t> {
    let mut decision = ScaffoldDecision {
        class_path: declaration_path(unit, class),
        jmock_fields: Vec::new(),
        rule_fields: Vec::new(),
        mock_fields: Vec::new(),
        jmock_mock_annotations: Vec::new(),
        has_extension: has_extension(unit, resolver, class),
    };

    let fields = class
        .child_by_field_name("body")
        .map(named_children)
        .unwrap_or_default()
        .into_iter()
        .filter(|n| n.kind() == "field_declaration");

    for field in fields {
        match resolver.declared_type(unit, field) {
            Some(ty) if resolver.is_of_type(&ty, JUNIT_RULE_MOCKERY) => {
                decision.jmock_fields.push(field);
                continue;
            }
            Some(ty)
                if resolver.is_of_type(&ty, MOCKITO_RULE)
                    || resolver.is_of_type(&ty, MOCKITO_TEST_RULE) =>
            {
                decision.rule_fields.push(field);
                continue;
            }
            _ => {}
        }

        decision.jmock_mock_annotations.extend(
            annotations(field).into_iter().filter(|a| {
                resolver
                    .resolve_type_name(annotation_name(unit, *a))
                    .is_some_and(|t| t.qualified_name() == JMOCK_MOCK)
            }),
        );

        match mock_initializers(unit, resolver, field) {
            MockInitializers::All => decision.mock_fields.push(field),
            MockInitializers::Unresolved(receiver) => {
                tracing::debug!("cannot resolve mock factory `{receiver}`, field left as is");
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnresolvedType,
                    Severity::Warning,
                    line_of(field),
                    format!("cannot resolve the type of `{receiver}`; field left unchanged"),
                ));
            }
            MockInitializers::NotMock => {}
        }
    }

    decision
}

/// Rewrite the scaffold of every class in `unit`. Classes in `kept`, and
/// classes nested in them, are left as they are.
pub fn rewrite_classes(
    unit: &JavaUnit,
    resolver: &dyn TypeResolver,
    kept: &BTreeMap<String, usize>,
    imports: &mut ImportRequests,
    diagnostics: &mut Vec<Diagnostic>,
) -> ScaffoldRewrite {
    let mut rewrite = ScaffoldRewrite::default();

    for class in find_all(unit.root(), "class_declaration") {
        if is_kept(&declaration_path(unit, class), kept) {
            continue;
        }
        let decision = decide(unit, resolver, class, diagnostics);

        for field in decision.jmock_fields.iter().chain(&decision.rule_fields) {
            rewrite.edits.push(remove_field(unit, *field));
        }
        if !decision.jmock_fields.is_empty() {
            for import in JMOCK_RULE_IMPORTS {
                imports.request_import_removal(import);
            }
        }
        if !decision.rule_fields.is_empty() {
            for import in MOCKITO_RULE_IMPORTS {
                imports.request_import_removal(import);
            }
        }
        if decision.retires_rules() {
            rewrite.retired_classes.insert(decision.class_path.clone());
        }
        if decision.needs_extension() {
            rewrite.edits.push(add_annotation(unit, class, EXTEND_WITH_MOCKITO));
            imports.request_import(EXTEND_WITH, None);
            imports.request_import(MOCKITO_EXTENSION, None);
            rewrite.annotations_added += 1;
        }

        for field in &decision.mock_fields {
            let already_annotated = annotations(*field)
                .iter()
                .any(|a| simple_name(annotation_name(unit, *a)) == "Mock");
            if !already_annotated {
                rewrite.edits.push(add_annotation(unit, *field, "@Mock"));
            }
            rewrite.edits.extend(drop_initializers(*field));
            imports.request_import(MOCKITO_MOCK, None);
        }

        for annotation in &decision.jmock_mock_annotations {
            rewrite.edits.push(replace_node(*annotation, "@Mock"));
            imports.request_import_removal(JMOCK_MOCK);
            imports.request_import(MOCKITO_MOCK, None);
        }

        if decision.retires_rules() || !decision.mock_fields.is_empty() {
            tracing::debug!(
                class = %decision.class_path,
                rules = decision.jmock_fields.len() + decision.rule_fields.len(),
                mocks = decision.mock_fields.len(),
                "rewrote class scaffold"
            );
        }
    }

    rewrite
}

fn has_extension(unit: &JavaUnit, resolver: &dyn TypeResolver, class: Node<'_>) -> bool {
    has_annotation(unit, resolver, class, EXTEND_WITH, Some(MOCKITO_EXTENSION))
        || MOCKITO_RUNNERS
            .iter()
            .any(|runner| has_annotation(unit, resolver, class, RUN_WITH, Some(runner)))
}

/// True if every declarator of `field` is `<mockery>.mock(...)`.
pub fn is_mock_field(unit: &JavaUnit, resolver: &dyn TypeResolver, field: Node<'_>) -> bool {
    matches!(mock_initializers(unit, resolver, field), MockInitializers::All)
}

enum MockInitializers {
    /// Every declarator is `<mockery>.mock(...)`.
    All,
    /// A `.mock(...)` receiver whose type could not be resolved.
    Unresolved(String),
    NotMock,
}

fn mock_initializers(
    unit: &JavaUnit,
    resolver: &dyn TypeResolver,
    field: Node<'_>,
) -> MockInitializers {
    let declarators: Vec<Node<'_>> = named_children(field)
        .into_iter()
        .filter(|n| n.kind() == "variable_declarator")
        .collect();
    if declarators.is_empty() {
        return MockInitializers::NotMock;
    }

    for declarator in declarators {
        let Some(value) = declarator.child_by_field_name("value") else {
            return MockInitializers::NotMock;
        };
        if value.kind() != "method_invocation" {
            return MockInitializers::NotMock;
        }
        let is_mock_call = value
            .child_by_field_name("name")
            .is_some_and(|n| unit.text(n) == "mock");
        let Some(receiver) = value.child_by_field_name("object") else {
            return MockInitializers::NotMock;
        };
        if !is_mock_call {
            return MockInitializers::NotMock;
        }
        match resolver.receiver_type(unit, receiver) {
            Some(ty) if resolver.is_of_type(&ty, MOCKERY) => {}
            Some(_) => return MockInitializers::NotMock,
            None => return MockInitializers::Unresolved(unit.text(receiver).to_string()),
        }
    }
    MockInitializers::All
}

/// Delete ` = <value>` from every declarator of a field.
fn drop_initializers(field: Node<'_>) -> Vec<TextEdit> {
    named_children(field)
        .into_iter()
        .filter(|n| n.kind() == "variable_declarator")
        .filter_map(|declarator| {
            let value = declarator.child_by_field_name("value")?;
            let assign = child_of_kind(declarator, "=")?;
            let from = assign.prev_sibling().map_or(assign.start_byte(), |n| n.end_byte());
            Some(TextEdit::delete(TextRange::new(from, value.end_byte())))
        })
        .collect()
}
