//! Which classes keep their rule fields.
//!
//! A rule field is removed only when every reference to it goes away with
//! the rewrite. Any reference that survives, such as the `checking(...)` of a
//! block left on JMock, would dangle, so the declaring class keeps its whole
//! JMock scaffold.

use std::collections::BTreeMap;

use tree_sitter::Node;

use crate::java::{descendants, enclosing, line_of, JavaUnit, TextRange, TypeResolver};
use crate::migrate::cleaner::orphaned_owner;
use crate::migrate::names::SOURCE_TYPES;
use crate::migrate::scaffold::is_mock_field;

/// Type paths of classes whose rule fields are still referenced after the
/// rewrite, each with the line of its first surviving reference.
///
/// `rewritten` holds the `checking(...)` statements that will be replaced.
pub fn kept_rule_owners(
    unit: &JavaUnit,
    resolver: &dyn TypeResolver,
    rewritten: &[TextRange],
) -> BTreeMap<String, usize> {
    let mut kept = BTreeMap::new();
    for node in descendants(unit.root()) {
        if node.kind() != "identifier" {
            continue;
        }
        let Some(reference) = reference_at(node) else {
            continue;
        };
        let is_rule = resolver
            .receiver_type(unit, reference)
            .is_some_and(|ty| SOURCE_TYPES.iter().any(|source| resolver.is_of_type(&ty, source)));
        if !is_rule {
            continue;
        }
        let Some(owner) = resolver.field_owner(unit, reference) else {
            continue;
        };
        if goes_away(unit, resolver, reference, rewritten) {
            continue;
        }
        let line = line_of(reference);
        tracing::debug!(class = %owner, line, "rule field still referenced");
        kept.entry(owner)
            .and_modify(|first: &mut usize| *first = (*first).min(line))
            .or_insert(line);
    }
    kept
}

/// True if `path` is one of `kept` or nested inside one.
pub fn is_kept(path: &str, kept: &BTreeMap<String, usize>) -> bool {
    kept.keys().any(|class| {
        path == class
            || path
                .strip_prefix(class.as_str())
                .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// The expression an identifier stands for when it may name a field, or
/// `None` when it is a declared name or a member name.
fn reference_at(identifier: Node<'_>) -> Option<Node<'_>> {
    let Some(parent) = identifier.parent() else {
        return Some(identifier);
    };
    if parent.kind() == "field_access" {
        if parent.child_by_field_name("field") == Some(identifier) {
            return Some(parent);
        }
        return Some(identifier);
    }
    if parent.child_by_field_name("name") == Some(identifier) {
        return None;
    }
    Some(identifier)
}

fn goes_away(
    unit: &JavaUnit,
    resolver: &dyn TypeResolver,
    reference: Node<'_>,
    rewritten: &[TextRange],
) -> bool {
    let at = reference.start_byte();
    if rewritten.iter().any(|range| range.start <= at && at < range.end) {
        return true;
    }
    if let Some(field) = enclosing(reference, &["field_declaration"]) {
        return is_mock_field(unit, resolver, field);
    }
    enclosing(reference, &["expression_statement"])
        .and_then(|stmt| orphaned_owner(unit, resolver, stmt))
        .is_some()
}
