use std::collections::BTreeSet;

use tree_sitter::Node;

use crate::java::splice::remove_statements;
use crate::java::{find_all, named_children, JavaUnit, TextEdit, TypeResolver};
use crate::migrate::names::{CHECKING, SOURCE_TYPES};

/// Remove method and constructor top-level statements that call into a rule
/// field declared by one of `retired_classes`. `checking(...)` calls are
/// kept; a remaining one is an expectation block that was not rewritten.
pub fn clean(
    unit: &JavaUnit,
    resolver: &dyn TypeResolver,
    retired_classes: &BTreeSet<String>,
) -> Vec<TextEdit> {
    if retired_classes.is_empty() {
        return Vec::new();
    }

    let orphaned: Vec<Node<'_>> = find_all(unit.root(), "expression_statement")
        .into_iter()
        .filter(|stmt| {
            orphaned_owner(unit, resolver, *stmt)
                .is_some_and(|owner| retired_classes.contains(&owner))
        })
        .collect();

    if !orphaned.is_empty() {
        tracing::debug!("removing {} orphaned rule invocations", orphaned.len());
    }
    remove_statements(unit, &orphaned)
}

/// Class declaring the rule field `stmt` calls into, when `stmt` is a
/// removable top-level `<rule>.member(...);` of a method or constructor body.
pub fn orphaned_owner(
    unit: &JavaUnit,
    resolver: &dyn TypeResolver,
    stmt: Node<'_>,
) -> Option<String> {
    if stmt.kind() != "expression_statement" || !is_top_level(stmt) {
        return None;
    }
    let call = named_children(stmt)
        .into_iter()
        .next()
        .filter(|expr| expr.kind() == "method_invocation")?;
    let is_checking = call
        .child_by_field_name("name")
        .is_some_and(|n| unit.text(n) == CHECKING);
    if is_checking {
        return None;
    }
    let receiver = call.child_by_field_name("object")?;
    let is_rule = resolver
        .receiver_type(unit, receiver)
        .is_some_and(|ty| SOURCE_TYPES.iter().any(|source| resolver.is_of_type(&ty, source)));
    if !is_rule {
        return None;
    }
    resolver.field_owner(unit, receiver)
}

fn is_top_level(stmt: Node<'_>) -> bool {
    let Some(body) = stmt.parent() else {
        return false;
    };
    body.parent().is_some_and(|method| {
        matches!(method.kind(), "method_declaration" | "constructor_declaration")
            && method.child_by_field_name("body") == Some(body)
    })
}
