//! Structural edits on statements, fields and annotations.
//!
//! Every function here only computes [`TextEdit`]s against the unit it is
//! given; nothing is applied until the caller commits them.

use tree_sitter::Node;

use crate::error::JavaError;
use crate::java::edit::{ends_line, full_line_range, indent_at, line_start, starts_line};
use crate::java::resolve::TypeResolver;
use crate::java::{
    annotation_name, annotations, find_all, named_children, simple_name, statements, template,
    JavaUnit, TextEdit, TextRange,
};

/// Structural coordinate inside a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Before the first statement.
    First,
    /// After the last statement, or before it when it transfers control
    /// (`return`, `throw`).
    Last,
}

/// Fallback indentation step for blocks without statements.
const INDENT_STEP: &str = "    ";

/// Render `template` with `args` and insert the resulting statements into
/// `block` at `position`, one statement per template line.
pub fn splice_statements(
    unit: &JavaUnit,
    block: Node<'_>,
    position: Position,
    template_text: &str,
    args: &[String],
) -> Result<TextEdit, JavaError> {
    let rendered = template::render(template_text, args)?;
    let lines: Vec<&str> = rendered.lines().collect();
    let text = unit.source();
    let stmts = statements(block);

    let anchor = match position {
        Position::First => stmts.first().copied(),
        Position::Last => stmts.last().copied(),
    };
    let Some(anchor) = anchor else {
        // Empty block: place the statements right after `{`.
        let open = block.start_byte() + 1;
        let indent = format!("{}{INDENT_STEP}", indent_at(text, block.start_byte()));
        let body: String = lines.iter().map(|l| format!("\n{indent}{l}")).collect();
        return Ok(TextEdit::insert(open, body));
    };

    let before_anchor = position == Position::First
        || matches!(anchor.kind(), "return_statement" | "throw_statement");
    let indent = indent_at(text, anchor.start_byte());

    if before_anchor {
        if starts_line(text, anchor.start_byte()) {
            let body: String = lines.iter().map(|l| format!("{indent}{l}\n")).collect();
            Ok(TextEdit::insert(line_start(text, anchor.start_byte()), body))
        } else {
            let body: String = lines.iter().map(|l| format!("{l} ")).collect();
            Ok(TextEdit::insert(anchor.start_byte(), body))
        }
    } else if starts_line(text, anchor.start_byte()) {
        let body: String = lines.iter().map(|l| format!("\n{indent}{l}")).collect();
        Ok(TextEdit::insert(anchor.end_byte(), body))
    } else {
        let body: String = lines.iter().map(|l| format!(" {l}")).collect();
        Ok(TextEdit::insert(anchor.end_byte(), body))
    }
}

/// Delete statements, taking their lines with them when they sit alone.
pub fn remove_statements(unit: &JavaUnit, to_remove: &[Node<'_>]) -> Vec<TextEdit> {
    to_remove
        .iter()
        .map(|stmt| TextEdit::delete(full_line_range(unit.source(), byte_range(*stmt))))
        .collect()
}

/// Delete a field declaration, its annotations included.
pub fn remove_field(unit: &JavaUnit, field: Node<'_>) -> TextEdit {
    TextEdit::delete(full_line_range(unit.source(), byte_range(field)))
}

/// Replace a node's text wholesale.
pub fn replace_node(node: Node<'_>, text: impl Into<String>) -> TextEdit {
    TextEdit::replace(byte_range(node), text)
}

/// Add `annotation_text` (e.g. `@ExtendWith(MockitoExtension.class)`) to a
/// declaration, ordered among its existing annotations by simple name.
pub fn add_annotation(unit: &JavaUnit, decl: Node<'_>, annotation_text: &str) -> TextEdit {
    let text = unit.source();
    let key = annotation_key(annotation_text);
    let existing = annotations(decl);

    let successor = existing
        .iter()
        .find(|a| simple_name(annotation_name(unit, **a)) > key);
    if let Some(next) = successor {
        let at = next.start_byte();
        return if starts_line(text, at) {
            TextEdit::insert(at, format!("{annotation_text}\n{}", indent_at(text, at)))
        } else {
            TextEdit::insert(at, format!("{annotation_text} "))
        };
    }

    if let Some(last) = existing.last() {
        let at = last.end_byte();
        return if ends_line(text, at) {
            TextEdit::insert(at, format!("\n{}{annotation_text}", indent_at(text, at)))
        } else {
            TextEdit::insert(at, format!(" {annotation_text}"))
        };
    }

    let at = decl.start_byte();
    if starts_line(text, at) {
        TextEdit::insert(at, format!("{annotation_text}\n{}", indent_at(text, at)))
    } else {
        TextEdit::insert(at, format!("{annotation_text} "))
    }
}

/// True if `decl` carries an annotation of type `annotation_type`, optionally
/// with a class-literal argument of type `class_argument`.
pub fn has_annotation(
    unit: &JavaUnit,
    resolver: &dyn TypeResolver,
    decl: Node<'_>,
    annotation_type: &str,
    class_argument: Option<&str>,
) -> bool {
    annotations(decl).into_iter().any(|annotation| {
        let resolved = resolver.resolve_type_name(annotation_name(unit, annotation));
        if resolved.as_ref().map(|t| t.qualified_name()) != Some(annotation_type) {
            return false;
        }
        let Some(expected) = class_argument else {
            return true;
        };
        let Some(arguments) = annotation.child_by_field_name("arguments") else {
            return false;
        };
        find_all(arguments, "class_literal").into_iter().any(|literal| {
            named_children(literal)
                .first()
                .and_then(|ty| resolver.resolve_type_name(unit.text(*ty)))
                .is_some_and(|ty| ty.qualified_name() == expected)
        })
    })
}

/// Simple name used to order an annotation: `@a.b.C(x)` -> `C`.
fn annotation_key(annotation_text: &str) -> &str {
    let name = annotation_text.trim_start_matches('@');
    let name = name.split('(').next().unwrap_or(name).trim();
    simple_name(name)
}

fn byte_range(node: Node<'_>) -> TextRange {
    TextRange::new(node.start_byte(), node.end_byte())
}
