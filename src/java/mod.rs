//! Host tree for the migration: Java source parsed with tree-sitter.
//!
//! A [`JavaUnit`] is an immutable value. Rewrites are expressed as
//! [`TextEdit`]s and committed with [`JavaUnit::apply`], which returns a new
//! unit; the old one is left untouched.

pub mod edit;
pub mod format;
pub mod imports;
pub mod resolve;
pub mod splice;
pub mod template;

pub use edit::{apply_edits, TextEdit, TextRange};
pub use imports::{ImportRequests, ImportSpec};
pub use resolve::{TypeRef, TypeResolver, UnitSymbols};

use snafu::OptionExt;
use tree_sitter::Node;

use crate::error::java_error::{ParseFailedSnafu, SyntaxRegressionSnafu, TreeSitterSnafu};
use crate::error::JavaError;

/// Node kinds tree-sitter-java uses for literal constants.
const LITERAL_KINDS: &[&str] = &[
    "string_literal",
    "character_literal",
    "text_block",
    "decimal_integer_literal",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
    "decimal_floating_point_literal",
    "hex_floating_point_literal",
    "true",
    "false",
    "null_literal",
];

/// Kinds that declare a named type and therefore open a class scope.
pub const TYPE_DECLARATION_KINDS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

/// One parsed compilation unit.
pub struct JavaUnit {
    source: String,
    tree: tree_sitter::Tree,
}

impl std::fmt::Debug for JavaUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaUnit")
            .field("len", &self.source.len())
            .field("errors", &self.error_count())
            .finish()
    }
}

impl JavaUnit {
    /// Parse Java source text.
    pub fn parse(source: impl Into<String>) -> Result<Self, JavaError> {
        let source = source.into();
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| {
                TreeSitterSnafu {
                    message: e.to_string(),
                }
                .build()
            })?;

        let tree = parser.parse(&source, None).context(ParseFailedSnafu {
            message: "tree-sitter returned None",
        })?;

        Ok(Self { source, tree })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn into_source(self) -> String {
        self.source
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Source text covered by `node`.
    pub fn text(&self, node: Node<'_>) -> &str {
        self.source.get(node.byte_range()).unwrap_or("")
    }

    /// Number of ERROR and MISSING nodes in the tree.
    pub fn error_count(&self) -> usize {
        if !self.root().has_error() {
            return 0;
        }
        descendants(self.root())
            .into_iter()
            .filter(|n| n.is_error() || n.is_missing())
            .count()
    }

    /// Byte ranges of literals spanning more than one line (text blocks).
    pub fn multiline_literals(&self) -> Vec<TextRange> {
        descendants(self.root())
            .into_iter()
            .filter(|n| matches!(n.kind(), "string_literal" | "text_block"))
            .filter(|n| n.start_position().row != n.end_position().row)
            .map(|n| TextRange::new(n.start_byte(), n.end_byte()))
            .collect()
    }

    /// Apply `edits` and return the rewritten unit together with the ranges
    /// the edits occupy in the new text.
    ///
    /// Fails if the result parses with more errors than `self`.
    pub fn apply(&self, edits: Vec<TextEdit>) -> Result<(JavaUnit, Vec<TextRange>), JavaError> {
        let (text, touched) = apply_edits(&self.source, edits)?;
        let unit = JavaUnit::parse(text)?;
        unit.ensure_no_regression(self.error_count())?;
        Ok((unit, touched))
    }

    /// Fail with `SyntaxRegression` if this unit has more parse errors than
    /// `baseline`.
    pub fn ensure_no_regression(&self, baseline: usize) -> Result<(), JavaError> {
        if self.error_count() <= baseline {
            return Ok(());
        }
        let line = descendants(self.root())
            .into_iter()
            .find(|n| n.is_error() || n.is_missing())
            .map(line_of)
            .unwrap_or(1);
        SyntaxRegressionSnafu { line }.fail()
    }
}

/// 1-based line of a node's first byte.
pub fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

pub fn is_comment(node: Node<'_>) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment")
}

pub fn is_literal(node: Node<'_>) -> bool {
    LITERAL_KINDS.contains(&node.kind())
}

/// Named children of `node`, comments excluded.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node
        .named_children(&mut cursor)
        .filter(|child| !is_comment(*child))
        .collect();
    children
}

/// First direct child of the given kind, named or not.
pub fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

/// Statements of a `block` (or any statement container), in source order.
pub fn statements(block: Node<'_>) -> Vec<Node<'_>> {
    named_children(block)
}

/// Every node below `node` in pre-order, `node` included.
pub fn descendants(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
        out.push(current);
        let mut cursor = current.walk();
        let children: Vec<Node<'_>> = current.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

/// Every node of the given kind below `node`, in source order.
pub fn find_all<'t>(node: Node<'t>, kind: &str) -> Vec<Node<'t>> {
    descendants(node)
        .into_iter()
        .filter(|n| n.kind() == kind)
        .collect()
}

/// Nearest ancestor (excluding `node`) whose kind is in `kinds`.
pub fn enclosing<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut current = node.parent();
    while let Some(parent) = current {
        if kinds.contains(&parent.kind()) {
            return Some(parent);
        }
        current = parent.parent();
    }
    None
}

/// Dotted path of the named type declarations enclosing `node`, outermost
/// first (`A`, `A.Inner`). Anonymous class bodies are transparent.
pub fn type_path(unit: &JavaUnit, node: Node<'_>) -> String {
    let mut names = Vec::new();
    let mut current = node.parent();
    while let Some(parent) = current {
        if TYPE_DECLARATION_KINDS.contains(&parent.kind()) {
            if let Some(name) = parent.child_by_field_name("name") {
                names.push(unit.text(name).to_string());
            }
        }
        current = parent.parent();
    }
    names.reverse();
    names.join(".")
}

/// Same as [`type_path`] but including `decl` itself when it is a type
/// declaration.
pub fn declaration_path(unit: &JavaUnit, decl: Node<'_>) -> String {
    let outer = type_path(unit, decl);
    let own = decl
        .child_by_field_name("name")
        .map(|n| unit.text(n).to_string())
        .unwrap_or_default();
    match (outer.is_empty(), own.is_empty()) {
        (true, _) => own,
        (false, true) => outer,
        (false, false) => format!("{outer}.{own}"),
    }
}

/// The `modifiers` node of a declaration, if it has one.
pub fn modifiers(decl: Node<'_>) -> Option<Node<'_>> {
    child_of_kind(decl, "modifiers")
}

/// Annotations (`@A` and `@A(...)`) attached to a declaration.
pub fn annotations(decl: Node<'_>) -> Vec<Node<'_>> {
    modifiers(decl)
        .map(|m| {
            named_children(m)
                .into_iter()
                .filter(|n| matches!(n.kind(), "marker_annotation" | "annotation"))
                .collect()
        })
        .unwrap_or_default()
}

/// Written name of an annotation (`Mock`, `org.jmock.auto.Mock`).
pub fn annotation_name<'u>(unit: &'u JavaUnit, annotation: Node<'_>) -> &'u str {
    annotation
        .child_by_field_name("name")
        .map(|n| unit.text(n))
        .unwrap_or("")
}

/// Last segment of a dotted name.
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
