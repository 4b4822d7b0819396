use tree_sitter::Node;

use crate::java::{is_literal, named_children, JavaUnit};
use crate::migrate::names::{ARGUMENT_MATCHERS, TYPE_HINT_MATCHERS, WITH};

/// Semantic category of one argument of a mocked call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentClassification {
    /// A literal constant, rendered as written.
    Literal(String),
    /// Any other plain expression (`index`, `this.name`, `key()`). JMock
    /// compares it by equality, so it is passed through as written.
    Value(String),
    /// `with(<literal>)`; holds the rendered `eq(<literal>)` call.
    EqualityMatcher(String),
    /// `with(any(T.class))` and friends; holds `T`.
    TypeWildcardMatcher(String),
    Unsupported,
}

impl ArgumentClassification {
    /// Target-idiom text of the argument, `None` for [`Unsupported`].
    ///
    /// [`Unsupported`]: ArgumentClassification::Unsupported
    pub fn render(&self) -> Option<String> {
        match self {
            ArgumentClassification::Literal(text) | ArgumentClassification::Value(text) => {
                Some(text.clone())
            }
            ArgumentClassification::EqualityMatcher(call) => Some(call.clone()),
            ArgumentClassification::TypeWildcardMatcher(ty) => Some(format!("any({ty}.class)")),
            ArgumentClassification::Unsupported => None,
        }
    }

    /// True for the forms Mockito treats as argument matchers. A call may
    /// not mix matchers with raw values.
    pub fn is_matcher(&self) -> bool {
        matches!(
            self,
            ArgumentClassification::EqualityMatcher(_)
                | ArgumentClassification::TypeWildcardMatcher(_)
        )
    }

    /// Static import `(owner, member)` the rendered text depends on.
    pub fn required_import(&self) -> Option<(&'static str, &'static str)> {
        match self {
            ArgumentClassification::EqualityMatcher(_) => Some((ARGUMENT_MATCHERS, "eq")),
            ArgumentClassification::TypeWildcardMatcher(_) => Some((ARGUMENT_MATCHERS, "any")),
            _ => None,
        }
    }
}

/// Classify one argument expression. Never inspects anything outside `node`.
pub fn classify(unit: &JavaUnit, node: Node<'_>) -> ArgumentClassification {
    if let Some(text) = literal_text(unit, node) {
        return ArgumentClassification::Literal(text.to_string());
    }

    let Some(inner) = single_argument_of(unit, node, WITH) else {
        if is_with_call(unit, node) {
            return ArgumentClassification::Unsupported;
        }
        return ArgumentClassification::Value(unit.text(node).to_string());
    };
    if let Some(text) = literal_text(unit, inner) {
        return ArgumentClassification::EqualityMatcher(format!("eq({text})"));
    }
    if inner.kind() != "method_invocation" || inner.child_by_field_name("object").is_some() {
        return ArgumentClassification::Unsupported;
    }
    let hint = inner
        .child_by_field_name("name")
        .map(|n| unit.text(n))
        .unwrap_or("");
    if !TYPE_HINT_MATCHERS.contains(&hint) {
        return ArgumentClassification::Unsupported;
    }
    let class_type = inner
        .child_by_field_name("arguments")
        .map(named_children)
        .filter(|args| args.len() == 1)
        .and_then(|args| args.into_iter().next())
        .filter(|arg| arg.kind() == "class_literal")
        .and_then(|literal| named_children(literal).into_iter().next());
    match class_type {
        Some(ty) => ArgumentClassification::TypeWildcardMatcher(unit.text(ty).to_string()),
        None => ArgumentClassification::Unsupported,
    }
}

/// Classify every argument of an `argument_list`, in order. An empty list
/// yields an empty vector.
pub fn classify_arguments<'t>(
    unit: &JavaUnit,
    argument_list: Node<'t>,
) -> Vec<(Node<'t>, ArgumentClassification)> {
    named_children(argument_list)
        .into_iter()
        .map(|arg| (arg, classify(unit, arg)))
        .collect()
}

/// Source text of a literal constant, negative numbers included.
pub fn literal_text<'u>(unit: &'u JavaUnit, node: Node<'_>) -> Option<&'u str> {
    if is_literal(node) {
        return Some(unit.text(node));
    }
    if node.kind() == "unary_expression" {
        let operator = node.child_by_field_name("operator").map(|op| unit.text(op));
        let operand = node.child_by_field_name("operand")?;
        let numeric = operand.kind().ends_with("integer_literal")
            || operand.kind().ends_with("floating_point_literal");
        if operator == Some("-") && numeric {
            return Some(unit.text(node));
        }
    }
    None
}

fn is_with_call(unit: &JavaUnit, node: Node<'_>) -> bool {
    node.kind() == "method_invocation"
        && node.child_by_field_name("object").is_none()
        && node
            .child_by_field_name("name")
            .is_some_and(|n| unit.text(n).eq_ignore_ascii_case(WITH))
}

/// The single argument of an unqualified call `name(arg)`, with `name`
/// compared case-insensitively.
pub fn single_argument_of<'t>(unit: &JavaUnit, node: Node<'t>, name: &str) -> Option<Node<'t>> {
    if node.kind() != "method_invocation" || node.child_by_field_name("object").is_some() {
        return None;
    }
    let called = node.child_by_field_name("name").map(|n| unit.text(n))?;
    if !called.eq_ignore_ascii_case(name) {
        return None;
    }
    let args = named_children(node.child_by_field_name("arguments")?);
    match args.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::find_all;

    fn classify_all(call: &str) -> Vec<ArgumentClassification> {
        let source = format!("class A {{ void f() {{ m.call({call}); }} }}");
        let unit = JavaUnit::parse(source).unwrap();
        let invocation = find_all(unit.root(), "method_invocation")
            .into_iter()
            .find(|m| m.child_by_field_name("object").is_some())
            .unwrap();
        let args = invocation.child_by_field_name("arguments").unwrap();
        classify_arguments(&unit, args).into_iter().map(|(_, c)| c).collect()
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            classify_all("\"one\", 100, -1, true, null, 'c'"),
            vec![
                ArgumentClassification::Literal("\"one\"".into()),
                ArgumentClassification::Literal("100".into()),
                ArgumentClassification::Literal("-1".into()),
                ArgumentClassification::Literal("true".into()),
                ArgumentClassification::Literal("null".into()),
                ArgumentClassification::Literal("'c'".into()),
            ]
        );
    }

    #[test]
    fn test_matchers() {
        let classified = classify_all("with(\"val1\"), with(any(String.class)), WITH(an(Integer.class))");
        assert_eq!(
            classified,
            vec![
                ArgumentClassification::EqualityMatcher("eq(\"val1\")".into()),
                ArgumentClassification::TypeWildcardMatcher("String".into()),
                ArgumentClassification::TypeWildcardMatcher("Integer".into()),
            ]
        );
        let rendered: Vec<String> = classified.iter().filter_map(|c| c.render()).collect();
        assert_eq!(rendered, vec!["eq(\"val1\")", "any(String.class)", "any(Integer.class)"]);
        assert_eq!(classified[0].required_import(), Some((ARGUMENT_MATCHERS, "eq")));
        assert_eq!(classified[1].required_import(), Some((ARGUMENT_MATCHERS, "any")));
    }

    #[test]
    fn test_plain_expressions_are_values() {
        let classified = classify_all("index, this.name, key(1)");
        assert_eq!(
            classified,
            vec![
                ArgumentClassification::Value("index".into()),
                ArgumentClassification::Value("this.name".into()),
                ArgumentClassification::Value("key(1)".into()),
            ]
        );
        assert!(classified.iter().all(|c| !c.is_matcher() && c.required_import().is_none()));
        assert_eq!(classified[1].render().as_deref(), Some("this.name"));
    }

    #[test]
    fn test_unsupported_shapes() {
        let classified = classify_all("with(x), with(aNull(String.class)), with(any(x)), with(1, 2)");
        assert_eq!(classified.len(), 4);
        assert!(classified
            .iter()
            .all(|c| *c == ArgumentClassification::Unsupported));
        assert!(ArgumentClassification::Unsupported.render().is_none());
    }

    #[test]
    fn test_empty_argument_list() {
        assert!(classify_all("").is_empty());
    }
}
