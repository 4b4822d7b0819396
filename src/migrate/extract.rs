//! Interaction extraction from one expectation initializer body.
//!
//! The body is a flat statement list. `oneOf(mock).member(args);` opens a
//! pending selection and the next `will(returnValue(lit));` closes it into a
//! [`MockInteraction`]. Statements that neither open nor close are skipped.

use std::collections::BTreeSet;

use snafu::OptionExt;
use tree_sitter::Node;

use crate::error::expectation_error::{MalformedExpectationSnafu, UnsupportedArgumentShapeSnafu};
use crate::error::ExpectationError;
use crate::java::{line_of, named_children, statements, JavaUnit};
use crate::migrate::classify::{classify_arguments, literal_text, single_argument_of};
use crate::migrate::names::{ARGUMENT_MATCHERS, ONE_OF, RETURN_VALUE, WILL};

/// One normalized mocked call with its stubbed result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockInteraction {
    /// Mock expression as written (`mockedList`, `this.list`).
    pub target: String,
    pub member: String,
    /// Rendered target-idiom arguments, in call order.
    pub arguments: Vec<String>,
    /// Literal text of the stubbed return value.
    pub return_value: String,
    /// Line of the closing `will(...)`.
    pub line: usize,
}

impl MockInteraction {
    /// `member(arg, ...)`
    pub fn call(&self) -> String {
        format!("{}({})", self.member, self.arguments.join(", "))
    }
}

/// A selection or directive that did not end up in an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedStatement {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Interactions in the order their `will(...)` appears.
    pub interactions: Vec<MockInteraction>,
    /// Static `(owner, member)` imports the rendered arguments need.
    pub matcher_imports: BTreeSet<(&'static str, &'static str)>,
    pub dropped: Vec<DroppedStatement>,
}

struct Pending {
    target: String,
    member: String,
    arguments: Vec<String>,
    imports: Vec<(&'static str, &'static str)>,
    line: usize,
}

/// Extract the interactions of an expectation initializer `body` (the inner
/// block of `new Expectations() {{ ... }}`).
///
/// Fails with `MalformedExpectation` when a `oneOf` or `will` has the wrong
/// number of arguments, and with `UnsupportedArgumentShape` when a selection
/// or return value is outside the recognized shape.
pub fn extract(unit: &JavaUnit, body: Node<'_>) -> Result<Extraction, ExpectationError> {
    let mut extraction = Extraction::default();
    let mut pending: Option<Pending> = None;

    for statement in statements(body) {
        let Some(call) = invocation_of(statement) else {
            continue;
        };
        let line = line_of(statement);

        if let Some(selection) = selection(unit, call)? {
            if let Some(open) = pending.replace(selection) {
                tracing::debug!("selection at line {} replaced before its will()", open.line);
                extraction.dropped.push(DroppedStatement {
                    line: open.line,
                    reason: format!("`{}.{}` has no will(...)", open.target, open.member),
                });
            }
            continue;
        }

        if !is_unqualified_call(unit, call, WILL) {
            continue;
        }
        let return_value = return_value(unit, call, line)?;
        match pending.take() {
            Some(open) => {
                extraction.matcher_imports.extend(open.imports);
                extraction.interactions.push(MockInteraction {
                    target: open.target,
                    member: open.member,
                    arguments: open.arguments,
                    return_value,
                    line,
                });
            }
            None => extraction.dropped.push(DroppedStatement {
                line,
                reason: "will(...) without a preceding oneOf(...)".to_string(),
            }),
        }
    }

    if let Some(open) = pending {
        extraction.dropped.push(DroppedStatement {
            line: open.line,
            reason: format!("`{}.{}` has no will(...)", open.target, open.member),
        });
    }
    Ok(extraction)
}

/// The method invocation an expression statement consists of.
fn invocation_of(statement: Node<'_>) -> Option<Node<'_>> {
    if statement.kind() != "expression_statement" {
        return None;
    }
    named_children(statement)
        .into_iter()
        .next()
        .filter(|expr| expr.kind() == "method_invocation")
}

fn is_unqualified_call(unit: &JavaUnit, call: Node<'_>, name: &str) -> bool {
    call.child_by_field_name("object").is_none()
        && call
            .child_by_field_name("name")
            .is_some_and(|n| unit.text(n).eq_ignore_ascii_case(name))
}

/// Parse `selector(mock).member(args)`. Returns `None` for calls that are not
/// chained off an unqualified selector; any selector other than `oneOf` is
/// outside the recognized shape.
fn selection(unit: &JavaUnit, call: Node<'_>) -> Result<Option<Pending>, ExpectationError> {
    let Some(selector) = call.child_by_field_name("object") else {
        return Ok(None);
    };
    if selector.kind() != "method_invocation" || selector.child_by_field_name("object").is_some() {
        return Ok(None);
    }
    let line = line_of(call);
    if !is_unqualified_call(unit, selector, ONE_OF) {
        return UnsupportedArgumentShapeSnafu {
            line,
            text: unit.text(call).to_string(),
        }
        .fail();
    }

    let selector_args = selector
        .child_by_field_name("arguments")
        .map(named_children)
        .unwrap_or_default();
    let [mock] = selector_args.as_slice() else {
        return MalformedExpectationSnafu {
            line,
            message: format!("oneOf takes exactly one mock, got {}", selector_args.len()),
        }
        .fail();
    };
    if !matches!(mock.kind(), "identifier" | "field_access") {
        return UnsupportedArgumentShapeSnafu {
            line,
            text: unit.text(*mock).to_string(),
        }
        .fail();
    }

    let member = call
        .child_by_field_name("name")
        .map(|n| unit.text(n).to_string())
        .context(MalformedExpectationSnafu {
            line,
            message: "selection has no member call",
        })?;

    let classified = call
        .child_by_field_name("arguments")
        .map(|args| classify_arguments(unit, args))
        .unwrap_or_default();
    let mut imports = Vec::new();
    let mut rendered = Vec::new();
    for (node, classification) in &classified {
        let Some(text) = classification.render() else {
            return UnsupportedArgumentShapeSnafu {
                line: line_of(*node),
                text: unit.text(*node).to_string(),
            }
            .fail();
        };
        imports.extend(classification.required_import());
        rendered.push(text);
    }
    // Mockito wants every argument of a call as a matcher once one is.
    if classified.iter().any(|(_, c)| c.is_matcher()) {
        for (text, (_, classification)) in rendered.iter_mut().zip(&classified) {
            if !classification.is_matcher() {
                *text = format!("eq({text})");
                imports.push((ARGUMENT_MATCHERS, "eq"));
            }
        }
    }
    let arguments = rendered;

    Ok(Some(Pending {
        target: unit.text(*mock).to_string(),
        member,
        arguments,
        imports,
        line,
    }))
}

/// Literal text of `will(returnValue(<literal>))`.
fn return_value(unit: &JavaUnit, will: Node<'_>, line: usize) -> Result<String, ExpectationError> {
    let args = will
        .child_by_field_name("arguments")
        .map(named_children)
        .unwrap_or_default();
    let [action] = args.as_slice() else {
        return MalformedExpectationSnafu {
            line,
            message: format!("will takes exactly one argument, got {}", args.len()),
        }
        .fail();
    };

    let literal = single_argument_of(unit, *action, RETURN_VALUE)
        .and_then(|value| literal_text(unit, value));
    match literal {
        Some(text) => Ok(text.to_string()),
        None => UnsupportedArgumentShapeSnafu {
            line,
            text: unit.text(*action).to_string(),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::java::find_all;

    fn with_body<T>(entries: &str, f: impl FnOnce(&JavaUnit, Node<'_>) -> T) -> T {
        let source = format!(
            "class A {{\n  void f() {{\n    context.checking(new Expectations() {{{{\n{entries}\n    }}}});\n  }}\n}}\n"
        );
        let unit = JavaUnit::parse(source).unwrap();
        let class_body = find_all(unit.root(), "class_body")[1];
        let block = find_all(class_body, "block")[0];
        f(&unit, block)
    }

    #[test]
    fn test_extracts_in_will_order() {
        let extraction = with_body(
            r#"      oneOf(mockedList).add("one");
      will(returnValue(true));

      oneOf(mockedList).size();
      will(returnValue(100));"#,
            |unit, body| extract(unit, body).unwrap(),
        );
        let calls: Vec<(String, String)> = extraction
            .interactions
            .iter()
            .map(|i| (format!("{}.{}", i.target, i.call()), i.return_value.clone()))
            .collect();
        assert_eq!(
            calls,
            vec![
                ("mockedList.add(\"one\")".to_string(), "true".to_string()),
                ("mockedList.size()".to_string(), "100".to_string()),
            ]
        );
        assert!(extraction.matcher_imports.is_empty());
        assert!(extraction.dropped.is_empty());
    }

    #[test]
    fn test_matcher_arguments_and_imports() {
        let extraction = with_body(
            r#"      OneOf(testClass).addValues(with("val1"), with(any(String.class)));
      WILL(ReturnValue(true));"#,
            |unit, body| extract(unit, body).unwrap(),
        );
        assert_eq!(extraction.interactions.len(), 1);
        assert_eq!(
            extraction.interactions[0].arguments,
            vec!["eq(\"val1\")", "any(String.class)"]
        );
        assert!(extraction.matcher_imports.contains(&("org.mockito.ArgumentMatchers", "eq")));
        assert!(extraction.matcher_imports.contains(&("org.mockito.ArgumentMatchers", "any")));
    }

    #[test]
    fn test_plain_values_pass_through() {
        let extraction = with_body(
            r#"      oneOf(mockedList).get(index);
      will(returnValue("x"));
      oneOf(mockedList).set(index, with(any(String.class)));
      will(returnValue("y"));"#,
            |unit, body| extract(unit, body).unwrap(),
        );
        let calls: Vec<String> = extraction.interactions.iter().map(|i| i.call()).collect();
        assert_eq!(calls, vec!["get(index)", "set(eq(index), any(String.class))"]);
        assert!(extraction.matcher_imports.contains(&("org.mockito.ArgumentMatchers", "eq")));
    }

    #[test]
    fn test_unclosed_selection_is_dropped() {
        let extraction = with_body(
            "      oneOf(mockedList).size();",
            |unit, body| extract(unit, body).unwrap(),
        );
        assert!(extraction.interactions.is_empty());
        assert_eq!(extraction.dropped.len(), 1);
    }

    #[test]
    fn test_will_without_argument_is_malformed() {
        let err = with_body(
            "      oneOf(mockedList).size();\n      will();",
            |unit, body| extract(unit, body).unwrap_err(),
        );
        assert!(matches!(err, ExpectationError::MalformedExpectation { .. }));
        assert_eq!(err.line(), 5);
    }

    #[test]
    fn test_one_of_without_mock_is_malformed() {
        let err = with_body(
            "      oneOf().size();\n      will(returnValue(1));",
            |unit, body| extract(unit, body).unwrap_err(),
        );
        assert!(matches!(err, ExpectationError::MalformedExpectation { .. }));
    }

    #[test]
    fn test_unsupported_shapes() {
        for entries in [
            "      oneOf(list).get(with(aNull(String.class)));\n      will(returnValue(1));",
            "      oneOf(list).size();\n      will(throwException(new RuntimeException()));",
            "      allowing(list).size();\n      will(returnValue(1));",
        ] {
            let err = with_body(entries, |unit, body| extract(unit, body).unwrap_err());
            assert!(
                matches!(err, ExpectationError::UnsupportedArgumentShape { .. }),
                "{entries}"
            );
        }
    }
}
