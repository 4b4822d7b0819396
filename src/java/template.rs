use crate::error::java_error::TemplateSnafu;
use crate::error::JavaError;

/// Placeholder substituted positionally by [`render`].
pub const PLACEHOLDER: &str = "#{}";

/// Substitute each `#{}` in `template` with the next argument.
pub fn render(template: &str, args: &[String]) -> Result<String, JavaError> {
    let expected = template.matches(PLACEHOLDER).count();
    if expected != args.len() {
        return TemplateSnafu {
            template,
            expected,
            actual: args.len(),
        }
        .fail();
    }

    let capacity = template.len() + args.iter().map(String::len).sum::<usize>();
    let mut out = String::with_capacity(capacity);
    let mut rest = template;
    for arg in args {
        // Count checked above, so every argument has a placeholder.
        if let Some(i) = rest.find(PLACEHOLDER) {
            out.push_str(&rest[..i]);
            out.push_str(arg);
            rest = &rest[i + PLACEHOLDER.len()..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let out = render(
            "when(#{}).thenReturn(#{});",
            &["m.size()".to_string(), "100".to_string()],
        )
        .unwrap();
        assert_eq!(out, "when(m.size()).thenReturn(100);");
    }

    #[test]
    fn test_argument_text_is_not_rescanned() {
        let out = render("f(#{});", &["\"#{}\"".to_string()]).unwrap();
        assert_eq!(out, "f(\"#{}\");");
    }

    #[test]
    fn test_count_mismatch() {
        let err = render("f(#{}, #{});", &["a".to_string()]).unwrap_err();
        assert!(err.to_string().contains("expects 2 arguments, got 1"));
    }
}
