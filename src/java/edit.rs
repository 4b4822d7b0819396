use crate::error::java_error::OverlappingEditsSnafu;
use crate::error::JavaError;

/// A half-open byte range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "invalid range: {start}..{end}");
        Self { start, end }
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }
}

/// A single replacement in one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub range: TextRange,
    pub replacement: String,
}

impl TextEdit {
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            range: TextRange::new(offset, offset),
            replacement: text.into(),
        }
    }

    pub fn replace(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            replacement: text.into(),
        }
    }

    pub fn delete(range: TextRange) -> Self {
        Self {
            range,
            replacement: String::new(),
        }
    }
}

/// Apply edits to `text`.
///
/// Edits are ordered by range; inserts at the same offset keep request order.
/// Returns the new text and, for each applied edit in order, the range its
/// replacement occupies in the new text.
pub fn apply_edits(
    text: &str,
    mut edits: Vec<TextEdit>,
) -> Result<(String, Vec<TextRange>), JavaError> {
    edits.sort_by(|a, b| {
        a.range
            .start
            .cmp(&b.range.start)
            .then_with(|| a.range.end.cmp(&b.range.end))
    });
    edits.dedup();

    let mut prev: Option<TextRange> = None;
    for edit in &edits {
        if let Some(p) = prev {
            let overlaps = edit.range.start < p.end
                || (edit.range == p && !p.is_empty());
            if overlaps {
                return OverlappingEditsSnafu {
                    first_start: p.start,
                    first_end: p.end,
                    second_start: edit.range.start,
                    second_end: edit.range.end,
                }
                .fail();
            }
        }
        prev = Some(edit.range);
    }

    let mut out = String::with_capacity(text.len());
    let mut touched = Vec::with_capacity(edits.len());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&text[cursor..edit.range.start]);
        let start = out.len();
        out.push_str(&edit.replacement);
        touched.push(TextRange::new(start, out.len()));
        cursor = edit.range.end;
    }
    out.push_str(&text[cursor..]);

    Ok((out, touched))
}

/// Offset of the first byte of the line containing `offset`.
pub fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Offset just past the newline ending the line containing `offset`.
pub fn line_end_inclusive(text: &str, offset: usize) -> usize {
    text[offset..]
        .find('\n')
        .map(|i| offset + i + 1)
        .unwrap_or(text.len())
}

/// Leading whitespace of the line containing `offset`.
pub fn indent_at(text: &str, offset: usize) -> &str {
    let start = line_start(text, offset);
    let line = &text[start..];
    let width = line
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    &line[..width]
}

/// True if only whitespace precedes `offset` on its line.
pub fn starts_line(text: &str, offset: usize) -> bool {
    text[line_start(text, offset)..offset]
        .chars()
        .all(|c| c == ' ' || c == '\t')
}

/// True if only whitespace follows `offset` up to the end of its line.
pub fn ends_line(text: &str, offset: usize) -> bool {
    text[offset..]
        .chars()
        .take_while(|c| *c != '\n')
        .all(char::is_whitespace)
}

/// Widen `range` to whole lines when it occupies its lines alone, so
/// deleting it leaves no blank residue. Otherwise returns `range`.
pub fn full_line_range(text: &str, range: TextRange) -> TextRange {
    if starts_line(text, range.start) && ends_line(text, range.end) {
        TextRange::new(
            line_start(text, range.start),
            line_end_inclusive(text, range.end),
        )
    } else {
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_in_order() {
        let text = "abcdef";
        let edits = vec![
            TextEdit::replace(TextRange::new(4, 6), "XY"),
            TextEdit::insert(0, ">"),
            TextEdit::delete(TextRange::new(1, 2)),
        ];
        let (out, touched) = apply_edits(text, edits).unwrap();
        assert_eq!(out, ">acdXY");
        assert_eq!(touched, vec![
            TextRange::new(0, 1),
            TextRange::new(2, 2),
            TextRange::new(4, 6),
        ]);
    }

    #[test]
    fn test_insert_before_delete_at_same_offset() {
        let text = "one two";
        let edits = vec![
            TextEdit::delete(TextRange::new(0, 4)),
            TextEdit::insert(0, "1 "),
        ];
        let (out, _) = apply_edits(text, edits).unwrap();
        assert_eq!(out, "1 two");
    }

    #[test]
    fn test_same_point_inserts_keep_request_order() {
        let edits = vec![TextEdit::insert(1, "a"), TextEdit::insert(1, "b")];
        let (out, _) = apply_edits("xy", edits).unwrap();
        assert_eq!(out, "xaby");
    }

    #[test]
    fn test_overlap_is_rejected() {
        let edits = vec![
            TextEdit::delete(TextRange::new(0, 3)),
            TextEdit::delete(TextRange::new(2, 4)),
        ];
        assert!(apply_edits("abcdef", edits).is_err());
    }

    #[test]
    fn test_line_helpers() {
        let text = "a\n    foo();\nb";
        let foo = text.find("foo").unwrap();
        assert_eq!(indent_at(text, foo), "    ");
        assert!(starts_line(text, foo));
        assert!(!starts_line(text, foo + 1));
        let end = foo + "foo();".len();
        assert!(ends_line(text, end));
        let range = full_line_range(text, TextRange::new(foo, end));
        assert_eq!(&text[range.start..range.end], "    foo();\n");
    }

    #[test]
    fn test_full_line_range_keeps_shared_lines() {
        let text = "{ foo(); }";
        let range = TextRange::new(2, 8);
        assert_eq!(full_line_range(text, range), range);
    }
}
