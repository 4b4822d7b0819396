use crate::java::TextRange;

/// Tidy the lines around `regions`: strip trailing whitespace and collapse
/// runs of blank lines to one. Lines outside the regions are left as they are.
///
/// Each region is widened by one line on both sides, plus any blank lines
/// adjoining it, so that blank lines left behind by a deletion next to the
/// region are caught too. Lines that start inside one of `verbatim` (the
/// body of a text block) are never touched.
pub fn reformat(text: &str, regions: &[TextRange], verbatim: &[TextRange]) -> String {
    if regions.is_empty() {
        return text.to_string();
    }

    let crlf = text.contains("\r\n");
    let lines: Vec<&str> = text.split('\n').collect();
    let mut line_starts = Vec::with_capacity(lines.len());
    let mut offset = 0;
    for line in &lines {
        line_starts.push(offset);
        offset += line.len() + 1;
    }
    let line_index = |pos: usize| match line_starts.binary_search(&pos) {
        Ok(i) => i,
        Err(i) => i.saturating_sub(1),
    };

    let mut marked = vec![false; lines.len()];
    for region in regions {
        let mut first = line_index(region.start).saturating_sub(1);
        let mut last = (line_index(region.end) + 1).min(lines.len() - 1);
        while first > 0 && lines[first - 1].trim().is_empty() {
            first -= 1;
        }
        while last + 1 < lines.len() && lines[last + 1].trim().is_empty() {
            last += 1;
        }
        for flag in &mut marked[first..=last] {
            *flag = true;
        }
    }

    for (flag, start) in marked.iter_mut().zip(&line_starts) {
        if verbatim.iter().any(|r| r.start < *start && *start <= r.end) {
            *flag = false;
        }
    }

    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut prev_blank = false;
    for (i, line) in lines.iter().enumerate() {
        let is_last = i + 1 == lines.len();
        if !marked[i] {
            prev_blank = line.trim().is_empty();
            out.push(line.to_string());
            continue;
        }
        let trimmed = line.trim_end();
        let blank = trimmed.is_empty();
        if blank && prev_blank && !is_last {
            continue;
        }
        prev_blank = blank;
        if crlf && !is_last {
            out.push(format!("{trimmed}\r"));
        } else {
            out.push(trimmed.to_string());
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_blank_runs_in_region() {
        let text = "a {\n\n\n\n}\n\n\nuntouched\n";
        let region = TextRange::new(4, 4);
        assert_eq!(reformat(text, &[region], &[]), "a {\n\n}\n\n\nuntouched\n");
    }

    #[test]
    fn test_strips_trailing_whitespace() {
        let text = "x();   \ny();  \n";
        assert_eq!(reformat(text, &[TextRange::new(0, 3)], &[]), "x();\ny();\n");
    }

    #[test]
    fn test_no_regions_is_identity() {
        let text = "a  \n\n\n";
        assert_eq!(reformat(text, &[], &[]), text);
    }

    #[test]
    fn test_text_block_lines_are_verbatim() {
        let text = "x();  \ns = \"\"\"\n  a  \n\n\n  \"\"\";\n";
        let start = text.find("\"\"\"").unwrap();
        let end = text.rfind("\"\"\"").unwrap() + 3;
        let literal = TextRange::new(start, end);
        assert_eq!(
            reformat(text, &[TextRange::new(0, text.len())], &[literal]),
            "x();\ns = \"\"\"\n  a  \n\n\n  \"\"\";\n"
        );
    }

    #[test]
    fn test_keeps_crlf() {
        let text = "a();  \r\nb();\r\n";
        assert_eq!(reformat(text, &[TextRange::new(0, 1)], &[]), "a();\r\nb();\r\n");
    }
}
