//! Deferred import maintenance.
//!
//! Components request additions and removals while they rewrite; the set is
//! committed once per unit, after every structural edit has landed.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::config::ImportLayout;
use crate::java::edit::line_start;
use crate::java::{
    descendants, find_all, named_children, simple_name, JavaUnit, TextEdit, TextRange,
};

/// An import to add: `qualified` is a type, `member` makes it a static import
/// of that member.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportSpec {
    pub qualified: String,
    pub member: Option<String>,
}

/// Import additions and removals requested during one unit rewrite.
#[derive(Debug, Clone, Default)]
pub struct ImportRequests {
    additions: BTreeSet<ImportSpec>,
    removals: BTreeSet<String>,
}

/// One line of the import section.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ImportLine {
    is_static: bool,
    /// Dotted path without `.*`; for explicit static imports this ends with
    /// the member name.
    path: String,
    star: bool,
}

impl ImportLine {
    fn render(&self) -> String {
        let keyword = if self.is_static { "import static " } else { "import " };
        let star = if self.star { ".*" } else { "" };
        format!("{keyword}{}{star};", self.path)
    }

    /// Owner used for star folding: the package of a type import, the class
    /// of a static import.
    fn owner(&self) -> &str {
        if self.star {
            &self.path
        } else {
            self.path.rsplit_once('.').map(|(owner, _)| owner).unwrap_or("")
        }
    }
}

impl ImportRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `import qualified;` or, with a member, `import static qualified.member;`.
    pub fn request_import(&mut self, qualified: &str, static_member: Option<&str>) {
        self.additions.insert(ImportSpec {
            qualified: qualified.to_string(),
            member: static_member.map(str::to_string),
        });
    }

    /// Request removal of `import qualified;` once nothing refers to it.
    pub fn request_import_removal(&mut self, qualified: &str) {
        self.removals.insert(qualified.to_string());
    }

    /// Compute the edit that brings the unit's import section in line with
    /// the requests. Returns `None` when the section would not change.
    pub fn commit(&self, unit: &JavaUnit, layout: &ImportLayout) -> Option<TextEdit> {
        let declarations = find_all(unit.root(), "import_declaration");
        let existing: Vec<ImportLine> = declarations
            .iter()
            .filter_map(|decl| parse_import(unit, *decl))
            .collect();

        let referenced = referenced_names(unit);
        let added_simple: HashSet<&str> = self
            .additions
            .iter()
            .filter(|spec| spec.member.is_none())
            .map(|spec| simple_name(&spec.qualified))
            .collect();

        let mut lines: Vec<ImportLine> = existing
            .iter()
            .filter(|line| {
                if line.is_static || line.star || !self.removals.contains(&line.path) {
                    return true;
                }
                let name = simple_name(&line.path);
                // Still in use, unless an added import takes over the name.
                referenced.contains(name) && !added_simple.contains(name)
            })
            .cloned()
            .collect();

        let mut touched_owners = BTreeSet::new();
        for spec in &self.additions {
            let line = match &spec.member {
                Some(member) => ImportLine {
                    is_static: true,
                    path: format!("{}.{member}", spec.qualified),
                    star: false,
                },
                None => ImportLine {
                    is_static: false,
                    path: spec.qualified.clone(),
                    star: false,
                },
            };
            let covered = lines.iter().any(|l| {
                l.is_static == line.is_static
                    && (l.path == line.path || (l.star && l.path == line.owner()))
            });
            if covered {
                continue;
            }
            touched_owners.insert((line.is_static, line.owner().to_string()));
            lines.push(line);
        }

        fold_stars(&mut lines, &touched_owners, layout);

        if lines == existing {
            return None;
        }

        let statics: BTreeSet<String> = lines
            .iter()
            .filter(|l| l.is_static)
            .map(ImportLine::render)
            .collect();
        let types: BTreeSet<String> = lines
            .iter()
            .filter(|l| !l.is_static)
            .map(ImportLine::render)
            .collect();
        let mut section = statics.into_iter().collect::<Vec<_>>().join("\n");
        if !section.is_empty() && !types.is_empty() {
            section.push_str("\n\n");
        }
        section.push_str(&types.into_iter().collect::<Vec<_>>().join("\n"));

        match (declarations.first(), declarations.last()) {
            (Some(first), Some(last)) if section.is_empty() => {
                // Drop the whole section together with the blank lines after it.
                let text = unit.source();
                let trailing = text[last.end_byte()..]
                    .len()
                    .saturating_sub(text[last.end_byte()..].trim_start().len());
                Some(TextEdit::delete(TextRange::new(
                    line_start(text, first.start_byte()),
                    last.end_byte() + trailing,
                )))
            }
            (Some(first), Some(last)) => Some(TextEdit::replace(
                TextRange::new(first.start_byte(), last.end_byte()),
                section,
            )),
            _ => {
                let package = find_all(unit.root(), "package_declaration");
                match package.first() {
                    Some(pkg) => Some(TextEdit::insert(pkg.end_byte(), format!("\n\n{section}"))),
                    None => Some(TextEdit::insert(0, format!("{section}\n\n"))),
                }
            }
        }
    }
}

/// Replace explicit imports with a star import when an owner touched by this
/// commit reaches the configured threshold.
fn fold_stars(
    lines: &mut Vec<ImportLine>,
    touched: &BTreeSet<(bool, String)>,
    layout: &ImportLayout,
) {
    let mut counts: BTreeMap<(bool, String), usize> = BTreeMap::new();
    for line in lines.iter().filter(|l| !l.star) {
        *counts.entry((line.is_static, line.owner().to_string())).or_default() += 1;
    }

    for key in touched {
        let threshold = if key.0 {
            layout.static_star_threshold
        } else {
            layout.type_star_threshold
        };
        let count = counts.get(key).copied().unwrap_or(0);
        if threshold == 0 || count < threshold || key.1.is_empty() {
            continue;
        }
        lines.retain(|l| l.star || l.is_static != key.0 || l.owner() != key.1);
        let star = ImportLine {
            is_static: key.0,
            path: key.1.clone(),
            star: true,
        };
        if !lines.contains(&star) {
            lines.push(star);
        }
    }
}

fn parse_import(unit: &JavaUnit, decl: tree_sitter::Node<'_>) -> Option<ImportLine> {
    let children = named_children(decl);
    let path = children
        .iter()
        .find(|n| matches!(n.kind(), "scoped_identifier" | "identifier"))
        .map(|n| unit.text(*n).to_string())?;
    Some(ImportLine {
        is_static: unit.text(decl).starts_with("import static"),
        path,
        star: children.iter().any(|n| n.kind() == "asterisk"),
    })
}

/// Simple names used anywhere outside the package and import declarations.
fn referenced_names(unit: &JavaUnit) -> HashSet<String> {
    descendants(unit.root())
        .into_iter()
        .filter(|n| matches!(n.kind(), "identifier" | "type_identifier"))
        .filter(|n| {
            let mut current = n.parent();
            while let Some(p) = current {
                if matches!(p.kind(), "import_declaration" | "package_declaration") {
                    return false;
                }
                current = p.parent();
            }
            true
        })
        .map(|n| unit.text(n).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(source: &str, requests: &ImportRequests) -> String {
        let unit = JavaUnit::parse(source).unwrap();
        match requests.commit(&unit, &ImportLayout::default()) {
            Some(edit) => unit.apply(vec![edit]).unwrap().0.into_source(),
            None => source.to_string(),
        }
    }

    #[test]
    fn test_static_imports_fold_into_star() {
        let mut requests = ImportRequests::new();
        requests.request_import("org.mockito.Mockito", Some("when"));
        requests.request_import("org.mockito.Mockito", Some("verify"));
        requests.request_import("org.mockito.Mockito", Some("times"));
        requests.request_import("org.mockito.ArgumentMatchers", Some("eq"));
        let out = commit("import java.util.List;\n\nclass A { List<String> l; }\n", &requests);
        assert_eq!(
            out,
            "import static org.mockito.ArgumentMatchers.eq;\nimport static org.mockito.Mockito.*;\n\nimport java.util.List;\n\nclass A { List<String> l; }\n"
        );
    }

    #[test]
    fn test_removal_only_when_unused() {
        let mut requests = ImportRequests::new();
        requests.request_import_removal("org.junit.Rule");
        requests.request_import_removal("java.util.List");
        let out = commit(
            "import java.util.List;\nimport org.junit.Rule;\n\nclass A { List<String> l; }\n",
            &requests,
        );
        assert_eq!(out, "import java.util.List;\n\nclass A { List<String> l; }\n");
    }

    #[test]
    fn test_added_import_takes_over_simple_name() {
        let mut requests = ImportRequests::new();
        requests.request_import_removal("org.jmock.auto.Mock");
        requests.request_import("org.mockito.Mock", None);
        let out = commit("import org.jmock.auto.Mock;\n\nclass A { @Mock Object o; }\n", &requests);
        assert_eq!(out, "import org.mockito.Mock;\n\nclass A { @Mock Object o; }\n");
    }

    #[test]
    fn test_covered_by_existing_star() {
        let mut requests = ImportRequests::new();
        requests.request_import("org.mockito.Mockito", Some("when"));
        let source = "import static org.mockito.Mockito.*;\n\nclass A {}\n";
        let unit = JavaUnit::parse(source).unwrap();
        assert!(requests.commit(&unit, &ImportLayout::default()).is_none());
    }

    #[test]
    fn test_emptied_section_is_dropped() {
        let mut requests = ImportRequests::new();
        requests.request_import_removal("org.junit.Rule");
        let out = commit("package demo;\n\nimport org.junit.Rule;\n\nclass A {}\n", &requests);
        assert_eq!(out, "package demo;\n\nclass A {}\n");
    }

    #[test]
    fn test_insert_after_package() {
        let mut requests = ImportRequests::new();
        requests.request_import("org.mockito.Mock", None);
        let out = commit("package demo;\n\nclass A {}\n", &requests);
        assert_eq!(out, "package demo;\n\nimport org.mockito.Mock;\n\nclass A {}\n");
    }
}
