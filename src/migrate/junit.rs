use tree_sitter::Node;

use crate::java::splice::replace_node;
use crate::java::{
    annotation_name, descendants, line_of, ImportRequests, JavaUnit, TextEdit, TypeResolver,
};
use crate::migrate::names::{JUNIT4_TEST, JUPITER_TEST};

/// Outcome of moving `@org.junit.Test` to Jupiter.
#[derive(Debug)]
pub enum TestAnnotationMigration {
    /// Edits for fully-qualified spellings; simple `@Test` is switched by
    /// the import swap alone.
    Migrated { edits: Vec<TextEdit>, count: usize },
    /// An `@Test(...)` with arguments has no Jupiter equivalent.
    Skipped { line: usize },
    NothingToDo,
}

/// `@Test` annotations resolving to JUnit 4's `org.junit.Test`.
fn junit4_annotations<'t>(unit: &'t JavaUnit, resolver: &dyn TypeResolver) -> Vec<Node<'t>> {
    descendants(unit.root())
        .into_iter()
        .filter(|n| matches!(n.kind(), "marker_annotation" | "annotation"))
        .filter(|n| {
            resolver
                .resolve_type_name(annotation_name(unit, *n))
                .is_some_and(|ty| ty.qualified_name() == JUNIT4_TEST)
        })
        .collect()
}

/// Line of the first JUnit 4 `@Test(...)` carrying arguments, if any.
pub fn blocking_annotation(unit: &JavaUnit, resolver: &dyn TypeResolver) -> Option<usize> {
    junit4_annotations(unit, resolver)
        .into_iter()
        .find(|n| n.kind() == "annotation")
        .map(line_of)
}

pub fn migrate_test_annotations(
    unit: &JavaUnit,
    resolver: &dyn TypeResolver,
    imports: &mut ImportRequests,
) -> TestAnnotationMigration {
    let junit4 = junit4_annotations(unit, resolver);
    if junit4.is_empty() {
        return TestAnnotationMigration::NothingToDo;
    }
    if let Some(with_arguments) = junit4.iter().find(|n| n.kind() == "annotation") {
        return TestAnnotationMigration::Skipped {
            line: line_of(*with_arguments),
        };
    }

    let edits = junit4
        .iter()
        .filter(|n| annotation_name(unit, **n).contains('.'))
        .map(|n| replace_node(*n, "@Test"))
        .collect();
    imports.request_import_removal(JUNIT4_TEST);
    imports.request_import(JUPITER_TEST, None);
    TestAnnotationMigration::Migrated {
        edits,
        count: junit4.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ImportLayout, TypeHierarchy};
    use crate::java::UnitSymbols;

    fn run(source: &str) -> (TestAnnotationMigration, String) {
        let unit = JavaUnit::parse(source).unwrap();
        let symbols = UnitSymbols::build(&unit, &TypeHierarchy::default());
        let mut imports = ImportRequests::new();
        let migration = migrate_test_annotations(&unit, &symbols, &mut imports);
        let edits = match &migration {
            TestAnnotationMigration::Migrated { edits, .. } => edits.clone(),
            _ => Vec::new(),
        };
        let (next, _) = unit.apply(edits).unwrap();
        let text = match imports.commit(&next, &ImportLayout::default()) {
            Some(edit) => next.apply(vec![edit]).unwrap().0.into_source(),
            None => next.into_source(),
        };
        (migration, text)
    }

    #[test]
    fn test_import_swap() {
        let (migration, text) = run(
            "import org.junit.Test;\n\nclass A {\n  @Test\n  void a() {}\n  @org.junit.Test\n  void b() {}\n}\n",
        );
        assert!(matches!(migration, TestAnnotationMigration::Migrated { count: 2, .. }));
        assert_eq!(
            text,
            "import org.junit.jupiter.api.Test;\n\nclass A {\n  @Test\n  void a() {}\n  @Test\n  void b() {}\n}\n"
        );
    }

    #[test]
    fn test_arguments_skip_whole_unit() {
        let source = "import org.junit.Test;\n\nclass A {\n  @Test\n  void a() {}\n  @Test(expected = Exception.class)\n  void b() {}\n}\n";
        let (migration, text) = run(source);
        assert!(matches!(migration, TestAnnotationMigration::Skipped { line: 6 }));
        assert_eq!(text, source);
    }

    #[test]
    fn test_blocking_annotation_line() {
        let source = "import org.junit.Test;\n\nclass A {\n  @Test(timeout = 10)\n  void a() {}\n}\n";
        let unit = JavaUnit::parse(source).unwrap();
        let symbols = UnitSymbols::build(&unit, &TypeHierarchy::default());
        assert_eq!(blocking_annotation(&unit, &symbols), Some(4));
    }

    #[test]
    fn test_jupiter_already() {
        let (migration, _) = run("import org.junit.jupiter.api.Test;\n\nclass A {\n  @Test\n  void a() {}\n}\n");
        assert!(matches!(migration, TestAnnotationMigration::NothingToDo));
    }
}
