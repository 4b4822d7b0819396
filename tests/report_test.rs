//! Running the migration over a directory tree.

use std::fs;

use mockswap::config::MigrateConfig;
use mockswap::migrate::MigrationState;
use mockswap::report::migrate_paths;

const RULE_TEST: &str = r#"import org.jmock.integration.junit4.JUnitRuleMockery;
import org.junit.Rule;

public class RuleTest {
  @Rule
  public JUnitRuleMockery context = new JUnitRuleMockery();
}
"#;

const PLAIN: &str = "class Plain {}\n";

fn tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("src/test/java/demo");
    fs::create_dir_all(&pkg).unwrap();
    fs::write(pkg.join("RuleTest.java"), RULE_TEST).unwrap();
    fs::write(pkg.join("Plain.java"), PLAIN).unwrap();
    dir
}

#[test]
fn test_dry_run_leaves_files() {
    let dir = tree();
    let report = migrate_paths(&[dir.path().to_path_buf()], &MigrateConfig::default(), true).unwrap();

    assert_eq!(report.files.len(), 2);
    assert_eq!(report.changed, 1);
    assert_eq!(report.aborted, 0);
    let on_disk = fs::read_to_string(dir.path().join("src/test/java/demo/RuleTest.java")).unwrap();
    assert_eq!(on_disk, RULE_TEST);
}

#[test]
fn test_rewrite_writes_changed_files() {
    let dir = tree();
    let report = migrate_paths(&[dir.path().to_path_buf()], &MigrateConfig::default(), false).unwrap();

    let rule = report
        .files
        .iter()
        .find(|f| f.path.ends_with("RuleTest.java"))
        .unwrap();
    assert!(rule.changed);
    assert_eq!(rule.state, MigrationState::Done);

    let plain = report.files.iter().find(|f| f.path.ends_with("Plain.java")).unwrap();
    assert_eq!(plain.state, MigrationState::NotApplicable);

    let on_disk = fs::read_to_string(dir.path().join("src/test/java/demo/RuleTest.java")).unwrap();
    assert!(on_disk.contains("@ExtendWith(MockitoExtension.class)\npublic class RuleTest {"));
    assert!(!on_disk.contains("JUnitRuleMockery"));
    assert_eq!(
        fs::read_to_string(dir.path().join("src/test/java/demo/Plain.java")).unwrap(),
        PLAIN
    );

    // A second pass finds nothing left to do.
    let again = migrate_paths(&[dir.path().to_path_buf()], &MigrateConfig::default(), false).unwrap();
    assert_eq!(again.changed, 0);
}

#[test]
fn test_report_serializes_kebab_case_states() {
    let dir = tree();
    let report = migrate_paths(&[dir.path().to_path_buf()], &MigrateConfig::default(), true).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["changed"], 1);
    let states: Vec<_> = json["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["state"].as_str().unwrap().to_string())
        .collect();
    assert!(states.contains(&"not-applicable".to_string()));
    assert!(states.contains(&"done".to_string()));
}
