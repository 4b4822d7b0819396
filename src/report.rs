//! Running the migration over files and directories.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::config::MigrateConfig;
use crate::error::migrate_error::IoSnafu;
use crate::error::Result;
use crate::migrate::{migrate_unit, Diagnostic, DiagnosticKind, MigrationState, Severity};

/// Result of one run over a set of paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct MigrationReport {
    pub files: Vec<FileReport>,
    /// Number of files whose source changed (or would change in a dry run).
    pub changed: usize,
    /// Number of files left as found because of an error.
    pub aborted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileReport {
    pub path: PathBuf,
    pub changed: bool,
    pub state: MigrationState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl MigrationReport {
    pub fn has_errors(&self) -> bool {
        self.files
            .iter()
            .flat_map(|f| &f.diagnostics)
            .any(|d| d.severity == Severity::Error)
    }

    fn push(&mut self, file: FileReport) {
        if file.changed {
            self.changed += 1;
        }
        if file.state == MigrationState::Aborted {
            self.aborted += 1;
        }
        self.files.push(file);
    }
}

/// Migrate every `.java` file under `paths`. Changed files are written back
/// unless `dry_run` is set.
///
/// Files are independent: a file that cannot be read or written is reported
/// as aborted and the run continues.
pub fn migrate_paths(
    paths: &[PathBuf],
    config: &MigrateConfig,
    dry_run: bool,
) -> Result<MigrationReport> {
    let mut report = MigrationReport::default();
    for file in collect_java_files(paths)? {
        report.push(migrate_file(&file, config, dry_run));
    }
    tracing::info!(
        files = report.files.len(),
        changed = report.changed,
        aborted = report.aborted,
        "migration finished"
    );
    Ok(report)
}

fn migrate_file(path: &Path, config: &MigrateConfig, dry_run: bool) -> FileReport {
    match try_migrate_file(path, config, dry_run) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!("{}: {e}", path.display());
            FileReport {
                path: path.to_path_buf(),
                changed: false,
                state: MigrationState::Aborted,
                diagnostics: vec![Diagnostic::new(
                    DiagnosticKind::UnitAborted,
                    Severity::Error,
                    1,
                    e.to_string(),
                )],
            }
        }
    }
}

fn try_migrate_file(path: &Path, config: &MigrateConfig, dry_run: bool) -> Result<FileReport> {
    let source = std::fs::read_to_string(path).context(IoSnafu { path })?;
    let outcome = migrate_unit(&source, config);
    if outcome.changed && !dry_run {
        std::fs::write(path, &outcome.source).context(IoSnafu { path })?;
    }
    tracing::debug!(path = %path.display(), state = %outcome.state, changed = outcome.changed);
    Ok(FileReport {
        path: path.to_path_buf(),
        changed: outcome.changed,
        state: outcome.state,
        diagnostics: outcome.diagnostics,
    })
}

/// Expand `paths` into a sorted list of `.java` files, walking directories
/// recursively. Explicit file paths are kept whatever their extension.
pub fn collect_java_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, &mut files)?;
        } else {
            files.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).context(IoSnafu { path: dir })?;
    for entry in entries {
        let path = entry.context(IoSnafu { path: dir })?.path();
        if path.is_dir() {
            walk(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "java") {
            files.push(path);
        }
    }
    Ok(())
}
