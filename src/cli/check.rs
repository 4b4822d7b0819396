use std::path::PathBuf;

use crate::error::Result;
use crate::report::migrate_paths;

/// Run `mockswap check`. Nothing is written; the process exits 1 when any
/// file would change or a unit could not be migrated.
pub fn run(paths: Vec<PathBuf>, json: bool, config: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config.as_deref())?;
    let report = migrate_paths(&paths, &config, true)?;

    if json {
        super::print_json(&report)?;
    } else {
        super::print_summary(&report, "would change");
    }

    if report.changed > 0 || report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}
