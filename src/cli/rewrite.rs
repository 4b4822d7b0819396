use std::path::PathBuf;

use crate::error::Result;
use crate::report::migrate_paths;

/// Run `mockswap rewrite`.
pub fn run(paths: Vec<PathBuf>, dry_run: bool, json: bool, config: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config.as_deref())?;
    tracing::debug!(policy = %config.failure_policy, dry_run, "rewriting");

    let report = migrate_paths(&paths, &config, dry_run)?;

    if json {
        super::print_json(&report)?;
    } else {
        let verb = if dry_run { "would change" } else { "rewritten" };
        super::print_summary(&report, verb);
    }

    Ok(())
}
