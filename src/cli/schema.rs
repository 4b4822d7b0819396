use crate::error::Result;
use schemars::schema_for;

/// Run the `mockswap schema <name>` subcommand.
///
/// Prints the JSON Schema for the requested type to stdout.
pub fn run(name: &str) -> Result<()> {
    let schema = match name {
        "report" => {
            schema_for!(crate::report::MigrationReport)
        }
        "config" => {
            schema_for!(crate::config::MigrateConfig)
        }
        _ => {
            return Err(crate::error::MigrateError::Validation {
                message: format!("Unknown schema name: '{name}'. Available: report, config"),
                location: snafu::Location::default(),
            });
        }
    };

    let json = serde_json::to_string_pretty(&schema).map_err(|e| {
        crate::error::MigrateError::Json {
            source: e,
            location: snafu::Location::default(),
        }
    })?;
    println!("{json}");

    Ok(())
}
