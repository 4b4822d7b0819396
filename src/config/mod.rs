use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::error::config_error::{ReadConfigSnafu, ReadFileSnafu};
use crate::error::ConfigError;

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".mockswap.toml";

/// Migration configuration, assembled from defaults + `.mockswap.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default, rename_all = "snake_case")]
pub struct MigrateConfig {
    pub failure_policy: FailurePolicy,
    /// Move `@org.junit.Test` to `@org.junit.jupiter.api.Test` in units whose
    /// expectation blocks were rewritten.
    pub migrate_test_annotations: bool,
    pub imports: ImportLayout,
    pub types: TypeHierarchy,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::LeaveUnit,
            migrate_test_annotations: true,
            imports: ImportLayout::default(),
            types: TypeHierarchy::default(),
        }
    }
}

/// What to leave untouched when an expectation block is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Return the whole compilation unit as found.
    LeaveUnit,
    /// Leave only the failing block. Its class keeps the rule it still uses;
    /// other classes are rewritten.
    LeaveBlock,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailurePolicy::LeaveUnit => write!(f, "leave-unit"),
            FailurePolicy::LeaveBlock => write!(f, "leave-block"),
        }
    }
}

/// Star-import folding thresholds used when imports are committed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ImportLayout {
    pub static_star_threshold: usize,
    pub type_star_threshold: usize,
}

impl Default for ImportLayout {
    fn default() -> Self {
        Self {
            static_star_threshold: 3,
            type_star_threshold: 5,
        }
    }
}

/// Extra `subtype -> [supertypes]` relations for type queries, on top of the
/// built-in JMock hierarchy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct TypeHierarchy {
    pub supertypes: BTreeMap<String, Vec<String>>,
}

impl MigrateConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).context(ReadConfigSnafu)
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).context(ReadFileSnafu {
            path: path.display().to_string(),
        })?;
        Self::from_toml(&contents)
    }

    /// Load config from `path` if given, otherwise from `.mockswap.toml` in
    /// `dir`. A missing default file yields the defaults.
    pub fn load(path: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load_from(path);
        }
        let default_path: PathBuf = dir.join(CONFIG_FILE_NAME);
        if !default_path.exists() {
            tracing::debug!("no {CONFIG_FILE_NAME} in {}, using defaults", dir.display());
            return Ok(Self::default());
        }
        Self::load_from(&default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = MigrateConfig::from_toml("").unwrap();
        assert_eq!(config, MigrateConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = MigrateConfig::from_toml(
            r#"
failure_policy = "leave-block"

[imports]
static_star_threshold = 99

[types.supertypes]
"com.acme.TestMockery" = ["org.jmock.Mockery"]
"#,
        )
        .unwrap();
        assert_eq!(config.failure_policy, FailurePolicy::LeaveBlock);
        assert!(config.migrate_test_annotations);
        assert_eq!(config.imports.static_star_threshold, 99);
        assert_eq!(config.imports.type_star_threshold, 5);
        assert_eq!(
            config.types.supertypes["com.acme.TestMockery"],
            vec!["org.jmock.Mockery".to_string()]
        );
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(MigrateConfig::from_toml("failure_policy = \"best-effort\"").is_err());
    }

    #[test]
    fn test_load_missing_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = MigrateConfig::load(None, dir.path()).unwrap();
        assert_eq!(config, MigrateConfig::default());
    }

    #[test]
    fn test_load_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "migrate_test_annotations = false\n",
        )
        .unwrap();
        let config = MigrateConfig::load(None, dir.path()).unwrap();
        assert!(!config.migrate_test_annotations);
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(FailurePolicy::LeaveUnit.to_string(), "leave-unit");
        assert_eq!(FailurePolicy::LeaveBlock.to_string(), "leave-block");
    }
}
