use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub), module(migrate_error))]
pub enum MigrateError {
    #[snafu(display("java error: {source}"))]
    Java {
        source: JavaError,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("config error: {source}"))]
    Config {
        source: ConfigError,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("IO error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("JSON error: {source}"))]
    Json {
        source: serde_json::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("validation error: {message}"))]
    Validation {
        message: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

/// Failures of the host tree layer. Any of these aborts the rewrite of the
/// whole compilation unit.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), module(java_error))]
pub enum JavaError {
    #[snafu(display("tree-sitter error: {message}"))]
    TreeSitter {
        message: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("parse failed: {message}"))]
    ParseFailed {
        message: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("overlapping edits at {first_start}..{first_end} and {second_start}..{second_end}"))]
    OverlappingEdits {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("template `{template}` expects {expected} arguments, got {actual}"))]
    Template {
        template: String,
        expected: usize,
        actual: usize,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("rewrite introduced a syntax error near line {line}"))]
    SyntaxRegression {
        line: usize,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

/// Failures scoped to one expectation block or one interaction.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub), module(expectation_error))]
pub enum ExpectationError {
    #[snafu(display("malformed expectation at line {line}: {message}"))]
    MalformedExpectation {
        line: usize,
        message: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("unsupported argument shape at line {line}: `{text}`"))]
    UnsupportedArgumentShape {
        line: usize,
        text: String,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

impl ExpectationError {
    /// 1-based source line the failure points at.
    pub fn line(&self) -> usize {
        match self {
            ExpectationError::MalformedExpectation { line, .. }
            | ExpectationError::UnsupportedArgumentShape { line, .. } => *line,
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub), module(config_error))]
pub enum ConfigError {
    #[snafu(display("failed to read {path}: {source}"))]
    ReadFile {
        path: String,
        source: std::io::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },

    #[snafu(display("invalid config: {source}"))]
    ReadConfig {
        source: toml::de::Error,
        #[snafu(implicit)]
        location: snafu::Location,
    },
}

pub type Result<T, E = MigrateError> = std::result::Result<T, E>;
