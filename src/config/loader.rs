//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::MonitorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<MonitorConfig, ConfigError> {
    let config: MonitorConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[checker]
name = "tur"
timeout_secs = 10
async_mode = false

[[paths]]
name = "sdb"
device = "/dev/sdb"

[[paths]]
name = "sdc"
device = "/dev/sdc"
checker = "readsector0"

[observability]
log_format = "json"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.checker.timeout_secs, 10);
        assert!(!config.checker.async_mode);
        assert_eq!(config.checker.retries, 5);
        assert_eq!(config.paths.len(), 2);
        assert_eq!(config.paths[1].checker.as_deref(), Some("readsector0"));
        assert_eq!(
            config.observability.log_format,
            crate::config::schema::LogFormat::Json
        );
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.checker.name, "tur");
        assert!(config.paths.is_empty());
    }

    #[test]
    fn reports_parse_and_validation_errors() {
        assert!(matches!(parse_config("[checker"), Err(ConfigError::Parse(_))));
        let err = parse_config("[checker]\nname = \"nope\"\ninterval_secs = 0\n").unwrap_err();
        match &err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("Validation failed: unknown checker 'nope'"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/pathcheck.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
