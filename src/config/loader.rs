//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::EngineConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Validation(_) => None,
        }
    }
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.web_server.validate_command, ["nginx", "-t"]);
        assert_eq!(config.certificate.validity_days, 365);
        assert!(config.primary_domain.is_none());
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config = parse_config(
            r#"
            primary_domain = "Panel.Example.com"

            [paths]
            nginx_conf_dir = "/srv/nginx"

            [[services.entries]]
            name = "node"
            ports = [3000]
            "#,
        )
        .unwrap();

        assert_eq!(config.primary_domain.unwrap().as_str(), "panel.example.com");
        assert_eq!(config.paths.nginx_conf_dir, Path::new("/srv/nginx"));
        assert_eq!(config.paths.pki_dir, Path::new("/app/conf/pki"));
        assert_eq!(config.services.entries[0].ports, [3000]);
    }

    #[test]
    fn test_invalid_primary_domain_is_parse_error() {
        let err = parse_config("primary_domain = \"not a host\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_semantic_errors_are_reported() {
        let err = parse_config("[web_server]\ncommand_timeout_secs = 0\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/vhost-engine.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
