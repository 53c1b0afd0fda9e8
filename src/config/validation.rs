//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid, key size)
//! - Reject relative filesystem roots
//! - Check the inline service registry for duplicates and unusable entries
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::config::schema::EngineConfig;

const MIN_KEY_BITS: u32 = 2048;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check an already-deserialized configuration.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let paths = &config.paths;
    for (field, path) in [
        ("paths.nginx_conf_dir", &paths.nginx_conf_dir),
        ("paths.mapping_dir", &paths.mapping_dir),
        ("paths.html_dir", &paths.html_dir),
        ("paths.pki_dir", &paths.pki_dir),
        ("paths.log_dir", &paths.log_dir),
        ("paths.std_include", &paths.std_include),
    ] {
        check_absolute(field, path, &mut errors);
    }
    if paths.primary_conf_name.is_empty() || paths.primary_conf_name.contains('/') {
        errors.push(ValidationError::new(
            "paths.primary_conf_name",
            "must be a plain file name",
        ));
    }

    let web = &config.web_server;
    if web.validate_command.first().map_or(true, |p| p.is_empty()) {
        errors.push(ValidationError::new("web_server.validate_command", "must not be empty"));
    }
    if web.reload_command.first().map_or(true, |p| p.is_empty()) {
        errors.push(ValidationError::new("web_server.reload_command", "must not be empty"));
    }
    if web.command_timeout_secs == 0 {
        errors.push(ValidationError::new("web_server.command_timeout_secs", "must be > 0"));
    }
    if web.http_port == 0 || web.https_port == 0 {
        errors.push(ValidationError::new("web_server", "listen ports must be > 0"));
    } else if web.http_port == web.https_port {
        errors.push(ValidationError::new(
            "web_server",
            "http_port and https_port must differ",
        ));
    }

    if config.ownership.enabled && config.ownership.user.is_empty() {
        errors.push(ValidationError::new("ownership.user", "must not be empty"));
    }

    let cert = &config.certificate;
    if cert.openssl_binary.is_empty() {
        errors.push(ValidationError::new("certificate.openssl_binary", "must not be empty"));
    }
    if cert.validity_days == 0 {
        errors.push(ValidationError::new("certificate.validity_days", "must be > 0"));
    }
    if cert.key_bits < MIN_KEY_BITS {
        errors.push(ValidationError::new(
            "certificate.key_bits",
            format!("must be at least {MIN_KEY_BITS}"),
        ));
    }

    let mut seen = HashSet::new();
    for service in &config.services.entries {
        let field = format!("services.entries[{}]", service.name);
        if !seen.insert(service.name.clone()) {
            errors.push(ValidationError::new(field.clone(), "duplicate service name"));
        }
        if service.ports.is_empty() {
            errors.push(ValidationError::new(field.clone(), "must expose at least one port"));
        }
        if service.ports.contains(&0) {
            errors.push(ValidationError::new(field, "port 0 is not addressable"));
        }
    }

    if config.admin.enabled {
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::new("admin.api_key", "must not be empty"));
        }
        if config.admin.request_timeout_secs == 0 {
            errors.push(ValidationError::new("admin.request_timeout_secs", "must be > 0"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_absolute(field: &str, path: &Path, errors: &mut Vec<ValidationError>) {
    if !path.is_absolute() {
        errors.push(ValidationError::new(field, "must be an absolute path"));
    }
}
