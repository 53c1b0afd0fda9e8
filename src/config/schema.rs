//! Configuration schema definitions.
//!
//! This module defines the complete deployment configuration for the engine.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{Fqdn, Service};

/// Root configuration for the virtual host engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Filesystem roots for every artifact the engine writes.
    pub paths: PathsConfig,

    /// Web server validate/reload commands.
    pub web_server: WebServerConfig,

    /// Ownership applied to created directories.
    pub ownership: OwnershipConfig,

    /// Self-signed certificate parameters.
    pub certificate: CertificateConfig,

    /// Local service registry.
    pub services: ServicesConfig,

    /// Hostname of the platform's designated primary domain, served from the
    /// shared primary artifact.
    pub primary_domain: Option<Fqdn>,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Filesystem layout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding one server-block artifact per primary hostname.
    pub nginx_conf_dir: PathBuf,

    /// Directory holding one mapping include per hostname.
    pub mapping_dir: PathBuf,

    /// Root of the public web directories.
    pub html_dir: PathBuf,

    /// Directory for certificates and private keys.
    pub pki_dir: PathBuf,

    /// Directory for per-host access/error logs.
    pub log_dir: PathBuf,

    /// Shared defaults included by every server block.
    pub std_include: PathBuf,

    /// File name (inside `nginx_conf_dir`) of the primary domain's shared artifact.
    pub primary_conf_name: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            nginx_conf_dir: PathBuf::from("/app/conf/nginx"),
            mapping_dir: PathBuf::from("/app/conf/nginx/mapping"),
            html_dir: PathBuf::from("/app/html"),
            pki_dir: PathBuf::from("/app/conf/pki"),
            log_dir: PathBuf::from("/app/logs/nginx"),
            std_include: PathBuf::from("/etc/nginx/std.conf"),
            primary_conf_name: "primary.conf".to_string(),
        }
    }
}

/// Web server control.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebServerConfig {
    /// Syntax/semantic check over the full configuration tree.
    pub validate_command: Vec<String>,

    /// Hot-reload command, only run after a successful validation.
    pub reload_command: Vec<String>,

    /// Deadline for any subprocess the engine runs, in seconds.
    pub command_timeout_secs: u64,

    /// Plaintext listen port rendered into server blocks.
    pub http_port: u16,

    /// TLS listen port rendered into server blocks.
    pub https_port: u16,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            validate_command: vec!["nginx".to_string(), "-t".to_string()],
            reload_command: vec!["nginx".to_string(), "-s".to_string(), "reload".to_string()],
            command_timeout_secs: 30,
            http_port: 80,
            https_port: 443,
        }
    }
}

/// Ownership fix applied after a primary host is created.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OwnershipConfig {
    /// Run `chown -R` over the created directories.
    pub enabled: bool,

    /// User the web server runs as.
    pub user: String,

    /// Group the web server runs as.
    pub group: String,
}

impl Default for OwnershipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            user: "nobody".to_string(),
            group: "nogroup".to_string(),
        }
    }
}

/// Self-signed certificate issuance.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CertificateConfig {
    /// Path or name of the openssl binary.
    pub openssl_binary: String,

    /// Certificate validity in days.
    pub validity_days: u32,

    /// RSA key size in bits.
    pub key_bits: u32,

    /// Subject fields preceding `/CN=<hostname>`.
    pub subject_prefix: String,
}

impl Default for CertificateConfig {
    fn default() -> Self {
        Self {
            openssl_binary: "openssl".to_string(),
            validity_days: 365,
            key_bits: 2048,
            subject_prefix: "/C=US/ST=California/L=LosAngeles/O=Acme".to_string(),
        }
    }
}

/// Local service registry.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServicesConfig {
    /// TOML file with `[[services]]` entries.
    pub registry_path: Option<PathBuf>,

    /// Services declared directly in the engine config.
    pub entries: Vec<Service>,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
