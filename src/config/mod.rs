//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EngineConfig (validated, immutable)
//!     → ArtifactLayout / commands / timeouts handed to each subsystem
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Filesystem roots are configuration, so tests point them at temp dirs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, CertificateConfig, EngineConfig, LogFormat, ObservabilityConfig,
    OwnershipConfig, PathsConfig, ServicesConfig, WebServerConfig,
};
