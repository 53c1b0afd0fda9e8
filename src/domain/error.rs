//! Engine error surface.
//!
//! Every failed sub-step maps to exactly one variant, and every variant has a
//! stable code that callers can match on.

use std::error::Error as _;
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::hostname::Fqdn;
use crate::domain::service::ServiceName;
use crate::services::ServiceDirectoryError;
use crate::system::exec::ExecError;

/// Failure classes, in the order an operation can hit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed input, caught before any mutation.
    Validation,
    /// A referenced parent host, service or artifact is missing.
    Dependency,
    /// A subprocess or filesystem call failed while applying.
    Os,
    /// The web server rejected the resulting configuration.
    Integrity,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Validation => "validation",
            ErrorCategory::Dependency => "dependency",
            ErrorCategory::Os => "os",
            ErrorCategory::Integrity => "integrity",
        };
        f.write_str(name)
    }
}

/// Errors returned by the virtual host engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid hostname {hostname:?}: {reason}")]
    InvalidHostname { hostname: String, reason: &'static str },

    #[error("invalid virtual host: {0}")]
    InvalidVirtualHost(String),

    #[error("invalid mapping: {0}")]
    InvalidMapping(String),

    #[error("invalid service name: {0}")]
    InvalidServiceName(String),

    #[error("virtual host {0} already exists")]
    VirtualHostAlreadyExists(Fqdn),

    #[error("alias {alias} is already listed in {}", path.display())]
    AliasAlreadyExists { alias: Fqdn, path: PathBuf },

    #[error("{0} is the platform primary domain and cannot be deleted")]
    PrimaryDomainProtected(Fqdn),

    #[error("config artifact for parent {parent} not found at {}", path.display())]
    AliasConfigNotFound { parent: Fqdn, path: PathBuf },

    #[error("service {0} is not registered or exposes no port")]
    ServiceNotFound(ServiceName),

    #[error("service directory unavailable")]
    ServiceDirectoryUnavailable(#[source] ServiceDirectoryError),

    #[error("mapping artifact for {hostname} could not be resolved")]
    MappingPathResolutionFailed { hostname: Fqdn },

    #[error("failed to create {}", path.display())]
    ArtifactCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to update {}", path.display())]
    ArtifactUpdateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create public directory {}", path.display())]
    PublicDirCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("certificate generation for {hostname} failed: {reason}")]
    CertificateGenerationFailed { hostname: Fqdn, reason: String },

    #[error("failed to fix ownership of {}", path.display())]
    OwnershipFixFailed {
        path: PathBuf,
        #[source]
        source: ExecError,
    },

    #[error("failed to delete {}", path.display())]
    VirtualHostDeletionFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("web server configuration test failed")]
    ConfigValidationFailed(#[source] ExecError),

    #[error("web server reload failed")]
    ReloadFailed(#[source] ExecError),
}

impl EngineError {
    /// Stable, machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::InvalidHostname { .. } => "invalid-hostname",
            EngineError::InvalidVirtualHost(_) => "invalid-vhost",
            EngineError::InvalidMapping(_) => "invalid-mapping",
            EngineError::InvalidServiceName(_) => "invalid-service-name",
            EngineError::VirtualHostAlreadyExists(_) => "vhost-already-exists",
            EngineError::AliasAlreadyExists { .. } => "alias-already-exists",
            EngineError::PrimaryDomainProtected(_) => "primary-domain-protected",
            EngineError::AliasConfigNotFound { .. } => "alias-config-not-found",
            EngineError::ServiceNotFound(_) => "service-not-found",
            EngineError::ServiceDirectoryUnavailable(_) => "service-directory-unavailable",
            EngineError::MappingPathResolutionFailed { .. } => "mapping-path-resolution-failed",
            EngineError::ArtifactCreationFailed { .. } => "artifact-creation-failed",
            EngineError::ArtifactUpdateFailed { .. } => "artifact-update-failed",
            EngineError::PublicDirCreationFailed { .. } => "public-dir-creation-failed",
            EngineError::CertificateGenerationFailed { .. } => "certificate-generation-failed",
            EngineError::OwnershipFixFailed { .. } => "ownership-fix-failed",
            EngineError::VirtualHostDeletionFailed { .. } => "vhost-deletion-failed",
            EngineError::ConfigValidationFailed(_) => "config-validation-failed",
            EngineError::ReloadFailed(_) => "reload-failed",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::InvalidHostname { .. }
            | EngineError::InvalidVirtualHost(_)
            | EngineError::InvalidMapping(_)
            | EngineError::InvalidServiceName(_)
            | EngineError::VirtualHostAlreadyExists(_)
            | EngineError::AliasAlreadyExists { .. }
            | EngineError::PrimaryDomainProtected(_) => ErrorCategory::Validation,

            EngineError::AliasConfigNotFound { .. }
            | EngineError::ServiceNotFound(_)
            | EngineError::ServiceDirectoryUnavailable(_)
            | EngineError::MappingPathResolutionFailed { .. } => ErrorCategory::Dependency,

            EngineError::ArtifactCreationFailed { .. }
            | EngineError::ArtifactUpdateFailed { .. }
            | EngineError::PublicDirCreationFailed { .. }
            | EngineError::CertificateGenerationFailed { .. }
            | EngineError::OwnershipFixFailed { .. }
            | EngineError::VirtualHostDeletionFailed { .. }
            | EngineError::ReloadFailed(_) => ErrorCategory::Os,

            EngineError::ConfigValidationFailed(_) => ErrorCategory::Integrity,
        }
    }

    /// The full cause chain, for operator logs.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}
