//! Service directory.
//!
//! # Data Flow
//! ```text
//! registry file (TOML) + inline [services.entries] from config
//!     → StaticServiceDirectory (snapshot behind ArcSwap)
//!     → get() → [Service]
//!     → resolve_endpoint(name) → http://localhost:<first port>
//! ```
//!
//! # Design Decisions
//! - Read-only from the engine's point of view; `reload()` swaps the whole snapshot
//! - HTTP only, first port only: services exposing several ports are proxied to
//!   their first one

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{EngineError, Service, ServiceName};

/// Errors reading the service registry.
#[derive(Debug, Error)]
pub enum ServiceDirectoryError {
    #[error("failed to read service registry {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse service registry {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Collaborator that lists locally registered services.
pub trait ServiceDirectory: Send + Sync {
    fn get(&self) -> Result<Vec<Service>, ServiceDirectoryError>;
}

/// Local loopback endpoint a service is reachable on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub port: u16,
}

impl fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://localhost:{}", self.port)
    }
}

/// Look up `name` and build the endpoint mappings proxy to.
pub fn resolve_endpoint(
    directory: &dyn ServiceDirectory,
    name: &ServiceName,
) -> Result<ServiceEndpoint, EngineError> {
    let services = directory
        .get()
        .map_err(EngineError::ServiceDirectoryUnavailable)?;

    services
        .iter()
        .find(|service| &service.name == name)
        .and_then(Service::primary_port)
        .map(|port| ServiceEndpoint { port })
        .ok_or_else(|| EngineError::ServiceNotFound(name.clone()))
}

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    services: Vec<Service>,
}

/// A static, file-backed service registry.
#[derive(Debug)]
pub struct StaticServiceDirectory {
    registry_path: Option<PathBuf>,
    inline: Vec<Service>,
    snapshot: ArcSwap<Vec<Service>>,
}

impl StaticServiceDirectory {
    /// A registry holding exactly `services`.
    pub fn from_services(services: Vec<Service>) -> Self {
        Self {
            registry_path: None,
            inline: services.clone(),
            snapshot: ArcSwap::from_pointee(services),
        }
    }

    /// Load `registry_path` (if any) and merge it after the inline entries.
    pub fn load(
        registry_path: Option<&Path>,
        inline: Vec<Service>,
    ) -> Result<Self, ServiceDirectoryError> {
        let directory = Self {
            registry_path: registry_path.map(Path::to_path_buf),
            inline,
            snapshot: ArcSwap::from_pointee(Vec::new()),
        };
        directory.reload()?;
        Ok(directory)
    }

    /// Re-read the registry file and swap the snapshot.
    ///
    /// On error the previous snapshot stays in place.
    pub fn reload(&self) -> Result<usize, ServiceDirectoryError> {
        let mut services = self.inline.clone();
        if let Some(path) = &self.registry_path {
            services.extend(read_registry(path)?);
        }

        let count = services.len();
        self.snapshot.store(Arc::new(services));
        tracing::info!(services = count, path = ?self.registry_path, "Service directory loaded");
        Ok(count)
    }
}

impl ServiceDirectory for StaticServiceDirectory {
    fn get(&self) -> Result<Vec<Service>, ServiceDirectoryError> {
        Ok(self.snapshot.load().as_ref().clone())
    }
}

fn read_registry(path: &Path) -> Result<Vec<Service>, ServiceDirectoryError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        // A registry that was never written just means no services yet.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ServiceDirectoryError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let file: RegistryFile = toml::from_str(&content).map_err(|source| ServiceDirectoryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.services)
}
