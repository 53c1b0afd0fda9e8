//! Locally addressable services.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;

/// Name a service is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(raw: impl Into<String>) -> Result<Self, EngineError> {
        let name = raw.into();
        let valid = !name.is_empty()
            && name
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'));
        if !valid {
            return Err(EngineError::InvalidServiceName(format!(
                "service name {name:?} must match [A-Za-z0-9_.-]+"
            )));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServiceName {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServiceName> for String {
    fn from(value: ServiceName) -> Self {
        value.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered service and the ports it listens on.
///
/// Only the first port is addressable; services are assumed to speak HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: ServiceName,
    #[serde(default)]
    pub ports: Vec<u16>,
}

impl Service {
    pub fn new(name: ServiceName, ports: Vec<u16>) -> Self {
        Self { name, ports }
    }

    /// The port mappings are proxied to.
    pub fn primary_port(&self) -> Option<u16> {
        self.ports.first().copied()
    }
}
