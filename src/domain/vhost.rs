//! Virtual host values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;
use crate::domain::hostname::Fqdn;

/// Whether a virtual host owns its artifacts or rides on a parent's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VhostKind {
    Primary,
    Alias,
}

impl fmt::Display for VhostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VhostKind::Primary => f.write_str("primary"),
            VhostKind::Alias => f.write_str("alias"),
        }
    }
}

/// A routable hostname.
///
/// An alias always carries the hostname of the primary whose artifacts it
/// shares; a primary never does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawVirtualHost", rename_all = "camelCase")]
pub struct VirtualHost {
    hostname: Fqdn,
    kind: VhostKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_hostname: Option<Fqdn>,
}

impl VirtualHost {
    pub fn new(
        hostname: Fqdn,
        kind: VhostKind,
        parent_hostname: Option<Fqdn>,
    ) -> Result<Self, EngineError> {
        match (kind, &parent_hostname) {
            (VhostKind::Alias, None) => {
                return Err(EngineError::InvalidVirtualHost(format!(
                    "alias {hostname} requires a parent hostname"
                )));
            }
            (VhostKind::Alias, Some(parent)) if *parent == hostname => {
                return Err(EngineError::InvalidVirtualHost(format!(
                    "alias {hostname} cannot be its own parent"
                )));
            }
            (VhostKind::Primary, Some(_)) => {
                return Err(EngineError::InvalidVirtualHost(format!(
                    "primary {hostname} cannot have a parent hostname"
                )));
            }
            _ => {}
        }

        Ok(Self {
            hostname,
            kind,
            parent_hostname,
        })
    }

    pub fn primary(hostname: Fqdn) -> Self {
        Self {
            hostname,
            kind: VhostKind::Primary,
            parent_hostname: None,
        }
    }

    pub fn alias(hostname: Fqdn, parent: Fqdn) -> Result<Self, EngineError> {
        Self::new(hostname, VhostKind::Alias, Some(parent))
    }

    pub fn hostname(&self) -> &Fqdn {
        &self.hostname
    }

    pub fn kind(&self) -> VhostKind {
        self.kind
    }

    pub fn parent_hostname(&self) -> Option<&Fqdn> {
        self.parent_hostname.as_ref()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVirtualHost {
    hostname: Fqdn,
    #[serde(alias = "type")]
    kind: VhostKind,
    #[serde(default)]
    parent_hostname: Option<Fqdn>,
}

impl TryFrom<RawVirtualHost> for VirtualHost {
    type Error = EngineError;

    fn try_from(raw: RawVirtualHost) -> Result<Self, Self::Error> {
        Self::new(raw.hostname, raw.kind, raw.parent_hostname)
    }
}
