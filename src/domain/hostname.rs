//! Fully-qualified domain names.
//!
//! # Responsibilities
//! - Normalize hostnames to lowercase
//! - Reject anything that could not appear in a `server_name` directive
//! - Derive the `www.` variant that always travels with a hostname

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;

const MAX_FQDN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// A validated, lower-cased fully-qualified domain name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fqdn(String);

impl Fqdn {
    /// Parse and validate a hostname.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, EngineError> {
        let host = raw.as_ref().trim().trim_end_matches('.').to_ascii_lowercase();
        validate(&host).map_err(|reason| EngineError::InvalidHostname {
            hostname: raw.as_ref().to_string(),
            reason,
        })?;
        Ok(Self(host))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `www.` variant rendered next to every hostname.
    pub fn www(&self) -> String {
        format!("www.{}", self.0)
    }
}

fn validate(host: &str) -> Result<(), &'static str> {
    if host.is_empty() {
        return Err("empty hostname");
    }
    if host.len() > MAX_FQDN_LEN {
        return Err("hostname longer than 253 characters");
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return Err("hostname needs at least two labels");
    }

    for label in labels {
        if label.is_empty() {
            return Err("empty label");
        }
        if label.len() > MAX_LABEL_LEN {
            return Err("label longer than 63 characters");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("label starts or ends with '-'");
        }
        if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err("label contains characters outside [a-z0-9-]");
        }
    }

    Ok(())
}

impl fmt::Display for Fqdn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Fqdn {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Fqdn {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Fqdn> for String {
    fn from(value: Fqdn) -> Self {
        value.0
    }
}

impl AsRef<str> for Fqdn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
