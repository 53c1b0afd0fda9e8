//! Path-routing rules.
//!
//! # Responsibilities
//! - Validate the path, status code and URL that end up inside a location block
//! - Guarantee exactly one routing target per mapping
//! - Translate to and from the flat wire shape (`targetType` + optional target fields)
//!
//! # Design Decisions
//! - Paths are rejected if they contain characters that would break out of the
//!   location line (`;`, `{`, `}`, whitespace)
//! - URL targets keep the caller's exact text; `url::Url` is only used to check it

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::EngineError;
use crate::domain::hostname::Fqdn;
use crate::domain::service::ServiceName;

/// Status code used for URL targets that do not carry one.
pub const DEFAULT_REDIRECT_STATUS: u16 = 301;

/// How the request path is compared against the mapping path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPattern {
    #[default]
    BeginsWith,
    Contains,
    EndsWith,
    Equals,
}

/// Which kind of target a mapping routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    Url,
    Service,
    ResponseCode,
}

/// A location path as written by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MappingPath(String);

impl MappingPath {
    pub fn new(raw: impl Into<String>) -> Result<Self, EngineError> {
        let path = raw.into();
        let invalid = |reason: &str| EngineError::InvalidMapping(format!("path {path:?}: {reason}"));

        if !path.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }
        if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(invalid("must not contain whitespace"));
        }
        if path.contains([';', '{', '}']) {
            return Err(invalid("must not contain ';', '{' or '}'"));
        }

        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MappingPath {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MappingPath> for String {
    fn from(value: MappingPath) -> Self {
        value.0
    }
}

/// An HTTP status code in the 100..=599 range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct HttpStatus(u16);

impl HttpStatus {
    pub fn new(code: u16) -> Result<Self, EngineError> {
        if !(100..=599).contains(&code) {
            return Err(EngineError::InvalidMapping(format!(
                "status code {code} outside 100-599"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_u16(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for HttpStatus {
    type Error = EngineError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<HttpStatus> for u16 {
    fn from(value: HttpStatus) -> Self {
        value.0
    }
}

impl fmt::Display for HttpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An absolute http(s) URL, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetUrl(String);

impl TargetUrl {
    pub fn new(raw: impl Into<String>) -> Result<Self, EngineError> {
        let raw = raw.into();
        let parsed = url::Url::parse(&raw)
            .map_err(|e| EngineError::InvalidMapping(format!("target url {raw:?}: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(EngineError::InvalidMapping(format!(
                "target url {raw:?}: scheme must be http or https"
            )));
        }
        if raw.contains([';', '{', '}']) || raw.chars().any(char::is_whitespace) {
            return Err(EngineError::InvalidMapping(format!(
                "target url {raw:?}: must not contain whitespace, ';', '{{' or '}}'"
            )));
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TargetUrl {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TargetUrl> for String {
    fn from(value: TargetUrl) -> Self {
        value.0
    }
}

impl fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where matching requests go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingTarget {
    /// Respond with `response_code` pointing at `url`.
    Url { url: TargetUrl, response_code: HttpStatus },
    /// Reverse-proxy to a locally registered service.
    Service(ServiceName),
    /// Respond with a bare status code.
    ResponseCode(HttpStatus),
}

impl MappingTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            MappingTarget::Url { .. } => TargetKind::Url,
            MappingTarget::Service(_) => TargetKind::Service,
            MappingTarget::ResponseCode(_) => TargetKind::ResponseCode,
        }
    }
}

/// A routing rule attached to one hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMapping", into = "RawMapping")]
pub struct Mapping {
    pub hostname: Fqdn,
    pub path: MappingPath,
    pub match_pattern: MatchPattern,
    pub target: MappingTarget,
}

impl Mapping {
    pub fn new(
        hostname: Fqdn,
        path: MappingPath,
        match_pattern: MatchPattern,
        target: MappingTarget,
    ) -> Self {
        Self {
            hostname,
            path,
            match_pattern,
            target,
        }
    }
}

/// Flat wire representation of a [`Mapping`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMapping {
    hostname: Fqdn,
    path: MappingPath,
    #[serde(default)]
    match_pattern: MatchPattern,
    #[serde(alias = "targetKind")]
    target_type: TargetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_url: Option<TargetUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_service_name: Option<ServiceName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_http_response_code: Option<HttpStatus>,
}

impl TryFrom<RawMapping> for Mapping {
    type Error = EngineError;

    fn try_from(raw: RawMapping) -> Result<Self, Self::Error> {
        let unexpected = |field: &str| {
            EngineError::InvalidMapping(format!(
                "{field} is not allowed for target type {:?}",
                raw.target_type
            ))
        };

        let target = match raw.target_type {
            TargetKind::Url => {
                if raw.target_service_name.is_some() {
                    return Err(unexpected("targetServiceName"));
                }
                let url = raw.target_url.clone().ok_or_else(|| {
                    EngineError::InvalidMapping("url target requires targetUrl".to_string())
                })?;
                let response_code = match raw.target_http_response_code {
                    Some(code) => code,
                    None => HttpStatus::new(DEFAULT_REDIRECT_STATUS)?,
                };
                MappingTarget::Url { url, response_code }
            }
            TargetKind::Service => {
                if raw.target_url.is_some() {
                    return Err(unexpected("targetUrl"));
                }
                if raw.target_http_response_code.is_some() {
                    return Err(unexpected("targetHttpResponseCode"));
                }
                let name = raw.target_service_name.clone().ok_or_else(|| {
                    EngineError::InvalidMapping(
                        "service target requires targetServiceName".to_string(),
                    )
                })?;
                MappingTarget::Service(name)
            }
            TargetKind::ResponseCode => {
                if raw.target_url.is_some() {
                    return Err(unexpected("targetUrl"));
                }
                if raw.target_service_name.is_some() {
                    return Err(unexpected("targetServiceName"));
                }
                let code = raw.target_http_response_code.ok_or_else(|| {
                    EngineError::InvalidMapping(
                        "response-code target requires targetHttpResponseCode".to_string(),
                    )
                })?;
                MappingTarget::ResponseCode(code)
            }
        };

        Ok(Mapping::new(raw.hostname, raw.path, raw.match_pattern, target))
    }
}

impl From<Mapping> for RawMapping {
    fn from(mapping: Mapping) -> Self {
        let target_type = mapping.target.kind();
        let (target_url, target_service_name, target_http_response_code) = match mapping.target {
            MappingTarget::Url { url, response_code } => (Some(url), None, Some(response_code)),
            MappingTarget::Service(name) => (None, Some(name), None),
            MappingTarget::ResponseCode(code) => (None, None, Some(code)),
        };

        Self {
            hostname: mapping.hostname,
            path: mapping.path,
            match_pattern: mapping.match_pattern,
            target_type,
            target_url,
            target_service_name,
            target_http_response_code,
        }
    }
}
