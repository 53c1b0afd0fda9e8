//! Mapping rule compilation.
//!
//! # Data Flow
//! ```text
//! Mapping (hostname, path, match pattern, target)
//!     → selector: equals → "= path" | contains → "~ path" | ends-with → "~ path$" | begins-with → "path"
//!     → directive: url → return code url | response-code → return code
//!                  service → ServiceDirectory → first port → proxy_pass http://localhost:<port>
//!     → LocationBlock (rendered by render::location)
//! ```
//!
//! # Design Decisions
//! - Compilation is side-effect free: nothing is written until a block exists
//! - An unresolvable service fails the whole mapping; no placeholder block

use std::sync::Arc;

use crate::domain::{EngineError, Mapping, MappingTarget, MatchPattern};
use crate::render::{LocationBlock, LocationDirective, LocationModifier};
use crate::services::{resolve_endpoint, ServiceDirectory};

/// Turns mappings into location blocks.
#[derive(Clone)]
pub struct MappingCompiler {
    services: Arc<dyn ServiceDirectory>,
}

impl MappingCompiler {
    pub fn new(services: Arc<dyn ServiceDirectory>) -> Self {
        Self { services }
    }

    pub fn compile(&self, mapping: &Mapping) -> Result<LocationBlock, EngineError> {
        let (modifier, path) = selector(mapping.match_pattern, mapping.path.as_str());

        let directive = match &mapping.target {
            MappingTarget::Url { url, response_code } => LocationDirective::ReturnUrl {
                code: response_code.as_u16(),
                url: url.to_string(),
            },
            MappingTarget::ResponseCode(code) => LocationDirective::Return(code.as_u16()),
            MappingTarget::Service(name) => {
                let endpoint = resolve_endpoint(self.services.as_ref(), name).inspect_err(|e| {
                    tracing::warn!(service = %name, hostname = %mapping.hostname, error = %e, "Mapping target unresolved");
                })?;
                LocationDirective::ProxyPass(endpoint.to_string())
            }
        };

        Ok(LocationBlock {
            modifier,
            path,
            directive,
        })
    }
}

fn selector(pattern: MatchPattern, path: &str) -> (Option<LocationModifier>, String) {
    match pattern {
        MatchPattern::Equals => (Some(LocationModifier::Exact), path.to_string()),
        MatchPattern::Contains => (Some(LocationModifier::Regex), path.to_string()),
        MatchPattern::EndsWith => (Some(LocationModifier::Regex), format!("{path}$")),
        MatchPattern::BeginsWith => (None, path.to_string()),
    }
}
