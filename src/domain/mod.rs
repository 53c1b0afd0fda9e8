//! Domain values for the virtual host engine.
//!
//! # Data Flow
//! ```text
//! administrative intent (CLI / admin API)
//!     → hostname.rs, mapping.rs (parse & validate identifiers)
//!     → VirtualHost / Mapping (typed, validated)
//!     → vhost::manager (artifacts + reload)
//!     → error.rs (one stable code per failed step)
//! ```
//!
//! # Design Decisions
//! - Values are validated at construction; downstream code never re-checks them
//! - Mapping targets are an enum, so exactly one target is populated by construction
//! - Error codes are stable strings, independent of Display messages

pub mod error;
pub mod hostname;
pub mod mapping;
pub mod service;
pub mod vhost;

pub use error::{EngineError, ErrorCategory};
pub use hostname::Fqdn;
pub use mapping::{HttpStatus, Mapping, MappingPath, MappingTarget, MatchPattern, TargetUrl};
pub use service::{Service, ServiceName};
pub use vhost::{VhostKind, VirtualHost};
