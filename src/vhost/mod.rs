//! Virtual host lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! add(primary)  → server block + mapping artifact + public dir
//!               → certificate → ownership → reload
//! add(alias)    → parent's server_name directives += alias, www.alias → reload
//! delete(…)     → inverse of add
//! add_mapping() → MappingCompiler → append to mapping artifact → reload
//! ```
//!
//! # Design Decisions
//! - One async lock per artifact path; edits to different hosts run in parallel
//! - Reloads are serialized globally by the reload controller
//! - Paths come from `ArtifactLayout` only; no other module builds them

pub mod layout;
pub mod manager;
pub mod query;

pub use layout::ArtifactLayout;
pub use manager::{ManagerDeps, VirtualHostManager};
pub use query::{LayoutQuery, VirtualHostQuery};
