//! Virtual host and mapping configuration engine.
//!
//! Turns declarative virtual host and mapping requests into nginx
//! configuration artifacts, then validates and hot-reloads the server.
//!
//! # Architecture Overview
//!
//! ```text
//!   vhostctl / admin API (api)
//!            │
//!            ▼
//!   VirtualHostManager (vhost) ──▶ MappingCompiler (mapping) ──▶ ServiceDirectory (services)
//!            │        │                     │
//!            │        │                     ▼
//!            │        │              LocationBlock (render)
//!            │        ▼
//!            │   ServerBlock / ServerNameDocument (render)
//!            │   CertificateProvisioner (pki)
//!            ▼
//!   artifacts on disk (system::fs) ──▶ ReloadController (reload): nginx -t, nginx -s reload
//! ```

// Core model
pub mod config;
pub mod domain;

// Engine
pub mod mapping;
pub mod pki;
pub mod reload;
pub mod render;
pub mod services;
pub mod vhost;

// Surfaces
pub mod api;

// Cross-cutting concerns
pub mod observability;
pub mod system;

pub use config::EngineConfig;
pub use domain::EngineError;
pub use vhost::VirtualHostManager;
