//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, one span per engine operation)
//!     → metrics.rs (operation and reload counters)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, `vhostctl serve` only)
//! ```
//!
//! # Design Decisions
//! - Structured fields (hostname, path, error code) instead of formatted messages
//! - Every failed step logs its full cause chain once, where it fails
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
