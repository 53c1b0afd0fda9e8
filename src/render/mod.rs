//! Configuration rendering and mutation.
//!
//! # Data Flow
//! ```text
//! Creating a primary host:
//!     ServerBlock (typed paths + hostname) → server_block.rs → server-block artifact text
//!
//! Adding a mapping:
//!     LocationBlock (modifier, path, directive) → location.rs → appended routing block
//!
//! Attaching / detaching an alias:
//!     artifact text → server_names.rs (parse server_name directives)
//!     → add/remove names → re-render touched lines → artifact text
//! ```
//!
//! # Design Decisions
//! - Rendering is pure: no filesystem access here
//! - Lines that are not touched by a mutation are written back byte-for-byte
//! - The on-disk nginx syntax is unchanged; only the in-memory model is structured

pub mod location;
pub mod server_block;
pub mod server_names;

pub use location::{LocationBlock, LocationDirective, LocationModifier};
pub use server_block::ServerBlock;
pub use server_names::ServerNameDocument;
