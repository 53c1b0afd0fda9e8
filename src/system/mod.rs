//! Operating-system primitives.
//!
//! # Data Flow
//! ```text
//! manager / pki / reload
//!     → exec.rs   (subprocess with deadline)
//!     → fs.rs     (atomic create / truncate / append, directories)
//!     → locks.rs  (one writer per artifact path)
//! ```
//!
//! # Design Decisions
//! - Every subprocess has a deadline; a hung child is killed, not awaited forever
//! - File writes go through a temp file + rename so readers never see half a file
//! - Locks are keyed by path, so edits to unrelated artifacts never wait on each other

pub mod exec;
pub mod fs;
pub mod locks;

pub use exec::{CommandOutput, CommandRunner, ExecError, TokioCommandRunner};
pub use locks::ArtifactLocks;
