//! Validate-then-apply web server reloads.
//!
//! # Data Flow
//! ```text
//! ReloadController::commit(stage, on_invalid)
//!     → acquire tree lock (one stage/validate/apply sequence at a time)
//!     → stage()                 (write the operation's artifacts)
//!     → WebServer::validate()   (nginx -t over the full tree)
//!         → failure: on_invalid() (restore staged artifact) → ConfigValidationFailed
//!     → WebServer::apply()      (nginx -s reload)
//!         → failure: ReloadFailed
//! ```
//!
//! # Design Decisions
//! - `nginx -t` sees the whole tree, so artifact writes happen inside the tree
//!   lock; no other operation's unvalidated edit is on disk during validate or apply
//! - `apply()` is unreachable unless `validate()` returned Ok in the same critical section
//! - Callers take their per-artifact locks before calling `commit`
//! - No retries: a rejected configuration is a caller fault, not a transient one

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::config::WebServerConfig;
use crate::domain::EngineError;
use crate::observability::metrics;
use crate::system::{CommandRunner, ExecError};

/// Control surface of the web server.
#[async_trait]
pub trait WebServer: Send + Sync {
    /// Check the full configuration tree without applying it.
    async fn validate(&self) -> Result<(), ExecError>;

    /// Hot-apply the configuration.
    async fn apply(&self) -> Result<(), ExecError>;
}

/// nginx driven through its command line.
pub struct NginxWebServer {
    validate_command: Vec<String>,
    reload_command: Vec<String>,
    runner: Arc<dyn CommandRunner>,
}

impl NginxWebServer {
    pub fn new(config: &WebServerConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            validate_command: config.validate_command.clone(),
            reload_command: config.reload_command.clone(),
            runner,
        }
    }

    async fn run(&self, command: &[String]) -> Result<(), ExecError> {
        let (program, args) = command.split_first().ok_or_else(|| ExecError::Spawn {
            program: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        })?;
        self.runner.run(program, args).await.map(|_| ())
    }
}

#[async_trait]
impl WebServer for NginxWebServer {
    async fn validate(&self) -> Result<(), ExecError> {
        self.run(&self.validate_command).await
    }

    async fn apply(&self) -> Result<(), ExecError> {
        self.run(&self.reload_command).await
    }
}

/// Serialized stage-validate-apply over the whole configuration tree.
pub struct ReloadController {
    web_server: Arc<dyn WebServer>,
    lock: Mutex<()>,
}

impl ReloadController {
    pub fn new(web_server: Arc<dyn WebServer>) -> Self {
        Self {
            web_server,
            lock: Mutex::new(()),
        }
    }

    /// Validate, then apply, with nothing staged.
    pub async fn reload(&self) -> Result<(), EngineError> {
        self.commit(|| async { Ok(()) }, || async {}).await
    }

    /// Run `stage`, validate the tree, then apply it.
    ///
    /// A failing `stage` returns its error without validating. If validation
    /// fails, `on_invalid` runs before the lock is released.
    pub async fn commit<S, SFut, F, Fut>(&self, stage: S, on_invalid: F) -> Result<(), EngineError>
    where
        S: FnOnce() -> SFut + Send,
        SFut: Future<Output = Result<(), EngineError>> + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let _guard = self.lock.lock().await;

        stage().await?;

        if let Err(e) = self.web_server.validate().await {
            tracing::error!(error = %e, "Web server rejected configuration; reload skipped");
            on_invalid().await;
            metrics::record_reload("invalid");
            return Err(EngineError::ConfigValidationFailed(e));
        }

        if let Err(e) = self.web_server.apply().await {
            tracing::error!(error = %e, "Web server reload failed");
            metrics::record_reload("failed");
            return Err(EngineError::ReloadFailed(e));
        }

        metrics::record_reload("applied");
        tracing::info!("Web server configuration reloaded");
        Ok(())
    }
}
