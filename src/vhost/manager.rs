//! Virtual host lifecycle.
//!
//! # Responsibilities
//! - Add and delete primary hosts and aliases
//! - Append compiled mappings to a host's mapping artifact
//! - Reload the web server after every successful mutation
//!
//! # Design Decisions
//! - Fail fast: the first failing step returns its own error code
//! - Per-artifact locks are taken first; every write then happens inside the
//!   reload controller's tree lock, together with its validate and apply
//! - Edits to an existing artifact are staged: the previous bytes are kept and
//!   written back if the web server rejects the result
//! - Creating a primary host is not staged; artifacts created before a failing
//!   step stay on disk
//! - Deleting a primary does not touch aliases attached to it; they are only
//!   reported in the log

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::config::{EngineConfig, OwnershipConfig, WebServerConfig};
use crate::domain::{EngineError, Fqdn, Mapping, VhostKind, VirtualHost};
use crate::mapping::MappingCompiler;
use crate::observability::metrics;
use crate::pki::{CertificateProvisioner, OpensslProvisioner};
use crate::reload::{NginxWebServer, ReloadController, WebServer};
use crate::render::ServerNameDocument;
use crate::services::{ServiceDirectory, StaticServiceDirectory};
use crate::system::fs::{self, WriteMode};
use crate::system::{ArtifactLocks, CommandRunner, TokioCommandRunner};
use crate::vhost::layout::ArtifactLayout;
use crate::vhost::query::{LayoutQuery, VirtualHostQuery};

/// Collaborators the manager drives.
pub struct ManagerDeps {
    pub query: Arc<dyn VirtualHostQuery>,
    pub services: Arc<dyn ServiceDirectory>,
    pub certificates: Arc<dyn CertificateProvisioner>,
    pub web_server: Arc<dyn WebServer>,
    pub runner: Arc<dyn CommandRunner>,
}

/// Entry point for every virtual host mutation.
pub struct VirtualHostManager {
    layout: ArtifactLayout,
    web: WebServerConfig,
    ownership: OwnershipConfig,
    query: Arc<dyn VirtualHostQuery>,
    services: Arc<dyn ServiceDirectory>,
    compiler: MappingCompiler,
    certificates: Arc<dyn CertificateProvisioner>,
    runner: Arc<dyn CommandRunner>,
    reload: ReloadController,
    locks: ArtifactLocks,
}

impl VirtualHostManager {
    pub fn new(config: &EngineConfig, deps: ManagerDeps) -> Self {
        Self {
            layout: ArtifactLayout::new(config.paths.clone()),
            web: config.web_server.clone(),
            ownership: config.ownership.clone(),
            query: deps.query,
            compiler: MappingCompiler::new(deps.services.clone()),
            services: deps.services,
            certificates: deps.certificates,
            runner: deps.runner,
            reload: ReloadController::new(deps.web_server),
            locks: ArtifactLocks::new(),
        }
    }

    /// Wire the production collaborators: nginx, openssl, the on-disk layout
    /// and the static service registry.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let runner: Arc<dyn CommandRunner> = Arc::new(TokioCommandRunner::new(Duration::from_secs(
            config.web_server.command_timeout_secs,
        )));
        let layout = ArtifactLayout::new(config.paths.clone());

        let services = StaticServiceDirectory::load(
            config.services.registry_path.as_deref(),
            config.services.entries.clone(),
        )
        .map_err(EngineError::ServiceDirectoryUnavailable)?;

        let deps = ManagerDeps {
            query: Arc::new(LayoutQuery::new(layout, config.primary_domain.clone())),
            services: Arc::new(services),
            certificates: Arc::new(OpensslProvisioner::new(
                config.paths.pki_dir.clone(),
                config.certificate.clone(),
                runner.clone(),
            )),
            web_server: Arc::new(NginxWebServer::new(&config.web_server, runner.clone())),
            runner,
        };
        Ok(Self::new(config, deps))
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn services(&self) -> &Arc<dyn ServiceDirectory> {
        &self.services
    }

    /// Every virtual host found on disk.
    pub async fn list(&self) -> Result<Vec<VirtualHost>, EngineError> {
        self.query.list().await
    }

    /// Create a primary host, or attach an alias to its parent.
    pub async fn add(&self, vhost: &VirtualHost) -> Result<(), EngineError> {
        let span = tracing::info_span!("vhost.add", hostname = %vhost.hostname(), kind = %vhost.kind());
        let result = self.dispatch_add(vhost).instrument(span.clone()).await;

        finish(&span, "add", result)
    }

    /// Remove a primary host's artifacts, or detach an alias.
    pub async fn delete(&self, vhost: &VirtualHost) -> Result<(), EngineError> {
        let span =
            tracing::info_span!("vhost.delete", hostname = %vhost.hostname(), kind = %vhost.kind());
        let result = self.dispatch_delete(vhost).instrument(span.clone()).await;

        finish(&span, "delete", result)
    }

    /// Compile `mapping` and append it to the host's mapping artifact.
    pub async fn add_mapping(&self, mapping: &Mapping) -> Result<(), EngineError> {
        let span = tracing::info_span!(
            "vhost.add_mapping",
            hostname = %mapping.hostname,
            path = %mapping.path.as_str()
        );
        let result = self.append_mapping(mapping).instrument(span.clone()).await;
        finish(&span, "add_mapping", result)
    }

    async fn dispatch_add(&self, vhost: &VirtualHost) -> Result<(), EngineError> {
        match vhost.kind() {
            VhostKind::Primary => self.add_primary(vhost.hostname()).await,
            VhostKind::Alias => self.add_alias(vhost.hostname(), parent_of(vhost)?).await,
        }
    }

    async fn dispatch_delete(&self, vhost: &VirtualHost) -> Result<(), EngineError> {
        match vhost.kind() {
            VhostKind::Primary => self.delete_primary(vhost.hostname()).await,
            VhostKind::Alias => self.delete_alias(vhost.hostname(), parent_of(vhost)?).await,
        }
    }

    async fn add_primary(&self, hostname: &Fqdn) -> Result<(), EngineError> {
        if self.query.is_primary_domain(hostname) {
            return Err(EngineError::VirtualHostAlreadyExists(hostname.clone()));
        }

        let conf_path = self.layout.server_block_path(hostname);
        let mapping_path = self.layout.mapping_path(hostname);
        let _conf_guard = self.locks.lock(&conf_path).await;
        let _mapping_guard = self.locks.lock(&mapping_path).await;

        let exists = tokio::fs::try_exists(&conf_path)
            .await
            .map_err(|source| EngineError::ArtifactCreationFailed {
                path: conf_path.clone(),
                source,
            })?;
        if exists {
            return Err(EngineError::VirtualHostAlreadyExists(hostname.clone()));
        }

        // No restore hook: a rejected new host keeps its artifacts.
        self.reload
            .commit(
                || self.create_primary(hostname, &conf_path, &mapping_path),
                || async {},
            )
            .await
    }

    async fn create_primary(
        &self,
        hostname: &Fqdn,
        conf_path: &Path,
        mapping_path: &Path,
    ) -> Result<(), EngineError> {
        let server_block = self.layout.server_block(hostname, &self.web).render();
        create_artifact(conf_path, &server_block).await?;
        create_artifact(mapping_path, "").await?;

        let public_dir = self.layout.public_dir(hostname);
        fs::make_dir(&public_dir)
            .await
            .map_err(|source| EngineError::PublicDirCreationFailed {
                path: public_dir.clone(),
                source,
            })?;

        self.certificates.issue(hostname).await?;
        self.fix_ownership(hostname).await?;

        tracing::info!(
            conf = %conf_path.display(),
            mapping = %mapping_path.display(),
            public_dir = %public_dir.display(),
            "Primary host artifacts created"
        );
        Ok(())
    }

    async fn fix_ownership(&self, hostname: &Fqdn) -> Result<(), EngineError> {
        if !self.ownership.enabled {
            return Ok(());
        }

        let owner = if self.ownership.group.is_empty() {
            self.ownership.user.clone()
        } else {
            format!("{}:{}", self.ownership.user, self.ownership.group)
        };

        for dir in self.layout.ownership_dirs(hostname) {
            let args = vec!["-R".to_string(), owner.clone(), dir.display().to_string()];
            self.runner
                .run("chown", &args)
                .await
                .map_err(|source| EngineError::OwnershipFixFailed { path: dir, source })?;
        }
        Ok(())
    }

    /// The artifact an alias of `parent` is written into.
    fn alias_config_path(&self, parent: &Fqdn) -> PathBuf {
        if self.query.is_primary_domain(parent) {
            self.layout.shared_primary_path()
        } else {
            self.layout.server_block_path(parent)
        }
    }

    async fn add_alias(&self, alias: &Fqdn, parent: &Fqdn) -> Result<(), EngineError> {
        let path = self.alias_config_path(parent);
        let _guard = self.locks.lock(&path).await;

        let (original, mut document) = load_server_names(&path, parent).await?;
        if document.contains(alias.as_str()) {
            return Err(EngineError::AliasAlreadyExists {
                alias: alias.clone(),
                path,
            });
        }

        let changed = document.add_alias(alias);
        let rendered = document.render();
        self.commit_staged(&path, original, || write_staged(&path, &rendered))
            .await?;

        tracing::info!(
            path = %path.display(),
            directives = changed,
            "Alias attached; certificate SANs are not updated"
        );
        Ok(())
    }

    async fn delete_alias(&self, alias: &Fqdn, parent: &Fqdn) -> Result<(), EngineError> {
        let path = self.alias_config_path(parent);
        let _guard = self.locks.lock(&path).await;

        let (original, mut document) = load_server_names(&path, parent).await?;
        if document.remove_alias(alias) == 0 {
            tracing::warn!(path = %path.display(), "Alias not listed; nothing to remove");
            return Ok(());
        }

        let rendered = document.render();
        self.commit_staged(&path, original, || write_staged(&path, &rendered))
            .await
    }

    async fn delete_primary(&self, hostname: &Fqdn) -> Result<(), EngineError> {
        if self.query.is_primary_domain(hostname) {
            return Err(EngineError::PrimaryDomainProtected(hostname.clone()));
        }

        let conf_path = self.layout.server_block_path(hostname);
        let mapping_path = self.layout.mapping_path(hostname);
        let _conf_guard = self.locks.lock(&conf_path).await;
        let _mapping_guard = self.locks.lock(&mapping_path).await;

        if let Ok(text) = tokio::fs::read_to_string(&conf_path).await {
            let orphans = ServerNameDocument::parse(&text).aliases_of(hostname.as_str());
            if !orphans.is_empty() {
                tracing::warn!(
                    aliases = ?orphans,
                    "Deleting primary host leaves its aliases without a server block"
                );
            }
        }

        let artifacts = self.layout.owned_artifacts(hostname);
        self.reload
            .commit(|| remove_artifacts(&artifacts), || async {})
            .await
    }

    async fn append_mapping(&self, mapping: &Mapping) -> Result<(), EngineError> {
        let block = self.compiler.compile(mapping)?;
        let path = self.query.mapping_artifact_path(&mapping.hostname).await?;
        let _guard = self.locks.lock(&path).await;

        let original = fs::read_optional(&path)
            .await
            .map_err(|source| EngineError::ArtifactUpdateFailed {
                path: path.clone(),
                source,
            })?
            .ok_or_else(|| EngineError::MappingPathResolutionFailed {
                hostname: mapping.hostname.clone(),
            })?;

        let rendered = block.render();
        self.commit_staged(&path, original, || append_staged(&path, &rendered))
            .await?;

        tracing::info!(path = %path.display(), location = %block.key(), "Mapping appended");
        Ok(())
    }

    /// Stage an edit of `path` and reload; if validation fails, `original`
    /// is written back before the tree lock is released.
    async fn commit_staged<S, SFut>(
        &self,
        path: &Path,
        original: Vec<u8>,
        stage: S,
    ) -> Result<(), EngineError>
    where
        S: FnOnce() -> SFut + Send,
        SFut: Future<Output = Result<(), EngineError>> + Send,
    {
        let path = path.to_path_buf();
        self.reload
            .commit(stage, || async move {
                match fs::write_atomic(&path, &original).await {
                    Ok(()) => tracing::warn!(path = %path.display(), "Restored artifact after rejected configuration"),
                    Err(e) => tracing::error!(path = %path.display(), error = %e, "Failed to restore artifact"),
                }
            })
            .await
    }
}

fn parent_of(vhost: &VirtualHost) -> Result<&Fqdn, EngineError> {
    vhost.parent_hostname().ok_or_else(|| {
        EngineError::InvalidVirtualHost(format!("alias {} has no parent", vhost.hostname()))
    })
}

fn finish(
    span: &tracing::Span,
    operation: &'static str,
    result: Result<(), EngineError>,
) -> Result<(), EngineError> {
    let _entered = span.enter();
    match &result {
        Ok(()) => {
            metrics::record_operation(operation, "ok");
            tracing::info!(operation, "Operation completed");
        }
        Err(e) => {
            metrics::record_operation(operation, e.code());
            tracing::error!(
                operation,
                code = e.code(),
                category = %e.category(),
                error = %e.chain(),
                "Operation failed"
            );
        }
    }
    result
}

async fn create_artifact(path: &Path, contents: &str) -> Result<(), EngineError> {
    fs::update_file(path, contents, WriteMode::Truncate)
        .await
        .map_err(|source| EngineError::ArtifactCreationFailed {
            path: path.to_path_buf(),
            source,
        })
}

async fn write_staged(path: &Path, contents: &str) -> Result<(), EngineError> {
    fs::update_file(path, contents, WriteMode::Truncate)
        .await
        .map_err(|source| EngineError::ArtifactUpdateFailed {
            path: path.to_path_buf(),
            source,
        })
}

async fn append_staged(path: &Path, contents: &str) -> Result<(), EngineError> {
    fs::update_file(path, contents, WriteMode::Append)
        .await
        .map_err(|source| EngineError::ArtifactUpdateFailed {
            path: path.to_path_buf(),
            source,
        })
}

async fn remove_artifacts(paths: &[PathBuf]) -> Result<(), EngineError> {
    fs::remove_all(paths)
        .await
        .map_err(|(path, source)| EngineError::VirtualHostDeletionFailed { path, source })
}

/// Read a server-block artifact for alias editing.
async fn load_server_names(
    path: &Path,
    parent: &Fqdn,
) -> Result<(Vec<u8>, ServerNameDocument), EngineError> {
    let not_found = || EngineError::AliasConfigNotFound {
        parent: parent.clone(),
        path: path.to_path_buf(),
    };

    let original = fs::read_optional(path)
        .await
        .map_err(|source| EngineError::ArtifactUpdateFailed {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(not_found)?;

    let text = std::str::from_utf8(&original).map_err(|e| EngineError::ArtifactUpdateFailed {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })?;

    let document = ServerNameDocument::parse(text);
    if document.directive_count() == 0 {
        return Err(not_found());
    }
    Ok((original, document))
}
