//! Read-only questions about existing virtual hosts.
//!
//! # Responsibilities
//! - Tell whether a hostname is the platform's designated primary domain
//! - Resolve the mapping artifact a hostname's routing rules go into
//! - Enumerate virtual hosts from the server-block artifacts on disk

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{EngineError, Fqdn, VirtualHost};
use crate::render::ServerNameDocument;
use crate::vhost::layout::ArtifactLayout;

/// Collaborator answering questions about existing virtual hosts.
#[async_trait]
pub trait VirtualHostQuery: Send + Sync {
    fn is_primary_domain(&self, hostname: &Fqdn) -> bool;

    async fn mapping_artifact_path(&self, hostname: &Fqdn) -> Result<PathBuf, EngineError>;

    async fn list(&self) -> Result<Vec<VirtualHost>, EngineError>;
}

/// Answers from the artifact layout on disk.
#[derive(Debug, Clone)]
pub struct LayoutQuery {
    layout: ArtifactLayout,
    primary_domain: Option<Fqdn>,
}

impl LayoutQuery {
    pub fn new(layout: ArtifactLayout, primary_domain: Option<Fqdn>) -> Self {
        Self {
            layout,
            primary_domain,
        }
    }

    /// The primary host whose server block lists `hostname` as an alias.
    async fn owner_of(&self, hostname: &Fqdn) -> Option<Fqdn> {
        self.list()
            .await
            .ok()?
            .into_iter()
            .find(|vhost| vhost.hostname() == hostname)
            .and_then(|vhost| vhost.parent_hostname().cloned())
    }

    fn mapping_path_of_primary(&self, primary: &Fqdn) -> PathBuf {
        if self.is_primary_domain(primary) {
            self.layout.shared_primary_mapping_path()
        } else {
            self.layout.mapping_path(primary)
        }
    }

    async fn server_blocks(&self) -> Result<Vec<PathBuf>, EngineError> {
        let dir = self.layout.conf_dir();
        let read_failed = |source: std::io::Error| EngineError::ArtifactUpdateFailed {
            path: dir.clone(),
            source,
        };

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(read_failed(source)),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "conf") && is_file(&path).await {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[async_trait]
impl VirtualHostQuery for LayoutQuery {
    fn is_primary_domain(&self, hostname: &Fqdn) -> bool {
        self.primary_domain.as_ref() == Some(hostname)
    }

    async fn mapping_artifact_path(&self, hostname: &Fqdn) -> Result<PathBuf, EngineError> {
        let own = self.mapping_path_of_primary(hostname);
        if is_file(&own).await {
            return Ok(own);
        }

        // Aliases route through their primary's mapping artifact.
        if let Some(owner) = self.owner_of(hostname).await {
            let path = self.mapping_path_of_primary(&owner);
            if is_file(&path).await {
                return Ok(path);
            }
        }
        Err(EngineError::MappingPathResolutionFailed {
            hostname: hostname.clone(),
        })
    }

    async fn list(&self) -> Result<Vec<VirtualHost>, EngineError> {
        let mut vhosts = Vec::new();

        for path in self.server_blocks().await? {
            let Some(primary) = primary_for(&path, &self.layout, self.primary_domain.as_ref()) else {
                continue;
            };

            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable server block");
                    continue;
                }
            };

            let aliases = ServerNameDocument::parse(&text).aliases_of(primary.as_str());
            vhosts.push(VirtualHost::primary(primary.clone()));
            for alias in aliases {
                match Fqdn::new(&alias).and_then(|a| VirtualHost::alias(a, primary.clone())) {
                    Ok(vhost) => vhosts.push(vhost),
                    Err(e) => tracing::warn!(alias = %alias, error = %e, "Skipping unparseable server name"),
                }
            }
        }

        Ok(vhosts)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

fn primary_for(path: &Path, layout: &ArtifactLayout, primary_domain: Option<&Fqdn>) -> Option<Fqdn> {
    let name = path.file_name()?.to_str()?;
    if name == layout.shared_primary_name() {
        return primary_domain.cloned();
    }
    Fqdn::new(name.strip_suffix(".conf")?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use crate::domain::VhostKind;

    fn layout(root: &Path) -> ArtifactLayout {
        ArtifactLayout::new(PathsConfig {
            nginx_conf_dir: root.join("nginx"),
            mapping_dir: root.join("nginx/mapping"),
            html_dir: root.join("html"),
            pki_dir: root.join("pki"),
            log_dir: root.join("logs"),
            std_include: root.join("std.conf"),
            primary_conf_name: "primary.conf".to_string(),
        })
    }

    fn fqdn(s: &str) -> Fqdn {
        Fqdn::new(s).unwrap()
    }

    fn write(path: PathBuf, text: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[tokio::test]
    async fn test_mapping_path_for_primary_and_alias() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = layout(tmp.path());
        let query = LayoutQuery::new(layout.clone(), Some(fqdn("panel.example.com")));

        write(
            layout.server_block_path(&fqdn("shop.example.com")),
            "server {\n    server_name shop.example.com www.shop.example.com a.example.com www.a.example.com;\n}\n",
        );
        write(layout.mapping_path(&fqdn("shop.example.com")), "");
        write(layout.shared_primary_mapping_path(), "");

        assert_eq!(
            query.mapping_artifact_path(&fqdn("shop.example.com")).await.unwrap(),
            layout.mapping_path(&fqdn("shop.example.com"))
        );
        assert_eq!(
            query.mapping_artifact_path(&fqdn("a.example.com")).await.unwrap(),
            layout.mapping_path(&fqdn("shop.example.com"))
        );
        assert_eq!(
            query.mapping_artifact_path(&fqdn("panel.example.com")).await.unwrap(),
            layout.shared_primary_mapping_path()
        );

        let err = query.mapping_artifact_path(&fqdn("ghost.example.com")).await.unwrap_err();
        assert_eq!(err.code(), "mapping-path-resolution-failed");
    }

    #[tokio::test]
    async fn test_list_recovers_aliases() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = layout(tmp.path());
        let query = LayoutQuery::new(layout.clone(), Some(fqdn("panel.example.com")));

        write(
            layout.shared_primary_path(),
            "server {\n    server_name panel.example.com www.panel.example.com b.example.com www.b.example.com;\n}\n",
        );
        write(
            layout.server_block_path(&fqdn("shop.example.com")),
            "server {\n    server_name shop.example.com www.shop.example.com;\n}\n",
        );
        write(tmp.path().join("nginx/notes.txt"), "ignored");

        let vhosts = query.list().await.unwrap();
        let summary: Vec<_> = vhosts
            .iter()
            .map(|v| (v.hostname().to_string(), v.kind(), v.parent_hostname().map(Fqdn::to_string)))
            .collect();

        assert_eq!(
            summary,
            [
                ("panel.example.com".to_string(), VhostKind::Primary, None),
                (
                    "b.example.com".to_string(),
                    VhostKind::Alias,
                    Some("panel.example.com".to_string())
                ),
                ("shop.example.com".to_string(), VhostKind::Primary, None),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_without_conf_dir_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let query = LayoutQuery::new(layout(&tmp.path().join("missing")), None);
        assert!(query.list().await.unwrap().is_empty());
    }
}
