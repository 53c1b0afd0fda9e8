//! Where each artifact of a virtual host lives.
//!
//! # Responsibilities
//! - Derive every artifact path from the configured roots and a hostname
//! - Build the typed server block for a new primary host
//! - List the artifacts a primary host owns (for deletion)

use std::path::PathBuf;

use crate::config::{PathsConfig, WebServerConfig};
use crate::domain::Fqdn;
use crate::pki::CertificateMaterial;
use crate::render::ServerBlock;

/// Path scheme for all engine-managed artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    paths: PathsConfig,
}

impl ArtifactLayout {
    pub fn new(paths: PathsConfig) -> Self {
        Self { paths }
    }

    pub fn conf_dir(&self) -> &PathBuf {
        &self.paths.nginx_conf_dir
    }

    pub fn pki_dir(&self) -> &PathBuf {
        &self.paths.pki_dir
    }

    /// `<conf>/<host>.conf`
    pub fn server_block_path(&self, hostname: &Fqdn) -> PathBuf {
        self.paths.nginx_conf_dir.join(format!("{hostname}.conf"))
    }

    /// The primary domain's shared server-block artifact.
    pub fn shared_primary_path(&self) -> PathBuf {
        self.paths.nginx_conf_dir.join(&self.paths.primary_conf_name)
    }

    /// File name of the shared primary artifact.
    pub fn shared_primary_name(&self) -> &str {
        &self.paths.primary_conf_name
    }

    /// `<mapping>/<host>.conf`
    pub fn mapping_path(&self, hostname: &Fqdn) -> PathBuf {
        self.paths.mapping_dir.join(format!("{hostname}.conf"))
    }

    /// Mapping include of the primary domain's shared artifact.
    pub fn shared_primary_mapping_path(&self) -> PathBuf {
        self.paths.mapping_dir.join(&self.paths.primary_conf_name)
    }

    /// `<html>/<host>`
    pub fn public_dir(&self, hostname: &Fqdn) -> PathBuf {
        self.paths.html_dir.join(hostname.as_str())
    }

    pub fn certificate(&self, hostname: &Fqdn) -> CertificateMaterial {
        CertificateMaterial::locate(&self.paths.pki_dir, hostname)
    }

    pub fn access_log(&self, hostname: &Fqdn) -> PathBuf {
        self.paths.log_dir.join(format!("{hostname}_access.log"))
    }

    pub fn error_log(&self, hostname: &Fqdn) -> PathBuf {
        self.paths.log_dir.join(format!("{hostname}_error.log"))
    }

    pub fn server_block(&self, hostname: &Fqdn, web: &WebServerConfig) -> ServerBlock {
        let certificate = self.certificate(hostname);
        ServerBlock {
            hostname: hostname.clone(),
            http_port: web.http_port,
            https_port: web.https_port,
            public_dir: self.public_dir(hostname),
            certificate_path: certificate.certificate_path,
            key_path: certificate.key_path,
            access_log: self.access_log(hostname),
            error_log: self.error_log(hostname),
            std_include: self.paths.std_include.clone(),
            mapping_include: self.mapping_path(hostname),
        }
    }

    /// The five artifacts a primary host owns: server block, mapping,
    /// public directory, certificate, key.
    pub fn owned_artifacts(&self, hostname: &Fqdn) -> Vec<PathBuf> {
        let certificate = self.certificate(hostname);
        vec![
            self.server_block_path(hostname),
            self.mapping_path(hostname),
            self.public_dir(hostname),
            certificate.certificate_path,
            certificate.key_path,
        ]
    }

    /// Directories handed to the serving user after a primary host is created.
    pub fn ownership_dirs(&self, hostname: &Fqdn) -> Vec<PathBuf> {
        vec![
            self.public_dir(hostname),
            self.paths.nginx_conf_dir.clone(),
            self.paths.pki_dir.clone(),
        ]
    }
}
