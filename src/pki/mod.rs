//! Self-signed certificate provisioning.
//!
//! # Responsibilities
//! - Issue one RSA key + self-signed certificate per primary hostname
//! - Write both to deterministic paths under the PKI directory
//!
//! # Design Decisions
//! - Delegates to the `openssl` binary through the injected command runner, so
//!   tests never generate real keys
//! - CN is the hostname only: aliases attached later are not added as subject
//!   alternative names and will fail strict TLS validation

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::CertificateConfig;
use crate::domain::{EngineError, Fqdn};
use crate::system::{fs, CommandRunner};

/// Paths of an issued key/certificate pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateMaterial {
    pub hostname: Fqdn,
    pub certificate_path: PathBuf,
    pub key_path: PathBuf,
}

impl CertificateMaterial {
    /// Where the pair for `hostname` lives under `pki_dir`.
    pub fn locate(pki_dir: &Path, hostname: &Fqdn) -> Self {
        Self {
            hostname: hostname.clone(),
            certificate_path: pki_dir.join(format!("{hostname}.crt")),
            key_path: pki_dir.join(format!("{hostname}.key")),
        }
    }
}

/// Issues TLS material for new primary hosts.
#[async_trait]
pub trait CertificateProvisioner: Send + Sync {
    async fn issue(&self, hostname: &Fqdn) -> Result<CertificateMaterial, EngineError>;
}

/// Runs `openssl req -x509` to produce the key and certificate.
pub struct OpensslProvisioner {
    pki_dir: PathBuf,
    config: CertificateConfig,
    runner: Arc<dyn CommandRunner>,
}

impl OpensslProvisioner {
    pub fn new(pki_dir: PathBuf, config: CertificateConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            pki_dir,
            config,
            runner,
        }
    }

    fn args(&self, material: &CertificateMaterial) -> Vec<String> {
        vec![
            "req".to_string(),
            "-x509".to_string(),
            "-nodes".to_string(),
            "-days".to_string(),
            self.config.validity_days.to_string(),
            "-newkey".to_string(),
            format!("rsa:{}", self.config.key_bits),
            "-keyout".to_string(),
            material.key_path.display().to_string(),
            "-out".to_string(),
            material.certificate_path.display().to_string(),
            "-subj".to_string(),
            format!("{}/CN={}", self.config.subject_prefix, material.hostname),
        ]
    }
}

#[async_trait]
impl CertificateProvisioner for OpensslProvisioner {
    async fn issue(&self, hostname: &Fqdn) -> Result<CertificateMaterial, EngineError> {
        let material = CertificateMaterial::locate(&self.pki_dir, hostname);

        fs::make_dir(&self.pki_dir)
            .await
            .map_err(|e| EngineError::CertificateGenerationFailed {
                hostname: hostname.clone(),
                reason: format!("cannot create {}: {e}", self.pki_dir.display()),
            })?;

        self.runner
            .run(&self.config.openssl_binary, &self.args(&material))
            .await
            .map_err(|e| EngineError::CertificateGenerationFailed {
                hostname: hostname.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            hostname = %hostname,
            certificate = %material.certificate_path.display(),
            days = self.config.validity_days,
            "Self-signed certificate issued"
        );
        Ok(material)
    }
}
