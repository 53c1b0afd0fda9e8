//! Server-block rendering.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::domain::Fqdn;

/// Everything a primary host's server block refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerBlock {
    pub hostname: Fqdn,
    pub http_port: u16,
    pub https_port: u16,
    pub public_dir: PathBuf,
    pub certificate_path: PathBuf,
    pub key_path: PathBuf,
    pub access_log: PathBuf,
    pub error_log: PathBuf,
    pub std_include: PathBuf,
    pub mapping_include: PathBuf,
}

impl ServerBlock {
    /// Render the server block as nginx configuration text.
    pub fn render(&self) -> String {
        let host = &self.hostname;
        let mut out = String::with_capacity(512);

        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "server {{
    listen {http};
    listen {https} ssl;
    server_name {host} {www};

    root {root};

    ssl_certificate {cert};
    ssl_certificate_key {key};

    access_log {access} combined buffer=512k flush=1m;
    error_log {error} warn;

    include {std};
    include {mapping};
}}
",
            http = self.http_port,
            https = self.https_port,
            www = host.www(),
            root = self.public_dir.display(),
            cert = self.certificate_path.display(),
            key = self.key_path.display(),
            access = self.access_log.display(),
            error = self.error_log.display(),
            std = self.std_include.display(),
            mapping = self.mapping_include.display(),
        );

        out
    }
}
