//! `vhostctl`: manage virtual hosts and mappings on this node.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;

use vhost_engine::api::{self, ApiState};
use vhost_engine::config::{load_config, EngineConfig};
use vhost_engine::domain::{
    Fqdn, HttpStatus, Mapping, MappingPath, MappingTarget, MatchPattern, ServiceName, TargetUrl,
    VhostKind, VirtualHost,
};
use vhost_engine::domain::mapping::DEFAULT_REDIRECT_STATUS;
use vhost_engine::observability::{logging, metrics};
use vhost_engine::VirtualHostManager;

#[derive(Parser)]
#[command(name = "vhostctl")]
#[command(about = "Virtual host and mapping configuration engine", long_about = None)]
struct Cli {
    /// Engine configuration file (TOML). Built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the admin API
    Serve,
    /// Add a primary host, or an alias with --parent
    Add {
        hostname: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Delete a primary host, or an alias with --parent
    Delete {
        hostname: String,
        #[arg(long)]
        parent: Option<String>,
    },
    /// Append a path mapping to a host
    AddMapping {
        hostname: String,
        path: String,
        #[arg(long = "match", value_enum, default_value_t = MatchArg::BeginsWith)]
        match_pattern: MatchArg,
        /// Proxy to a local service
        #[arg(long, conflicts_with_all = ["url", "code"])]
        service: Option<String>,
        /// Redirect to a URL
        #[arg(long)]
        url: Option<String>,
        /// Status code (redirect status with --url, fixed response otherwise)
        #[arg(long)]
        code: Option<u16>,
    },
    /// List virtual hosts found on disk
    List,
    /// List registered services
    Services,
}

#[derive(Clone, Copy, ValueEnum)]
enum MatchArg {
    BeginsWith,
    Contains,
    EndsWith,
    Equals,
}

impl From<MatchArg> for MatchPattern {
    fn from(arg: MatchArg) -> Self {
        match arg {
            MatchArg::BeginsWith => MatchPattern::BeginsWith,
            MatchArg::Contains => MatchPattern::Contains,
            MatchArg::EndsWith => MatchPattern::EndsWith,
            MatchArg::Equals => MatchPattern::Equals,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    logging::init_logging(&config.observability);

    let manager = Arc::new(VirtualHostManager::from_config(&config)?);

    match cli.command {
        Commands::Serve => serve(&config, manager).await?,
        Commands::Add { hostname, parent } => {
            manager.add(&virtual_host(&hostname, parent.as_deref())?).await?;
        }
        Commands::Delete { hostname, parent } => {
            manager.delete(&virtual_host(&hostname, parent.as_deref())?).await?;
        }
        Commands::AddMapping {
            hostname,
            path,
            match_pattern,
            service,
            url,
            code,
        } => {
            let target = match (service, url, code) {
                (Some(name), None, None) => MappingTarget::Service(ServiceName::new(name)?),
                (None, Some(url), code) => MappingTarget::Url {
                    url: TargetUrl::new(url)?,
                    response_code: HttpStatus::new(code.unwrap_or(DEFAULT_REDIRECT_STATUS))?,
                },
                (None, None, Some(code)) => MappingTarget::ResponseCode(HttpStatus::new(code)?),
                _ => return Err("one of --service, --url or --code is required".into()),
            };
            let mapping = Mapping::new(
                Fqdn::new(&hostname)?,
                MappingPath::new(path)?,
                match_pattern.into(),
                target,
            );
            manager.add_mapping(&mapping).await?;
        }
        Commands::List => {
            let vhosts = manager.list().await?;
            println!("{}", serde_json::to_string_pretty(&vhosts)?);
        }
        Commands::Services => {
            let services = manager.services().get()?;
            println!("{}", serde_json::to_string_pretty(&services)?);
        }
    }

    Ok(())
}

fn virtual_host(hostname: &str, parent: Option<&str>) -> Result<VirtualHost, vhost_engine::EngineError> {
    let hostname = Fqdn::new(hostname)?;
    match parent {
        Some(parent) => VirtualHost::new(hostname, VhostKind::Alias, Some(Fqdn::new(parent)?)),
        None => Ok(VirtualHost::primary(hostname)),
    }
}

async fn serve(
    config: &EngineConfig,
    manager: Arc<VirtualHostManager>,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    if !config.admin.enabled {
        tracing::warn!("Admin API disabled; set admin.enabled = true to serve");
        return Ok(());
    }

    let listener = TcpListener::bind(&config.admin.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    let app = api::router(
        ApiState::new(manager, config.admin.api_key.as_str()),
        Duration::from_secs(config.admin.request_timeout_secs),
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(api::shutdown_signal())
        .await?;

    tracing::info!("Admin API stopped");
    Ok(())
}
