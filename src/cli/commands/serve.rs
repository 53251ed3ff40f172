use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::task::JoinError;

use crate::{
    admin::start_admin_server,
    cli::types::{LogFormat, LogLevel},
    config::EdgeConfig,
    logging::{LogConfig, configure_global_tracing},
    proxy::CacheService,
    server::{bind_address, start_edge_server},
};

#[derive(Parser, Debug)]
#[command(about = "Start the edge caching server")]
pub struct ServeCommand {
    #[arg(
        short = 'H',
        long,
        default_value = "127.0.0.1",
        help = "IP address to bind the edge server"
    )]
    pub host: String,

    #[arg(
        short = 'p',
        long,
        env = "PORT",
        default_value = "9000",
        help = "Port number to bind the edge server"
    )]
    pub port: u16,

    #[arg(
        long,
        env = "ORIGIN_SERVER",
        default_value = "http://localhost:8080",
        help = "Base URL of the origin server fetched on cache misses"
    )]
    pub origin: String,

    #[arg(
        long,
        env = "API_SERVER",
        default_value = "http://localhost:3000",
        help = "Base URL of the backend API (requests under /api/ are proxied uncached)"
    )]
    pub api: String,

    #[arg(
        long,
        env = "CACHE_TTL_SECS",
        default_value = "3600",
        help = "Seconds a cached asset stays fresh"
    )]
    pub ttl_secs: u64,

    #[arg(
        long,
        default_value = "30",
        help = "Deadline in seconds for each origin/API call (0 disables it)"
    )]
    pub fetch_timeout_secs: u64,

    #[arg(long, help = "Port for the separate admin interface (disabled if not set)")]
    pub admin_port: Option<u16>,

    #[arg(
        short,
        long,
        default_value = "info",
        value_enum,
        help = "Logging level"
    )]
    pub log_level: LogLevel,

    #[arg(long, help = "Path to log file (if not specified, logs go to stdout)")]
    pub log_file: Option<String>,

    #[arg(long, default_value = "pretty", value_enum, help = "Log output format")]
    pub log_format: LogFormat,

    #[arg(
        long,
        help = "Maximum number of log files to retain (only applies if log_file is set)"
    )]
    pub log_max_files: Option<usize>,
}

impl ServeCommand {
    pub async fn execute(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.admin_port == Some(self.port) {
            return Err("Admin port cannot be the same as the edge server port".into());
        }

        let log_config = LogConfig {
            level: self.log_level,
            format: self.log_format,
            file_path: self.log_file.clone(),
            max_log_files: self.log_max_files,
        };

        let _log_guard = configure_global_tracing(log_config)?;

        let config = EdgeConfig::from_cli(self)?;
        let edge_addr = bind_address(&self.host, self.port)?;
        let admin_addr = self
            .admin_port
            .map(|port| bind_address(&self.host, port))
            .transpose()?;

        self.print_banner(&config);

        let service = Arc::new(CacheService::from_config(config)?);

        run_servers(edge_addr, admin_addr, service).await
    }

    fn print_banner(&self, config: &EdgeConfig) {
        println!();
        println!("╔═══════════════════════════════════════════════╗");
        println!(
            "║        CDN Edge Cache Server v{:<16}║",
            env!("CARGO_PKG_VERSION")
        );
        println!("╚═══════════════════════════════════════════════╝");
        println!();
        println!("Configuration:");
        println!("  → Listen: {}:{}", self.host, self.port);
        println!("  → Origin: {}", config.origin_url);
        println!("  → API: {}", config.api_url);
        println!("  → TTL: {}s", config.ttl_secs);
        println!("  → Upstream timeout: {}s", config.fetch_timeout_secs);
        println!("  → Log Level: {:?}", self.log_level);
        println!("  → Log Format: {:?}", self.log_format);

        if let Some(ref file) = self.log_file {
            println!("  → Log File: {}", file);
        }

        match self.admin_port {
            Some(port) => println!("  → Admin: {}:{}", self.host, port),
            None => println!("  → Admin: ✗ Disabled"),
        }
        println!();
        println!("Static assets will be cached, API requests will be proxied.");
        println!();
    }
}

type ServerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Runs the edge listener and, when configured, the admin listener until the
/// first of them stops. A bind failure or panic in either is returned.
async fn run_servers(
    edge_addr: SocketAddr,
    admin_addr: Option<SocketAddr>,
    service: Arc<CacheService>,
) -> ServerResult {
    let edge_handle = tokio::spawn(start_edge_server(edge_addr, Arc::clone(&service)));

    match admin_addr {
        Some(admin_addr) => {
            let admin_handle = tokio::spawn(start_admin_server(admin_addr, service));

            tokio::select! {
                result = edge_handle => report_exit("Edge", result),
                result = admin_handle => report_exit("Admin", result),
            }
        }
        None => report_exit("Edge", edge_handle.await),
    }
}

fn report_exit(name: &str, result: Result<ServerResult, JoinError>) -> ServerResult {
    match result {
        Ok(Ok(())) => {
            tracing::info!("{} server stopped", name);
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!("{} server failed: {}", name, e);
            Err(e)
        }
        Err(e) => {
            tracing::error!("{} server panicked: {:?}", name, e);
            Err(e.into())
        }
    }
}
