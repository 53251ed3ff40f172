mod commands;
pub mod types;

pub use commands::ServeCommand;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "edge-cache",
    version = env!("CARGO_PKG_VERSION"),
    about = "CDN edge simulator: caches static assets from an origin and proxies API calls",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Serve(ServeCommand),
}

impl Cli {
    pub async fn execute(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match &self.command {
            Commands::Serve(command) => command.execute().await,
        }
    }
}
