pub mod server;

pub use server::{serve_edge, start_edge_server};

use std::net::{IpAddr, SocketAddr};

/// Parses `host` as a literal IP. Hostnames are not resolved.
pub fn bind_address(
    host: &str,
    port: u16,
) -> Result<SocketAddr, Box<dyn std::error::Error + Send + Sync>> {
    let ip: IpAddr = host
        .parse()
        .map_err(|e| format!("Invalid bind host '{}': {}", host, e))?;

    Ok(SocketAddr::new(ip, port))
}
