use std::path::PathBuf;

use clap::Parser;

/// Carrot chat server
#[derive(Debug, Parser)]
#[command(name = "carrot", about = "Streaming chat server with MCP tool calling")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "carrot.toml", env = "CARROT_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "CARROT_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, default_value = "info", env = "CARROT_LOG")]
    pub log: String,
}
