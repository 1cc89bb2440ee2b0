//! Server command implementation

use std::path::Path;

use anyhow::Result;
use pennywise_server::ServerConfig;

use super::load_config;

pub async fn cmd_serve(
    config_path: Option<&Path>,
    host: &str,
    port: u16,
    allowed_origins: Vec<String>,
) -> Result<()> {
    let (analysis, source) = load_config(config_path)?;

    println!("🚀 Starting Pennywise web server...");
    println!("   Config: {}", source);
    println!("   Listening: http://{}:{}", host, port);
    if allowed_origins.is_empty() {
        println!("   CORS: any origin");
    } else {
        println!("   CORS: {}", allowed_origins.join(", "));
    }
    println!();

    let config = ServerConfig { allowed_origins };
    pennywise_server::serve_with_config(analysis, host, port, config).await
}
