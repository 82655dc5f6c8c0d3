//! Collaborative whiteboard server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin rakugaki-server
//! cargo run --bin rakugaki-server -- --host 0.0.0.0 --port 4000 --database-url sqlite://rakugaki.db
//! ```

use clap::Parser;
use rakugaki_server::{config::ServerConfig, ui::Server};
use rakugaki_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(
        &[env!("CARGO_PKG_NAME"), "tower_http"],
        &config.log_level,
    );

    let server = match Server::from_config(&config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run(config.host.clone(), config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
