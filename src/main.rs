//! PG MCP Server - Main entry point.
//!
//! Serves safe, paginated SQL query and catalog tools for one PostgreSQL
//! (or SQLite) database over MCP.

use clap::Parser;
use pg_mcp_server::config::{Config, TransportMode};
use pg_mcp_server::db::ConnectionHandle;
use pg_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries the stdio protocol stream.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_tracing(&config);

    if let Err(message) = config.validate() {
        error!(error = %message, "Invalid configuration");
        return Err(message.into());
    }

    info!(
        transport = %config.transport,
        read_only = config.read_only,
        "Starting PG MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let settings = config.connection_settings()?;
    let connection = Arc::new(ConnectionHandle::connect(&settings).await?);
    let policy = config.query_policy();

    let result = match config.transport {
        TransportMode::Stdio => {
            let transport = StdioTransport::new(connection, policy);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                connection,
                policy,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
