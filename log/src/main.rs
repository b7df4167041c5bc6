//! Commit Log HTTP Server binary entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commitlog::CommitLog;
use commitlog::server::{CliArgs, LogServer, LogServerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let log_config = args.to_log_config();
    let server_config = LogServerConfig::from(&args);

    tracing::info!("Opening log with config: {:?}", log_config);

    let log = match CommitLog::open(log_config).await {
        Ok(log) => log,
        Err(err) => {
            tracing::error!(error = %err, "failed to open log");
            return ExitCode::FAILURE;
        }
    };

    let server = LogServer::new(Arc::new(log), server_config);
    if let Err(err) = server.run().await {
        tracing::error!(error = %err, "server failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
