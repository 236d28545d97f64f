//! `serve` command

use std::sync::Arc;

use clap::Args;
use tracing::info;

use crate::app::options::AppOptions;
use crate::errors::DeployError;
use crate::server::serve::serve;
use crate::server::state::ServerState;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on, overrides the settings file
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,
}

/// Run the REST facade until interrupted
pub async fn run(args: &ServeArgs, options: AppOptions) -> Result<(), DeployError> {
    let options = options.with_server_port(args.port);
    let state = Arc::new(ServerState::new(options.orchestrator()?));

    serve(&options.server, state, await_shutdown_signal()).await
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, shutting down...");
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Ctrl+C received, shutting down...");
                    }
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
