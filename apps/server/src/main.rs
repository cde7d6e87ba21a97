//! filestat daemon entry point.

mod config;

use std::sync::Arc;

use filestat_server::{FileServer, ServerConfig};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting filestat daemon"
    );

    // Load configuration.
    let config = config::Config::load()?;
    tracing::info!(port = config.port, "configuration loaded");

    // Build and run the tokio runtime.
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config))?;

    tracing::info!("daemon shut down cleanly");
    Ok(())
}

async fn run(config: config::Config) -> anyhow::Result<()> {
    let server = FileServer::new(ServerConfig {
        port: config.port,
        save_dir: config::expand_home(&config.save_dir),
        result_log_path: config::expand_home(&config.result_log),
    });

    let server_run = Arc::clone(&server);
    let mut run_handle = tokio::spawn(async move { server_run.run().await });

    // Wait for the server to bind; a bind failure is fatal.
    let port = loop {
        if run_handle.is_finished() {
            match run_handle.await? {
                Ok(()) => anyhow::bail!("server exited before binding"),
                Err(e) => return Err(e.into()),
            }
        }
        let p = server.port().await;
        if p > 0 {
            break p;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    };

    tracing::info!(port, "listening for uploads");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("SIGINT received, shutting down");
            server.shutdown();
        }
        result = &mut run_handle => {
            result??;
            anyhow::bail!("server exited unexpectedly");
        }
    }

    // The accept loop stops between iterations; in-flight uploads finish
    // on their own.
    let _ = run_handle.await;
    Ok(())
}
