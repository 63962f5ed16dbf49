use anyhow::Result;
use tokio::signal;

/// Resolve once Ctrl+C or SIGTERM arrives; handler install failures are
/// logged and treated as a shutdown request.
pub async fn wait_for_shutdown() {
    let result = tokio::select! {
        result = wait_ctrl_c() => result,
        result = wait_sigterm() => result,
    };
    if let Err(e) = result {
        tracing::error!(error = %e, "signal handling failed, shutting down");
    }
    tracing::info!("Shutdown signal received, draining connections");
}

async fn wait_ctrl_c() -> Result<()> {
    signal::ctrl_c().await?;
    tracing::info!("Received Ctrl+C signal");
    Ok(())
}

#[cfg(unix)]
async fn wait_sigterm() -> Result<()> {
    let mut handler = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    handler.recv().await;
    tracing::info!("Received SIGTERM signal");
    Ok(())
}

#[cfg(not(unix))]
async fn wait_sigterm() -> Result<()> {
    std::future::pending::<Result<()>>().await
}
