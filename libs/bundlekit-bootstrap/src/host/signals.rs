use std::future::Future;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Wait until the process is asked to stop and return the name of the signal.
///
/// # Errors
/// Returns an error if a signal handler cannot be installed.
pub async fn wait_for_shutdown() -> Result<&'static str> {
    #[cfg(unix)]
    let terminate = {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?;
        async move {
            sigterm.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let name = tokio::select! {
        res = signal::ctrl_c() => {
            res.context("failed to listen for Ctrl+C")?;
            "SIGINT"
        }
        () = terminate => "SIGTERM",
    };

    tracing::info!(signal = name, "shutdown signal received");
    Ok(name)
}

/// Root cancellation token for the host, cancelled on the first shutdown signal.
///
/// Must be called from inside a tokio runtime.
#[must_use]
pub fn shutdown_token() -> CancellationToken {
    cancel_on(wait_for_shutdown())
}

/// Spawn `trigger` and cancel the returned token once it resolves.
/// A failed trigger is logged and cancels too.
fn cancel_on<F>(trigger: F) -> CancellationToken
where
    F: Future<Output = Result<&'static str>> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        if let Err(e) = trigger.await {
            tracing::error!(
                error = %format!("{e:#}"),
                "signal handling failed, stopping host"
            );
        }
        cancel.cancel();
    });
    token
}
