use {std::time::Duration, tokio::signal, tokio_util::sync::CancellationToken};

/// Resolves once Ctrl+C or SIGTERM is received, or `token` is cancelled.
/// Cancels `token` before returning so background tasks stop too.
///
/// If a signal handler cannot be installed a warning is logged and that
/// signal is ignored.
pub(crate) async fn shutdown_signal(timeout: Duration, token: CancellationToken) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::debug!("Ctrl+C signal received"),
            Err(err) => {
                tracing::warn!("Failed to install Ctrl+C handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal_handler) => {
                signal_handler.recv().await;
                tracing::debug!("SIGTERM signal received");
            }
            Err(err) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => tracing::debug!("Shutdown requested through cancellation token"),
    }

    tracing::info!(
        "Shutdown signal received, starting graceful shutdown (timeout: {}s)",
        timeout.as_secs()
    );
    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_token_resolves_signal() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(
            Duration::from_secs(1),
            shutdown_signal(Duration::from_secs(1), token.clone()),
        )
        .await
        .unwrap();
        assert!(token.is_cancelled());
    }
}
