use tracing::{info, warn};

/// Completes when the process is asked to stop: SIGINT, SIGTERM or SIGHUP on
/// unix, Ctrl-C elsewhere. If no handler can be installed it never completes.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{signal, Signal, SignalKind};

    async fn recv(stream: Option<&mut Signal>) {
        match stream {
            Some(stream) => {
                stream.recv().await;
            }
            None => std::future::pending().await,
        }
    }

    let install = |name: &str, kind: SignalKind| match signal(kind) {
        Ok(stream) => Some(stream),
        Err(e) => {
            warn!(signal = name, error = %e, "failed to install signal handler");
            None
        }
    };

    let mut sigint = install("SIGINT", SignalKind::interrupt());
    let mut sigterm = install("SIGTERM", SignalKind::terminate());
    let mut sighup = install("SIGHUP", SignalKind::hangup());

    tokio::select! {
        _ = recv(sigint.as_mut()) => info!("received SIGINT"),
        _ = recv(sigterm.as_mut()) => info!("received SIGTERM"),
        _ = recv(sighup.as_mut()) => info!("received SIGHUP"),
    }
}

#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl-C"),
        Err(e) => {
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await
        }
    }
}
