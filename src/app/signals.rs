//! Signal handling for batch cancellation
//!
//! Ctrl+C (and SIGTERM on unix) cancel the token handed in. Used by the
//! non-interactive `--process` mode; the interactive UI reads Ctrl+C as a key
//! event instead, because raw mode swallows the signal.

use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cancel `token` on the first Ctrl+C or SIGTERM
///
/// The returned task ends after the first signal or when `token` is
/// cancelled by someone else.
pub fn cancel_on_signal(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Ctrl+C received"),
                Err(e) => {
                    warn!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("SIGTERM received");
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Cancelling batch, no further regions will start");
                token.cancel();
            }
            _ = terminate => {
                info!("Cancelling batch, no further regions will start");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}
