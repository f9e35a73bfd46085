//! Lossy, non-blocking progress delivery

use tokio::sync::mpsc;
use tracing::debug;

use crate::app::processor::ProcessingUpdate;

/// Producer half of the progress channel
///
/// `emit` never waits: when the consumer falls behind, updates are dropped.
/// Progress is display data only, so nothing downstream depends on every
/// update arriving.
#[derive(Debug, Clone, Default)]
pub struct ProgressSender {
    tx: Option<mpsc::Sender<ProcessingUpdate>>,
}

impl ProgressSender {
    /// Wrap an existing channel
    pub fn new(tx: mpsc::Sender<ProcessingUpdate>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A sender that discards everything
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Create a bounded channel and its sender
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProcessingUpdate>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Send without blocking, dropping the update if the channel is full
    pub fn emit(&self, update: ProcessingUpdate) {
        let Some(tx) = &self.tx else {
            return;
        };
        if let Err(e) = tx.try_send(update) {
            match e {
                mpsc::error::TrySendError::Full(update) => {
                    debug!("Progress channel full, skipping update for {}", update.region);
                }
                mpsc::error::TrySendError::Closed(_) => {
                    debug!("Progress channel closed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(n: usize) -> ProcessingUpdate {
        ProcessingUpdate::for_batch(format!("r{}", n), n, 10, "status")
    }

    #[test]
    fn test_full_channel_drops_instead_of_blocking() {
        let (sender, mut rx) = ProgressSender::channel(2);
        for n in 0..5 {
            sender.emit(update(n));
        }

        assert_eq!(rx.try_recv().unwrap().region, "r0");
        assert_eq!(rx.try_recv().unwrap().region, "r1");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_and_disabled_are_silent() {
        let (sender, rx) = ProgressSender::channel(2);
        drop(rx);
        sender.emit(update(1));

        ProgressSender::disabled().emit(update(2));
    }
}
