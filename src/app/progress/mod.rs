//! Progress plumbing between the batch and its observers
//!
//! The batch runs as one background task and reports through a bounded,
//! lossy channel. Observers (the interactive UI or the CLI progress bars)
//! fold updates into a [`ProgressAggregator`] at their own pace.

pub mod aggregator;
pub mod bridge;
pub mod sender;

pub use aggregator::ProgressAggregator;
pub use bridge::{BatchLauncher, ProgressBridge};
pub use sender::ProgressSender;
