pub mod git;
pub mod pipeline;

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// One step in a clone's lifecycle. `Fetch` and `Checkout` carry 0-100
/// percentages; the stream ends with exactly one `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneEvent {
    Fetch(u8),
    Checkout(u8),
    Done,
    Error(String),
}

/// A clone/checkout engine consumed as a stream of [`CloneEvent`]s.
///
/// Implementations run the actual clone off the caller's task and report
/// through the returned receiver. Dropping the receiver abandons the
/// events, not the clone itself.
#[async_trait]
pub trait CloneEngine: Send + Sync {
    async fn clone_into(&self, url: &str, dest: &Path) -> mpsc::UnboundedReceiver<CloneEvent>;
}
