//! Coalescing of viewport resize bursts

use crate::types::Viewport;
use std::time::Duration;
use tokio::sync::mpsc;

/// Sending half handed to whatever observes the viewport
pub type ResizeSender = mpsc::Sender<Viewport>;

/// Yields one viewport per burst of resize events, once the viewport has
/// stopped changing for the quiet period
pub struct ResizeDebouncer {
    events: mpsc::Receiver<Viewport>,
    quiet: Duration,
}

impl ResizeDebouncer {
    pub fn channel(quiet: Duration) -> (ResizeSender, Self) {
        let (tx, rx) = mpsc::channel(64);
        (tx, Self { events: rx, quiet })
    }

    /// Wait for the next settled viewport. `None` once every sender is gone
    /// and nothing is pending.
    pub async fn next(&mut self) -> Option<Viewport> {
        let mut latest = self.events.recv().await?;
        loop {
            match tokio::time::timeout(self.quiet, self.events.recv()).await {
                Ok(Some(viewport)) => latest = viewport,
                Ok(None) | Err(_) => return Some(latest),
            }
        }
    }
}
