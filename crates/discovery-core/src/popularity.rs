//! Fire-and-forget popularity recording

use crate::ports::PopularityCounter;
use chrono::Duration;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Bump `member` under `key` and refresh the key's rolling expiry.
///
/// Runs detached from the caller; failures are logged and swallowed. The
/// handle is only useful to tests that need to observe the write.
pub fn record_in_background(
    counter: Arc<dyn PopularityCounter>,
    key: String,
    member: String,
    ttl: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = counter.increment(&key, &member).await {
            tracing::warn!(key = %key, member = %member, error = %e, "popularity increment failed");
            return;
        }
        if let Err(e) = counter.expire_after(&key, ttl).await {
            tracing::warn!(key = %key, error = %e, "popularity expiry refresh failed");
        }
    })
}

/// Detached popularity writes that a short-lived caller can wait on before exit
#[derive(Debug, Default)]
pub struct PendingWrites {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl PendingWrites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().unwrap_or_else(|e| e.into_inner());
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait for every write pushed so far
    pub async fn drain(&self) {
        let handles = {
            let mut guard = self.handles.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "popularity task did not complete");
            }
        }
    }
}
