use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;
use tracing::debug;
use wl_core::{ids::SessionId, ports::TimerPort};

/// Tokio-backed pairing expiry timer.
///
/// When a timer fires, the session id is delivered over the channel handed
/// to `new`, so the owning command loop processes the timeout in the same
/// serialized queue as every other mutation.
pub struct ExpiryTimer {
    timers: Arc<Mutex<HashMap<SessionId, tokio::task::AbortHandle>>>,
    expired_tx: mpsc::Sender<SessionId>,
}

impl ExpiryTimer {
    pub fn new(expired_tx: mpsc::Sender<SessionId>) -> Self {
        Self {
            timers: Arc::new(Mutex::new(HashMap::new())),
            expired_tx,
        }
    }
}

#[async_trait::async_trait]
impl TimerPort for ExpiryTimer {
    async fn start(&mut self, session_id: &SessionId, ttl: Duration) -> anyhow::Result<()> {
        let timers = Arc::clone(&self.timers);
        let expired_tx = self.expired_tx.clone();
        let session_id_clone = session_id.clone();

        let mut timers_guard = self.timers.lock().await;
        if let Some(existing) = timers_guard.remove(session_id) {
            existing.abort();
        }

        let handle = tokio::spawn(async move {
            sleep(ttl).await;
            timers.lock().await.remove(&session_id_clone);
            // Receiver gone means the command loop shut down first
            let _ = expired_tx.send(session_id_clone).await;
        });

        timers_guard.insert(session_id.clone(), handle.abort_handle());
        debug!(session_id = %session_id, ttl_ms = ttl.as_millis() as u64, "expiry timer started");
        Ok(())
    }

    async fn stop(&mut self, session_id: &SessionId) -> anyhow::Result<()> {
        let mut timers_guard = self.timers.lock().await;
        if let Some(handle) = timers_guard.remove(session_id) {
            handle.abort();
            debug!(session_id = %session_id, "expiry timer stopped");
        }
        Ok(())
    }
}
