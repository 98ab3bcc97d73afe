use std::time::Duration;

use crate::ids::SessionId;

/// Expiry timer for pairing sessions. Implementations deliver the timeout
/// back to the owning command loop; they never touch registry state.
#[async_trait::async_trait]
pub trait TimerPort: Send {
    async fn start(&mut self, session_id: &SessionId, ttl: Duration) -> anyhow::Result<()>;
    async fn stop(&mut self, session_id: &SessionId) -> anyhow::Result<()>;
}
