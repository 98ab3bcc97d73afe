use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use wl_app::{RegistryHandle, RegistryService, ShellEvent, ShellEventPort};
use wl_core::ids::SessionId;
use wl_core::pairing::PairingMethod;
use wl_core::ports::ClockPort;
use wl_core::registry::RegistrySnapshot;
use wl_core::settings::Settings;
use wl_infra::ExpiryTimer;

/// Deterministic clock for driving registry time from tests.
#[derive(Default)]
pub struct FakeClock(AtomicI64);

impl FakeClock {
    pub fn advance_ms(&self, ms: i64) {
        self.0.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn now_ms(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl ClockPort for FakeClock {
    fn now_ms(&self) -> i64 {
        FakeClock::now_ms(self)
    }
}

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub async fn start_service() -> (Arc<FakeClock>, RegistryHandle, mpsc::Receiver<ShellEvent>) {
    init_tracing();
    let clock = Arc::new(FakeClock::default());
    let (expired_tx, expired_rx) = mpsc::channel(16);
    let timer = ExpiryTimer::new(expired_tx);
    let handle = RegistryService::start(
        Settings::default(),
        clock.clone(),
        Box::new(timer),
        expired_rx,
    );
    let events = handle.subscribe().await.expect("subscribe to shell events");
    (clock, handle, events)
}

pub async fn next_event(events: &mut mpsc::Receiver<ShellEvent>) -> ShellEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for shell event")
        .expect("shell event stream closed")
}

pub async fn expect_snapshot(events: &mut mpsc::Receiver<ShellEvent>) -> RegistrySnapshot {
    match next_event(events).await {
        ShellEvent::SnapshotChanged { snapshot } => snapshot,
        other => panic!("expected snapshot event, got {other:?}"),
    }
}

pub async fn expect_prompt(
    events: &mut mpsc::Receiver<ShellEvent>,
) -> (SessionId, PairingMethod, String) {
    match next_event(events).await {
        ShellEvent::PairingPrompt {
            session_id,
            method,
            secret,
        } => (session_id, method, secret),
        other => panic!("expected pairing prompt, got {other:?}"),
    }
}

pub async fn expect_rejection(events: &mut mpsc::Receiver<ShellEvent>) -> String {
    match next_event(events).await {
        ShellEvent::CommandRejected { reason } => reason,
        other => panic!("expected rejection event, got {other:?}"),
    }
}
