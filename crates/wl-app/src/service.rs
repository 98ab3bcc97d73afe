//! Registry command loop
//!
//! All registry mutations funnel through one `tokio::select!` loop, so no
//! two commands interleave mid-mutation and session expiry is injected into
//! the same serialized queue as user commands.
//!
//! ```text
//! Host shell / discovery collaborator
//!   ↓ RegistryHandle (commands, completion callbacks, snapshot queries)
//! RegistryService (single command loop)
//!   ↓ DeviceRegistry (pure, synchronous mutations)
//!   ↓ ShellEvent stream (snapshots, prompts, notices)
//! Host shell re-projects and re-renders
//! ```

use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use wl_core::ids::SessionId;
use wl_core::pairing::{PairingResult, SessionState};
use wl_core::ports::{ClockPort, TimerPort};
use wl_core::registry::{Command, DeviceRegistry, RegistryError, RegistrySnapshot};
use wl_core::settings::Settings;

use crate::event::{ShellEvent, ShellEventPort};

enum ServiceMsg {
    Dispatch(Command),
    CompletePairing {
        session_id: SessionId,
        result: PairingResult,
    },
    GetSnapshot {
        reply: oneshot::Sender<RegistrySnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<mpsc::Receiver<ShellEvent>>,
    },
}

#[derive(Debug, Error)]
pub enum HandleError {
    #[error("registry service stopped")]
    ServiceStopped,
}

/// Cloneable endpoint for the host shell and the discovery collaborator.
#[derive(Clone)]
pub struct RegistryHandle {
    msg_tx: mpsc::Sender<ServiceMsg>,
}

impl RegistryHandle {
    pub async fn dispatch(&self, command: Command) -> Result<(), HandleError> {
        self.msg_tx
            .send(ServiceMsg::Dispatch(command))
            .await
            .map_err(|_| HandleError::ServiceStopped)
    }

    /// Parse and dispatch a command arriving over the host shell's JSON
    /// message channel.
    pub async fn dispatch_json(&self, raw: &str) -> anyhow::Result<()> {
        let command: Command = serde_json::from_str(raw).context("malformed shell command")?;
        Ok(self.dispatch(command).await?)
    }

    /// Pull-on-demand snapshot query.
    pub async fn get_snapshot(&self) -> Result<RegistrySnapshot, HandleError> {
        let (reply, rx) = oneshot::channel();
        self.msg_tx
            .send(ServiceMsg::GetSnapshot { reply })
            .await
            .map_err(|_| HandleError::ServiceStopped)?;
        rx.await.map_err(|_| HandleError::ServiceStopped)
    }

    /// Completion callback for the discovery collaborator.
    pub async fn complete_pairing(
        &self,
        session_id: SessionId,
        result: PairingResult,
    ) -> Result<(), HandleError> {
        self.msg_tx
            .send(ServiceMsg::CompletePairing { session_id, result })
            .await
            .map_err(|_| HandleError::ServiceStopped)
    }
}

#[async_trait]
impl ShellEventPort for RegistryHandle {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<ShellEvent>> {
        let (reply, rx) = oneshot::channel();
        self.msg_tx
            .send(ServiceMsg::Subscribe { reply })
            .await
            .map_err(|_| anyhow!("registry service stopped"))?;
        rx.await.map_err(|_| anyhow!("registry service stopped"))
    }
}

/// Owns the registry and serializes every mutation.
pub struct RegistryService {
    registry: DeviceRegistry,
    settings: Settings,
    clock: Arc<dyn ClockPort>,
    timer: Box<dyn TimerPort>,
    msg_rx: mpsc::Receiver<ServiceMsg>,
    expired_rx: mpsc::Receiver<SessionId>,
    subscribers: Vec<mpsc::Sender<ShellEvent>>,
}

impl RegistryService {
    /// Build a service wired to the given ports. `expired_rx` is the
    /// delivery side of the expiry timer so timeouts join the queue.
    pub fn new(
        settings: Settings,
        clock: Arc<dyn ClockPort>,
        timer: Box<dyn TimerPort>,
        expired_rx: mpsc::Receiver<SessionId>,
    ) -> (Self, RegistryHandle) {
        let (msg_tx, msg_rx) = mpsc::channel(64);
        let service = Self {
            registry: DeviceRegistry::new(&settings.pairing),
            settings,
            clock,
            timer,
            msg_rx,
            expired_rx,
            subscribers: Vec::new(),
        };
        (service, RegistryHandle { msg_tx })
    }

    /// Convenience: build and spawn onto the current tokio runtime.
    pub fn start(
        settings: Settings,
        clock: Arc<dyn ClockPort>,
        timer: Box<dyn TimerPort>,
        expired_rx: mpsc::Receiver<SessionId>,
    ) -> RegistryHandle {
        let (service, handle) = Self::new(settings, clock, timer, expired_rx);
        tokio::spawn(service.run());
        handle
    }

    /// Run until every handle is dropped.
    ///
    /// The expiry channel cannot close while the service runs (the timer
    /// holding its sender lives in `self`), so the select below never
    /// spins on a dead branch.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                msg = self.msg_rx.recv() => match msg {
                    Some(msg) => self.handle_msg(msg).await,
                    None => break,
                },
                Some(session_id) = self.expired_rx.recv() => {
                    self.handle_expiry(session_id).await;
                }
            }
        }
        debug!("registry service stopped");
    }

    async fn handle_msg(&mut self, msg: ServiceMsg) {
        match msg {
            ServiceMsg::Dispatch(command) => self.apply_command(command).await,
            ServiceMsg::CompletePairing { session_id, result } => {
                let now = self.clock.now();
                match self.registry.complete_pairing(&session_id, result, now) {
                    Ok(device) => {
                        let state = if device.is_some() {
                            SessionState::Succeeded
                        } else {
                            SessionState::Failed
                        };
                        self.stop_timer(&session_id).await;
                        self.emit(ShellEvent::PairingResolved { session_id, state });
                        self.emit_snapshot();
                    }
                    Err(err) => self.reject(err),
                }
            }
            ServiceMsg::GetSnapshot { reply } => {
                let _ = reply.send(self.registry.snapshot(self.clock.now()));
            }
            ServiceMsg::Subscribe { reply } => {
                let (tx, rx) = mpsc::channel(32);
                self.subscribers.push(tx);
                let _ = reply.send(rx);
            }
        }
    }

    async fn apply_command(&mut self, command: Command) {
        let now = self.clock.now();
        match command {
            Command::Rename { id, new_name } => match self.registry.rename(&id, &new_name) {
                Ok(_) => self.emit_snapshot(),
                Err(err) => self.reject(err),
            },
            Command::CopyId { id } => {
                if self.registry.device(&id).is_some() {
                    self.emit(ShellEvent::CopyDeviceId { id });
                } else {
                    self.reject(RegistryError::NotFound);
                }
            }
            Command::Disconnect { id } => match self.registry.disconnect(&id) {
                Ok(()) => self.emit_snapshot(),
                Err(err) => self.reject(err),
            },
            Command::BeginPairing {
                method,
                target_hint,
            } => {
                let begun = self
                    .registry
                    .begin_pairing(method, &target_hint, now)
                    .map(|session| session.id.clone());
                match begun {
                    Ok(session_id) => {
                        // Hand the challenge straight to the shell; the pair
                        // panel is already open when this command arrives.
                        match self.registry.present_challenge(&session_id, now) {
                            Ok(presentation) => {
                                let ttl = self.settings.pairing.session_ttl;
                                if let Err(err) = self.timer.start(&session_id, ttl).await {
                                    warn!(session_id = %session_id, error = %err, "failed to arm expiry timer");
                                }
                                self.emit(ShellEvent::PairingPrompt {
                                    session_id: presentation.session_id,
                                    method: presentation.method,
                                    secret: presentation.secret,
                                });
                                self.emit_snapshot();
                            }
                            Err(err) => self.reject(err),
                        }
                    }
                    Err(err) => self.reject(err),
                }
            }
            Command::ConfirmPairing { session_id } => {
                match self.registry.confirm_pairing(&session_id, now) {
                    Ok(()) => self.emit_snapshot(),
                    Err(err) => self.reject(err),
                }
            }
            Command::CancelPairing { session_id } => {
                match self.registry.cancel_pairing(&session_id, now) {
                    Ok(()) => {
                        self.stop_timer(&session_id).await;
                        self.emit(ShellEvent::PairingResolved {
                            session_id,
                            state: SessionState::Cancelled,
                        });
                        self.emit_snapshot();
                    }
                    Err(err) => self.reject(err),
                }
            }
            Command::MarkSeen { id, at } => {
                // Stale beacons change nothing; don't wake the shell for them.
                if self.registry.mark_seen(id, at) {
                    self.emit_snapshot();
                }
            }
        }
    }

    async fn handle_expiry(&mut self, _fired: SessionId) {
        let now = self.clock.now();
        let expired = self.registry.sweep_expired(now);
        if expired.is_empty() {
            return;
        }
        for session_id in expired {
            self.emit(ShellEvent::PairingResolved {
                session_id,
                state: SessionState::Expired,
            });
        }
        self.emit_snapshot();
    }

    async fn stop_timer(&mut self, session_id: &SessionId) {
        if let Err(err) = self.timer.stop(session_id).await {
            warn!(session_id = %session_id, error = %err, "failed to stop expiry timer");
        }
    }

    fn reject(&mut self, err: RegistryError) {
        warn!(error = %err, "command rejected");
        self.emit(ShellEvent::CommandRejected {
            reason: err.to_string(),
        });
    }

    fn emit_snapshot(&mut self) {
        let snapshot = self.registry.snapshot(self.clock.now());
        self.emit(ShellEvent::SnapshotChanged { snapshot });
    }

    fn emit(&mut self, event: ShellEvent) {
        self.subscribers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("shell event dropped: subscriber lagging");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }
}
