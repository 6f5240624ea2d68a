//! Session manager with the tokio mpsc command/event pattern.
//!
//! The connection task owns the WebSocket exclusively. External code talks
//! to it through typed command and event channels; reconcilers never touch
//! the transport, only the decoded event stream downstream of this layer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use astral_shared::constants::{
    DEFAULT_WS_ENDPOINT, HEARTBEAT_INTERVAL, HEARTBEAT_TIMEOUT, LIVENESS_TOPIC,
    RECONNECT_BASE_DELAY, RECONNECT_MAX_DELAY,
};
use astral_shared::push::{ConnectFrame, SubscribeFrame};
use astral_shared::{Identity, IdentityProvider};

use crate::error::SessionError;
use crate::liveness::LivenessClock;
use crate::transport::{self, WsStream};

// ---------------------------------------------------------------------------
// Command / event types
// ---------------------------------------------------------------------------

/// Commands sent *into* the connection task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Send a raw text frame to the server.
    Send(String),
    /// Subscribe to an additional topic (re-applied after reconnects).
    Subscribe(String),
    /// Tear the connection down and stop the retry loop.
    Shutdown,
}

/// Events sent *from* the connection task to the application.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Transport is up and the connect/subscribe frames have been sent.
    Connected,
    /// Transport was lost; the session retries after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// The session reached `Disconnected` and will not retry.
    Disconnected,
    /// A raw data frame arrived. The session layer never interprets it.
    Frame(String),
}

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebSocket endpoint.
    pub endpoint: String,
    /// Outbound keep-alive interval.
    pub heartbeat_interval: Duration,
    /// Inbound silence window treated as a dead transport.
    pub heartbeat_timeout: Duration,
    /// Base reconnect delay; doubles per attempt.
    pub reconnect_base_delay: Duration,
    /// Backoff cap.
    pub reconnect_max_delay: Duration,
    /// Topics subscribed in addition to the user topic and liveness topic.
    pub extra_topics: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_WS_ENDPOINT.to_string(),
            heartbeat_interval: HEARTBEAT_INTERVAL,
            heartbeat_timeout: HEARTBEAT_TIMEOUT,
            reconnect_base_delay: RECONNECT_BASE_DELAY,
            reconnect_max_delay: RECONNECT_MAX_DELAY,
            extra_topics: Vec::new(),
        }
    }
}

/// Reconnect delay for the given attempt (1-based): capped exponential
/// backoff starting at the base delay.
pub fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    base.saturating_mul(2u32.saturating_pow(exponent)).min(max)
}

// ---------------------------------------------------------------------------
// Session manager
// ---------------------------------------------------------------------------

/// Owns the single persistent connection for one logged-in user.
///
/// Explicitly constructed and injected wherever it is needed, so tests can
/// run several independent sessions side by side.
pub struct SessionManager {
    config: SessionConfig,
    identity: Arc<dyn IdentityProvider>,
    state: Arc<Mutex<SessionState>>,
    /// Bumped on every connect/disconnect; an orphaned task whose
    /// generation no longer matches stops touching shared state.
    generation: Arc<AtomicU64>,
    cmd_tx: Mutex<Option<mpsc::Sender<SessionCommand>>>,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl SessionManager {
    /// Create the manager and the event stream consumed by the router.
    pub fn new(
        config: SessionConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::channel(256);
        let manager = Self {
            config,
            identity,
            state: Arc::new(Mutex::new(SessionState::Disconnected)),
            generation: Arc::new(AtomicU64::new(0)),
            cmd_tx: Mutex::new(None),
            event_tx,
        };
        (manager, event_rx)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
            .lock()
            .map(|state| *state)
            .unwrap_or(SessionState::Disconnected)
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Connected
    }

    /// Open the connection and start the retry loop.
    ///
    /// Fails fast with [`SessionError::AuthRequired`] when no identity is
    /// available; a no-op when the session is already running. Must be
    /// called from within a tokio runtime.
    pub fn connect(&self) -> Result<(), SessionError> {
        let identity = self
            .identity
            .identity()
            .ok_or(SessionError::AuthRequired)?;

        let mut cmd_slot = match self.cmd_tx.lock() {
            Ok(slot) => slot,
            Err(_) => return Ok(()),
        };
        if cmd_slot.is_some() && self.state() != SessionState::Disconnected {
            debug!("connect() ignored: session already running");
            return Ok(());
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut state) = self.state.lock() {
            *state = SessionState::Connecting;
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        *cmd_slot = Some(cmd_tx);

        let ctx = TaskCtx {
            generation,
            current: self.generation.clone(),
            state: self.state.clone(),
            event_tx: self.event_tx.clone(),
        };
        let config = self.config.clone();
        tokio::spawn(run_loop(ctx, config, identity, cmd_rx));
        Ok(())
    }

    /// Stop the session. Idempotent; synchronously marks the state
    /// `Disconnected` regardless of in-flight network activity.
    pub fn disconnect(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut state) = self.state.lock() {
            *state = SessionState::Disconnected;
        }
        if let Ok(mut cmd_slot) = self.cmd_tx.lock() {
            if let Some(cmd_tx) = cmd_slot.take() {
                let _ = cmd_tx.try_send(SessionCommand::Shutdown);
                // The orphaned task no longer emits; announce the terminal
                // state from here so observers always see it.
                let _ = self.event_tx.try_send(SessionEvent::Disconnected);
            }
        }
        info!("Session disconnected");
    }

    /// Subscribe to an additional topic on the live connection.
    pub fn subscribe(&self, topic: impl Into<String>) {
        if let Ok(cmd_slot) = self.cmd_tx.lock() {
            if let Some(cmd_tx) = cmd_slot.as_ref() {
                let _ = cmd_tx.try_send(SessionCommand::Subscribe(topic.into()));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Connection task
// ---------------------------------------------------------------------------

struct TaskCtx {
    generation: u64,
    current: Arc<AtomicU64>,
    state: Arc<Mutex<SessionState>>,
    event_tx: mpsc::Sender<SessionEvent>,
}

impl TaskCtx {
    fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    fn set_state(&self, next: SessionState) {
        if !self.is_current() {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            *state = next;
        }
    }

    async fn emit(&self, event: SessionEvent) {
        if self.is_current() {
            let _ = self.event_tx.send(event).await;
        }
    }
}

enum ConnEnd {
    Shutdown,
    Transport(SessionError),
}

async fn run_loop(
    ctx: TaskCtx,
    config: SessionConfig,
    identity: Identity,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
) {
    // Topic set survives reconnects so dynamic subscriptions are re-applied.
    let mut topics = vec![
        identity.user_id.notification_topic(),
        LIVENESS_TOPIC.to_string(),
    ];
    topics.extend(config.extra_topics.iter().cloned());

    let mut attempt: u32 = 0;

    'session: loop {
        if !ctx.is_current() {
            return;
        }
        ctx.set_state(SessionState::Connecting);

        match transport::open(&config.endpoint, &identity).await {
            Ok(stream) => {
                attempt = 0;
                info!(user = %identity.user_id, "Session connected");
                ctx.set_state(SessionState::Connected);
                ctx.emit(SessionEvent::Connected).await;

                match drive_connection(stream, &config, &identity, &mut topics, &mut cmd_rx, &ctx)
                    .await
                {
                    ConnEnd::Shutdown => break 'session,
                    ConnEnd::Transport(err) => {
                        warn!(error = %err, "Transport failed");
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "Connection attempt failed");
            }
        }

        if !ctx.is_current() {
            return;
        }

        attempt += 1;
        let delay = backoff_delay(
            config.reconnect_base_delay,
            config.reconnect_max_delay,
            attempt,
        );
        ctx.set_state(SessionState::Reconnecting);
        ctx.emit(SessionEvent::Reconnecting { attempt, delay }).await;

        let deadline = tokio::time::Instant::now() + delay;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                cmd = cmd_rx.recv() => match cmd {
                    Some(SessionCommand::Shutdown) | None => break 'session,
                    Some(SessionCommand::Subscribe(topic)) => topics.push(topic),
                    Some(SessionCommand::Send(_)) => {
                        debug!("Dropping outbound frame while disconnected");
                    }
                },
            }
        }
    }

    ctx.set_state(SessionState::Disconnected);
    ctx.emit(SessionEvent::Disconnected).await;
}

/// Announce the user and subscribe the topic set on a fresh transport.
async fn announce(
    stream: &mut WsStream,
    identity: &Identity,
    topics: &[String],
) -> Result<(), SessionError> {
    let connect = serde_json::to_string(&ConnectFrame::new(identity.user_id))?;
    stream.send(Message::Text(connect)).await?;

    for topic in topics {
        let frame = serde_json::to_string(&SubscribeFrame::new(topic.clone()))?;
        stream.send(Message::Text(frame)).await?;
        debug!(topic = %topic, "Subscribed");
    }
    Ok(())
}

async fn drive_connection(
    mut stream: WsStream,
    config: &SessionConfig,
    identity: &Identity,
    topics: &mut Vec<String>,
    cmd_rx: &mut mpsc::Receiver<SessionCommand>,
    ctx: &TaskCtx,
) -> ConnEnd {
    if let Err(err) = announce(&mut stream, identity, topics).await {
        return ConnEnd::Transport(err);
    }

    let mut liveness = LivenessClock::new(config.heartbeat_timeout);
    let mut heartbeat = tokio::time::interval(config.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(SessionCommand::Send(text)) => {
                    if let Err(err) = stream.send(Message::Text(text)).await {
                        return ConnEnd::Transport(err.into());
                    }
                }
                Some(SessionCommand::Subscribe(topic)) => {
                    topics.push(topic.clone());
                    let frame = match serde_json::to_string(&SubscribeFrame::new(topic)) {
                        Ok(frame) => frame,
                        Err(err) => return ConnEnd::Transport(err.into()),
                    };
                    if let Err(err) = stream.send(Message::Text(frame)).await {
                        return ConnEnd::Transport(err.into());
                    }
                }
                Some(SessionCommand::Shutdown) | None => {
                    let _ = stream.close(None).await;
                    return ConnEnd::Shutdown;
                }
            },

            frame = stream.next() => match frame {
                Some(Ok(message)) => {
                    liveness.touch();
                    match message {
                        Message::Text(text) => {
                            ctx.emit(SessionEvent::Frame(text)).await;
                        }
                        Message::Ping(payload) => {
                            if let Err(err) = stream.send(Message::Pong(payload)).await {
                                return ConnEnd::Transport(err.into());
                            }
                        }
                        Message::Pong(_) => {}
                        Message::Close(_) => return ConnEnd::Transport(SessionError::Closed),
                        other => debug!(len = other.len(), "Ignoring non-text frame"),
                    }
                }
                Some(Err(err)) => return ConnEnd::Transport(err.into()),
                None => return ConnEnd::Transport(SessionError::Closed),
            },

            _ = heartbeat.tick() => {
                if liveness.expired() {
                    return ConnEnd::Transport(SessionError::HeartbeatTimeout);
                }
                if let Err(err) = stream.send(Message::Ping(Vec::new())).await {
                    return ConnEnd::Transport(err.into());
                }
            }
        }
    }
}
