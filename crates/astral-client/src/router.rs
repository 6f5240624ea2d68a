//! Event router: session events in, reconciler mutations and UI effects
//! out.
//!
//! Frames are processed strictly in arrival order, one at a time; each
//! dispatch runs the owning reconciler's merge to completion under the
//! state lock before the next frame is looked at. Push handling never
//! blocks on the network — the follow-up mark-read call is spawned off
//! the loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use astral_net::{SessionEvent, SessionState};
use astral_shared::push::{PushEvent, PushKind};
use astral_shared::IdentityProvider;

use crate::api::ApiClient;
use crate::commands;
use crate::effects::{emit, EffectSender, UiEvent};
use crate::state::{lock, SharedState};

pub fn spawn_router(
    state: SharedState,
    api: ApiClient,
    identity: Arc<dyn IdentityProvider>,
    mut events: mpsc::Receiver<SessionEvent>,
    effects: EffectSender,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Event router started");
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Connected => {
                    emit(&effects, UiEvent::Connection(SessionState::Connected));
                }
                SessionEvent::Reconnecting { attempt, .. } => {
                    debug!(attempt, "Session reconnecting");
                    emit(&effects, UiEvent::Connection(SessionState::Reconnecting));
                }
                SessionEvent::Disconnected => {
                    emit(&effects, UiEvent::Connection(SessionState::Disconnected));
                }
                SessionEvent::Frame(text) => {
                    dispatch_frame(&state, &api, identity.as_ref(), &effects, &text);
                }
            }
        }
        info!("Session event stream ended; router stopped");
    })
}

/// Decode and dispatch one frame. At-most-once to the UI: an effect is
/// emitted only when the reconciler actually applied the event.
fn dispatch_frame(
    state: &SharedState,
    api: &ApiClient,
    identity: &dyn IdentityProvider,
    effects: &EffectSender,
    raw: &str,
) {
    let event = PushEvent::decode(raw);
    match event.kind {
        PushKind::Notification(notification) => {
            let outcome = lock(state)
                .notifications
                .ingest_push((*notification).clone());
            if outcome.applied() {
                emit(effects, UiEvent::NotificationArrived(notification));
            }
        }

        PushKind::PrivateMessage(message) => {
            let Some(local_user) = identity.identity().map(|i| i.user_id) else {
                warn!("Dropping message push: no local identity");
                return;
            };

            let receipt = lock(state).chat.ingest_push((*message).clone(), local_user);
            if !receipt.applied {
                return;
            }

            emit(
                effects,
                UiEvent::MessageArrived {
                    message,
                    active_session: receipt.active_session,
                },
            );

            if receipt.needs_mark_read {
                // Off the push path: routing stays non-blocking.
                let api = api.clone();
                let state = state.clone();
                let friend = receipt.session_user;
                tokio::spawn(async move {
                    if let Err(err) = commands::chat::mark_session_read(&api, &state, friend).await
                    {
                        warn!(friend = %friend, error = %err, "Auto mark-read failed");
                    }
                });
            }
        }

        PushKind::Unknown => {
            debug!(received_at = %event.received_at, "Dropping unclassified push frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use astral_shared::types::UserId;
    use astral_shared::StaticIdentity;

    use crate::config::ClientConfig;
    use crate::state;

    fn harness() -> (
        SharedState,
        mpsc::Sender<SessionEvent>,
        mpsc::Receiver<UiEvent>,
        JoinHandle<()>,
    ) {
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(StaticIdentity::new(UserId(1), "token"));
        let api = ApiClient::new(&ClientConfig::default(), identity.clone()).unwrap();
        let shared = state::shared(20);
        let (event_tx, event_rx) = mpsc::channel(16);
        let (effect_tx, effect_rx) = mpsc::channel(16);
        let handle = spawn_router(shared.clone(), api, identity, event_rx, effect_tx);
        (shared, event_tx, effect_rx, handle)
    }

    async fn recv_effect(effects: &mut mpsc::Receiver<UiEvent>) -> UiEvent {
        tokio::time::timeout(Duration::from_secs(2), effects.recv())
            .await
            .expect("timed out waiting for effect")
            .expect("effect channel closed")
    }

    #[tokio::test]
    async fn test_notification_frame_reaches_feed_once() {
        let (shared, events, mut effects, _handle) = harness();
        let frame = r#"{"type":"notification","data":{"notificationId":1,"type":7,"title":"hi","isRead":0}}"#;

        events
            .send(SessionEvent::Frame(frame.to_string()))
            .await
            .unwrap();
        events
            .send(SessionEvent::Frame(frame.to_string()))
            .await
            .unwrap();
        events.send(SessionEvent::Connected).await.unwrap();

        // First delivery: one effect.
        assert!(matches!(
            recv_effect(&mut effects).await,
            UiEvent::NotificationArrived(_)
        ));
        // Duplicate applied nothing, so the next effect is the Connected
        // marker we queued behind it.
        assert!(matches!(
            recv_effect(&mut effects).await,
            UiEvent::Connection(SessionState::Connected)
        ));

        let guard = lock(&shared);
        assert_eq!(guard.notifications.items().len(), 1);
        assert_eq!(guard.notifications.unread().total, 1);
    }

    #[tokio::test]
    async fn test_background_message_frame_updates_sessions() {
        let (shared, events, mut effects, _handle) = harness();
        // Sender 5 -> local user 1; no active session, so no mark-read.
        let frame = r#"{"type":"private_message","data":{"messageId":3,"senderId":5,"receiverId":1,"content":"hey"}}"#;

        events
            .send(SessionEvent::Frame(frame.to_string()))
            .await
            .unwrap();

        match recv_effect(&mut effects).await {
            UiEvent::MessageArrived {
                active_session, ..
            } => assert!(!active_session),
            other => panic!("expected MessageArrived, got {other:?}"),
        }

        let guard = lock(&shared);
        assert_eq!(guard.chat.sessions().len(), 1);
        assert_eq!(guard.chat.sessions()[0].friend_user_id, UserId(5));
        assert_eq!(guard.chat.sessions()[0].unread_count, 1);
    }

    #[tokio::test]
    async fn test_malformed_frame_is_dropped_quietly() {
        let (shared, events, mut effects, _handle) = harness();

        events
            .send(SessionEvent::Frame("garbage".to_string()))
            .await
            .unwrap();
        events.send(SessionEvent::Connected).await.unwrap();

        // The only effect is the Connected marker: the bad frame produced
        // neither an effect nor a crash.
        assert!(matches!(
            recv_effect(&mut effects).await,
            UiEvent::Connection(SessionState::Connected)
        ));
        assert!(lock(&shared).notifications.items().is_empty());
    }
}
