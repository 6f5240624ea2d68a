//! Post-reconciliation effect stream.
//!
//! Reconcilers stay pure; anything user-visible that should happen after a
//! merge (sounds, desktop notifications, badge updates) is driven by the
//! embedding app consuming these events. The router emits at most one
//! event per applied push — duplicates apply nothing and emit nothing.

use tokio::sync::mpsc;
use tracing::warn;

use astral_net::SessionState;
use astral_shared::model::{Notification, PrivateMessage};

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Connection lifecycle change.
    Connection(SessionState),
    /// A new notification was merged into the feed.
    NotificationArrived(Box<Notification>),
    /// A new private message was merged.
    MessageArrived {
        message: Box<PrivateMessage>,
        /// Whether it landed in the focused chat window.
        active_session: bool,
    },
}

pub type EffectSender = mpsc::Sender<UiEvent>;

/// Fire-and-forget emit; a full buffer drops the effect rather than
/// blocking the push path.
pub fn emit(effects: &EffectSender, event: UiEvent) {
    if effects.try_send(event).is_err() {
        warn!("Effect buffer full; dropping UI event");
    }
}
