//! The `SyncClient` facade: wires the session manager, router, REST
//! client and reconcilers together for one logged-in user.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use astral_net::{SessionConfig, SessionEvent, SessionManager, SessionState};
use astral_shared::model::{ChatSession, Notification, PrivateMessage, UnreadCount};
use astral_shared::IdentityProvider;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::effects::{EffectSender, UiEvent};
use crate::error::Result;
use crate::router::spawn_router;
use crate::state::{self, lock, SharedState};

pub struct SyncClient {
    api: ApiClient,
    state: SharedState,
    session: SessionManager,
    identity: Arc<dyn IdentityProvider>,
    session_events: Option<mpsc::Receiver<SessionEvent>>,
    effects_tx: EffectSender,
    router: Option<JoinHandle<()>>,
}

impl SyncClient {
    /// Build the client. Returns the effect stream the embedding app
    /// consumes for sounds, badges and desktop notifications.
    pub fn new(
        config: ClientConfig,
        session_config: SessionConfig,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<(Self, mpsc::Receiver<UiEvent>)> {
        let api = ApiClient::new(&config, identity.clone())?;
        let state = state::shared(config.page_size);
        let (session, session_events) = SessionManager::new(session_config, identity.clone());
        let (effects_tx, effects_rx) = mpsc::channel(256);

        let client = Self {
            api,
            state,
            session,
            identity,
            session_events: Some(session_events),
            effects_tx,
            router: None,
        };
        Ok((client, effects_rx))
    }

    /// Connect the push session and start routing events. Fails fast when
    /// not authenticated.
    pub fn start(&mut self) -> Result<()> {
        self.session.connect()?;
        if let Some(events) = self.session_events.take() {
            self.router = Some(spawn_router(
                self.state.clone(),
                self.api.clone(),
                self.identity.clone(),
                events,
                self.effects_tx.clone(),
            ));
        }
        Ok(())
    }

    /// Tear the session down. Local collections stay intact.
    pub fn stop(&self) {
        self.session.disconnect();
    }

    pub fn connection_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    // ------------------------------------------------------------------
    // Read-only snapshots for the UI layer
    // ------------------------------------------------------------------

    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.state).notifications.items().to_vec()
    }

    pub fn unread_count(&self) -> UnreadCount {
        lock(&self.state).notifications.unread().clone()
    }

    pub fn chat_sessions(&self) -> Vec<ChatSession> {
        lock(&self.state).chat.sessions().to_vec()
    }

    pub fn messages(&self) -> Vec<PrivateMessage> {
        lock(&self.state).chat.messages().to_vec()
    }

    pub fn total_message_unread(&self) -> u64 {
        lock(&self.state).chat.total_unread()
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        self.session.disconnect();
        if let Some(router) = self.router.take() {
            router.abort();
        }
    }
}
