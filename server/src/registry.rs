use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use system::{CanvasSession, ConnectionId, SessionCode};
use tokio::sync::{Mutex, RwLock};

use crate::error::PersistenceError;

pub type SharedSession = Arc<Mutex<CanvasSession>>;

/// Every live canvas, by code. The registry lock only guards the map; each
/// session carries its own lock.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionCode, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn generate_session(&self, creator: ConnectionId) -> (SessionCode, SharedSession) {
        let mut rng = StdRng::from_entropy();
        self.generate_session_with(creator, &mut rng).await
    }

    /// Draws codes from `rng` until one is free, then inserts a session owned by `creator`.
    pub async fn generate_session_with<R: Rng + Send>(
        &self,
        creator: ConnectionId,
        rng: &mut R,
    ) -> (SessionCode, SharedSession) {
        let mut sessions = self.sessions.write().await;
        let code = loop {
            let candidate = SessionCode::random(rng);
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
            log::debug!("Session code {} is taken, retrying", candidate);
        };
        let session = Arc::new(Mutex::new(CanvasSession::new(code.clone(), creator)));
        sessions.insert(code.clone(), session.clone());
        log::info!("Connection {} created session {}", creator, code);
        (code, session)
    }

    /// Client supplied codes go through here. Malformed and unknown codes are both `None`.
    pub async fn lookup(&self, code: &str) -> Option<SharedSession> {
        let code = SessionCode::parse(code)?;
        self.get(&code).await
    }

    pub async fn get(&self, code: &SessionCode) -> Option<SharedSession> {
        self.sessions.read().await.get(code).cloned()
    }

    /// Handles of every session at the time of the call.
    pub async fn all_sessions(&self) -> Vec<SharedSession> {
        self.sessions.read().await.values().cloned().collect()
    }

    pub async fn codes(&self) -> Vec<SessionCode> {
        let mut codes: Vec<_> = self.sessions.read().await.keys().cloned().collect();
        codes.sort();
        codes
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn install(&self, session: CanvasSession) -> SharedSession {
        let code = session.code().clone();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(code, shared.clone());
        shared
    }

    /// Restores one persisted session. A bad record is logged and left out.
    pub async fn rehydrate(&self, code: &SessionCode, bytes: &[u8]) -> Result<(), PersistenceError> {
        let result = CanvasSession::from_bytes(bytes)
            .map_err(PersistenceError::from)
            .and_then(|session| {
                if session.code() == code {
                    Ok(session)
                } else {
                    Err(PersistenceError::CodeMismatch {
                        stored: code.clone(),
                        decoded: session.code().clone(),
                    })
                }
            });
        match result {
            Ok(session) => {
                self.install(session).await;
                log::debug!("Loaded: {}", code);
                Ok(())
            }
            Err(err) => {
                log::warn!("Skipping stored session {}: {}", code, err);
                Err(err)
            }
        }
    }

    /// Drops `connection_id` from every session it joined. Returns how many sessions it left.
    pub async fn remove_participant_everywhere(&self, connection_id: &ConnectionId) -> usize {
        let mut left = 0;
        for session in self.all_sessions().await {
            if session.lock().await.remove_participant(connection_id) {
                left += 1;
            }
        }
        left
    }
}
