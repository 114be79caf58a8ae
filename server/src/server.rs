use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use system::{render_png, ConnectionId, Request, Response, SessionCode, BLOCK_SIZE, GRID_SIZE};

use crate::broadcast_hub::{BroadcastHub, ConnectionTx};
use crate::config::BroadcastScope;
use crate::error::ExportError;
use crate::persistence::PersistenceCycle;
use crate::registry::{SessionRegistry, SharedSession};

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        connection_id: ConnectionId,
        tx: ConnectionTx,
    },
    Disconnect {
        from: ConnectionId,
    },
    Request {
        from: ConnectionId,
        request: Request,
    },
}

/// Routes decoded requests to canvas sessions and sends the replies.
pub struct Server {
    registry: Arc<SessionRegistry>,
    hub: Arc<BroadcastHub>,
    persistence: Arc<PersistenceCycle>,
    broadcast_scope: BroadcastScope,
}

impl Server {
    pub fn new(
        registry: Arc<SessionRegistry>,
        hub: Arc<BroadcastHub>,
        persistence: Arc<PersistenceCycle>,
    ) -> Self {
        Self {
            registry,
            hub,
            persistence,
            broadcast_scope: BroadcastScope::default(),
        }
    }

    pub fn with_broadcast_scope(mut self, broadcast_scope: BroadcastScope) -> Self {
        self.broadcast_scope = broadcast_scope;
        self
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    pub async fn handle_connection_command(&self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { connection_id, tx } => {
                self.hub.register(connection_id, tx).await;
                log::info!("Connection {} opened", connection_id);
            }
            ConnectionCommand::Disconnect { from } => {
                self.hub.unregister(&from).await;
                let left = self.registry.remove_participant_everywhere(&from).await;
                log::info!("Connection {} closed, left {} sessions", from, left);
            }
            ConnectionCommand::Request { from, request } => {
                self.handle_request(&from, request).await;
            }
        }
    }

    pub async fn handle_request(&self, from: &ConnectionId, request: Request) {
        log::debug!("Request from {}: {:?}", from, request);
        match request {
            Request::Session => {
                let code = self.create_session(from).await;
                self.hub.send(from, Response::SessionResponse { code }).await;
            }
            Request::Canvas { canvas_code } => {
                if let Some(session) = self.lookup(&canvas_code).await {
                    let pixels = {
                        let mut session = session.lock().await;
                        session.add_participant(*from);
                        session.snapshot()
                    };
                    log::debug!("Loaded canvas {} for {}", canvas_code, from);
                    self.hub
                        .send(from, Response::CanvasResponse { pixels })
                        .await;
                }
            }
            Request::Draw {
                canvas_code,
                x,
                y,
                color,
            } => {
                if let Some(session) = self.lookup(&canvas_code).await {
                    self.draw(from, &session, x, y, color.as_deref()).await;
                }
            }
            Request::Image { canvas_code } => {
                if let Some(session) = self.lookup(&canvas_code).await {
                    match export_png(&session).await {
                        Ok(png) => {
                            let image = BASE64.encode(png);
                            self.hub.send(from, Response::ImageResponse { image }).await;
                        }
                        Err(err) => {
                            log::warn!("Cannot render canvas {}: {}", canvas_code, err);
                        }
                    }
                }
            }
            Request::KeepAlive { .. } => {}
        }
    }

    async fn lookup(&self, canvas_code: &str) -> Option<SharedSession> {
        let session = self.registry.lookup(canvas_code).await;
        if session.is_none() {
            log::debug!("Ignoring request for unknown canvas {:?}", canvas_code);
        }
        session
    }

    /// Creates the session and writes it to the store before the code is handed out.
    async fn create_session(&self, creator: &ConnectionId) -> SessionCode {
        let (code, session) = self.registry.generate_session(*creator).await;
        if let Err(err) = self.persistence.write_session(&session).await {
            log::warn!("Session {} is not persisted yet: {}", code, err);
        }
        code
    }

    /// Replies and fan-out happen under the session lock, so every client sees
    /// updates to a cell in the order they were applied.
    async fn draw(
        &self,
        from: &ConnectionId,
        session: &SharedSession,
        x: i64,
        y: i64,
        color: Option<&str>,
    ) {
        let mut session = session.lock().await;
        let pixel = match session.draw(x, y, color, *from) {
            Ok(pixel) => pixel,
            Err(err) => {
                log::debug!("Draw on {} rejected: {}", session.code(), err);
                self.hub
                    .send(from, Response::DrawResponse { ok: false })
                    .await;
                return;
            }
        };

        self.hub
            .send(from, Response::DrawResponse { ok: true })
            .await;

        let update = Response::CanvasUpdate {
            canvas_code: session.code().clone(),
            x: pixel.x,
            y: pixel.y,
            color: pixel.color,
        };
        match self.broadcast_scope {
            BroadcastScope::AllConnections => self.hub.broadcast(update).await,
            BroadcastScope::SessionParticipants => {
                self.hub.send_to(session.participants(), update).await
            }
        };
    }
}

/// Renders a canvas to PNG on the blocking pool. The session lock is only held
/// while its pixels are copied.
pub async fn export_png(session: &SharedSession) -> Result<Vec<u8>, ExportError> {
    let pixels = session.lock().await.snapshot();
    let png =
        tokio::task::spawn_blocking(move || render_png(&pixels, GRID_SIZE, BLOCK_SIZE)).await??;
    Ok(png)
}
