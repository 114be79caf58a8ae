use std::sync::Arc;

use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use system::uuid::Uuid;
use system::{ConnectionId, Request, Response};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

use crate::server::{ConnectionCommand, Server};

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(Response);

/// One WebSocket. Requests are handed to a per-connection task so a client's
/// requests run in order, while other clients proceed independently.
struct ConnectionActor {
    connection_id: ConnectionId,
    server: Arc<Server>,
    inbound: Option<UnboundedSender<Request>>,
}

impl ConnectionActor {
    fn new(server: Arc<Server>) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            server,
            inbound: None,
        }
    }

    fn ingress(&self, raw: &[u8]) {
        log::debug!("Ingress size: {}", raw.len());
        // Anything that doesn't decode, including `{}`, is dropped without a reply.
        if let Some(request) = Request::decode(raw) {
            if let Some(inbound) = &self.inbound {
                if inbound.send(request).is_err() {
                    log::warn!("Request worker of {} is gone", self.connection_id);
                }
            }
        }
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = unbounded_channel::<Response>();
        let (inbound_tx, mut inbound_rx) = unbounded_channel::<Request>();
        self.inbound = Some(inbound_tx);

        let addr = ctx.address().recipient();
        tokio::spawn(async move {
            while let Some(response) = rx.recv().await {
                addr.do_send(ConnectionActorMessage(response));
            }
        });

        let server = self.server.clone();
        let connection_id = self.connection_id;
        tokio::spawn(async move {
            server
                .handle_connection_command(ConnectionCommand::Connect { connection_id, tx })
                .await;
            while let Some(request) = inbound_rx.recv().await {
                server
                    .handle_connection_command(ConnectionCommand::Request {
                        from: connection_id,
                        request,
                    })
                    .await;
            }
            server
                .handle_connection_command(ConnectionCommand::Disconnect {
                    from: connection_id,
                })
                .await;
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        // Closing the inbound channel lets the worker finish queued requests, then disconnect.
        self.inbound.take();
        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Text(text)) => self.ingress(text.as_bytes()),
            Ok(ws::Message::Binary(bin)) => self.ingress(&bin),
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Err(err) => {
                log::debug!("Protocol error on {}: {}", self.connection_id, err);
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        match msg.0.encode() {
            Ok(text) => ctx.text(text),
            Err(err) => log::error!("Cannot encode response {:?}: {}", msg.0, err),
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    server: web::Data<Server>,
) -> Result<HttpResponse, Error> {
    ws::start(ConnectionActor::new(server.into_inner()), &req, stream)
}
