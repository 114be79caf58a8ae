use std::sync::Arc;

use server::broadcast_hub::BroadcastHub;
use server::persistence::{PersistenceCycle, RestoreReport};
use server::registry::SessionRegistry;
use server::server::{ConnectionCommand, Server};
use server::store::{CanvasStore, FileStore};
use system::uuid::Uuid;
use system::{ConnectionId, Request, Response, SessionCode};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

struct Node {
    server: Server,
    persistence: Arc<PersistenceCycle>,
}

async fn boot(store: Arc<dyn CanvasStore>) -> (Node, RestoreReport) {
    let registry = Arc::new(SessionRegistry::new());
    let persistence = Arc::new(PersistenceCycle::new(registry.clone(), store));
    let report = persistence.restore().await.expect("store should list");
    let server = Server::new(registry, Arc::new(BroadcastHub::new()), persistence.clone());
    (
        Node {
            server,
            persistence,
        },
        report,
    )
}

async fn connect(node: &Node) -> (ConnectionId, UnboundedReceiver<Response>) {
    let (tx, rx) = unbounded_channel();
    let connection_id = Uuid::new_v4();
    node.server
        .handle_connection_command(ConnectionCommand::Connect { connection_id, tx })
        .await;
    (connection_id, rx)
}

async fn send(node: &Node, from: ConnectionId, raw: &str) {
    if let Some(request) = Request::decode(raw.as_bytes()) {
        node.server.handle_request(&from, request).await;
    }
}

fn next(rx: &mut UnboundedReceiver<Response>) -> Response {
    rx.try_recv().expect("a response")
}

#[tokio::test]
async fn it_draws_and_survives_restart() {
    let dir = tempfile::tempdir().expect("");
    let store: Arc<dyn CanvasStore> = Arc::new(FileStore::open(dir.path()).await.expect(""));

    let (node, report) = boot(store.clone()).await;
    assert_eq!(report, RestoreReport::default());

    let (alice, mut alice_rx) = connect(&node).await;
    let (bob, mut bob_rx) = connect(&node).await;

    send(&node, alice, r#"{"requestType":"session","canvasCode":"session"}"#).await;
    let code = match next(&mut alice_rx) {
        Response::SessionResponse { code } => code,
        other => panic!("unexpected {:?}", other),
    };
    assert_eq!(code.as_str().len(), 8);
    assert!(code.as_str().chars().all(|c| c.is_ascii_uppercase()));

    let canvas = format!(r#"{{"requestType":"canvas","canvasCode":"{}"}}"#, code);
    send(&node, alice, &canvas).await;
    assert_eq!(
        next(&mut alice_rx),
        Response::CanvasResponse { pixels: vec![] }
    );

    let draw = format!(
        r##"{{"requestType":"draw","canvasCode":"{}","x":5,"y":5,"color":"#FF0000"}}"##,
        code
    );
    send(&node, alice, &draw).await;
    assert_eq!(next(&mut alice_rx), Response::DrawResponse { ok: true });
    let update = Response::CanvasUpdate {
        canvas_code: code.clone(),
        x: 5,
        y: 5,
        color: "#FF0000".into(),
    };
    assert_eq!(next(&mut alice_rx), update);
    // Bob never opened the canvas but still hears about the draw.
    assert_eq!(next(&mut bob_rx), update);
    assert!(bob_rx.try_recv().is_err());

    send(&node, alice, &canvas).await;
    match next(&mut alice_rx) {
        Response::CanvasResponse { pixels } => {
            assert_eq!(pixels.len(), 1);
            assert_eq!((pixels[0].x, pixels[0].y), (5, 5));
            assert_eq!(pixels[0].color, "#FF0000");
            assert_eq!(pixels[0].owner, alice);
        }
        other => panic!("unexpected {:?}", other),
    }

    send(&node, alice, "{}").await;
    send(&node, alice, r#"{"requestType":"none","canvasCode":"session"}"#).await;
    assert!(alice_rx.try_recv().is_err());

    node.persistence.flush().await;
    node.server
        .handle_connection_command(ConnectionCommand::Disconnect { from: bob })
        .await;
    drop(node);

    let (node, report) = boot(store).await;
    assert_eq!(report, RestoreReport { loaded: 1, skipped: 0 });
    let restored = node
        .server
        .registry()
        .get(&code)
        .await
        .expect("session restored");
    let restored = restored.lock().await;
    assert_eq!(restored.snapshot().len(), 1);
    assert!(restored.has_participant(&alice));
}

#[tokio::test]
async fn it_skips_corrupt_file_on_boot() {
    let dir = tempfile::tempdir().expect("");
    let store: Arc<dyn CanvasStore> = Arc::new(FileStore::open(dir.path()).await.expect(""));

    let (node, _) = boot(store.clone()).await;
    let (alice, mut alice_rx) = connect(&node).await;
    send(&node, alice, r#"{"requestType":"session"}"#).await;
    let good = match next(&mut alice_rx) {
        Response::SessionResponse { code } => code,
        other => panic!("unexpected {:?}", other),
    };

    let bad = SessionCode::parse("BROKENXX").expect("");
    std::fs::write(dir.path().join("BROKENXX.dcv"), b"\x01garbage").expect("");

    let (node, report) = boot(store).await;
    assert_eq!(report, RestoreReport { loaded: 1, skipped: 1 });
    assert!(node.server.registry().get(&good).await.is_some());
    assert!(node.server.registry().get(&bad).await.is_none());
}
