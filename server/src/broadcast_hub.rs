use std::collections::HashMap;

use system::{ConnectionId, Response};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;

pub type ConnectionTx = UnboundedSender<Response>;

/// Outbound channel of every open connection.
///
/// Delivery is best effort: a channel whose connection is already gone is
/// skipped without disturbing the others.
#[derive(Default)]
pub struct BroadcastHub {
    connection_txs: RwLock<HashMap<ConnectionId, ConnectionTx>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, connection_id: ConnectionId, tx: ConnectionTx) {
        self.connection_txs.write().await.insert(connection_id, tx);
    }

    pub async fn unregister(&self, connection_id: &ConnectionId) -> Option<ConnectionTx> {
        self.connection_txs.write().await.remove(connection_id)
    }

    pub async fn send(&self, to: &ConnectionId, message: Response) -> bool {
        match self.connection_txs.read().await.get(to) {
            Some(tx) => deliver(to, tx, message),
            None => {
                log::debug!("Connection {} is not registered", to);
                false
            }
        }
    }

    /// Sends to every registered connection. Returns how many accepted the message.
    pub async fn broadcast(&self, message: Response) -> usize {
        let connection_txs = self.connection_txs.read().await;
        connection_txs
            .iter()
            .filter(|(connection_id, tx)| deliver(connection_id, tx, message.clone()))
            .count()
    }

    /// Like `broadcast`, limited to `targets`. Unknown ids are skipped.
    pub async fn send_to<'a, I>(&self, targets: I, message: Response) -> usize
    where
        I: IntoIterator<Item = &'a ConnectionId>,
    {
        let connection_txs = self.connection_txs.read().await;
        targets
            .into_iter()
            .filter_map(|connection_id| {
                connection_txs
                    .get(connection_id)
                    .map(|tx| (connection_id, tx))
            })
            .filter(|(connection_id, tx)| deliver(connection_id, tx, message.clone()))
            .count()
    }

    pub async fn connection_count(&self) -> usize {
        self.connection_txs.read().await.len()
    }
}

fn deliver(to: &ConnectionId, tx: &ConnectionTx, message: Response) -> bool {
    if tx.send(message).is_err() {
        log::debug!("Connection {} is gone, dropping message", to);
        false
    } else {
        true
    }
}
