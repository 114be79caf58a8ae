use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::{PersistenceError, StoreError};
use crate::registry::{SessionRegistry, SharedSession};
use crate::store::CanvasStore;

pub const DEFAULT_BACKUP_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub written: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// Copies every session in the registry to the store, on a timer and on demand.
pub struct PersistenceCycle {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn CanvasStore>,
    interval: Duration,
    write_timeout: Duration,
}

impl PersistenceCycle {
    pub fn new(registry: Arc<SessionRegistry>, store: Arc<dyn CanvasStore>) -> Self {
        Self {
            registry,
            store,
            interval: DEFAULT_BACKUP_INTERVAL,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Loads every stored session into the registry.
    ///
    /// Only a failure to list the store is returned; unreadable or corrupt
    /// entries are skipped.
    pub async fn restore(&self) -> Result<RestoreReport, StoreError> {
        let mut report = RestoreReport::default();
        for code in self.store.list_codes().await? {
            let bytes = match self.store.get(&code).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    log::warn!("Cannot read stored session {}: {}", code, err);
                    report.skipped += 1;
                    continue;
                }
            };
            if self.registry.rehydrate(&code, &bytes).await.is_ok() {
                report.loaded += 1;
            } else {
                report.skipped += 1;
            }
        }
        log::info!(
            "Restored {} sessions ({} skipped)",
            report.loaded,
            report.skipped
        );
        Ok(report)
    }

    pub async fn write_session(&self, session: &SharedSession) -> Result<(), PersistenceError> {
        let (code, bytes) = {
            let session = session.lock().await;
            (session.code().clone(), session.to_bytes()?)
        };
        timeout(self.write_timeout, self.store.put(&code, bytes))
            .await
            .map_err(|_| PersistenceError::Timeout(self.write_timeout))??;
        Ok(())
    }

    /// Writes every session once. A failed write is logged and the rest carry on.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();
        for session in self.registry.all_sessions().await {
            match self.write_session(&session).await {
                Ok(()) => report.written += 1,
                Err(err) => {
                    let code = session.lock().await.code().clone();
                    log::error!("Backup of session {} failed: {}", code, err);
                    report.failed += 1;
                }
            }
        }
        report
    }

    /// Teardown hook: one last backup.
    pub async fn flush(&self) -> TickReport {
        let report = self.tick().await;
        log::info!(
            "Flushed {} sessions ({} failed)",
            report.written,
            report.failed
        );
        report
    }

    /// Runs `tick` every interval, first one after a full interval, until `shutdown` fires.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log::info!("Backup task started, every {:?}", self.interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let report = self.tick().await;
                        log::debug!(
                            "Backup tick: {} written, {} failed",
                            report.written,
                            report.failed
                        );
                    }
                }
            }
            log::info!("Backup task stopped");
        })
    }
}
