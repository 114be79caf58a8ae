use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tokio_util::sync::CancellationToken;

use server::broadcast_hub::BroadcastHub;
use server::config::ServerConfig;
use server::handlers::root;
use server::persistence::PersistenceCycle;
use server::registry::SessionRegistry;
use server::server::Server;
use server::store::{CanvasStore, FileStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::load().context("Failed to load configuration")?;

    let store: Arc<dyn CanvasStore> = Arc::new(
        FileStore::open(&config.data_dir)
            .await
            .context("Failed to open canvas storage")?,
    );
    let registry = Arc::new(SessionRegistry::new());
    let persistence = Arc::new(
        PersistenceCycle::new(registry.clone(), store)
            .with_interval(config.backup_interval())
            .with_write_timeout(config.write_timeout()),
    );
    persistence
        .restore()
        .await
        .context("Failed to list stored canvases")?;

    let shutdown = CancellationToken::new();
    let backup = persistence.clone().spawn(shutdown.clone());

    let srv = web::Data::new(
        Server::new(registry, Arc::new(BroadcastHub::new()), persistence.clone())
            .with_broadcast_scope(config.broadcast_scope),
    );

    log::info!("Listening on {}", config.bind_address);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(srv.clone())
            .configure(root)
    })
    .bind(config.bind_address.as_str())?
    .run()
    .await?;

    shutdown.cancel();
    if let Err(err) = backup.await {
        log::error!("Backup task panicked: {}", err);
    }
    persistence.flush().await;
    Ok(())
}
