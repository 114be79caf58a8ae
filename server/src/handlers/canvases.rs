use actix_web::{error, web, HttpResponse, Responder, Result};

use crate::server::{export_png, Server};

pub fn configure_canvas_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/canvases").route(web::get().to(list)))
        .service(web::resource("/canvases/{code}/image.png").route(web::get().to(image)));
}

async fn list(server: web::Data<Server>) -> impl Responder {
    HttpResponse::Ok().json(server.registry().codes().await)
}

async fn image(path: web::Path<String>, server: web::Data<Server>) -> Result<HttpResponse> {
    let code = path.into_inner();
    let session = server
        .registry()
        .lookup(&code)
        .await
        .ok_or_else(|| error::ErrorNotFound("no such canvas"))?;
    let png = export_png(&session).await.map_err(|err| {
        log::warn!("Cannot export canvas {}: {}", code, err);
        error::ErrorInternalServerError("render failed")
    })?;
    Ok(HttpResponse::Ok().content_type("image/png").body(png))
}
