use crate::connection::ws_index;
use crate::handlers::canvases::configure_canvas_handlers;
use actix_web::web;

mod canvases;

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/canvas").route(web::get().to(ws_index)));

    configure_canvas_handlers(cfg);
}
