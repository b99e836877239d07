use actix_files as fs;
use actix_web::dev::Server;
use actix_web::{error::JsonPayloadError, middleware::Logger, web, App, HttpRequest, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::SessionService;
use crate::chirps::ChirpService;
use crate::configuration::Platform;
use crate::error::{AppError, ValidationError};
use crate::metrics::HitCounter;
use crate::middleware::{CountHits, RequestLogger};
use crate::routes::{
    create_chirp, create_user, delete_chirp, get_chirp, health_check, list_chirps, login,
    metrics, refresh, reset, revoke, update_user,
};

/// Everything the handlers share. Built once in `main` (or a test) and cloned
/// into each worker.
pub struct AppState {
    pub sessions: Arc<SessionService>,
    pub chirps: Arc<ChirpService>,
    pub hits: Arc<HitCounter>,
    pub platform: Platform,
}

fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected JSON body");
    AppError::Validation(ValidationError::InvalidFormat("request body".to_string())).into()
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, std::io::Error> {
    let sessions = web::Data::from(state.sessions);
    let chirps = web::Data::from(state.chirps);
    let hits = web::Data::from(state.hits.clone());
    let counter = state.hits;
    let platform = web::Data::new(state.platform);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(RequestLogger)
            .app_data(sessions.clone())
            .app_data(chirps.clone())
            .app_data(hits.clone())
            .app_data(platform.clone())
            .app_data(web::JsonConfig::default().error_handler(json_error))
            .route("/api/healthz", web::get().to(health_check))
            .route("/api/users", web::post().to(create_user))
            .route("/api/users", web::put().to(update_user))
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .route("/api/chirps", web::post().to(create_chirp))
            .route("/api/chirps", web::get().to(list_chirps))
            .route("/api/chirps/{chirp_id}", web::get().to(get_chirp))
            .route("/api/chirps/{chirp_id}", web::delete().to(delete_chirp))
            .route("/admin/metrics", web::get().to(metrics))
            .route("/admin/reset", web::post().to(reset))
            .service(
                web::scope("/app")
                    .wrap(CountHits::new(counter.clone()))
                    .service(fs::Files::new("", "./public").index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
