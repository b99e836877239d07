use actix_web::{web, HttpResponse};

use crate::auth::SessionService;
use crate::configuration::Platform;
use crate::error::AppError;
use crate::metrics::HitCounter;

/// GET /admin/metrics
pub async fn metrics(hits: web::Data<HitCounter>) -> HttpResponse {
    let body = format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        hits.hits()
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// POST /admin/reset
///
/// Zero the visit counter and delete every user. Dev platform only; 403 elsewhere.
pub async fn reset(
    platform: web::Data<Platform>,
    hits: web::Data<HitCounter>,
    sessions: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    if *platform.get_ref() != Platform::Dev {
        tracing::warn!(platform = ?platform.get_ref(), "Reset refused outside dev");
        return Ok(HttpResponse::Forbidden().finish());
    }

    hits.reset();
    let removed = sessions.users().delete_all().await?;

    tracing::info!(users_removed = removed, "Admin reset");
    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Hits reset to 0"))
}
