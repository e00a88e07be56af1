//! HTTP handlers and route configuration.

mod about;
mod auth;
mod health;
mod posts;


use actix_web::{HttpResponse, web};

use crate::middleware::error::AppError;

/// Configure all application routes.
///
/// Fixed prefixes are registered before the `/{username}/...` patterns so a
/// literal path always wins over a username.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/health/", web::get().to(health::health_check))
        .service(
            web::resource("/new/")
                .route(web::get().to(posts::new_form))
                .route(web::post().to(posts::create)),
        )
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .service(
            web::scope("/about")
                .route("/author/", web::get().to(about::author))
                .route("/tech/", web::get().to(about::tech)),
        )
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .service(
                    web::resource("/logout/")
                        .route(web::get().to(auth::logout))
                        .route(web::post().to(auth::logout)),
                )
                .service(
                    web::resource("/signup/")
                        .route(web::get().to(auth::signup_form))
                        .route(web::post().to(auth::signup)),
                ),
        )
        .route("/{username}/", web::get().to(posts::profile))
        .route("/{username}/{post_id}/", web::get().to(posts::post_view))
        .service(
            web::resource("/{username}/{post_id}/edit/")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit)),
        );
}

/// Fallback for unmatched paths.
pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound("no route".to_string()))
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, location.to_string()))
        .finish()
}
