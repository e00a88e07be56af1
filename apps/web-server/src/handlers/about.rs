//! Static "about" pages.

use actix_web::{HttpResponse, web};

use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::render::page_context;
use crate::state::AppState;

/// GET /about/author/
pub async fn author(state: web::Data<AppState>, viewer: OptionalIdentity) -> AppResult<HttpResponse> {
    state
        .templates
        .render("about/author.html", &page_context(viewer.actor()))
}

/// GET /about/tech/
pub async fn tech(state: web::Data<AppState>, viewer: OptionalIdentity) -> AppResult<HttpResponse> {
    state
        .templates
        .render("about/tech.html", &page_context(viewer.actor()))
}
