//! Tera templates, compiled into the binary.

use actix_web::HttpResponse;
use actix_web::http::header::ContentType;
use tera::{Context, Tera};

use quill_core::domain::Actor;

use crate::middleware::error::{AppError, AppResult};

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("includes/feed.html", include_str!("../templates/includes/feed.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("group.html", include_str!("../templates/group.html")),
    ("profile.html", include_str!("../templates/profile.html")),
    ("post.html", include_str!("../templates/post.html")),
    ("new.html", include_str!("../templates/new.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("signup.html", include_str!("../templates/signup.html")),
    ("about/author.html", include_str!("../templates/about/author.html")),
    ("about/tech.html", include_str!("../templates/about/tech.html")),
];

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())?;
        Ok(Self { tera })
    }

    /// Render `name` into a 200 HTML response.
    pub fn render(&self, name: &str, context: &Context) -> AppResult<HttpResponse> {
        let body = self.tera.render(name, context).map_err(|e| {
            AppError::Internal(format!("rendering {name} failed: {e:?}"))
        })?;

        Ok(HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(body))
    }
}

/// Base context shared by every page: the signed-in user, if any.
pub fn page_context(viewer: Option<&Actor>) -> Context {
    let mut context = Context::new();
    context.insert("viewer", &viewer);
    context
}
