//! Post listings, detail pages and the create/edit forms.

use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, HttpResponse, web};
use url::form_urlencoded;
use tera::Context;
use uuid::Uuid;

use quill_core::PageRequest;
use quill_core::domain::{Actor, Post};
use quill_core::forms::{FormErrors, PostForm};
use quill_core::policy::can_edit;
use quill_core::service::{CreateOutcome, EditOutcome};

use super::redirect;
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::render::page_context;
use crate::state::AppState;

/// `?page=N` on every listing, read from the raw query string. Junk values
/// and malformed queries fall back to page 1; a repeated key takes the last
/// value.
#[derive(Debug, Clone, Copy)]
pub struct PageQuery(PageRequest);

impl PageQuery {
    fn parse(query: &str) -> Self {
        let raw = form_urlencoded::parse(query.as_bytes())
            .filter(|(key, _)| key == "page")
            .map(|(_, value)| value.into_owned())
            .last();
        Self(PageRequest::from_query(raw.as_deref()))
    }

    fn request(&self) -> PageRequest {
        self.0
    }
}

impl FromRequest for PageQuery {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::parse(req.query_string())))
    }
}

fn parse_post_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("post '{raw}'")))
}

fn detail_url(username: &str, post_id: Uuid) -> String {
    format!("/{username}/{post_id}/")
}

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    query: PageQuery,
) -> AppResult<HttpResponse> {
    let page = state.blog.index(query.request()).await?;

    let mut context = page_context(viewer.actor());
    context.insert("page", &page);
    state.templates.render("index.html", &context)
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    slug: web::Path<String>,
    query: PageQuery,
) -> AppResult<HttpResponse> {
    let feed = state.blog.group_feed(&slug, query.request()).await?;

    let mut context = page_context(viewer.actor());
    context.insert("group", &feed.group);
    context.insert("page", &feed.page);
    state.templates.render("group.html", &context)
}

/// GET /{username}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    username: web::Path<String>,
    query: PageQuery,
) -> AppResult<HttpResponse> {
    let feed = state.blog.profile(&username, query.request()).await?;

    let mut context = page_context(viewer.actor());
    context.insert("author", &feed.author);
    context.insert("page", &feed.page);
    state.templates.render("profile.html", &context)
}

/// GET /{username}/{post_id}/
pub async fn post_view(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (username, raw_id) = path.into_inner();
    let post_id = parse_post_id(&raw_id)?;
    let detail = state.blog.post_detail(&username, post_id).await?;

    let editable = viewer
        .actor()
        .is_some_and(|actor| can_edit(actor, &detail.card.post));

    let mut context = page_context(viewer.actor());
    context.insert("title", &detail.card.post.excerpt(30));
    context.insert("author", &detail.card.author);
    context.insert("post", &detail.card);
    context.insert("post_count", &detail.post_count);
    context.insert("can_edit", &editable);
    state.templates.render("post.html", &context)
}

/// Render the shared create/edit form.
async fn render_form(
    state: &AppState,
    actor: &Actor,
    form: &PostForm,
    errors: &FormErrors,
    editing: Option<&Post>,
) -> AppResult<HttpResponse> {
    let groups = state.blog.list_groups().await?;

    let mut context: Context = page_context(Some(actor));
    context.insert("form", form);
    context.insert("errors", errors);
    context.insert("groups", &groups);
    context.insert("is_edit", &editing.is_some());
    match editing {
        Some(post) => {
            context.insert("post", post);
            context.insert(
                "action",
                &format!("{}edit/", detail_url(&actor.username, post.id)),
            );
        }
        None => context.insert("action", "/new/"),
    }
    state.templates.render("new.html", &context)
}

/// GET /new/
pub async fn new_form(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    render_form(
        &state,
        &identity,
        &PostForm::default(),
        &FormErrors::new(),
        None,
    )
    .await
}

/// POST /new/
///
/// The author is always the signed-in user; an `author` field in the body is
/// ignored.
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    match state.blog.create_post(&identity, form.into_inner()).await? {
        CreateOutcome::Created(_) => Ok(redirect("/")),
        CreateOutcome::Invalid { form, errors } => {
            render_form(&state, &identity, &form, &errors, None).await
        }
    }
}

async fn respond_to_edit(
    state: &AppState,
    identity: &Identity,
    username: &str,
    outcome: EditOutcome,
) -> AppResult<HttpResponse> {
    match outcome {
        EditOutcome::Refused(post) | EditOutcome::Saved(post) => {
            Ok(redirect(&detail_url(username, post.id)))
        }
        EditOutcome::Form { post, form, errors } => {
            render_form(state, identity, &form, &errors, Some(&post)).await
        }
    }
}

/// GET /{username}/{post_id}/edit/
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (username, raw_id) = path.into_inner();
    let post_id = parse_post_id(&raw_id)?;

    let outcome = state
        .blog
        .edit_post(&identity, &username, post_id, None)
        .await?;
    respond_to_edit(&state, &identity, &username, outcome).await
}

/// POST /{username}/{post_id}/edit/
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, String)>,
    form: web::Form<PostForm>,
) -> AppResult<HttpResponse> {
    let (username, raw_id) = path.into_inner();
    let post_id = parse_post_id(&raw_id)?;

    let outcome = state
        .blog
        .edit_post(&identity, &username, post_id, Some(form.into_inner()))
        .await?;
    respond_to_edit(&state, &identity, &username, outcome).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query_is_lenient() {
        assert_eq!(PageQuery::parse("").request().number, None);
        assert_eq!(PageQuery::parse("page=3").request().number, Some(3));
        assert_eq!(PageQuery::parse("page=abc").request().number, None);
        assert_eq!(PageQuery::parse("page=1&page=2").request().number, Some(2));
        assert_eq!(PageQuery::parse("page=%ZZ&x").request().number, None);
    }
}
