//! Sign-in, sign-out and registration pages.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use quill_core::DomainError;
use quill_core::domain::Actor;
use quill_core::forms::{FormErrors, LoginForm, NON_FIELD, SignupForm};

use super::redirect;
use crate::middleware::auth::{
    LOGIN_PATH, OptionalIdentity, expired_session_cookie, safe_next, session_cookie,
};
use crate::middleware::error::{AppError, AppResult};
use crate::render::page_context;
use crate::state::AppState;

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

fn render_login(
    state: &AppState,
    viewer: Option<&Actor>,
    form: &LoginForm,
    errors: &FormErrors,
) -> AppResult<HttpResponse> {
    let mut context = page_context(viewer);
    context.insert("form", form);
    context.insert("next", safe_next(form.next.as_deref()));
    context.insert("errors", errors);
    state.templates.render("login.html", &context)
}

fn render_signup(
    state: &AppState,
    viewer: Option<&Actor>,
    form: &SignupForm,
    errors: &FormErrors,
) -> AppResult<HttpResponse> {
    let mut context = page_context(viewer);
    context.insert("form", form);
    context.insert("errors", errors);
    state.templates.render("signup.html", &context)
}

/// GET /auth/login/
pub async fn login_form(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    query: web::Query<NextQuery>,
) -> AppResult<HttpResponse> {
    let form = LoginForm {
        next: query.into_inner().next,
        ..LoginForm::default()
    };
    render_login(&state, viewer.actor(), &form, &FormErrors::new())
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    let user = match state.accounts.authenticate(&form).await {
        Ok(user) => user,
        Err(DomainError::InvalidForm(errors)) => {
            return render_login(&state, viewer.actor(), &form, &errors);
        }
        Err(DomainError::Unauthorized) => {
            let mut errors = FormErrors::new();
            errors.add(NON_FIELD, BAD_CREDENTIALS);
            return render_login(&state, viewer.actor(), &form, &errors);
        }
        Err(e) => return Err(e.into()),
    };

    let token = state
        .tokens
        .generate_token(user.id, &user.username)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, username = %user.username, "User signed in");

    Ok(HttpResponse::Found()
        .insert_header((
            actix_web::http::header::LOCATION,
            safe_next(form.next.as_deref()).to_string(),
        ))
        .cookie(session_cookie(token, state.tokens.expiration_seconds()))
        .finish())
}

/// GET|POST /auth/logout/
pub async fn logout(viewer: OptionalIdentity) -> HttpResponse {
    if let Some(actor) = viewer.actor() {
        tracing::info!(username = %actor.username, "User signed out");
    }

    HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, "/"))
        .cookie(expired_session_cookie())
        .finish()
}

/// GET /auth/signup/
pub async fn signup_form(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    render_signup(
        &state,
        viewer.actor(),
        &SignupForm::default(),
        &FormErrors::new(),
    )
}

/// POST /auth/signup/
pub async fn signup(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    form: web::Form<SignupForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();

    match state.accounts.register(&form).await {
        Ok(_) => Ok(redirect(LOGIN_PATH)),
        Err(DomainError::InvalidForm(errors)) => {
            render_signup(&state, viewer.actor(), &form, &errors)
        }
        Err(DomainError::Duplicate(_)) => {
            let mut errors = FormErrors::new();
            errors.add("username", "A user with that username already exists.");
            render_signup(&state, viewer.actor(), &form, &errors)
        }
        Err(e) => Err(e.into()),
    }
}
