use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use crate::auth::{session, users};
use crate::config::AuthConfig;
use crate::error::AppResult;
use crate::extractors::{extract_cookie, CurrentUser, MaybeUser};
use crate::forms::FormErrors;
use crate::routes::home::Html;
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub viewer: Option<String>,
    pub username: String,
    pub next: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate {
    pub viewer: Option<String>,
    pub username: String,
    pub username_errors: Vec<String>,
    pub password1_errors: Vec<String>,
    pub password2_errors: Vec<String>,
}

impl SignupTemplate {
    fn new(username: String, errors: &FormErrors) -> Self {
        Self {
            viewer: None,
            username,
            username_errors: errors.messages_for("username"),
            password1_errors: errors.messages_for("password1"),
            password2_errors: errors.messages_for("password2"),
        }
    }
}

// -- Request types --

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
}

// -- Cookie helpers --

fn session_cookie(auth: &AuthConfig, token: &str) -> String {
    let max_age_secs = auth.session_hours.saturating_mul(3600);
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        auth.cookie_name, token, max_age_secs
    )
}

fn clear_session_cookie(auth: &AuthConfig) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        auth.cookie_name
    )
}

/// Only same-site paths are followed after login.
pub fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") && !next.starts_with("/\\") {
        next
    } else {
        "/"
    }
}

fn start_session(state: &AppState, user: &CurrentUser, destination: &str) -> AppResult<Response> {
    let token = session::create_session(&state.db, &user.id, state.config.auth.session_hours)?;
    Ok((
        [(header::SET_COOKIE, session_cookie(&state.config.auth, &token))],
        Redirect::to(destination),
    )
        .into_response())
}

// -- Login --

/// GET /auth/login/
pub async fn login_page(
    maybe_user: MaybeUser,
    Query(query): Query<NextQuery>,
) -> AppResult<Response> {
    Ok(Html(LoginTemplate {
        viewer: maybe_user.username(),
        username: String::new(),
        next: query.next.unwrap_or_default(),
        error: None,
    })
    .into_response())
}

/// POST /auth/login/
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let username = form.username.trim();
    match users::verify_credentials(&state.db, username, &form.password)? {
        Some(user) => {
            tracing::info!(username = %user.username, "User logged in");
            start_session(&state, &user, safe_next(&form.next))
        }
        None => Ok(Html(LoginTemplate {
            viewer: None,
            username: username.to_string(),
            next: form.next.clone(),
            error: Some("Please enter a correct username and password.".to_string()),
        })
        .into_response()),
    }
}

// -- Signup --

/// GET /auth/signup/
pub async fn signup_page() -> AppResult<Response> {
    Ok(Html(SignupTemplate::new(String::new(), &FormErrors::new())).into_response())
}

/// POST /auth/signup/
pub async fn signup_submit(
    State(state): State<AppState>,
    Form(form): Form<users::SignupForm>,
) -> AppResult<Response> {
    let username = form.username.trim().to_string();

    let mut errors = form.validate().err().unwrap_or_default();
    if !errors.has("username") && users::username_taken(&state.db, &username)? {
        errors.add("username", users::USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        return Ok(Html(SignupTemplate::new(username, &errors)).into_response());
    }

    let Some(user) = users::create_user(
        &state.db,
        &username,
        &form.password1,
        state.config.auth.bcrypt_cost,
    )?
    else {
        errors.add("username", users::USERNAME_TAKEN);
        return Ok(Html(SignupTemplate::new(username, &errors)).into_response());
    };
    tracing::info!(username = %user.username, "User signed up");

    start_session(&state, &user, "/")
}

// -- Logout --

/// POST /auth/logout/
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = extract_cookie(&headers, &state.config.auth.cookie_name) {
        session::delete_session(&state.db, token)?;
    }

    Ok((
        [(header::SET_COOKIE, clear_session_cookie(&state.config.auth))],
        Redirect::to("/"),
    )
        .into_response())
}
