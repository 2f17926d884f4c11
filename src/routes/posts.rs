use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};

use crate::blog::domain::PostId;
use crate::blog::forms::PostForm;
use crate::blog::service::{CreateOutcome, EditForm, EditOutcome};
use crate::blog::views::{GroupOption, PostCard, PostFormView};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/post_detail.html")]
pub struct PostDetailTemplate {
    pub viewer: Option<String>,
    pub post: PostCard,
    pub author_post_count: usize,
    pub can_edit: bool,
}

#[derive(Template)]
#[template(path = "pages/create_post.html")]
pub struct PostFormTemplate {
    pub viewer: Option<String>,
    pub is_edit: bool,
    pub action: String,
    pub text: String,
    pub groups: Vec<GroupOption>,
    pub no_group_selected: bool,
    pub text_errors: Vec<String>,
    pub group_errors: Vec<String>,
}

impl PostFormTemplate {
    fn new(viewer: &CurrentUser, view: PostFormView) -> Self {
        let action = match view.editing {
            Some(id) => edit_url(id),
            None => "/create/".to_string(),
        };
        Self {
            viewer: Some(viewer.username.clone()),
            is_edit: view.is_edit(),
            action,
            no_group_selected: !view.groups.iter().any(|g| g.selected),
            text_errors: view.errors.messages_for("text"),
            group_errors: view.errors.messages_for("group"),
            text: view.form.text,
            groups: view.groups,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{post_id}/", get(post_detail))
        .route("/create/", get(create_form).post(create_submit))
        .route("/posts/{post_id}/edit/", get(edit_form).post(edit_submit))
}

fn detail_url(id: PostId) -> String {
    format!("/posts/{}/", id)
}

fn edit_url(id: PostId) -> String {
    format!("/posts/{}/edit/", id)
}

fn profile_url(username: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(username.as_bytes()).collect();
    format!("/profile/{}/", encoded)
}

fn parse_post_id(raw: &str) -> AppResult<PostId> {
    PostId::parse(raw).ok_or(AppError::NotFound)
}

async fn post_detail(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let id = parse_post_id(&post_id)?;
    let view = state.blog.post_detail(id).await?;

    let viewer = maybe_user.username();
    let can_edit = viewer.as_deref() == Some(view.post.author.as_str());

    Ok(Html(PostDetailTemplate {
        viewer,
        post: view.post,
        author_post_count: view.author_post_count,
        can_edit,
    })
    .into_response())
}

async fn create_form(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let view = state.blog.new_post_form().await?;
    Ok(Html(PostFormTemplate::new(&user, view)).into_response())
}

async fn create_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    match state.blog.create_post(&user.caller(), form).await? {
        CreateOutcome::Created { author, .. } => {
            Ok(Redirect::to(&profile_url(&author)).into_response())
        }
        CreateOutcome::Invalid(view) => Ok(Html(PostFormTemplate::new(&user, view)).into_response()),
    }
}

async fn edit_form(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<Response> {
    let id = parse_post_id(&post_id)?;
    match state.blog.edit_post_form(&user.caller(), id).await? {
        EditForm::Form(view) => Ok(Html(PostFormTemplate::new(&user, view)).into_response()),
        EditForm::NotAuthor(id) => Ok(Redirect::to(&detail_url(id)).into_response()),
    }
}

async fn edit_submit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(post_id): Path<String>,
    Form(form): Form<PostForm>,
) -> AppResult<Response> {
    let id = parse_post_id(&post_id)?;
    match state.blog.edit_post(&user.caller(), id, form).await? {
        EditOutcome::Updated(id) | EditOutcome::NotAuthor(id) => {
            Ok(Redirect::to(&detail_url(id)).into_response())
        }
        EditOutcome::Invalid(view) => Ok(Html(PostFormTemplate::new(&user, view)).into_response()),
    }
}
