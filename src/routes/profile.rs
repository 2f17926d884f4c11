use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::blog::feed::Page;
use crate::blog::views::PostCard;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::routes::home::{Html, PageQuery};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/profile.html")]
pub struct ProfileTemplate {
    pub viewer: Option<String>,
    pub author: String,
    pub post_count: usize,
    pub page: Page<PostCard>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/profile/{username}/", get(profile))
}

async fn profile(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let feed = state.blog.profile_feed(&username, query.request()).await?;

    Ok(Html(ProfileTemplate {
        viewer: maybe_user.username(),
        post_count: feed.post_count(),
        author: feed.author.username,
        page: feed.page,
    })
    .into_response())
}
