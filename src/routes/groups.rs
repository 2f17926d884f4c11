use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::blog::domain::Group;
use crate::blog::feed::Page;
use crate::blog::views::PostCard;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::routes::home::{Html, PageQuery};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/group_list.html")]
pub struct GroupListTemplate {
    pub viewer: Option<String>,
    pub group: Group,
    pub page: Page<PostCard>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/group/{slug}/", get(group_posts))
}

async fn group_posts(
    State(state): State<AppState>,
    maybe_user: MaybeUser,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Response> {
    let feed = state.blog.group_feed(&slug, query.request()).await?;

    Ok(Html(GroupListTemplate {
        viewer: maybe_user.username(),
        group: feed.group,
        page: feed.page,
    })
    .into_response())
}
