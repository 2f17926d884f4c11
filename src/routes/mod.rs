pub mod assets;
pub mod auth;
pub mod groups;
pub mod home;
pub mod posts;
pub mod profile;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::not_found_page;
use crate::state::AppState;

/// The full site: feeds, post pages, auth and static assets.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(groups::router())
        .merge(profile::router())
        .merge(posts::router())
        .merge(auth::router())
        .fallback(|| async { not_found_page() })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
