use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::blog::{BlogService, SqliteBlogRepository};
use crate::config::Config;

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub blog: BlogService,
}

impl AppState {
    /// Wire the SQLite-backed blog service onto an already migrated pool.
    pub fn new(db: DbPool, config: Config) -> Self {
        let repo = Arc::new(SqliteBlogRepository::new(db.clone()));
        let blog = BlogService::new(repo, config.feed.page_size);
        Self { db, config, blog }
    }
}
