//! Shared fixtures: a migrated temp database wired into a full AppState.
#![allow(dead_code)]

use postboard::auth::{session, users};
use postboard::blog::domain::{Group, NewGroup, PostId};
use postboard::blog::forms::PostForm;
use postboard::blog::service::CreateOutcome;
use postboard::blog::SqliteBlogRepository;
use postboard::config::Config;
use postboard::db;
use postboard::extractors::CurrentUser;
use postboard::state::AppState;
use tempfile::TempDir;

pub const TEST_BCRYPT_COST: u32 = 4;
pub const TEST_PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub state: AppState,
    _tmp: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.database.path = Some(tmp.path().join("test.db"));
        config.auth.bcrypt_cost = TEST_BCRYPT_COST;

        let pool = db::create_pool(config.db_path()).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");

        Self {
            state: AppState::new(pool, config),
            _tmp: tmp,
        }
    }

    pub fn repo(&self) -> SqliteBlogRepository {
        SqliteBlogRepository::new(self.state.db.clone())
    }

    pub fn user(&self, username: &str) -> CurrentUser {
        users::create_user(&self.state.db, username, TEST_PASSWORD, TEST_BCRYPT_COST)
            .unwrap()
            .expect("username already taken")
    }

    /// `Cookie` header value for a fresh session.
    pub fn cookie_for(&self, user: &CurrentUser) -> String {
        let token = session::create_session(&self.state.db, &user.id, 1).unwrap();
        format!("{}={}", self.state.config.auth.cookie_name, token)
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        let group = NewGroup::new(title, slug, "").unwrap();
        self.state.blog.add_group(&group).await.unwrap()
    }

    pub async fn post(&self, author: &CurrentUser, text: &str, group: Option<&Group>) -> PostId {
        let form = PostForm {
            text: text.to_string(),
            group: group.map(|g| g.id.get().to_string()).unwrap_or_default(),
        };
        match self.state.blog.create_post(&author.caller(), form).await.unwrap() {
            CreateOutcome::Created { id, .. } => id,
            CreateOutcome::Invalid(view) => panic!("post rejected: {:?}", view.errors),
        }
    }
}
