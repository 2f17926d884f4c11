// Repository pattern - isolates all database side effects
use crate::blog::domain::*;
use crate::db::models::{decode_timestamp, encode_timestamp};
use crate::state::DbPool;
use async_trait::async_trait;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Which posts a feed covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(GroupId),
    Author(UserId),
}

impl PostFilter {
    fn clause(&self) -> (&'static str, Vec<Value>) {
        match self {
            PostFilter::All => ("", Vec::new()),
            PostFilter::Group(id) => ("WHERE p.group_id = ?", vec![Value::Integer(id.get())]),
            PostFilter::Author(id) => (
                "WHERE p.author_id = ?",
                vec![Value::Text(id.as_str().to_string())],
            ),
        }
    }
}

/// Repository trait - all blog storage operations
#[async_trait]
pub trait BlogRepository: Send + Sync {
    /// Load a post with its author and group
    async fn find_post(&self, id: PostId) -> Result<Option<Post>, RepositoryError>;

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RepositoryError>;

    async fn find_author(&self, username: &str) -> Result<Option<Author>, RepositoryError>;

    /// All groups, ordered by title
    async fn list_groups(&self) -> Result<Vec<Group>, RepositoryError>;

    async fn count_posts(&self, filter: &PostFilter) -> Result<usize, RepositoryError>;

    /// Newest first; equal timestamps fall back to reverse insertion order
    async fn list_posts(
        &self,
        filter: &PostFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Post>, RepositoryError>;

    async fn insert_post(&self, post: &NewPost) -> Result<Post, RepositoryError>;

    /// Apply text/group changes. Returns `None` when the post does not exist.
    async fn update_post(
        &self,
        id: PostId,
        changes: &PostChanges,
    ) -> Result<Option<Post>, RepositoryError>;

    /// Fails with `Conflict` when the slug is taken
    async fn insert_group(&self, group: &NewGroup) -> Result<Group, RepositoryError>;
}

const POST_SELECT: &str = "SELECT p.id, p.text, p.pub_date, u.id, u.username, \
     g.id, g.title, g.slug, g.description \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id";

const FEED_ORDER: &str = "ORDER BY p.pub_date DESC, p.id DESC";

fn slug_from_column(idx: usize, raw: String) -> rusqlite::Result<Slug> {
    Slug::parse(&raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn group_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<Group> {
    Ok(Group {
        id: GroupId::new(row.get(first)?),
        title: row.get(first + 1)?,
        slug: slug_from_column(first + 2, row.get(first + 2)?)?,
        description: row.get(first + 3)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    let pub_date: String = row.get(2)?;
    let group_id: Option<i64> = row.get(5)?;
    let group = match group_id {
        Some(_) => Some(group_from_row(row, 5)?),
        None => None,
    };

    Ok(Post {
        id: PostId::new(row.get(0)?),
        text: row.get(1)?,
        pub_date: decode_timestamp(2, &pub_date)?,
        author: Author {
            id: UserId::new(row.get::<_, String>(3)?),
            username: row.get(4)?,
        },
        group,
    })
}

fn load_post(conn: &Connection, id: PostId) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        &format!("{POST_SELECT} WHERE p.id = ?1"),
        params![id.get()],
        post_from_row,
    )
    .optional()
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// SQLite implementation
pub struct SqliteBlogRepository {
    pool: DbPool,
}

impl SqliteBlogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlogRepository for SqliteBlogRepository {
    async fn find_post(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;
        Ok(load_post(&conn, id)?)
    }

    async fn find_group_by_slug(&self, slug: &str) -> Result<Option<Group>, RepositoryError> {
        let conn = self.pool.get()?;

        let group = conn
            .query_row(
                "SELECT id, title, slug, description FROM post_groups WHERE slug = ?1",
                params![slug],
                |row| group_from_row(row, 0),
            )
            .optional()?;

        Ok(group)
    }

    async fn find_author(&self, username: &str) -> Result<Option<Author>, RepositoryError> {
        let conn = self.pool.get()?;

        let author = conn
            .query_row(
                "SELECT id, username FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(Author {
                        id: UserId::new(row.get::<_, String>(0)?),
                        username: row.get(1)?,
                    })
                },
            )
            .optional()?;

        Ok(author)
    }

    async fn list_groups(&self) -> Result<Vec<Group>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn
            .prepare("SELECT id, title, slug, description FROM post_groups ORDER BY title, id")?;
        let groups = stmt
            .query_map([], |row| group_from_row(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(groups)
    }

    async fn count_posts(&self, filter: &PostFilter) -> Result<usize, RepositoryError> {
        let conn = self.pool.get()?;

        let (clause, values) = filter.clause();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM posts p {clause}"),
            params_from_iter(values),
            |row| row.get(0),
        )?;

        usize::try_from(count).map_err(|_| RepositoryError::Corrupt(format!("post count {count}")))
    }

    async fn list_posts(
        &self,
        filter: &PostFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Post>, RepositoryError> {
        let conn = self.pool.get()?;

        let (clause, mut values) = filter.clause();
        values.push(Value::Integer(limit as i64));
        values.push(Value::Integer(offset as i64));

        let mut stmt =
            conn.prepare(&format!("{POST_SELECT} {clause} {FEED_ORDER} LIMIT ? OFFSET ?"))?;
        let posts = stmt
            .query_map(params_from_iter(values), post_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(posts)
    }

    async fn insert_post(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO posts (text, pub_date, author_id, group_id) VALUES (?1, ?2, ?3, ?4)",
            params![
                post.text.as_str(),
                encode_timestamp(post.pub_date),
                post.author.as_str(),
                post.group.map(GroupId::get),
            ],
        )?;
        let id = PostId::new(conn.last_insert_rowid());

        load_post(&conn, id)?
            .ok_or_else(|| RepositoryError::Corrupt(format!("post {id} vanished after insert")))
    }

    async fn update_post(
        &self,
        id: PostId,
        changes: &PostChanges,
    ) -> Result<Option<Post>, RepositoryError> {
        let conn = self.pool.get()?;

        // pub_date and author_id are deliberately absent from the SET list
        let rows = conn.execute(
            "UPDATE posts SET text = ?1, group_id = ?2 WHERE id = ?3",
            params![changes.text.as_str(), changes.group.map(GroupId::get), id.get()],
        )?;

        if rows == 0 {
            return Ok(None);
        }
        Ok(load_post(&conn, id)?)
    }

    async fn insert_group(&self, group: &NewGroup) -> Result<Group, RepositoryError> {
        let conn = self.pool.get()?;

        let inserted = conn.execute(
            "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
            params![group.title, group.slug.as_str(), group.description],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(RepositoryError::Conflict(format!(
                    "group slug '{}' already exists",
                    group.slug
                )));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Group {
            id: GroupId::new(conn.last_insert_rowid()),
            title: group.title.clone(),
            slug: group.slug.clone(),
            description: group.description.clone(),
        })
    }
}

/// Type alias for Arc-wrapped repository (for AppState)
pub type DynBlogRepository = Arc<dyn BlogRepository>;
