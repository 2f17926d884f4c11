use rusqlite::{params, OptionalExtension};

use crate::blog::domain::UserId;
use crate::blog::repository::is_unique_violation;
use crate::db::models::User;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::forms::{FormErrors, REQUIRED};
use crate::state::DbPool;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.chars().count() <= USERNAME_MAX_LEN
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Registration form as submitted.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    /// Shape checks only; whether the name is free is checked against the store.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::new();
        let username = self.username.trim();

        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. Use letters, numbers and @/./+/-/_ only.",
            );
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN_LEN {
            errors.add(
                "password1",
                format!("Password must contain at least {PASSWORD_MIN_LEN} characters."),
            );
        }

        if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result(|| ())
    }
}

pub fn username_taken(pool: &DbPool, username: &str) -> AppResult<bool> {
    let conn = pool.get()?;
    let taken: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    Ok(taken)
}

/// `None` when the username is already taken, even if it was claimed
/// after an earlier `username_taken` check.
pub fn create_user(
    pool: &DbPool,
    username: &str,
    password: &str,
    bcrypt_cost: u32,
) -> AppResult<Option<CurrentUser>> {
    let password_hash = bcrypt::hash(password, bcrypt_cost)?;
    let id = uuid::Uuid::now_v7().to_string();

    let conn = pool.get()?;
    match conn.execute(
        "INSERT INTO users (id, username, password_hash) VALUES (?1, ?2, ?3)",
        params![id, username, password_hash],
    ) {
        Ok(_) => Ok(Some(CurrentUser {
            id: UserId::new(id),
            username: username.to_string(),
        })),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn find_user(pool: &DbPool, username: &str) -> AppResult<Option<User>> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    password_hash: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

/// `Some(user)` only when the username exists and the password matches.
pub fn verify_credentials(
    pool: &DbPool,
    username: &str,
    password: &str,
) -> AppResult<Option<CurrentUser>> {
    let Some(user) = find_user(pool, username)? else {
        return Ok(None);
    };

    if !bcrypt::verify(password, &user.password_hash).unwrap_or(false) {
        return Ok(None);
    }

    Ok(Some(CurrentUser {
        id: UserId::new(user.id),
        username: user.username,
    }))
}
