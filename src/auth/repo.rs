use anyhow::Context;
use sqlx::SqlitePool;

use crate::auth::repo_types::{NewUser, User};

const USER_COLUMNS: &str = "id, username, password_hash, city";

impl User {
    pub async fn find_by_username(db: &SqlitePool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(db)
        .await
        .context("find user by username")?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    /// Insert a user with an already hashed password.
    pub async fn create(
        db: &SqlitePool,
        new: &NewUser<'_>,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, username, password_hash, car_model, city, email)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.first_name)
        .bind(new.last_name)
        .bind(new.username)
        .bind(password_hash)
        .bind(new.car_model)
        .bind(new.city)
        .bind(new.email)
        .fetch_one(db)
        .await
        .context("insert user")?;
        Ok(user)
    }
}

/// True when `err` is the UNIQUE(username) index rejecting a duplicate.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|e| e.is_unique_violation())
}
