use anyhow::Context;
use sqlx::SqlitePool;
use uuid::Uuid;

/// SQLite `datetime` modifier reaching `hours` into the past.
fn age_modifier(hours: u32) -> String {
    format!("-{hours} hours")
}

/// Open a new session for `user_id` and return its opaque token.
pub async fn create(db: &SqlitePool, user_id: i64) -> anyhow::Result<String> {
    let token = Uuid::new_v4().simple().to_string();
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id)
        VALUES (?, ?)
        "#,
    )
    .bind(&token)
    .bind(user_id)
    .execute(db)
    .await
    .context("insert session")?;
    Ok(token)
}

/// The user behind `token`, unless the session is older than `max_age_hours`.
pub async fn find_user_id(
    db: &SqlitePool,
    token: &str,
    max_age_hours: u32,
) -> anyhow::Result<Option<i64>> {
    let user_id = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT user_id
          FROM sessions
         WHERE id = ?
           AND created_at >= datetime('now', ?)
        "#,
    )
    .bind(token)
    .bind(age_modifier(max_age_hours))
    .fetch_optional(db)
    .await
    .context("find session")?;
    Ok(user_id)
}

pub async fn delete(db: &SqlitePool, token: &str) -> anyhow::Result<()> {
    sqlx::query("DELETE FROM sessions WHERE id = ?")
        .bind(token)
        .execute(db)
        .await
        .context("delete session")?;
    Ok(())
}

/// Drop every session older than `max_age_hours`; returns how many went.
pub async fn prune_expired(db: &SqlitePool, max_age_hours: u32) -> anyhow::Result<u64> {
    let done = sqlx::query("DELETE FROM sessions WHERE created_at < datetime('now', ?)")
        .bind(age_modifier(max_age_hours))
        .execute(db)
        .await
        .context("prune expired sessions")?;
    Ok(done.rows_affected())
}
