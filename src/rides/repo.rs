use anyhow::Context;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::rides::repo_types::{AvailableDrive, BookedDrive, Drive};

impl Drive {
    pub async fn find(db: &SqlitePool, id: i64) -> anyhow::Result<Option<Drive>> {
        let drive = sqlx::query_as::<_, Drive>(
            r#"
            SELECT id, user_id, city
              FROM drives
             WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find drive")?;
        Ok(drive)
    }

    /// Drives whose id appears among `rider_id`'s bookings.
    pub async fn booked_by(db: &SqlitePool, rider_id: i64) -> anyhow::Result<Vec<BookedDrive>> {
        let rows = sqlx::query_as::<_, BookedDrive>(
            r#"
            SELECT drives.id, users.first_name, users.last_name, drives.city,
                   drives.date, drives.time, users.driver_rating, users.email
              FROM drives
              JOIN users ON drives.user_id = users.id
             WHERE drives.id IN (SELECT drive_id FROM books WHERE user_id = ?)
             ORDER BY drives.id
            "#,
        )
        .bind(rider_id)
        .fetch_all(db)
        .await
        .context("list booked drives")?;
        Ok(rows)
    }

    /// Drives located in the city `rider_id` lives in.
    pub async fn available_to(db: &SqlitePool, rider_id: i64) -> anyhow::Result<Vec<AvailableDrive>> {
        let rows = sqlx::query_as::<_, AvailableDrive>(
            r#"
            SELECT drives.id, drives.city, drives.date, drives.time, users.driver_rating
              FROM drives
              JOIN users ON drives.user_id = users.id
             WHERE drives.city IN (SELECT city FROM users WHERE id = ?)
             ORDER BY drives.id
            "#,
        )
        .bind(rider_id)
        .fetch_all(db)
        .await
        .context("list available drives")?;
        Ok(rows)
    }
}

// ---- Writes ----

/// Insert a drive within a transaction, snapshotting the driver's city and rating.
pub async fn insert_drive_tx(
    tx: &mut Transaction<'_, Sqlite>,
    driver_id: i64,
    date: &str,
    time: &str,
) -> anyhow::Result<Option<i64>> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO drives (user_id, city, date, time, rating)
        SELECT id, city, ?, ?, driver_rating
          FROM users
         WHERE id = ?
        RETURNING id
        "#,
    )
    .bind(date)
    .bind(time)
    .bind(driver_id)
    .fetch_optional(&mut **tx)
    .await
    .context("insert drive")?;
    Ok(id)
}

pub async fn increment_drive_count_tx(
    tx: &mut Transaction<'_, Sqlite>,
    driver_id: i64,
) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET drives = drives + 1 WHERE id = ?")
        .bind(driver_id)
        .execute(&mut **tx)
        .await
        .context("increment drive count")?;
    Ok(())
}

pub async fn insert_booking(db: &SqlitePool, rider_id: i64, drive_id: i64) -> anyhow::Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO books (user_id, drive_id)
        VALUES (?, ?)
        RETURNING id
        "#,
    )
    .bind(rider_id)
    .bind(drive_id)
    .fetch_one(db)
    .await
    .context("insert booking")?;
    Ok(id)
}

pub async fn insert_rating_tx(
    tx: &mut Transaction<'_, Sqlite>,
    rater_id: i64,
    driver_id: i64,
    drive_id: i64,
    rating: f64,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ratings (user_id, driver_id, drive_id, rating)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(rater_id)
    .bind(driver_id)
    .bind(drive_id)
    .bind(rating)
    .execute(&mut **tx)
    .await
    .context("insert rating")?;
    Ok(())
}

/// Recompute `driver_id`'s mean rating from every rating they received and store it.
pub async fn refresh_driver_rating_tx(
    tx: &mut Transaction<'_, Sqlite>,
    driver_id: i64,
) -> anyhow::Result<Option<f64>> {
    let average = sqlx::query_scalar::<_, Option<f64>>(
        r#"
        UPDATE users
           SET driver_rating = (SELECT AVG(rating) FROM ratings WHERE driver_id = ?)
         WHERE id = ?
        RETURNING driver_rating
        "#,
    )
    .bind(driver_id)
    .bind(driver_id)
    .fetch_optional(&mut **tx)
    .await
    .context("refresh driver rating")?;
    Ok(average.flatten())
}
