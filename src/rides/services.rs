use anyhow::Context;
use sqlx::SqlitePool;
use time::{macros::format_description, Date, Time};
use tracing::debug;

use crate::rides::repo;

/// `YYYY-MM-DD` from a date input to the display form stored on a drive.
///
/// The display form is month/day/day: the year is dropped and the day is
/// repeated in its place. Existing drives are stored this way, so new ones
/// follow suit.
pub fn format_date(raw: &str) -> Option<String> {
    let date = Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()?;
    let month = u8::from(date.month());
    let day = date.day();
    Some(format!("{month:02}/{day:02}/{day:02}"))
}

/// 24-hour `HH:MM` (seconds optional) to `H:MM AM|PM`.
pub fn format_time(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let time = Time::parse(raw, format_description!("[hour]:[minute]"))
        .or_else(|_| Time::parse(raw, format_description!("[hour]:[minute]:[second]")))
        .ok()?;

    let (hour, suffix) = match time.hour() {
        0 => (12, "AM"),
        h @ 1..=11 => (h, "AM"),
        12 => (12, "PM"),
        h => (h - 12, "PM"),
    };
    Some(format!("{hour}:{:02} {suffix}", time.minute()))
}

/// Publish a drive for `driver_id` and bump their hosted-drive count.
///
/// Returns `None` when the driver no longer exists.
pub async fn host_drive(
    db: &SqlitePool,
    driver_id: i64,
    date: &str,
    time: &str,
) -> anyhow::Result<Option<i64>> {
    let mut tx = db.begin().await.context("begin host transaction")?;

    let Some(drive_id) = repo::insert_drive_tx(&mut tx, driver_id, date, time).await? else {
        return Ok(None);
    };
    repo::increment_drive_count_tx(&mut tx, driver_id).await?;

    tx.commit().await.context("commit host transaction")?;
    Ok(Some(drive_id))
}

/// Store a rating and refresh the driver's average in one transaction.
///
/// Returns the driver's new average.
pub async fn record_rating(
    db: &SqlitePool,
    rater_id: i64,
    driver_id: i64,
    drive_id: i64,
    rating: f64,
) -> anyhow::Result<Option<f64>> {
    let mut tx = db.begin().await.context("begin rating transaction")?;

    repo::insert_rating_tx(&mut tx, rater_id, driver_id, drive_id, rating).await?;
    let average = repo::refresh_driver_rating_tx(&mut tx, driver_id).await?;

    tx.commit().await.context("commit rating transaction")?;
    debug!(driver_id, ?average, "driver rating refreshed");
    Ok(average)
}
