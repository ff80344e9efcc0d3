use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::repo_types::User,
    error::AppResult,
    forms::filled,
    rides::{
        dto::{HostForm, RidesForm},
        repo,
        repo_types::Drive,
        services::{format_date, format_time, host_drive, record_rating},
    },
    session::CurrentUser,
    state::AppState,
    views::{self, RidesErrors},
};

pub fn rides_routes() -> Router<AppState> {
    Router::new()
        .route("/host", get(host_page).post(host))
        .route("/rides", get(rides_page).post(rides))
}

pub async fn host_page(CurrentUser(_): CurrentUser) -> Html<String> {
    Html(views::host(None))
}

fn host_error(message: &str) -> Response {
    Html(views::host(Some(message))).into_response()
}

#[instrument(skip(state, form))]
pub async fn host(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Form(form): Form<HostForm>,
) -> AppResult<Response> {
    let Some(raw_date) = filled(&form.drive_date) else {
        return Ok(host_error("Incomplete date"));
    };
    let Some(raw_time) = filled(&form.drive_time) else {
        return Ok(host_error("Incomplete time"));
    };
    let Some(date) = format_date(raw_date) else {
        warn!(user_id, date = %raw_date, "unparseable drive date");
        return Ok(host_error("Invalid date"));
    };
    let Some(time) = format_time(raw_time) else {
        warn!(user_id, time = %raw_time, "unparseable drive time");
        return Ok(host_error("Invalid time"));
    };

    let Some(drive_id) = host_drive(&state.db, user_id, &date, &time).await? else {
        warn!(user_id, "session refers to a missing user");
        return Ok(Redirect::to("/login").into_response());
    };

    info!(user_id, drive_id, %date, %time, "drive hosted");
    Ok(Redirect::to("/rides").into_response())
}

/// Both listings for `user_id` with any inline errors.
async fn render_rides(
    state: &AppState,
    user_id: i64,
    errors: RidesErrors<'_>,
) -> AppResult<Response> {
    let yours = Drive::booked_by(&state.db, user_id).await?;
    let available = Drive::available_to(&state.db, user_id).await?;
    Ok(Html(views::rides(&yours, &available, errors)).into_response())
}

#[instrument(skip(state))]
pub async fn rides_page(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> AppResult<Response> {
    render_rides(&state, user_id, RidesErrors::default()).await
}

#[instrument(skip(state, form))]
pub async fn rides(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Form(form): Form<RidesForm>,
) -> AppResult<Response> {
    if form.rate_id.is_some() {
        rate(&state, user_id, &form).await
    } else if form.drive_id.is_some() {
        book(&state, user_id, &form).await
    } else {
        Ok(Redirect::to("/rides").into_response())
    }
}

/// Stars a rider may give.
const RATING_RANGE: std::ops::RangeInclusive<f64> = 1.0..=5.0;

async fn rate(state: &AppState, user_id: i64, form: &RidesForm) -> AppResult<Response> {
    let failed = |message| RidesErrors {
        rating: Some(message),
        ..Default::default()
    };

    let Some(raw_drive) = filled(&form.rate_id) else {
        return render_rides(state, user_id, failed("Missing drive id")).await;
    };
    let Some(raw_rating) = filled(&form.rating) else {
        return render_rides(state, user_id, failed("Missing rating")).await;
    };
    let Some(rating) = raw_rating
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|r| RATING_RANGE.contains(r))
    else {
        warn!(user_id, rating = %raw_rating, "rating out of range");
        return render_rides(state, user_id, failed("Invalid rating")).await;
    };

    let drive = match raw_drive.trim().parse::<i64>() {
        Ok(id) => Drive::find(&state.db, id).await?,
        Err(_) => None,
    };
    let Some(drive) = drive else {
        warn!(user_id, drive = %raw_drive, "rating for unknown drive");
        return render_rides(state, user_id, failed("Invalid drive id")).await;
    };

    let average = record_rating(&state.db, user_id, drive.user_id, drive.id, rating).await?;
    info!(user_id, drive_id = drive.id, driver_id = drive.user_id, rating, ?average, "drive rated");
    Ok(Redirect::to("/rides").into_response())
}

async fn book(state: &AppState, user_id: i64, form: &RidesForm) -> AppResult<Response> {
    let failed = |message| RidesErrors {
        booking: Some(message),
        ..Default::default()
    };

    let Some(raw_drive) = filled(&form.drive_id) else {
        return render_rides(state, user_id, failed("No drive chosen")).await;
    };

    let drive = match raw_drive.trim().parse::<i64>() {
        Ok(id) => Drive::find(&state.db, id).await?,
        Err(_) => None,
    };
    let Some(drive) = drive else {
        warn!(user_id, drive = %raw_drive, "booking for unknown drive");
        return render_rides(state, user_id, failed("This drive doesn't exist")).await;
    };

    let rider_city = User::find_by_id(&state.db, user_id).await?.map(|u| u.city);
    if rider_city.as_deref() != Some(drive.city.as_str()) {
        warn!(user_id, drive_id = drive.id, drive_city = %drive.city, "booking outside rider's city");
        return render_rides(state, user_id, failed("This drive is not in your city")).await;
    }

    let booking_id = repo::insert_booking(&state.db, user_id, drive.id).await?;
    info!(user_id, drive_id = drive.id, booking_id, "drive booked");
    Ok(Redirect::to("/rides").into_response())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::test_support::TestApp;

    async fn host(app: &TestApp, cookie: &str, date: &str, time: &str) {
        app.post_form("/host", &[("drive_date", date), ("drive_time", time)], Some(cookie))
            .await
            .assert_redirect("/rides");
    }

    async fn drive_ids(app: &TestApp, sql: &str, user_id: i64) -> Vec<i64> {
        sqlx::query_scalar::<_, i64>(sql)
            .bind(user_id)
            .fetch_all(&app.state.db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn protected_pages_redirect_to_login_without_session() {
        let app = TestApp::new().await;
        for uri in ["/host", "/rides"] {
            app.get(uri, None).await.assert_redirect("/login");
            app.get(uri, Some("session=forged")).await.assert_redirect("/login");
            app.post_form(uri, &[("drive_id", "1")], None)
                .await
                .assert_redirect("/login");
        }
        assert_eq!(app.count("books").await, 0);
    }

    #[tokio::test]
    async fn host_page_renders_form() {
        let app = TestApp::new().await;
        let cookie = app.signed_in("dora", "Lyon").await;
        let res = app.get("/host", Some(&cookie)).await;
        assert_eq!(res.status, StatusCode::OK);
        assert!(res.body.contains(r#"name="drive_date""#));
    }

    #[tokio::test]
    async fn hosting_requires_date_and_time() {
        let app = TestApp::new().await;
        let cookie = app.signed_in("dora", "Lyon").await;

        let res = app
            .post_form("/host", &[("drive_date", ""), ("drive_time", "10:00")], Some(&cookie))
            .await;
        assert!(res.body.contains("Incomplete date"));
        let res = app
            .post_form("/host", &[("drive_date", "2024-05-07")], Some(&cookie))
            .await;
        assert!(res.body.contains("Incomplete time"));
        let res = app
            .post_form("/host", &[("drive_date", "tomorrow"), ("drive_time", "10:00")], Some(&cookie))
            .await;
        assert!(res.body.contains("Invalid date"));
        assert_eq!(app.count("drives").await, 0);
    }

    #[tokio::test]
    async fn hosted_drive_is_stored_in_display_form() {
        let app = TestApp::new().await;
        let cookie = app.signed_in("dora", "Lyon").await;
        host(&app, &cookie, "2024-05-07", "00:30").await;
        host(&app, &cookie, "2024-05-08", "13:15").await;

        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT city, date, time FROM drives ORDER BY id")
                .fetch_all(&app.state.db)
                .await
                .unwrap();
        assert_eq!(
            rows,
            vec![
                ("Lyon".into(), "05/07/07".into(), "12:30 AM".into()),
                ("Lyon".into(), "05/08/08".into(), "1:15 PM".into()),
            ]
        );
    }

    #[tokio::test]
    async fn listings_follow_bookings_and_city() {
        let app = TestApp::new().await;
        let lyon_driver = app.signed_in("dora", "Lyon").await;
        let paris_driver = app.signed_in("paul", "Paris").await;
        host(&app, &lyon_driver, "2024-05-07", "08:00").await; // 1
        host(&app, &lyon_driver, "2024-05-08", "08:00").await; // 2
        host(&app, &paris_driver, "2024-05-07", "09:00").await; // 3

        let rider = app.signed_in("rick", "Lyon").await;
        let rider_id = app.user_id("rick").await;

        let page = app.get("/rides", Some(&rider)).await;
        assert_eq!(page.status, StatusCode::OK);
        assert!(page.body.contains("You have not booked any drives yet."));

        app.post_form("/rides", &[("drive_id", "2")], Some(&rider))
            .await
            .assert_redirect("/rides");
        // the same drive may be booked twice; it is listed once
        app.post_form("/rides", &[("drive_id", "2")], Some(&rider))
            .await
            .assert_redirect("/rides");
        assert_eq!(app.count("books").await, 2);

        let booked = drive_ids(
            &app,
            "SELECT DISTINCT drive_id FROM books WHERE user_id = ? ORDER BY drive_id",
            rider_id,
        )
        .await;
        assert_eq!(booked, vec![2]);

        let page = app.get("/rides", Some(&rider)).await;
        assert!(page.body.contains("dora@example.com"));
        assert!(!page.body.contains("paul@example.com"));
        assert!(page.body.contains(r#"<option value="1">"#));
        assert!(page.body.contains(r#"<option value="2">"#));
        assert!(!page.body.contains(r#"<option value="3">"#));
    }

    #[tokio::test]
    async fn booking_checks_are_enforced() {
        let app = TestApp::new().await;
        let paris_driver = app.signed_in("paul", "Paris").await;
        host(&app, &paris_driver, "2024-05-07", "09:00").await; // 1
        let rider = app.signed_in("rick", "Lyon").await;

        let cases = [
            ("", "No drive chosen"),
            ("999", "This drive doesn&#39;t exist"),
            ("abc", "This drive doesn&#39;t exist"),
            ("1", "This drive is not in your city"),
        ];
        for (drive_id, message) in cases {
            let res = app
                .post_form("/rides", &[("drive_id", drive_id)], Some(&rider))
                .await;
            assert_eq!(res.status, StatusCode::OK);
            assert!(res.body.contains(message), "{drive_id}: expected {message}");
            // listings are rendered alongside the error
            assert!(res.body.contains("Available drives"));
        }
        assert_eq!(app.count("books").await, 0);
    }

    #[tokio::test]
    async fn rating_updates_driver_average_and_redirects() {
        let app = TestApp::new().await;
        let driver = app.signed_in("dora", "Lyon").await;
        host(&app, &driver, "2024-05-07", "08:00").await;
        let rider = app.signed_in("rick", "Lyon").await;
        app.post_form("/rides", &[("drive_id", "1")], Some(&rider)).await;

        for rating in ["4", "5", "3"] {
            app.post_form("/rides", &[("rate_id", "1"), ("rating", rating)], Some(&rider))
                .await
                .assert_redirect("/rides");
        }

        let average: Option<f64> =
            sqlx::query_scalar("SELECT driver_rating FROM users WHERE username = 'dora'")
                .fetch_one(&app.state.db)
                .await
                .unwrap();
        assert_eq!(average, Some(4.0));
        assert_eq!(app.count("ratings").await, 3);

        let page = app.get("/rides", Some(&rider)).await;
        assert!(page.body.contains("4.0 / 5"));
    }

    #[tokio::test]
    async fn rating_errors_are_inline() {
        let app = TestApp::new().await;
        let driver = app.signed_in("dora", "Lyon").await;
        host(&app, &driver, "2024-05-07", "08:00").await;
        let rider = app.signed_in("rick", "Lyon").await;

        let cases: [(&[(&str, &str)], &str); 4] = [
            (&[("rate_id", ""), ("rating", "4")], "Missing drive id"),
            (&[("rate_id", "1")], "Missing rating"),
            (&[("rate_id", "1"), ("rating", "great")], "Invalid rating"),
            (&[("rate_id", "42"), ("rating", "4")], "Invalid drive id"),
        ];
        for (fields, message) in cases {
            let res = app.post_form("/rides", fields, Some(&rider)).await;
            assert_eq!(res.status, StatusCode::OK);
            assert!(res.body.contains(message), "expected {message}");
        }
        assert_eq!(app.count("ratings").await, 0);
    }

    #[tokio::test]
    async fn out_of_range_ratings_leave_driver_average_untouched() {
        let app = TestApp::new().await;
        let driver = app.signed_in("dora", "Lyon").await;
        host(&app, &driver, "2024-05-07", "08:00").await;
        let rider = app.signed_in("rick", "Lyon").await;

        for rating in ["1e308", "-40", "100", "0", "5.5", "NaN", "inf"] {
            let res = app
                .post_form("/rides", &[("rate_id", "1"), ("rating", rating)], Some(&rider))
                .await;
            assert_eq!(res.status, StatusCode::OK, "{rating}");
            assert!(res.body.contains("Invalid rating"), "{rating}");
        }
        assert_eq!(app.count("ratings").await, 0);

        let average: Option<f64> =
            sqlx::query_scalar("SELECT driver_rating FROM users WHERE username = 'dora'")
                .fetch_one(&app.state.db)
                .await
                .unwrap();
        assert_eq!(average, None);

        // both ends of the scale are accepted
        for rating in ["1", "5"] {
            app.post_form("/rides", &[("rate_id", "1"), ("rating", rating)], Some(&rider))
                .await
                .assert_redirect("/rides");
        }
        assert_eq!(app.count("ratings").await, 2);
    }

    #[tokio::test]
    async fn post_without_known_field_redirects() {
        let app = TestApp::new().await;
        let rider = app.signed_in("rick", "Lyon").await;
        app.post_form("/rides", &[], Some(&rider))
            .await
            .assert_redirect("/rides");
    }
}
