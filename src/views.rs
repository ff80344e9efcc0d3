//! Server-rendered HTML pages.
//!
//! Every page shares [`layout`]; forms post back to their own route and show a
//! single inline error above the fields.

use crate::rides::repo_types::{AvailableDrive, BookedDrive};

fn base_style() -> &'static str {
    r#"
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        background: #f3f7f2; color: #2d3a2e;
    }
    nav {
        display: flex; gap: 16px; align-items: center;
        padding: 14px 24px; background: #2f6b3b;
    }
    nav a { color: #fff; text-decoration: none; font-size: 15px; }
    nav .brand { font-weight: 700; font-size: 20px; margin-right: auto; }
    main { max-width: 760px; margin: 32px auto; padding: 0 20px; }
    .card {
        background: #fff; border-radius: 14px; padding: 28px; margin-bottom: 24px;
        box-shadow: 0 4px 20px rgba(0,0,0,0.06);
    }
    h1 { font-size: 24px; margin-bottom: 16px; }
    h2 { font-size: 18px; margin-bottom: 12px; }
    .form-group { margin-bottom: 14px; }
    .form-group label { display: block; font-size: 14px; margin-bottom: 6px; }
    .form-group input, .form-group select {
        width: 100%; padding: 10px 12px; border: 1.5px solid #cfd8cf;
        border-radius: 8px; font-size: 15px;
    }
    .btn {
        padding: 12px 18px; border: none; border-radius: 8px; font-size: 15px;
        font-weight: 600; cursor: pointer; background: #2f6b3b; color: #fff;
    }
    .error { background: #fff0f0; color: #c62828; padding: 10px 14px; border-radius: 8px; font-size: 14px; margin-bottom: 16px; }
    table { width: 100%; border-collapse: collapse; margin-bottom: 16px; font-size: 14px; }
    th, td { text-align: left; padding: 8px; border-bottom: 1px solid #e3e9e3; }
    .empty { color: #7a8a7b; font-size: 14px; margin-bottom: 16px; }
    "#
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn error_html(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<div class="error">{}</div>"#, escape(e)))
        .unwrap_or_default()
}

fn rating_display(rating: Option<f64>) -> String {
    rating
        .map(|r| format!("{r:.1} / 5"))
        .unwrap_or_else(|| "Not rated yet".into())
}

fn layout(title: &str, signed_in: bool, body: &str) -> String {
    let links = if signed_in {
        r#"<a href="/host">Host a drive</a><a href="/rides">Rides</a><a href="/logout">Log out</a>"#
    } else {
        r#"<a href="/register">Register</a><a href="/login">Log in</a>"#
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en"><head>
<meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1">
<title>EcoRide - {title}</title>
<style>{style}</style>
</head><body>
<nav><a class="brand" href="/">EcoRide</a>{links}</nav>
<main>
{body}
</main>
</body></html>"#,
        style = base_style(),
    )
}

pub fn index(signed_in: bool) -> String {
    let call_to_action = if signed_in {
        r#"<p><a class="btn" href="/rides">Find a ride</a> <a class="btn" href="/host">Offer a ride</a></p>"#
    } else {
        r#"<p><a class="btn" href="/register">Join EcoRide</a></p>"#
    };
    let body = format!(
        r#"<div class="card">
  <h1>Share the road, split the footprint</h1>
  <p style="margin-bottom:16px">EcoRide matches drivers and riders who live in the same city.</p>
  {call_to_action}
</div>"#
    );
    layout("Home", signed_in, &body)
}

pub fn register(error: Option<&str>) -> String {
    let body = format!(
        r#"<div class="card">
  <h1>Create an account</h1>
  {error}
  <form method="POST" action="/register">
    <div class="form-group"><label>First name</label><input type="text" name="first_name" autocomplete="given-name"></div>
    <div class="form-group"><label>Last name</label><input type="text" name="last_name" autocomplete="family-name"></div>
    <div class="form-group"><label>Username</label><input type="text" name="username" autocomplete="username"></div>
    <div class="form-group"><label>Email</label><input type="email" name="email" autocomplete="email"></div>
    <div class="form-group"><label>City</label><input type="text" name="city"></div>
    <div class="form-group"><label>Car brand</label><input type="text" name="brand"></div>
    <div class="form-group"><label>Password</label><input type="password" name="password" autocomplete="new-password"></div>
    <div class="form-group"><label>Confirm password</label><input type="password" name="confirmation" autocomplete="new-password"></div>
    <button type="submit" class="btn">Register</button>
  </form>
</div>"#,
        error = error_html(error),
    );
    layout("Register", false, &body)
}

pub fn login(error: Option<&str>) -> String {
    let body = format!(
        r#"<div class="card">
  <h1>Log in</h1>
  {error}
  <form method="POST" action="/login">
    <div class="form-group"><label>Username</label><input type="text" name="username" autocomplete="username"></div>
    <div class="form-group"><label>Password</label><input type="password" name="password" autocomplete="current-password"></div>
    <button type="submit" class="btn">Log in</button>
  </form>
</div>"#,
        error = error_html(error),
    );
    layout("Log in", false, &body)
}

pub fn host(error: Option<&str>) -> String {
    let body = format!(
        r#"<div class="card">
  <h1>Host a drive</h1>
  {error}
  <form method="POST" action="/host">
    <div class="form-group"><label>Date</label><input type="date" name="drive_date"></div>
    <div class="form-group"><label>Departure time</label><input type="time" name="drive_time"></div>
    <button type="submit" class="btn">Host</button>
  </form>
</div>"#,
        error = error_html(error),
    );
    layout("Host", true, &body)
}

/// Inline errors for the two forms on the rides page.
#[derive(Debug, Default)]
pub struct RidesErrors<'a> {
    pub booking: Option<&'a str>,
    pub rating: Option<&'a str>,
}

pub fn rides(yours: &[BookedDrive], available: &[AvailableDrive], errors: RidesErrors<'_>) -> String {
    let yours_html = if yours.is_empty() {
        r#"<p class="empty">You have not booked any drives yet.</p>"#.to_owned()
    } else {
        let rows: String = yours
            .iter()
            .map(|d| {
                format!(
                    "<tr><td>{id}</td><td>{first} {last}</td><td>{city}</td><td>{date}</td><td>{time}</td><td>{rating}</td><td>{email}</td></tr>",
                    id = d.id,
                    first = escape(&d.first_name),
                    last = escape(&d.last_name),
                    city = escape(&d.city),
                    date = escape(&d.date),
                    time = escape(&d.time),
                    rating = rating_display(d.driver_rating),
                    email = escape(&d.email),
                )
            })
            .collect();
        let options: String = yours
            .iter()
            .map(|d| format!(r#"<option value="{id}">#{id} {date} {time}</option>"#, id = d.id, date = escape(&d.date), time = escape(&d.time)))
            .collect();
        format!(
            r#"<table>
    <tr><th>#</th><th>Driver</th><th>City</th><th>Date</th><th>Time</th><th>Rating</th><th>Contact</th></tr>
    {rows}
  </table>
  <h2>Rate a drive</h2>
  <form method="POST" action="/rides">
    <div class="form-group"><label>Drive</label><select name="rate_id">{options}</select></div>
    <div class="form-group"><label>Rating</label><input type="number" name="rating" min="1" max="5" step="1"></div>
    <button type="submit" class="btn">Rate</button>
  </form>"#
        )
    };

    let available_html = if available.is_empty() {
        r#"<p class="empty">No drives available in your city right now.</p>"#.to_owned()
    } else {
        let rows: String = available
            .iter()
            .map(|d| {
                format!(
                    "<tr><td>{id}</td><td>{city}</td><td>{date}</td><td>{time}</td><td>{rating}</td></tr>",
                    id = d.id,
                    city = escape(&d.city),
                    date = escape(&d.date),
                    time = escape(&d.time),
                    rating = rating_display(d.driver_rating),
                )
            })
            .collect();
        let options: String = available
            .iter()
            .map(|d| format!(r#"<option value="{id}">#{id} {date} {time}</option>"#, id = d.id, date = escape(&d.date), time = escape(&d.time)))
            .collect();
        format!(
            r#"<table>
    <tr><th>#</th><th>City</th><th>Date</th><th>Time</th><th>Driver rating</th></tr>
    {rows}
  </table>
  <form method="POST" action="/rides">
    <div class="form-group"><label>Drive</label><select name="drive_id"><option value="">Choose a drive</option>{options}</select></div>
    <button type="submit" class="btn">Book</button>
  </form>"#
        )
    };

    let body = format!(
        r#"<div class="card">
  <h1>Your drives</h1>
  {rating_error}
  {yours_html}
</div>
<div class="card">
  <h1>Available drives</h1>
  {error}
  {available_html}
</div>"#,
        rating_error = error_html(errors.rating),
        error = error_html(errors.booking),
    );
    layout("Rides", true, &body)
}
