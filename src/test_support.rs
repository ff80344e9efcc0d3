//! Drives the full router against an in-memory database.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::{app::build_app, session::SESSION_COOKIE, state::AppState};

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    /// `session=<token>` when the response opens a session.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| {
                pair.strip_prefix(SESSION_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
                    .is_some_and(|token| !token.is_empty())
            })
            .map(str::to_owned)
    }

    /// True when the response tells the browser to drop its session cookie.
    pub fn clears_session_cookie(&self) -> bool {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .any(|v| v.starts_with(&format!("{SESSION_COOKIE}=;")) && v.contains("Max-Age=0"))
    }

    pub fn assert_redirect(&self, to: &str) {
        assert_eq!(self.status, StatusCode::SEE_OTHER, "body: {}", self.body);
        assert_eq!(self.location(), Some(to));
    }
}

fn form_body(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

impl TestApp {
    pub async fn new() -> Self {
        let state = AppState::fake().await;
        let router = build_app(state.clone());
        Self { state, router }
    }

    async fn send(&self, req: Request<Body>) -> TestResponse {
        let res = self.router.clone().oneshot(req).await.expect("router is infallible");
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = res
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        let mut req = Request::get(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(
        &self,
        uri: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut req = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        self.send(req.body(Body::from(form_body(fields))).unwrap())
            .await
    }

    /// Register `username` living in `city` with password `pw`.
    pub async fn register(&self, username: &str, city: &str) -> TestResponse {
        self.post_form(
            "/register",
            &[
                ("first_name", "Test"),
                ("last_name", username),
                ("username", username),
                ("email", &format!("{username}@example.com")),
                ("city", city),
                ("brand", "Peugeot"),
                ("password", "pw"),
                ("confirmation", "pw"),
            ],
            None,
        )
        .await
    }

    /// Register and log in, returning the session cookie.
    pub async fn signed_in(&self, username: &str, city: &str) -> String {
        self.register(username, city).await.assert_redirect("/login");
        let res = self
            .post_form("/login", &[("username", username), ("password", "pw")], None)
            .await;
        res.assert_redirect("/");
        res.session_cookie().expect("login opens a session")
    }

    pub async fn user_id(&self, username: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.state.db)
            .await
            .expect("user exists")
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.state.db)
            .await
            .expect("count rows")
    }
}
