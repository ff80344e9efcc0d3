use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{repo, SESSION_COOKIE};
use crate::{error::AppError, state::AppState};

/// The request's session: who is signed in, plus the cookie jar to send back.
///
/// Handlers that change the session must return [`SessionContext::into_jar`]
/// alongside their response so the cookie update reaches the browser.
pub struct SessionContext {
    db: SqlitePool,
    jar: CookieJar,
    secure: bool,
    max_age_hours: u32,
    token: Option<String>,
    user_id: Option<i64>,
}

impl SessionContext {
    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Forget the current session, server side and in the browser.
    pub async fn clear(&mut self) -> anyhow::Result<()> {
        if let Some(token) = self.token.take() {
            repo::delete(&self.db, &token).await?;
            debug!("session cleared");
        }
        self.user_id = None;
        self.jar = self
            .jar
            .clone()
            .remove(Cookie::build(SESSION_COOKIE).path("/"));
        Ok(())
    }

    /// Start a fresh session for `user_id`, dropping any previous one along
    /// with every expired session in the store.
    pub async fn persist_user(&mut self, user_id: i64) -> anyhow::Result<()> {
        self.clear().await?;
        let pruned = repo::prune_expired(&self.db, self.max_age_hours).await?;
        if pruned > 0 {
            info!(pruned, "expired sessions pruned");
        }
        let token = repo::create(&self.db, user_id).await?;
        // no Max-Age: the cookie dies with the browser session
        let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);
        self.jar = self.jar.clone().add(cookie);
        self.token = Some(token);
        self.user_id = Some(user_id);
        Ok(())
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = &state.config.session;
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_owned());
        let user_id = match token.as_deref() {
            Some(t) => repo::find_user_id(&state.db, t, session.max_age_hours).await?,
            None => None,
        };

        Ok(Self {
            db: state.db.clone(),
            jar,
            secure: session.secure_cookie,
            max_age_hours: session.max_age_hours,
            token,
            user_id,
        })
    }
}

/// The signed-in user's id. Requests without one are redirected to `/login`.
pub struct CurrentUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = SessionContext::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        match session.user_id() {
            Some(id) => Ok(CurrentUser(id)),
            None => {
                debug!(uri = %parts.uri, "no session, redirecting to login");
                Err(Redirect::to("/login").into_response())
            }
        }
    }
}
