use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, RegisterForm},
        password,
        repo::is_unique_violation,
        repo_types::User,
    },
    error::AppResult,
    forms::filled,
    session::SessionContext,
    state::AppState,
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

pub async fn register_page() -> Html<String> {
    Html(views::register(None))
}

fn register_error(message: &str) -> Response {
    Html(views::register(Some(message))).into_response()
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let registration = match form.require_all() {
        Ok(r) => r,
        Err(message) => {
            warn!(reason = message, "registration incomplete");
            return Ok(register_error(message));
        }
    };
    let username = registration.user.username;

    if User::find_by_username(&state.db, username).await?.is_some() {
        warn!(%username, "username already registered");
        return Ok(register_error("Username already in use"));
    }

    if registration.password != registration.confirmation {
        warn!(%username, "password confirmation mismatch");
        return Ok(register_error("Passwords do not match"));
    }

    let hash = password::hash(registration.password)?;

    // the unique index catches a concurrent registration of the same name
    let user = match User::create(&state.db, &registration.user, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(%username, "username registered concurrently");
            return Ok(register_error("Username already in use"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = user.id, username = %user.username, city = %user.city, "user registered");
    Ok(Redirect::to("/login").into_response())
}

/// Visiting the login page always signs the visitor out first.
#[instrument(skip(session))]
pub async fn login_page(mut session: SessionContext) -> AppResult<(CookieJar, Html<String>)> {
    session.clear().await?;
    Ok((session.into_jar(), Html(views::login(None))))
}

#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    mut session: SessionContext,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    session.clear().await?;

    let failed = |session: SessionContext, message: &str| {
        (session.into_jar(), Html(views::login(Some(message)))).into_response()
    };

    let Some(username) = filled(&form.username) else {
        return Ok(failed(session, "Missing username"));
    };
    let Some(secret) = filled(&form.password) else {
        return Ok(failed(session, "Missing password"));
    };

    let Some(user) = User::find_by_username(&state.db, username).await? else {
        warn!(%username, "login unknown username");
        return Ok(failed(session, "No user exists with this username"));
    };

    if !password::verify(secret, &user.password_hash)? {
        warn!(%username, user_id = user.id, "login invalid password");
        return Ok(failed(session, "Wrong password"));
    }

    session.persist_user(user.id).await?;
    info!(user_id = user.id, %username, "user logged in");
    Ok((session.into_jar(), Redirect::to("/")).into_response())
}

#[instrument(skip(session))]
pub async fn logout(mut session: SessionContext) -> AppResult<(CookieJar, Redirect)> {
    if let Some(user_id) = session.user_id() {
        info!(user_id, "user logged out");
    }
    session.clear().await?;
    Ok((session.into_jar(), Redirect::to("/")))
}
