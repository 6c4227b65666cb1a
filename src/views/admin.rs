use std::net::SocketAddr;

use askama::Template;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;

use crate::auth;
use crate::auth::extractor::{AdminSession, SESSION_COOKIE};
use crate::error::AppError;
use crate::export;
use crate::models::Track;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "admin/login.html")]
struct LoginTemplate {
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/submissions.html")]
struct SubmissionsTemplate {
    track: String,
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    error: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub password: String,
}

#[derive(Deserialize)]
pub struct TrackQuery {
    pub track: Option<String>,
}

pub fn session_cookie(token: &str, minutes: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(minutes))
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

pub async fn login_page(State(state): State<SharedState>, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if auth::jwt::decode_token(cookie.value(), &state.config.session_secret).is_ok() {
            return Redirect::to("/admin/submissions").into_response();
        }
    }

    let error = state
        .config
        .admin
        .credential
        .is_none()
        .then(|| "Admin password is not configured.".to_string());
    Html(LoginTemplate { error }.render().unwrap_or_default()).into_response()
}

pub async fn login(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let ip = addr.ip();
    if state.login_limiter.check(ip).is_err() {
        let error = Some("Too many login attempts. Please try again later.".to_string());
        let page = Html(LoginTemplate { error }.render().unwrap_or_default());
        return (StatusCode::TOO_MANY_REQUESTS, page).into_response();
    }

    match auth::login(&state.config.admin, &state.config.session_secret, &form.password) {
        Ok((token, _)) => {
            state.login_limiter.reset(ip);
            tracing::info!("Admin login from {ip}");
            let jar = jar.add(session_cookie(&token, state.config.admin.session_minutes));
            (jar, Redirect::to("/admin/submissions")).into_response()
        }
        Err(e) => {
            if matches!(e, AppError::Unauthorized(_)) {
                state.login_limiter.record_failure(ip);
                tracing::warn!("Failed admin login from {ip}");
            }
            let error = Some(match e {
                AppError::Unauthorized(_) => "Incorrect password.".to_string(),
                AppError::Unavailable(msg) => format!("{msg}."),
                _ => "Login is temporarily unavailable.".to_string(),
            });
            Html(LoginTemplate { error }.render().unwrap_or_default()).into_response()
        }
    }
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.add(clear_session_cookie()), Redirect::to("/admin/login"))
}

pub async fn submissions_page(
    _session: AdminSession,
    State(state): State<SharedState>,
    Query(q): Query<TrackQuery>,
) -> Result<impl IntoResponse, AppError> {
    let track = parse_track_filter(q.track.as_deref())?;

    // A datastore failure renders as an on-screen error with an empty table
    let (submissions, error) = match state.repo.list(track).await {
        Ok(subs) => (subs, None),
        Err(e) => {
            tracing::error!("Admin listing failed: {e}");
            (Vec::new(), Some("Error loading submissions.".to_string()))
        }
    };

    let (columns, rows) = export::table(&submissions, track);
    let template = SubmissionsTemplate {
        track: track.map(|t| t.as_str().to_string()).unwrap_or_default(),
        columns,
        rows,
        error,
    };
    Ok(Html(template.render().unwrap_or_default()))
}

/// Empty or missing means every track.
pub fn parse_track_filter(value: Option<&str>) -> Result<Option<Track>, AppError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(slug) => Track::from_slug(slug)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown track: {slug}"))),
    }
}
