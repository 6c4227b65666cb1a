use std::net::SocketAddr;

use axum::Json;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::auth;
use crate::auth::extractor::AdminSession;
use crate::error::AppError;
use crate::export::{self, ExportView};
use crate::models::Submission;
use crate::state::SharedState;
use crate::views::admin::parse_track_filter;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub track: Option<String>,
}

#[derive(Deserialize)]
pub struct ExportParams {
    pub track: Option<String>,
    pub view: Option<String>,
}

pub async fn login(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let ip = addr.ip();
    if let Err(retry_after) = state.login_limiter.check(ip) {
        return Err(AppError::RateLimited(format!(
            "Too many login attempts. Try again in {retry_after} seconds"
        )));
    }

    let (token, claims) =
        match auth::login(&state.config.admin, &state.config.session_secret, &req.password) {
            Ok(issued) => issued,
            Err(e) => {
                if matches!(e, AppError::Unauthorized(_)) {
                    state.login_limiter.record_failure(ip);
                    tracing::warn!("Failed admin login from {ip}");
                }
                return Err(e);
            }
        };

    state.login_limiter.reset(ip);
    tracing::info!("Admin login from {ip}");

    Ok(Json(serde_json::json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_at": claims.expires_at(),
    })))
}

pub async fn list(
    _session: AdminSession,
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let submissions = load(&state, params.track.as_deref()).await?;
    Ok(Json(serde_json::json!({
        "total": submissions.len(),
        "submissions": submissions,
    })))
}

pub async fn export(
    _session: AdminSession,
    State(state): State<SharedState>,
    Query(params): Query<ExportParams>,
) -> Result<impl IntoResponse, AppError> {
    let submissions = load(&state, params.track.as_deref()).await?;
    let view = ExportView::parse(params.view.as_deref().unwrap_or("all"));
    let csv = export::to_csv(&submissions, view);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", view.file_name()),
            ),
        ],
        csv,
    ))
}

async fn load(state: &SharedState, track: Option<&str>) -> Result<Vec<Submission>, AppError> {
    let track = parse_track_filter(track)?;
    state.repo.list(track).await.map_err(AppError::Repository)
}
