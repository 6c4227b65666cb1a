use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;

use crate::error::AppError;
use crate::intake::{IntakeError, parser};
use crate::state::SharedState;
use crate::views::apply::parse_track;

/// Machine-facing intake. Accepts the same bodies as the HTML form.
pub async fn submit(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let track = parse_track(&slug)?;
    let input = parser::parse_request(&headers, body)
        .await
        .map_err(AppError::BadRequest)?;

    let response = match state.pipeline.run(track, &input, Utc::now()).await {
        Ok(receipt) => {
            let (status, label) = if receipt.duplicate {
                (StatusCode::OK, "duplicate")
            } else {
                (StatusCode::CREATED, "created")
            };
            let body = json!({
                "status": label,
                "track": receipt.track,
                "submission_id": receipt.submission_id,
                "created_at": receipt.created_at,
                "notified": receipt.notified,
                "uploads": receipt.uploads,
                "warnings": receipt.warnings,
            });
            (status, Json(body)).into_response()
        }
        Err(e) => {
            let message = e.to_string();
            let (status, body) = match e {
                IntakeError::ClosedWindow { cutoff, .. } => (
                    StatusCode::FORBIDDEN,
                    json!({
                        "error": message,
                        "deadline": cutoff.map(|c| c.to_rfc3339()),
                    }),
                ),
                IntakeError::ValidationFailed(result) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "error": message, "validation": result }),
                ),
                IntakeError::PersistFailed(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": message }),
                ),
            };
            (status, Json(body)).into_response()
        }
    };

    Ok(response)
}
