use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::auth::jwt::{self, Claims};
use crate::error::AppError;
use crate::state::SharedState;

pub const SESSION_COOKIE: &str = "admin_session";

/// Proof of a valid, unexpired admin session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: Claims,
}

impl FromRequestParts<SharedState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        // Bearer token first, then the session cookie
        if let Some(auth_header) = parts.headers.get("authorization") {
            let auth_str = auth_header
                .to_str()
                .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let claims = jwt::decode_token(token, &state.config.session_secret)
                    .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;
                return Ok(AdminSession { claims });
            }
        }

        let jar = CookieJar::from_headers(&parts.headers);
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            let claims = jwt::decode_token(cookie.value(), &state.config.session_secret)
                .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;
            return Ok(AdminSession { claims });
        }

        Err(AppError::Unauthorized("Admin login required".to_string()))
    }
}
