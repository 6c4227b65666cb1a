pub mod extractor;
pub mod jwt;
pub mod password;

use crate::config::AdminConfig;
use crate::error::AppError;

/// Credential check followed by session issue. Returns the signed token and
/// its claims.
pub fn login(
    admin: &AdminConfig,
    secret: &str,
    input: &str,
) -> Result<(String, jwt::Claims), AppError> {
    let credential = admin.credential.as_ref().ok_or_else(|| {
        AppError::Unavailable("Admin password is not configured".to_string())
    })?;

    if !password::verify(input, credential).map_err(AppError::Internal)? {
        return Err(AppError::Unauthorized("Incorrect password".to_string()));
    }

    let claims = jwt::Claims::admin(admin.session_minutes);
    let token = jwt::encode_token(&claims, secret).map_err(AppError::Internal)?;
    Ok((token, claims))
}
