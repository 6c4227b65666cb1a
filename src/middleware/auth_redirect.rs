use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::Cookie;

use crate::auth::extractor::SESSION_COOKIE;

/// Sends browsers without a valid admin session to `/admin/login`, dropping
/// any stale session cookie on the way.
pub async fn redirect_unauthorized(jar: CookieJar, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    if response.status() != StatusCode::UNAUTHORIZED {
        return response;
    }

    if jar.get(SESSION_COOKIE).is_some() {
        let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
        return (jar, Redirect::to("/admin/login")).into_response();
    }
    Redirect::to("/admin/login").into_response()
}
