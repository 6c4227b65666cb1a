pub mod admin;
pub mod apply;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn view_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(apply::index))
        .route("/apply/{track}", get(apply::form_page).post(apply::submit))
        .route("/admin/login", get(admin::login_page).post(admin::login))
        .route("/admin/logout", post(admin::logout))
}

/// Pages that require an admin session; 401s are turned into a login redirect.
pub fn admin_view_routes() -> Router<SharedState> {
    Router::new().route("/admin/submissions", get(admin::submissions_page))
}
