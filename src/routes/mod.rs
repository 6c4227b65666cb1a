pub mod admin;
pub mod intake;

use axum::Router;
use axum::routing::{get, post};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Intake
        .route("/api/v1/submissions/{track}", post(intake::submit))
        // Admin
        .route("/api/v1/admin/login", post(admin::login))
        .route("/api/v1/admin/submissions", get(admin::list))
        .route("/api/v1/admin/submissions/export", get(admin::export))
}
