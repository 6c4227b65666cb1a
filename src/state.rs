use std::sync::Arc;

use crate::config::Config;
use crate::db::SubmissionRepository;
use crate::email::Mailer;
use crate::intake::IntakePipeline;
use crate::rate_limit::LoginRateLimiter;
use crate::storage::ObjectStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub pipeline: IntakePipeline,
    pub repo: Arc<dyn SubmissionRepository>,
    pub login_limiter: LoginRateLimiter,
}

impl AppState {
    /// Collaborators are injected so tests can substitute in-memory fakes.
    pub fn new(
        config: Config,
        repo: Arc<dyn SubmissionRepository>,
        store: Arc<dyn ObjectStore>,
        mailer: Arc<dyn Mailer>,
    ) -> SharedState {
        let pipeline = IntakePipeline::new(
            config.intake.clone(),
            &config.storage,
            repo.clone(),
            store,
            mailer,
        );

        Arc::new(Self {
            config,
            pipeline,
            repo,
            login_limiter: LoginRateLimiter::new(),
        })
    }
}
