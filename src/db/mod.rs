pub mod submissions;

use async_trait::async_trait;

use crate::models::{Inserted, NewSubmission, Submission, Track};

pub use submissions::PgSubmissionRepository;

/// Datastore seam for the intake pipeline and the admin reader.
///
/// Failures are reported as strings so callers can degrade to an on-screen
/// error instead of propagating a driver type.
#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn insert(&self, record: &NewSubmission) -> Result<Inserted, String>;

    /// Newest identifier first.
    async fn list(&self, track: Option<Track>) -> Result<Vec<Submission>, String>;
}
