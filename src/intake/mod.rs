pub mod deadline;
pub mod idempotency;
pub mod parser;
pub mod pipeline;
pub mod tracks;
pub mod uploads;
pub mod validate;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::models::Track;

pub use pipeline::IntakePipeline;
pub use validate::ValidationResult;

/// Rejections that end a submission attempt.
#[derive(Debug, Clone)]
pub enum IntakeError {
    ClosedWindow {
        track: Track,
        cutoff: Option<DateTime<Tz>>,
    },
    ValidationFailed(ValidationResult),
    PersistFailed(String),
}

impl std::fmt::Display for IntakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeError::ClosedWindow { track, .. } => {
                write!(f, "The {track} submission deadline has passed.")
            }
            IntakeError::ValidationFailed(result) => write!(f, "{}", result.problems().join(" ")),
            IntakeError::PersistFailed(_) => write!(
                f,
                "There was a problem saving your submission. Please try again or contact support."
            ),
        }
    }
}

/// Non-fatal problems. The submission still succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntakeWarning {
    UploadFailed { role: String, reason: String },
    NotifyFailed,
}

impl std::fmt::Display for IntakeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakeWarning::UploadFailed { role, reason } => {
                write!(f, "The {role} attachment could not be stored ({reason}).")
            }
            IntakeWarning::NotifyFailed => {
                write!(f, "Your submission was saved, but the confirmation email could not be sent.")
            }
        }
    }
}

/// Successful end of the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
    pub track: Track,
    pub submission_id: i64,
    pub created_at: DateTime<Utc>,
    pub duplicate: bool,
    pub notified: bool,
    pub uploads: serde_json::Map<String, serde_json::Value>,
    pub warnings: Vec<IntakeWarning>,
}
