use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Applicant category. Selects the required fields, eligibility boxes and
/// attachment slots that apply to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    Organization,
    Student,
    Poster,
}

impl Track {
    pub const ALL: [Track; 3] = [Track::Organization, Track::Student, Track::Poster];

    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Organization => "organization",
            Track::Student => "student",
            Track::Poster => "poster",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "organization" => Some(Track::Organization),
            "student" => Some(Track::Student),
            "poster" => Some(Track::Poster),
            _ => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Track::Organization => "Organization",
            Track::Student => "Student",
            Track::Poster => "Poster",
        }
    }

    pub fn is_grant(&self) -> bool {
        !matches!(self, Track::Poster)
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted submission row.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub track: String,
    pub applicant_name: String,
    pub email: String,
    pub phone: String,
    pub payload_json: serde_json::Value,
    pub uploads_json: serde_json::Value,
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    pub fn payload_str(&self, key: &str) -> String {
        json_str(&self.payload_json, key)
    }

    pub fn upload_url(&self, role: &str) -> String {
        json_str(&self.uploads_json, role)
    }
}

/// A validated submission ready to insert. Identity fields are already trimmed.
#[derive(Debug, Clone, Serialize)]
pub struct NewSubmission {
    pub track: Track,
    pub applicant_name: String,
    pub email: String,
    pub phone: String,
    pub payload: serde_json::Value,
    pub uploads: serde_json::Value,
    pub idempotency_key: String,
}

/// Result of an insert: the assigned identifier, or the existing one when the
/// idempotency key was already present.
#[derive(Debug, Clone, Copy)]
pub struct Inserted {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub duplicate: bool,
}

fn json_str(value: &serde_json::Value, key: &str) -> String {
    match value.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
