use askama::Template;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::models::Track;

pub const CONTACT_EMAIL: &str = "nhcma@lutinemanagement.com";

/// Values shown in a confirmation email. All strings are raw user input; the
/// templates escape them on render.
pub struct Confirmation<'a> {
    pub track: Track,
    pub applicant_name: &'a str,
    pub project_title: &'a str,
    pub organization: &'a str,
    pub school: &'a str,
    pub category: &'a str,
    pub poster_url: &'a str,
    pub submitted_at: DateTime<Utc>,
    pub timezone: Tz,
    pub submission_id: i64,
}

#[derive(Template)]
#[template(path = "email/grant_confirmation.html")]
struct GrantConfirmation<'a> {
    name: &'a str,
    track: &'static str,
    title: &'a str,
    organization: Option<&'a str>,
    school: Option<&'a str>,
    submitted_at: String,
    submission_id: i64,
    contact_email: &'static str,
}

#[derive(Template)]
#[template(path = "email/poster_confirmation.html")]
struct PosterConfirmation<'a> {
    name: &'a str,
    category: &'a str,
    title: &'a str,
    submitted_at: String,
    submission_id: i64,
    poster_url: Option<&'a str>,
    contact_email: &'static str,
}

pub fn subject(track: Track) -> &'static str {
    match track {
        Track::Organization => "NHCMA Foundation — Organization Application Received (2025)",
        Track::Student => "NHCMA Foundation — Student Application Received (2025)",
        Track::Poster => "NHCMA — Poster Submission Received",
    }
}

pub fn format_timestamp(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz)
        .format("%b %d, %Y %I:%M %p %Z")
        .to_string()
}

pub fn render_confirmation(c: &Confirmation<'_>) -> Result<String, askama::Error> {
    let submitted_at = format_timestamp(c.submitted_at, c.timezone);
    match c.track {
        Track::Poster => PosterConfirmation {
            name: or_default(c.applicant_name, "Presenter"),
            category: c.category.trim(),
            title: or_default(c.project_title, "—"),
            submitted_at,
            submission_id: c.submission_id,
            poster_url: non_empty(c.poster_url),
            contact_email: CONTACT_EMAIL,
        }
        .render(),
        track => GrantConfirmation {
            name: or_default(c.applicant_name, "Applicant"),
            track: track.title(),
            title: or_default(c.project_title, "—"),
            organization: non_empty(c.organization).filter(|_| track == Track::Organization),
            school: non_empty(c.school).filter(|_| track == Track::Student),
            submitted_at,
            submission_id: c.submission_id,
            contact_email: CONTACT_EMAIL,
        }
        .render(),
    }
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    non_empty(value).unwrap_or(fallback)
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value.trim()).filter(|v| !v.is_empty())
}
