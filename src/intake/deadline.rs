use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::IntakeConfig;
use crate::models::Track;

/// Closed strictly after the cutoff; the cutoff instant itself is still open.
pub fn is_closed<A: TimeZone, B: TimeZone>(cutoff: &DateTime<A>, now: &DateTime<B>) -> bool {
    now > cutoff
}

/// A track's cutoff. Tracks without a cutoff never close.
#[derive(Debug, Clone, Copy)]
pub struct AdmissionWindow {
    pub track: Track,
    pub cutoff: Option<DateTime<Tz>>,
}

impl AdmissionWindow {
    pub fn for_track(config: &IntakeConfig, track: Track) -> Self {
        let cutoff = match track {
            Track::Organization => config.org_deadline,
            Track::Student => config.student_deadline,
            Track::Poster => config.poster_deadline,
        };
        Self { track, cutoff }
    }

    pub fn is_closed_at(&self, now: DateTime<Utc>) -> bool {
        self.cutoff.is_some_and(|cutoff| is_closed(&cutoff, &now))
    }

    /// e.g. "October 17, 2025 at 04:59 PM EDT"
    pub fn label(&self) -> Option<String> {
        self.cutoff
            .map(|c| c.format("%B %-d, %Y at %I:%M %p %Z").to_string())
    }
}
